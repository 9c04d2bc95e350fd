// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Answer an admission review for the Metal3 data and IP address families

use k8s_types::ipam::{IPAddress, IPClaim, IPPool};
use k8s_types::metal3::{Metal3Data, Metal3DataClaim, Metal3DataTemplate};
use kube_core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube_core::{DynamicObject, Resource};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info};
use webhooks::{Defaulter, Validator};

#[derive(Debug, Error)]
pub enum AdmitError {
    #[error("no admission checks for kind {kind} in group {group:?}")]
    UnknownKind { group: String, kind: String },
    #[error("the request carries no {0} object")]
    MissingObject(&'static str),
    #[error("cannot decode object: {0}")]
    Decode(String),
    #[error(transparent)]
    Rejected(#[from] field::Invalid),
}

fn decode<K: DeserializeOwned>(object: &DynamicObject) -> Result<K, AdmitError> {
    let value = serde_json::to_value(object).map_err(|e| AdmitError::Decode(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| AdmitError::Decode(e.to_string()))
}

fn check<K>(request: &AdmissionRequest<DynamicObject>) -> Result<(), AdmitError>
where
    K: Validator + Defaulter + DeserializeOwned,
{
    let new = request.object.as_ref().map(decode::<K>).transpose()?;
    let old = request.old_object.as_ref().map(decode::<K>).transpose()?;
    match request.operation {
        Operation::Create => {
            let mut new = new.ok_or(AdmitError::MissingObject("new"))?;
            new.apply_defaults();
            new.validate_create()?;
        }
        Operation::Update => {
            let mut new = new.ok_or(AdmitError::MissingObject("new"))?;
            let old = old.ok_or(AdmitError::MissingObject("old"))?;
            new.apply_defaults();
            new.validate_update(&old)?;
        }
        Operation::Delete => {
            if let Some(old) = old {
                old.validate_delete()?;
            }
        }
        Operation::Connect => {}
    }
    Ok(())
}

fn is<K: Resource<DynamicType = ()>>(group: &str, kind: &str) -> bool {
    K::group(&()) == group && K::kind(&()) == kind
}

/// Run the checks of the family named by the request.
///
/// # Errors
/// Fails when the kind is not handled, the objects cannot be decoded or the checks reject the
/// change.
pub fn admit(request: &AdmissionRequest<DynamicObject>) -> Result<(), AdmitError> {
    let (group, kind) = (request.kind.group.as_str(), request.kind.kind.as_str());
    if is::<Metal3Data>(group, kind) {
        check::<Metal3Data>(request)
    } else if is::<Metal3DataTemplate>(group, kind) {
        check::<Metal3DataTemplate>(request)
    } else if is::<Metal3DataClaim>(group, kind) {
        check::<Metal3DataClaim>(request)
    } else if is::<IPPool>(group, kind) {
        check::<IPPool>(request)
    } else if is::<IPClaim>(group, kind) {
        check::<IPClaim>(request)
    } else if is::<IPAddress>(group, kind) {
        check::<IPAddress>(request)
    } else {
        Err(AdmitError::UnknownKind {
            group: group.to_string(),
            kind: kind.to_string(),
        })
    }
}

/// Build the review answering `review`
#[must_use]
pub fn respond(review: AdmissionReview<DynamicObject>) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse admission request: {e}");
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };
    let response = match admit(&request) {
        Ok(()) => {
            debug!(
                "{:?} of {} {:?} allowed",
                request.operation, request.kind.kind, request.name
            );
            AdmissionResponse::from(&request)
        }
        Err(e) => {
            info!(
                "{:?} of {} {:?} denied: {e}",
                request.operation, request.kind.kind, request.name
            );
            AdmissionResponse::from(&request).deny(e.to_string())
        }
    };
    response.into_review()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn review(
        operation: &str,
        object: serde_json::Value,
        old: serde_json::Value,
    ) -> AdmissionReview<DynamicObject> {
        let subject = if object.is_null() { &old } else { &object };
        let kind = subject["kind"].clone();
        let name = subject["metadata"]["name"].clone();
        let group = subject["apiVersion"]
            .as_str()
            .and_then(|v| v.split_once('/'))
            .map(|(group, _)| group.to_string())
            .unwrap_or_default();
        serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": group, "version": "v1alpha1", "kind": kind},
                "resource": {"group": group, "version": "v1alpha1", "resource": "objects"},
                "name": name,
                "namespace": "metal3",
                "operation": operation,
                "userInfo": {},
                "object": object,
                "oldObject": old,
                "dryRun": false,
            }
        }))
        .unwrap()
    }

    fn pool(name_prefix: &str, start: &str) -> serde_json::Value {
        json!({
            "apiVersion": "ipam.metal3.io/v1alpha1",
            "kind": "IPPool",
            "metadata": {"name": "pool", "namespace": "metal3"},
            "spec": {
                "clusterName": "cluster",
                "namePrefix": name_prefix,
                "pools": [{"start": start, "end": "10.0.0.20"}],
            }
        })
    }

    fn allowed(review: &AdmissionReview<DynamicObject>) -> (bool, String) {
        let value = serde_json::to_value(review).unwrap();
        (
            value["response"]["allowed"].as_bool().unwrap_or_default(),
            value["response"]["status"]["message"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        )
    }

    #[test]
    fn test_create_allowed() {
        let reply = respond(review("CREATE", pool("pool", "10.0.0.10"), json!(null)));
        assert_eq!(allowed(&reply), (true, String::new()));
    }

    #[test]
    fn test_create_denied() {
        let reply = respond(review("CREATE", pool("pool", "10.0.0.300"), json!(null)));
        let (allowed, message) = allowed(&reply);
        assert!(!allowed);
        assert!(message.contains("spec.pools[0].start"), "{message}");
    }

    #[test]
    fn test_update_denied() {
        let reply = respond(review(
            "UPDATE",
            pool("renamed", "10.0.0.10"),
            pool("pool", "10.0.0.10"),
        ));
        let (allowed, message) = allowed(&reply);
        assert!(!allowed);
        assert!(message.contains("spec.namePrefix"), "{message}");
    }

    #[test]
    fn test_delete_allowed() {
        let reply = respond(review("DELETE", json!(null), pool("pool", "10.0.0.300")));
        assert!(allowed(&reply).0);
    }

    #[test]
    fn test_unknown_kind() {
        let object = json!({
            "apiVersion": "example.io/v1alpha1",
            "kind": "Widget",
            "metadata": {"name": "w"},
        });
        let request: AdmissionRequest<DynamicObject> =
            review("CREATE", object, json!(null)).try_into().unwrap();
        assert!(matches!(
            admit(&request),
            Err(AdmitError::UnknownKind { kind, .. }) if kind == "Widget"
        ));
    }

    #[test]
    fn test_missing_old_object() {
        let request: AdmissionRequest<DynamicObject> =
            review("UPDATE", pool("pool", "10.0.0.10"), json!(null))
                .try_into()
                .unwrap();
        assert!(matches!(admit(&request), Err(AdmitError::MissingObject("old"))));
    }
}
