// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use kube_core::DynamicObject;
use kube_core::admission::AdmissionReview;
use mapi_validator::admit::respond;
use pretty_assertions::assert_eq;
use serde_json::Value;

const IPPOOL_UPDATE: &str = include_str!("fixtures/ippool-update-review.yaml");
const METAL3DATA_CREATE: &str = include_str!("fixtures/metal3data-create-review.yaml");

fn answer(input: &str) -> Value {
    let review: AdmissionReview<DynamicObject> = serde_yaml_ng::from_str(input).unwrap();
    serde_json::to_value(respond(review)).unwrap()
}

#[test]
fn well_named_data_is_allowed() {
    let answer = answer(METAL3DATA_CREATE);
    assert_eq!(answer["response"]["uid"], "3c1a8f0e-9d2b-4f6e-a1b7-5e4d3c2b1a00");
    assert_eq!(answer["response"]["allowed"], true);
}

#[test]
fn misnamed_data_is_denied() {
    let input = METAL3DATA_CREATE.replace("index: 2", "index: 3");
    let answer = answer(&input);
    assert_eq!(answer["response"]["allowed"], false);
    let message = answer["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("metadata.name"), "{message}");
    assert!(
        message.contains("should follow the convention <Metal3Template Name>-<index>"),
        "{message}"
    );
}

#[test]
fn shrinking_pool_is_denied_with_every_reason() {
    let answer = answer(IPPOOL_UPDATE);
    assert_eq!(answer["response"]["allowed"], false);
    let message = answer["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("IPPool.ipam.metal3.io \"provisioning\""), "{message}");
    assert!(
        message.contains("spec.preAllocations[host-0]")
            && message.contains("pre-allocated address is out of bounds of the pools given"),
        "{message}"
    );
    assert!(
        message.contains("address in use by provisioning-host-1 is out of bounds"),
        "{message}"
    );
}

#[test]
fn widening_pool_is_allowed() {
    let input = IPPOOL_UPDATE
        .replace("end: 192.168.10.20", "end: 192.168.10.200")
        .replace("host-0: 192.168.10.50", "host-0: 192.168.10.60");
    assert_eq!(answer(&input)["response"]["allowed"], true);
}
