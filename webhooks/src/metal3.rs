// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Checks of the Metal3 data family

use field::{ErrorList, FieldError, Invalid, Path};
use k8s_types::metal3::{
    Metal3Data, Metal3DataClaim, Metal3DataTemplate, NetworkData, NetworkDataIp,
};
use kube::ResourceExt;

use crate::references::{check_reference_unchanged, check_unchanged};
use crate::{Defaulter, Validator, verdict};

/// The name a [`Metal3Data`] must carry: `<template-name>-<index>`, where the template name is
/// `templateReference` if set and `template.name` otherwise
#[must_use]
pub fn expected_data_name(data: &Metal3Data) -> String {
    let template_name = data
        .spec
        .template_reference
        .as_deref()
        .filter(|name| !name.is_empty())
        .or(data.spec.template.name.as_deref())
        .unwrap_or_default();
    format!("{template_name}-{}", data.spec.index)
}

impl Validator for Metal3Data {
    fn validate_create(&self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        let name = self.name_any();
        if name != expected_data_name(self) {
            errors.push(FieldError::invalid(
                &Path::new(&["metadata", "name"]),
                &name,
                "should follow the convention <Metal3Template Name>-<index>",
            ));
        }
        if self.spec.index < 0 {
            errors.push(FieldError::invalid(
                &Path::new(&["spec", "index"]),
                &self.spec.index,
                "must be positive value",
            ));
        }
        verdict(self, "create", errors)
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        let spec = Path::new(&["spec"]);
        check_unchanged(&old.spec.index, &self.spec.index, &spec.child("index"), &mut errors);
        check_reference_unchanged(
            &old.spec.template,
            &self.spec.template,
            &spec.child("template"),
            &mut errors,
        );
        check_reference_unchanged(
            &old.spec.claim,
            &self.spec.claim,
            &spec.child("claim"),
            &mut errors,
        );
        verdict(self, "update", errors)
    }
}

impl Defaulter for Metal3Data {}

/// Every statically addressed network must name the pool its address comes from
fn check_network_pools(network_data: &NetworkData, path: &Path, errors: &mut ErrorList) {
    let families: [(&str, &[NetworkDataIp]); 2] = [
        ("ipv4", &network_data.networks.ipv4),
        ("ipv6", &network_data.networks.ipv6),
    ];
    for (family, networks) in families {
        let family_path = path.child("networks").child(family);
        for (index, network) in networks.iter().enumerate() {
            if !network.references_pool() {
                errors.push(FieldError::required(
                    &family_path.index(index),
                    "ipAddressFromIPPool or fromPoolRef must be set",
                ));
            }
        }
    }
}

fn check_template_structure(template: &Metal3DataTemplate, errors: &mut ErrorList) {
    if let Some(network_data) = &template.spec.network_data {
        check_network_pools(network_data, &Path::new(&["spec", "networkData"]), errors);
    }
}

impl Validator for Metal3DataTemplate {
    fn validate_create(&self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_template_structure(self, &mut errors);
        verdict(self, "create", errors)
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_template_structure(self, &mut errors);
        let spec = Path::new(&["spec"]);
        check_unchanged(
            &old.spec.meta_data,
            &self.spec.meta_data,
            &spec.child("metaData"),
            &mut errors,
        );
        check_unchanged(
            &old.spec.network_data,
            &self.spec.network_data,
            &spec.child("networkData"),
            &mut errors,
        );
        verdict(self, "update", errors)
    }
}

impl Defaulter for Metal3DataTemplate {}

impl Validator for Metal3DataClaim {
    fn validate_create(&self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        if self.spec.template.name.as_deref().unwrap_or_default().is_empty() {
            errors.push(FieldError::required(
                &Path::new(&["spec", "template", "name"]),
                "must be set",
            ));
        }
        verdict(self, "create", errors)
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_reference_unchanged(
            &old.spec.template,
            &self.spec.template,
            &Path::new(&["spec", "template"]),
            &mut errors,
        );
        verdict(self, "update", errors)
    }
}

impl Defaulter for Metal3DataClaim {}
