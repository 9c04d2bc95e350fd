// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Metal3 Data family (`infrastructure.cluster.x-k8s.io/v1beta1`).
//!
//! A `Metal3DataTemplate` describes the metadata and network data rendered for each host. A
//! `Metal3DataClaim` requests one rendering of a template and is answered by a `Metal3Data`
//! named `<template-name>-<index>`.

use k8s_openapi::api::core::v1::{ObjectReference, SecretReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "infrastructure.cluster.x-k8s.io";

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Metal3Data",
    namespaced,
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct Metal3DataSpec {
    /// Position of this rendering within its template
    #[serde(default)]
    pub index: i32,
    /// Name of the template, when it differs from `template.name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_reference: Option<String>,
    #[serde(default)]
    pub template: ObjectReference,
    #[serde(default)]
    pub claim: ObjectReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_data: Option<SecretReference>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataString {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataObjectName {
    pub key: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataIndex {
    pub key: String,
    #[serde(default)]
    pub offset: i32,
    #[serde(default = "default_step")]
    pub step: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

fn default_step() -> i32 {
    1
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataFromPool {
    pub key: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<MetaDataString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_names: Vec<MetaDataObjectName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<MetaDataIndex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<MetaDataObjectName>,
    #[serde(default, rename = "ipAddressesFromIPPool", skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses_from_ip_pool: Vec<MetaDataFromPool>,
    #[serde(default, rename = "gatewaysFromIPPool", skip_serializing_if = "Vec::is_empty")]
    pub gateways_from_ip_pool: Vec<MetaDataFromPool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataEthernet {
    /// `phy`, `bridge`, `tap`, ...
    pub r#type: String,
    pub id: String,
    #[serde(default = "default_mtu")]
    pub mtu: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}

fn default_mtu() -> i32 {
    1500
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataLink {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ethernets: Vec<NetworkDataEthernet>,
}

/// Typed reference to an address pool
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolReference {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataRoute {
    pub network: String,
    pub prefix: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

/// A statically addressed network. The address comes from a pool, named either inline
/// (`ipAddressFromIPPool`) or through `fromPoolRef`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataIp {
    pub id: String,
    pub link: String,
    #[serde(default, rename = "ipAddressFromIPPool", skip_serializing_if = "Option::is_none")]
    pub ip_address_from_ip_pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pool_ref: Option<PoolReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<NetworkDataRoute>,
}

impl NetworkDataIp {
    /// Whether this network names the pool its address comes from
    #[must_use]
    pub fn references_pool(&self) -> bool {
        let inline = self
            .ip_address_from_ip_pool
            .as_ref()
            .is_some_and(|pool| !pool.is_empty());
        let explicit = self
            .from_pool_ref
            .as_ref()
            .is_some_and(|pool| !pool.name.is_empty());
        inline || explicit
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataDhcp {
    pub id: String,
    pub link: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataNetworks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4: Vec<NetworkDataIp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6: Vec<NetworkDataIp>,
    #[serde(default, rename = "ipv4DHCP", skip_serializing_if = "Vec::is_empty")]
    pub ipv4_dhcp: Vec<NetworkDataDhcp>,
    #[serde(default, rename = "ipv6DHCP", skip_serializing_if = "Vec::is_empty")]
    pub ipv6_dhcp: Vec<NetworkDataDhcp>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDataServices {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    #[serde(default)]
    pub links: NetworkDataLink,
    #[serde(default)]
    pub networks: NetworkDataNetworks,
    #[serde(default)]
    pub services: NetworkDataServices,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Metal3DataTemplate",
    namespaced,
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct Metal3DataTemplateSpec {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_data: Option<NetworkData>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Metal3DataClaim",
    namespaced,
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct Metal3DataClaimSpec {
    #[serde(default)]
    pub template: ObjectReference,
}
