// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP address management family (`ipam.metal3.io/v1alpha1`)

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "ipam.metal3.io";

/// An IP address, in its textual form
pub type IPAddressStr = String;

/// One address range of a pool. A range is bounded by any combination of `start`, `end` and
/// `subnet`; an unset bound does not restrict the range, but a range without any bound holds no
/// address.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<IPAddressStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<IPAddressStr>,
    /// CIDR, e.g. `192.168.0.0/24`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IPAddressStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<IPAddressStr>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ipam.metal3.io",
    version = "v1alpha1",
    kind = "IPPool",
    namespaced,
    status = "IPPoolStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Address ranges, in order of preference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<Pool>,
    /// Addresses reserved for given claims, keyed by claim name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pre_allocations: BTreeMap<String, IPAddressStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IPAddressStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<IPAddressStr>,
    /// Prefix of the names of the `IPAddress` objects allocated from this pool
    #[serde(default)]
    pub name_prefix: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolStatus {
    /// Addresses in use, keyed by `IPAddress` name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allocations: BTreeMap<String, IPAddressStr>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ipam.metal3.io",
    version = "v1alpha1",
    kind = "IPClaim",
    namespaced,
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct IPClaimSpec {
    #[serde(default)]
    pub pool: ObjectReference,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ipam.metal3.io",
    version = "v1alpha1",
    kind = "IPAddress",
    namespaced,
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct IPAddressSpec {
    #[serde(default)]
    pub claim: ObjectReference,
    #[serde(default)]
    pub pool: ObjectReference,
    #[serde(default)]
    pub address: IPAddressStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IPAddressStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<IPAddressStr>,
}
