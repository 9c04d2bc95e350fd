// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! WASM-safe CRD type definitions for the machine resource families.
//!
//! * [`legacy`]: flat machine schema with an opaque AWS provider-config blob.
//! * [`config`]: the cluster infrastructure descriptor.
//! * [`capi`] and [`capa`]: the structured schema, split into a provider-agnostic core object and
//!   an AWS-specific template.
//! * [`metal3`] and [`ipam`]: the Data and IP families guarded by the admission validators.

#![deny(clippy::all, clippy::pedantic)]

pub mod capa;
pub mod capi;
pub mod config;
pub mod ipam;
pub mod legacy;
pub mod metal3;
pub mod utils;

#[cfg(any(test, feature = "bolero"))]
pub mod bolero;
