// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Conversion of AWS machines between the legacy `machine.openshift.io` schema and the structured
//! core (`cluster.x-k8s.io`) plus infrastructure (`infrastructure.cluster.x-k8s.io`) schemas.
//!
//! A conversion never stops at the first problem: every unsupported or invalid field is reported
//! together with its path, alongside non-fatal warnings about information that does not survive
//! the conversion.

#![deny(clippy::all, clippy::pedantic)]

pub mod capi2mapi;
pub mod errors;
pub mod mapi2capi;
pub mod options;

pub use errors::{ConversionError, ConversionFault, ConversionResult, Converted, Rejected};
pub use options::{ConversionOptions, ConversionOptionsBuilder, ConversionOptionsBuilderError};
