// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Field paths and aggregated field errors.
//!
//! Validation and conversion code never stops at the first problem it finds. Instead, every
//! violation is recorded as a [`FieldError`] against the [`Path`] of the offending field and the
//! whole [`ErrorList`] is turned into a single error value at the boundary of the public operation,
//! either an [`Aggregate`] or, for admission, an [`Invalid`] naming the rejected object.

#![deny(clippy::all, clippy::pedantic)]

mod errors;
mod path;

pub use errors::{Aggregate, ErrorList, ErrorType, FieldError, GroupKind, Invalid};
pub use path::Path;
