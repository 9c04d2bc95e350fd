// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::fmt::Display;

use field::{Aggregate, Path};
use thiserror::Error;
use tracing::{debug, warn};

/// What went wrong with a single field during a conversion
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionFault {
    #[error("infrastructure cannot be nil and infrastructure.status.infrastructureName cannot be empty")]
    MissingInfrastructureName,
    #[error("unable to decode provider spec: {0}")]
    ProviderSpecDecode(String),
    #[error("unable to encode provider spec: {0}")]
    ProviderSpecEncode(String),
    #[error("unable to convert volume, only EBS volumes are supported")]
    UnsupportedVolumeMapping,
    #[error("unable to convert AMI ARN reference, not supported")]
    UnsupportedAmiArn,
    #[error("unable to convert AMI filters reference, not supported")]
    UnsupportedAmiFilters,
    #[error("unable to find a valid AMI resource reference")]
    UnableToFindReference,
    #[error("unable to find InstanceID in ProviderID")]
    UnableToFindInstanceID,
    #[error("non-root volumes must have a device name")]
    MissingDeviceName,
    #[error("{0} is not supported")]
    NotSupported(&'static str),
    #[error("unsupported value {value:?}, supported values: {supported}")]
    UnsupportedValue {
        value: String,
        supported: &'static str,
    },
}

/// A [`ConversionFault`] attached to the path of the field that caused it
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field}: {fault}")]
pub struct ConversionError {
    pub field: String,
    pub fault: ConversionFault,
}

impl ConversionError {
    #[must_use]
    pub fn new(path: &Path, fault: ConversionFault) -> Self {
        Self {
            field: path.to_string(),
            fault,
        }
    }
}

/// The outcome of a successful conversion: the core object, its provider-specific counterpart and
/// the warnings collected on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Converted<C, T> {
    pub core: C,
    pub template: T,
    pub warnings: Vec<String>,
}

/// A failed conversion. Warnings found before the failure are kept.
#[derive(Debug, Error)]
#[error("{errors}")]
pub struct Rejected {
    pub errors: Aggregate<ConversionError>,
    pub warnings: Vec<String>,
}

impl Rejected {
    /// Whether any of the errors is of the given kind
    #[must_use]
    pub fn has_fault(&self, fault: &ConversionFault) -> bool {
        self.errors.errors().iter().any(|e| &e.fault == fault)
    }
}

pub type ConversionResult<C, T> = Result<Converted<C, T>, Rejected>;

/// Accumulates the errors and warnings of one conversion run
#[derive(Debug, Default)]
pub(crate) struct Report {
    errors: Vec<ConversionError>,
    warnings: Vec<String>,
}

impl Report {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn error(&mut self, path: &Path, fault: ConversionFault) {
        let error = ConversionError::new(path, fault);
        debug!("conversion error: {error}");
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, path: &Path, message: impl Display) {
        let warning = format!("{path}: {message}");
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Record the error, if any, and pass the value through
    pub(crate) fn check<T>(&mut self, path: &Path, result: Result<T, ConversionFault>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(fault) => {
                self.error(path, fault);
                None
            }
        }
    }

    /// Abort with the errors recorded so far plus `fault`
    pub(crate) fn reject(self, path: &Path, fault: ConversionFault) -> Rejected {
        let last = ConversionError::new(path, fault);
        debug!("conversion error: {last}");
        let Report { errors, warnings } = self;
        let errors = match Aggregate::new(errors) {
            Some(mut errors) => {
                errors.extend([last]);
                errors
            }
            None => Aggregate::from(last),
        };
        Rejected { errors, warnings }
    }

    pub(crate) fn finish<C, T>(self, core: C, template: T) -> ConversionResult<C, T> {
        let Report { errors, warnings } = self;
        match Aggregate::new(errors) {
            None => Ok(Converted {
                core,
                template,
                warnings,
            }),
            Some(errors) => Err(Rejected { errors, warnings }),
        }
    }
}
