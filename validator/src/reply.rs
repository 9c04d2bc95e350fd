// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors of the driver and the reply it prints

use convert::Rejected;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The type representing an error when serving a request
#[derive(Debug, Error)]
pub enum DriverError {
    /// Errors that may occur when using this tool, e.g. an unreadable input file.
    #[error("{0}")]
    Environment(String),

    /// Errors that may occur when deserializing from JSON or YAML.
    #[error("{0}")]
    Deserialize(String),

    /// The input is well formed but does not hold the expected objects.
    #[error("{0}")]
    Input(String),

    /// The objects cannot be converted. Warnings found on the way are kept.
    #[error(transparent)]
    Conversion(Rejected),
}

impl DriverError {
    /// Provide a string indicating the type of error
    fn get_type(&self) -> &'static str {
        match self {
            DriverError::Environment(_) => "Environment",
            DriverError::Deserialize(_) => "Deserialization",
            DriverError::Input(_) => "Input",
            DriverError::Conversion(_) => "Conversion",
        }
    }

    /// One entry per error, with the offending field when known
    fn get_errors(&self) -> Vec<ReplyError> {
        let r#type = self.get_type().to_owned();
        match self {
            DriverError::Conversion(rejected) => rejected
                .errors
                .errors()
                .iter()
                .map(|e| ReplyError {
                    r#type: r#type.clone(),
                    message: e.fault.to_string(),
                    field: Some(e.field.clone()),
                })
                .collect(),
            other => vec![ReplyError {
                r#type,
                message: other.to_string(),
                field: None,
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReplyError {
    pub r#type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// The outcome of a conversion request
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ConvertReply {
    pub success: bool,
    /// The produced objects, core object first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReplyError>,
}

impl ConvertReply {
    #[must_use]
    pub fn success(objects: Vec<serde_json::Value>, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            objects,
            warnings,
            errors: vec![],
        }
    }
}

impl From<DriverError> for ConvertReply {
    fn from(error: DriverError) -> Self {
        let errors = error.get_errors();
        let warnings = match error {
            DriverError::Conversion(rejected) => rejected.warnings,
            _ => vec![],
        };
        ConvertReply {
            success: false,
            objects: vec![],
            warnings,
            errors,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use convert::{ConversionError, ConversionFault};
    use field::Aggregate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejection_reply() {
        let errors = vec![
            ConversionError {
                field: "spec.providerSpec.value.ami".to_string(),
                fault: ConversionFault::UnsupportedAmiFilters,
            },
            ConversionError {
                field: "spec.providerID".to_string(),
                fault: ConversionFault::UnableToFindInstanceID,
            },
        ];
        let error = DriverError::Conversion(Rejected {
            errors: Aggregate::new(errors).unwrap(),
            warnings: vec!["dropped".to_string()],
        });
        let reply = ConvertReply::from(error);
        assert!(!reply.success);
        assert_eq!(reply.warnings, vec!["dropped".to_string()]);
        assert_eq!(reply.errors.len(), 2);
        assert_eq!(
            reply.errors[1],
            ReplyError {
                r#type: "Conversion".to_string(),
                message: "unable to find InstanceID in ProviderID".to_string(),
                field: Some("spec.providerID".to_string()),
            }
        );
    }

    #[test]
    fn test_plain_error_reply() {
        let reply = ConvertReply::from(DriverError::Input("no Infrastructure found".to_string()));
        assert_eq!(
            reply.errors,
            vec![ReplyError {
                r#type: "Input".to_string(),
                message: "no Infrastructure found".to_string(),
                field: None,
            }]
        );
    }
}
