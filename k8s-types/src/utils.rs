// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Utils to build resource objects from JSON / YAML text.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to deserialize object from YAML ({0}): {1}")]
    Yaml(String, serde_yaml_ng::Error),
}

/// Deserialize an object from text holding either JSON or YAML.
///
/// JSON is a subset of YAML, so everything goes through the YAML deserializer.
///
/// # Errors
/// Fails if the text cannot be deserialized as a `T`. `origin` names the source in the error.
pub fn load_object_from_str<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T, LoadError> {
    serde_yaml_ng::from_str(text).map_err(|e| LoadError::Yaml(origin.to_owned(), e))
}
