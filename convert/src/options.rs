// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use derive_builder::Builder;

/// Namespace holding the structured machine objects
pub const DEFAULT_CAPI_NAMESPACE: &str = "openshift-cluster-api";
/// Namespace holding the legacy machine objects
pub const DEFAULT_MAPI_NAMESPACE: &str = "openshift-machine-api";
/// Bootstrap secret used when the provider configuration names none
pub const DEFAULT_USER_DATA_SECRET: &str = "worker-user-data";

/// Knobs of a conversion run.
///
/// ```
/// use mapi_convert::ConversionOptionsBuilder;
///
/// let options = ConversionOptionsBuilder::default()
///     .capi_namespace("capi-system")
///     .build()
///     .unwrap();
/// assert_eq!(options.capi_namespace, "capi-system");
/// assert_eq!(options.default_user_data_secret, "worker-user-data");
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Namespace stamped on converted core and infrastructure objects
    #[builder(setter(into), default = "DEFAULT_CAPI_NAMESPACE.to_string()")]
    pub capi_namespace: String,

    /// Namespace stamped on objects converted back into the legacy schema
    #[builder(setter(into), default = "DEFAULT_MAPI_NAMESPACE.to_string()")]
    pub mapi_namespace: String,

    #[builder(setter(into), default = "DEFAULT_USER_DATA_SECRET.to_string()")]
    pub default_user_data_secret: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            capi_namespace: DEFAULT_CAPI_NAMESPACE.to_string(),
            mapi_namespace: DEFAULT_MAPI_NAMESPACE.to_string(),
            default_user_data_secret: DEFAULT_USER_DATA_SECRET.to_string(),
        }
    }
}
