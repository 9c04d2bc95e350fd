// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::collections::BTreeMap;

use field::Path;
use k8s_types::capa::{
    self, AMIReference, AWSMachineSpec, HttpTokensState, InstanceMetadataOptions,
};
use k8s_types::legacy::{
    AWSMachineProviderConfig, AWSResourceReference, METADATA_AUTHENTICATION_OPTIONAL,
    METADATA_AUTHENTICATION_REQUIRED, MetadataServiceOptions, TagSpecification,
};

use crate::errors::{ConversionFault, Report};
use crate::mapi2capi::volumes::convert_block_devices;

/// Map the legacy AWS provider configuration onto the structured AWS machine spec.
///
/// `path` points at the provider configuration in the legacy object. The returned spec carries
/// no provider or instance id: those come from the machine itself.
pub(crate) fn convert_provider_config(
    config: &AWSMachineProviderConfig,
    path: &Path,
    report: &mut Report,
) -> AWSMachineSpec {
    check_unsupported(config, path, report);

    let (root_volume, non_root_volumes) =
        convert_block_devices(&config.block_devices, &path.child("blockDevices"), report);

    AWSMachineSpec {
        provider_id: None,
        instance_id: None,
        ami: convert_ami(&config.ami).unwrap_or_else(|faults| {
            for fault in faults {
                report.error(&path.child("ami"), fault);
            }
            AMIReference::default()
        }),
        instance_type: config.instance_type.clone(),
        additional_tags: convert_tags(&config.tags),
        iam_instance_profile: config.iam_instance_profile.as_ref().and_then(|profile| {
            report.check(
                &path.child("iamInstanceProfile"),
                convert_iam_instance_profile(profile),
            )
        }),
        public_ip: config.public_ip,
        additional_security_groups: config
            .security_groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                convert_resource_reference(group, &path.child("securityGroups").index(i), report)
            })
            .collect(),
        subnet: (!config.subnet.is_empty())
            .then(|| convert_resource_reference(&config.subnet, &path.child("subnet"), report)),
        ssh_key_name: config.key_name.clone(),
        root_volume,
        non_root_volumes,
        spot_market_options: config
            .spot_market_options
            .as_ref()
            .map(|spot| capa::SpotMarketOptions {
                max_price: spot.max_price.clone(),
            }),
        instance_metadata_options: Some(convert_metadata_options(
            &config.metadata_service_options,
            &path.child("metadataServiceOptions"),
            report,
        )),
        tenancy: config.placement.tenancy.clone().unwrap_or_default(),
        placement_group_name: config.placement_group_name.clone().unwrap_or_default(),
        capacity_reservation_id: config.capacity_reservation_id.clone(),
        network_interface_type: report
            .check(
                &path.child("networkInterfaceType"),
                convert_network_interface_type(config.network_interface_type.as_deref()),
            )
            .unwrap_or_default(),
    }
}

/// Fields with no structured counterpart
fn check_unsupported(config: &AWSMachineProviderConfig, path: &Path, report: &mut Report) {
    if !config.load_balancers.is_empty() {
        report.error(
            &path.child("loadBalancers"),
            ConversionFault::NotSupported("loadBalancers"),
        );
    }
    if config.device_index != 0 {
        report.error(
            &path.child("deviceIndex"),
            ConversionFault::NotSupported("a non-zero deviceIndex"),
        );
    }
    if config.credentials_secret.is_some() {
        report.warn(
            &path.child("credentialsSecret"),
            "credentialsSecret is ignored, credentials come from the cluster",
        );
    }
}

fn has_filters(reference: &AWSResourceReference) -> bool {
    reference.filters.as_ref().is_some_and(|filters| !filters.is_empty())
}

/// Only a reference by id can be expressed. An ARN and filters are each reported.
fn convert_ami(ami: &AWSResourceReference) -> Result<AMIReference, Vec<ConversionFault>> {
    let mut faults = Vec::new();
    if ami.arn.is_some() {
        faults.push(ConversionFault::UnsupportedAmiArn);
    }
    if has_filters(ami) {
        faults.push(ConversionFault::UnsupportedAmiFilters);
    }
    match (&ami.id, faults.is_empty()) {
        (Some(id), true) => Ok(AMIReference {
            id: Some(id.clone()),
            eks_optimized_lookup_type: None,
        }),
        (None, true) => Err(vec![ConversionFault::UnableToFindReference]),
        (_, false) => Err(faults),
    }
}

/// Later tags with the same name overwrite earlier ones.
fn convert_tags(tags: &[TagSpecification]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|tag| (tag.name.clone(), tag.value.clone()))
        .collect()
}

fn convert_iam_instance_profile(
    profile: &AWSResourceReference,
) -> Result<String, ConversionFault> {
    if profile.arn.is_some() || has_filters(profile) {
        return Err(ConversionFault::NotSupported(
            "referencing an IAM instance profile by ARN or filters",
        ));
    }
    profile
        .id
        .clone()
        .ok_or(ConversionFault::NotSupported("an IAM instance profile without id"))
}

fn convert_resource_reference(
    reference: &AWSResourceReference,
    path: &Path,
    report: &mut Report,
) -> capa::AWSResourceReference {
    if reference.arn.is_some() {
        report.warn(&path.child("arn"), "ARN references are dropped");
    }
    capa::AWSResourceReference {
        id: reference.id.clone(),
        filters: reference
            .filters
            .iter()
            .flatten()
            .map(|filter| capa::Filter {
                name: filter.name.clone(),
                values: filter.values.clone(),
            })
            .collect(),
    }
}

/// An unknown authentication mode falls back to the provider's default.
fn convert_metadata_options(
    options: &MetadataServiceOptions,
    path: &Path,
    report: &mut Report,
) -> InstanceMetadataOptions {
    let http_tokens = match options.authentication.as_deref() {
        None | Some("") => None,
        Some(METADATA_AUTHENTICATION_OPTIONAL) => Some(HttpTokensState::Optional),
        Some(METADATA_AUTHENTICATION_REQUIRED) => Some(HttpTokensState::Required),
        Some(other) => {
            report.warn(
                &path.child("authentication"),
                format!("unknown authentication {other:?}, using the default"),
            );
            None
        }
    };
    InstanceMetadataOptions {
        http_tokens,
        ..Default::default()
    }
}

fn convert_network_interface_type(kind: Option<&str>) -> Result<String, ConversionFault> {
    match kind {
        None | Some("" | "ENA") => Ok(String::new()),
        Some("EFA") => Ok("efa".to_string()),
        Some(other) => Err(ConversionFault::UnsupportedValue {
            value: other.to_string(),
            supported: "ENA, EFA",
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use k8s_types::bolero::LegalValue;
    use k8s_types::legacy::{Filter, LoadBalancerReference, SecretRef};
    use pretty_assertions::assert_eq;

    fn path() -> Path {
        Path::new(&["spec", "providerSpec", "value"])
    }

    fn with_ami(id: &str) -> AWSMachineProviderConfig {
        AWSMachineProviderConfig {
            ami: AWSResourceReference {
                id: Some(id.to_string()),
                ..Default::default()
            },
            instance_type: "m6i.xlarge".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ami_reference() {
        assert_eq!(
            convert_ami(&AWSResourceReference {
                id: Some("ami-0123".to_string()),
                ..Default::default()
            }),
            Ok(AMIReference {
                id: Some("ami-0123".to_string()),
                eks_optimized_lookup_type: None
            })
        );
        assert_eq!(
            convert_ami(&AWSResourceReference {
                arn: Some("arn:aws:ec2:::image/ami-0123".to_string()),
                ..Default::default()
            }),
            Err(vec![ConversionFault::UnsupportedAmiArn])
        );
        assert_eq!(
            convert_ami(&AWSResourceReference {
                filters: Some(vec![Filter {
                    name: "name".to_string(),
                    values: vec!["rhcos-*".to_string()],
                }]),
                ..Default::default()
            }),
            Err(vec![ConversionFault::UnsupportedAmiFilters])
        );
        assert_eq!(
            convert_ami(&AWSResourceReference {
                filters: Some(vec![]),
                ..Default::default()
            }),
            Err(vec![ConversionFault::UnableToFindReference])
        );
        assert_eq!(
            convert_ami(&AWSResourceReference::default()),
            Err(vec![ConversionFault::UnableToFindReference])
        );
    }

    #[test]
    fn test_ami_arn_and_filters_are_both_reported() {
        let config = AWSMachineProviderConfig {
            ami: AWSResourceReference {
                id: Some("ami-0123".to_string()),
                arn: Some("arn:aws:ec2:::image/ami-0123".to_string()),
                filters: Some(vec![Filter {
                    name: "name".to_string(),
                    values: vec!["rhcos-*".to_string()],
                }]),
            },
            ..with_ami("ami-0123")
        };
        let mut report = Report::new();
        convert_provider_config(&config, &path(), &mut report);
        let rejected = report.finish((), ()).unwrap_err();
        let faults: Vec<_> = rejected.errors.errors().iter().map(|e| &e.fault).collect();
        assert_eq!(
            faults,
            vec![
                &ConversionFault::UnsupportedAmiArn,
                &ConversionFault::UnsupportedAmiFilters
            ]
        );
        assert!(
            rejected
                .errors
                .errors()
                .iter()
                .all(|e| e.field == "spec.providerSpec.value.ami")
        );
    }

    #[test]
    fn test_iam_instance_profile_empty_filters() {
        let profile = AWSResourceReference {
            id: Some("worker-profile".to_string()),
            filters: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            convert_iam_instance_profile(&profile),
            Ok("worker-profile".to_string())
        );
    }

    #[test]
    fn test_tags_later_wins() {
        let tags = vec![
            TagSpecification {
                name: "env".to_string(),
                value: "dev".to_string(),
            },
            TagSpecification {
                name: "owner".to_string(),
                value: "me".to_string(),
            },
            TagSpecification {
                name: "env".to_string(),
                value: "prod".to_string(),
            },
        ];
        let converted = convert_tags(&tags);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted["env"], "prod");
        assert_eq!(converted["owner"], "me");
    }

    #[test]
    fn test_metadata_options() {
        let mut report = Report::new();
        let auth = |a: Option<&str>| MetadataServiceOptions {
            authentication: a.map(str::to_string),
        };
        let p = path().child("metadataServiceOptions");
        assert_eq!(
            convert_metadata_options(&auth(Some("Required")), &p, &mut report).http_tokens,
            Some(HttpTokensState::Required)
        );
        assert_eq!(
            convert_metadata_options(&auth(Some("Optional")), &p, &mut report).http_tokens,
            Some(HttpTokensState::Optional)
        );
        assert_eq!(
            convert_metadata_options(&auth(None), &p, &mut report),
            InstanceMetadataOptions::default()
        );
        assert_eq!(
            convert_metadata_options(&auth(Some("Sometimes")), &p, &mut report),
            InstanceMetadataOptions::default()
        );
        let converted = report.finish((), ()).unwrap();
        assert_eq!(converted.warnings.len(), 1);
    }

    #[test]
    fn test_network_interface_type() {
        assert_eq!(convert_network_interface_type(None), Ok(String::new()));
        assert_eq!(convert_network_interface_type(Some("ENA")), Ok(String::new()));
        assert_eq!(
            convert_network_interface_type(Some("EFA")),
            Ok("efa".to_string())
        );
        assert!(convert_network_interface_type(Some("SRD")).is_err());
    }

    #[test]
    fn test_unsupported_fields_are_all_reported() {
        let config = AWSMachineProviderConfig {
            load_balancers: vec![LoadBalancerReference {
                name: "api".to_string(),
                r#type: "network".to_string(),
            }],
            device_index: 1,
            credentials_secret: Some(SecretRef {
                name: "aws-cloud-credentials".to_string(),
            }),
            ..with_ami("ami-0123")
        };
        let mut report = Report::new();
        convert_provider_config(&config, &path(), &mut report);
        let rejected = report.finish((), ()).unwrap_err();
        let fields: Vec<_> = rejected.errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "spec.providerSpec.value.loadBalancers",
                "spec.providerSpec.value.deviceIndex"
            ]
        );
        assert_eq!(rejected.warnings.len(), 1);
    }

    #[test]
    fn test_resource_references() {
        let config = AWSMachineProviderConfig {
            security_groups: vec![
                AWSResourceReference {
                    id: Some("sg-1".to_string()),
                    ..Default::default()
                },
                AWSResourceReference {
                    arn: Some("arn:aws:ec2:::security-group/sg-2".to_string()),
                    filters: Some(vec![Filter {
                        name: "tag:Name".to_string(),
                        values: vec!["workers".to_string()],
                    }]),
                    ..Default::default()
                },
            ],
            iam_instance_profile: Some(AWSResourceReference {
                id: Some("worker-profile".to_string()),
                ..Default::default()
            }),
            ..with_ami("ami-0123")
        };
        let mut report = Report::new();
        let spec = convert_provider_config(&config, &path(), &mut report);
        assert_eq!(spec.subnet, None);
        assert_eq!(spec.iam_instance_profile.as_deref(), Some("worker-profile"));
        assert_eq!(spec.additional_security_groups.len(), 2);
        assert_eq!(spec.additional_security_groups[0].id.as_deref(), Some("sg-1"));
        assert_eq!(spec.additional_security_groups[1].filters[0].name, "tag:Name");
        let converted = report.finish((), ()).unwrap();
        assert_eq!(
            converted.warnings,
            vec!["spec.providerSpec.value.securityGroups[1].arn: ARN references are dropped"]
        );
    }

    #[test]
    fn test_legal_provider_configs_convert() {
        bolero::check!()
            .with_type::<LegalValue<AWSMachineProviderConfig>>()
            .for_each(|config| {
                let config = config.as_ref();
                let mut report = Report::new();
                let spec = convert_provider_config(config, &path(), &mut report);
                assert!(report.finish((), ()).is_ok());
                assert_eq!(spec.ami.id, config.ami.id);
                assert_eq!(spec.instance_type, config.instance_type);
                let named = config
                    .block_devices
                    .iter()
                    .filter(|m| m.device_name.is_some())
                    .count();
                assert_eq!(spec.non_root_volumes.len(), named);
                assert_eq!(
                    spec.root_volume.is_some(),
                    config.block_devices.len() > named
                );
                assert_eq!(
                    spec.additional_security_groups.len(),
                    config.security_groups.len()
                );
                assert!(spec.subnet.is_some());
            });
    }
}
