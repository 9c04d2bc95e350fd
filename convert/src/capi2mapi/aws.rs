// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use field::Path;
use k8s_types::capa::{self, AWSMachineSpec, HttpTokensState, Volume};
use k8s_types::legacy::{
    self, AWSMachineProviderConfig, AWSResourceReference, BlockDeviceMappingSpec,
    EBSBlockDeviceSpec, METADATA_AUTHENTICATION_OPTIONAL, METADATA_AUTHENTICATION_REQUIRED,
    MetadataServiceOptions, PROVIDER_CONFIG_API_VERSION, PROVIDER_CONFIG_KIND, Placement,
    SecretRef, TagSpecification,
};

use crate::errors::{ConversionFault, Report};

/// What the legacy provider configuration needs from the core machine
pub(crate) struct CoreFields<'a> {
    pub(crate) failure_domain: Option<&'a str>,
    pub(crate) data_secret_name: Option<&'a str>,
}

/// Build the legacy AWS provider configuration of a structured AWS machine spec.
///
/// `path` points at the AWS machine spec.
pub(crate) fn convert_aws_machine_spec(
    spec: &AWSMachineSpec,
    core: &CoreFields<'_>,
    path: &Path,
    report: &mut Report,
) -> AWSMachineProviderConfig {
    AWSMachineProviderConfig {
        api_version: Some(PROVIDER_CONFIG_API_VERSION.to_string()),
        kind: Some(PROVIDER_CONFIG_KIND.to_string()),
        ami: convert_ami(&spec.ami, &path.child("ami"), report),
        instance_type: spec.instance_type.clone(),
        tags: spec
            .additional_tags
            .iter()
            .map(|(name, value)| TagSpecification {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        iam_instance_profile: spec
            .iam_instance_profile
            .as_ref()
            .map(|name| AWSResourceReference {
                id: Some(name.clone()),
                ..Default::default()
            }),
        user_data_secret: core.data_secret_name.map(|name| SecretRef {
            name: name.to_string(),
        }),
        credentials_secret: None,
        key_name: spec.ssh_key_name.clone(),
        device_index: 0,
        public_ip: spec.public_ip,
        network_interface_type: report
            .check(
                &path.child("networkInterfaceType"),
                convert_network_interface_type(&spec.network_interface_type),
            )
            .flatten(),
        security_groups: spec
            .additional_security_groups
            .iter()
            .map(convert_resource_reference)
            .collect(),
        subnet: spec
            .subnet
            .as_ref()
            .map(convert_resource_reference)
            .unwrap_or_default(),
        placement: Placement {
            region: None,
            availability_zone: core.failure_domain.map(str::to_string),
            tenancy: non_empty(&spec.tenancy),
        },
        load_balancers: Vec::new(),
        block_devices: convert_volumes(spec, path, report),
        spot_market_options: spec
            .spot_market_options
            .as_ref()
            .map(|spot| legacy::SpotMarketOptions {
                max_price: spot.max_price.clone(),
            }),
        metadata_service_options: MetadataServiceOptions {
            authentication: spec
                .instance_metadata_options
                .as_ref()
                .and_then(|options| options.http_tokens)
                .map(|tokens| match tokens {
                    HttpTokensState::Optional => METADATA_AUTHENTICATION_OPTIONAL.to_string(),
                    HttpTokensState::Required => METADATA_AUTHENTICATION_REQUIRED.to_string(),
                }),
        },
        placement_group_name: non_empty(&spec.placement_group_name),
        capacity_reservation_id: spec.capacity_reservation_id.clone(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn convert_ami(ami: &capa::AMIReference, path: &Path, report: &mut Report) -> AWSResourceReference {
    if ami.eks_optimized_lookup_type.is_some() {
        report.error(
            &path.child("eksOptimizedLookupType"),
            ConversionFault::NotSupported("eksOptimizedLookupType"),
        );
    }
    if ami.id.is_none() {
        report.error(&path.child("id"), ConversionFault::UnableToFindReference);
    }
    AWSResourceReference {
        id: ami.id.clone(),
        ..Default::default()
    }
}

fn convert_resource_reference(reference: &capa::AWSResourceReference) -> AWSResourceReference {
    AWSResourceReference {
        id: reference.id.clone(),
        arn: None,
        filters: (!reference.filters.is_empty()).then(|| {
            reference
                .filters
                .iter()
                .map(|filter| legacy::Filter {
                    name: filter.name.clone(),
                    values: filter.values.clone(),
                })
                .collect()
        }),
    }
}

fn convert_network_interface_type(kind: &str) -> Result<Option<String>, ConversionFault> {
    match kind {
        "" => Ok(None),
        "efa" => Ok(Some("EFA".to_string())),
        other => Err(ConversionFault::UnsupportedValue {
            value: other.to_string(),
            supported: "efa",
        }),
    }
}

fn convert_volume(volume: &Volume) -> EBSBlockDeviceSpec {
    let kms_key = AWSResourceReference {
        id: non_empty(&volume.encryption_key),
        ..Default::default()
    };
    EBSBlockDeviceSpec {
        delete_on_termination: None,
        encrypted: volume.encrypted,
        kms_key,
        iops: Some(volume.iops),
        throughput: volume.throughput,
        volume_size: Some(volume.size),
        volume_type: non_empty(&volume.r#type),
    }
}

/// The root volume first, without a device name, then every named volume.
fn convert_volumes(
    spec: &AWSMachineSpec,
    path: &Path,
    report: &mut Report,
) -> Vec<BlockDeviceMappingSpec> {
    let root = spec.root_volume.iter().map(|volume| BlockDeviceMappingSpec {
        ebs: Some(convert_volume(volume)),
        ..Default::default()
    });
    let non_root = spec
        .non_root_volumes
        .iter()
        .enumerate()
        .filter_map(|(index, volume)| {
            if volume.device_name.is_empty() {
                report.error(
                    &path.child("nonRootVolumes").index(index).child("deviceName"),
                    ConversionFault::MissingDeviceName,
                );
                return None;
            }
            Some(BlockDeviceMappingSpec {
                device_name: Some(volume.device_name.clone()),
                ebs: Some(convert_volume(volume)),
                ..Default::default()
            })
        });
    root.chain(non_root).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const CORE: CoreFields<'static> = CoreFields {
        failure_domain: Some("us-west-2a"),
        data_secret_name: Some("worker-user-data"),
    };

    fn spec() -> AWSMachineSpec {
        AWSMachineSpec {
            ami: capa::AMIReference {
                id: Some("ami-0123".to_string()),
                eks_optimized_lookup_type: None,
            },
            instance_type: "m6i.xlarge".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_volumes() {
        let spec = AWSMachineSpec {
            root_volume: Some(Volume {
                size: 120,
                r#type: "gp3".to_string(),
                encrypted: Some(true),
                ..Default::default()
            }),
            non_root_volumes: vec![
                Volume {
                    device_name: "/dev/sdb".to_string(),
                    size: 50,
                    encryption_key: "key-1".to_string(),
                    ..Default::default()
                },
                Volume {
                    size: 50,
                    ..Default::default()
                },
            ],
            ..spec()
        };
        let mut report = Report::new();
        let config = convert_aws_machine_spec(&spec, &CORE, &Path::new(&["spec"]), &mut report);
        assert_eq!(config.block_devices.len(), 2);
        assert_eq!(config.block_devices[0].device_name, None);
        assert_eq!(
            config.block_devices[0].ebs.as_ref().unwrap().volume_type.as_deref(),
            Some("gp3")
        );
        assert_eq!(config.block_devices[1].device_name.as_deref(), Some("/dev/sdb"));
        assert_eq!(
            config.block_devices[1].ebs.as_ref().unwrap().kms_key.id.as_deref(),
            Some("key-1")
        );

        let rejected = report.finish((), ()).unwrap_err();
        assert_eq!(
            rejected.errors.errors()[0].field,
            "spec.nonRootVolumes[1].deviceName"
        );
        assert!(rejected.has_fault(&ConversionFault::MissingDeviceName));
    }

    #[test]
    fn test_core_fields_and_metadata() {
        let spec = AWSMachineSpec {
            tenancy: "dedicated".to_string(),
            network_interface_type: "efa".to_string(),
            instance_metadata_options: Some(capa::InstanceMetadataOptions {
                http_tokens: Some(HttpTokensState::Required),
                ..Default::default()
            }),
            ..spec()
        };
        let mut report = Report::new();
        let config = convert_aws_machine_spec(&spec, &CORE, &Path::new(&["spec"]), &mut report);
        assert!(report.finish((), ()).is_ok());
        assert_eq!(config.placement.availability_zone.as_deref(), Some("us-west-2a"));
        assert_eq!(config.placement.tenancy.as_deref(), Some("dedicated"));
        assert_eq!(config.network_interface_type.as_deref(), Some("EFA"));
        assert_eq!(
            config.user_data_secret.map(|s| s.name).as_deref(),
            Some("worker-user-data")
        );
        assert_eq!(
            config.metadata_service_options.authentication.as_deref(),
            Some("Required")
        );
    }

    #[test]
    fn test_ami_without_id() {
        let spec = AWSMachineSpec {
            ami: capa::AMIReference {
                id: None,
                eks_optimized_lookup_type: Some("AmazonLinux".to_string()),
            },
            ..spec()
        };
        let mut report = Report::new();
        convert_aws_machine_spec(&spec, &CORE, &Path::new(&["spec"]), &mut report);
        let rejected = report.finish((), ()).unwrap_err();
        let fields: Vec<_> = rejected.errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["spec.ami.eksOptimizedLookupType", "spec.ami.id"]);
    }
}
