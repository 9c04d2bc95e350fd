// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Legacy machines to structured core and AWS infrastructure objects

mod aws;
mod volumes;

use std::collections::BTreeMap;

use field::Path;
use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_types::capa::{self, AWSMachine, AWSMachineSpec, AWSMachineTemplate};
use k8s_types::capi::{self, CLUSTER_NAME_LABEL};
use k8s_types::config::Infrastructure;
use k8s_types::legacy::{self, AWSMachineProviderConfig};
use tracing::debug;

use crate::errors::{ConversionFault, ConversionResult, Report};
use crate::options::ConversionOptions;

const INSTANCE_ID_PREFIX: &str = "i-";

/// Decode the opaque provider configuration. An absent or empty blob yields `None`.
///
/// # Errors
/// Returns [`ConversionFault::ProviderSpecDecode`] if the blob is not an AWS provider config.
pub fn decode_provider_config(
    value: Option<&serde_json::Value>,
) -> Result<Option<AWSMachineProviderConfig>, ConversionFault> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ConversionFault::ProviderSpecDecode(e.to_string())),
    }
}

/// Extract the instance id, the last `/`-separated segment of a provider id, e.g.
/// `aws:///us-west-2a/i-05442bc41c3df969d` gives `i-05442bc41c3df969d`.
///
/// # Errors
/// Returns [`ConversionFault::UnableToFindInstanceID`] if the last segment is not an instance id.
pub fn instance_id_from_provider_id(provider_id: &str) -> Result<String, ConversionFault> {
    provider_id
        .rsplit('/')
        .next()
        .filter(|segment| segment.starts_with(INSTANCE_ID_PREFIX))
        .map(str::to_string)
        .ok_or(ConversionFault::UnableToFindInstanceID)
}

fn require_cluster_name<'a>(
    infrastructure: Option<&'a Infrastructure>,
    report: Report,
) -> Result<(&'a str, Report), crate::Rejected> {
    match infrastructure.and_then(Infrastructure::cluster_name) {
        Some(name) => Ok((name, report)),
        None => Err(report.reject(
            &Path::new(&["infrastructure", "status", "infrastructureName"]),
            ConversionFault::MissingInfrastructureName,
        )),
    }
}

/// The AWS spec of a legacy machine spec, or `None` if the provider configuration cannot be
/// decoded. `path` points at the legacy machine spec.
fn convert_machine_spec(
    spec: &legacy::MachineSpec,
    path: &Path,
    report: &mut Report,
) -> Option<(Option<AWSMachineProviderConfig>, AWSMachineSpec)> {
    let provider_path = path.child("providerSpec").child("value");
    let config = report.check(
        &provider_path,
        decode_provider_config(spec.provider_spec.value.as_ref()),
    )?;

    let mut aws_spec = match &config {
        Some(config) => aws::convert_provider_config(config, &provider_path, report),
        None => {
            debug!("{provider_path}: no provider configuration, using defaults");
            AWSMachineSpec::default()
        }
    };

    if !spec.taints.is_empty() {
        report.error(&path.child("taints"), ConversionFault::NotSupported("taints"));
    }
    if let Some(provider_id) = &spec.provider_id {
        aws_spec.provider_id = Some(provider_id.clone());
        aws_spec.instance_id = report.check(
            &path.child("providerID"),
            instance_id_from_provider_id(provider_id),
        );
    }
    Some((config, aws_spec))
}

fn core_machine_spec(
    spec: &legacy::MachineSpec,
    config: Option<&AWSMachineProviderConfig>,
    cluster_name: &str,
    infrastructure_ref: ObjectReference,
    options: &ConversionOptions,
) -> capi::MachineSpec {
    let data_secret_name = config
        .and_then(|config| config.user_data_secret.as_ref())
        .map_or_else(
            || options.default_user_data_secret.clone(),
            |secret| secret.name.clone(),
        );
    capi::MachineSpec {
        cluster_name: cluster_name.to_string(),
        bootstrap: capi::Bootstrap {
            config_ref: None,
            data_secret_name: Some(data_secret_name),
        },
        infrastructure_ref,
        version: None,
        provider_id: spec.provider_id.clone(),
        failure_domain: config.and_then(|config| config.placement.availability_zone.clone()),
    }
}

fn infrastructure_ref(kind: &str, name: &str, options: &ConversionOptions) -> ObjectReference {
    ObjectReference {
        api_version: Some(capa::API_VERSION.to_string()),
        kind: Some(kind.to_string()),
        name: Some(name.to_string()),
        namespace: Some(options.capi_namespace.clone()),
        ..Default::default()
    }
}

/// Labels with the cluster name label added
fn cluster_labels(
    labels: Option<&BTreeMap<String, String>>,
    cluster_name: &str,
) -> BTreeMap<String, String> {
    let mut labels = labels.cloned().unwrap_or_default();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cluster_name.to_string());
    labels
}

fn object_meta(source: &ObjectMeta, cluster_name: &str, options: &ConversionOptions) -> ObjectMeta {
    ObjectMeta {
        name: source.name.clone(),
        namespace: Some(options.capi_namespace.clone()),
        labels: Some(cluster_labels(source.labels.as_ref(), cluster_name)),
        annotations: source.annotations.clone(),
        ..Default::default()
    }
}

fn warn_node_metadata(metadata: Option<&legacy::TemplateMeta>, path: &Path, report: &mut Report) {
    if metadata.is_some_and(|m| !m.labels.is_empty() || !m.annotations.is_empty()) {
        report.warn(
            &path.child("metadata"),
            "node labels and annotations are not carried over",
        );
    }
}

/// Convert a legacy machine into a core machine and its AWS machine.
///
/// # Errors
/// Returns every problem found, each tied to the path of the offending field. A missing
/// infrastructure name or an undecodable provider configuration stop the conversion early.
pub fn convert_machine(
    machine: &legacy::Machine,
    infrastructure: Option<&Infrastructure>,
    options: &ConversionOptions,
) -> ConversionResult<capi::Machine, AWSMachine> {
    let (cluster_name, mut report) = require_cluster_name(infrastructure, Report::new())?;
    let name = machine.metadata.name.clone().unwrap_or_default();
    debug!("converting machine {name:?} of cluster {cluster_name}");

    let spec_path = Path::new(&["spec"]);
    let Some((config, aws_spec)) = convert_machine_spec(&machine.spec, &spec_path, &mut report)
    else {
        return report.finish(capi::Machine::default(), AWSMachine::default());
    };
    warn_node_metadata(machine.spec.metadata.as_ref(), &spec_path, &mut report);

    let core_spec = core_machine_spec(
        &machine.spec,
        config.as_ref(),
        cluster_name,
        infrastructure_ref(capa::AWS_MACHINE_KIND, &name, options),
        options,
    );
    let core = capi::Machine {
        metadata: object_meta(&machine.metadata, cluster_name, options),
        spec: core_spec,
    };
    let template = AWSMachine {
        metadata: object_meta(&machine.metadata, cluster_name, options),
        spec: aws_spec,
    };
    report.finish(core, template)
}

/// Convert a legacy machine set into a core machine set and its AWS machine template.
///
/// # Errors
/// See [`convert_machine`]. Paths point into the per-replica template of the set.
pub fn convert_machine_set(
    machine_set: &legacy::MachineSet,
    infrastructure: Option<&Infrastructure>,
    options: &ConversionOptions,
) -> ConversionResult<capi::MachineSet, AWSMachineTemplate> {
    let (cluster_name, mut report) = require_cluster_name(infrastructure, Report::new())?;
    let name = machine_set.metadata.name.clone().unwrap_or_default();
    debug!("converting machine set {name:?} of cluster {cluster_name}");

    let template_path = Path::new(&["spec", "template"]);
    let legacy_template = &machine_set.spec.template;
    let Some((config, aws_spec)) =
        convert_machine_spec(&legacy_template.spec, &template_path.child("spec"), &mut report)
    else {
        return report.finish(capi::MachineSet::default(), AWSMachineTemplate::default());
    };
    warn_node_metadata(
        legacy_template.spec.metadata.as_ref(),
        &template_path.child("spec"),
        &mut report,
    );

    let core_spec = core_machine_spec(
        &legacy_template.spec,
        config.as_ref(),
        cluster_name,
        infrastructure_ref(capa::AWS_MACHINE_TEMPLATE_KIND, &name, options),
        options,
    );
    let template_meta = legacy_template.metadata.as_ref();
    let mut selector: LabelSelector = machine_set.spec.selector.clone();
    selector.match_labels = Some(cluster_labels(
        selector.match_labels.as_ref(),
        cluster_name,
    ));

    let core = capi::MachineSet {
        metadata: object_meta(&machine_set.metadata, cluster_name, options),
        spec: capi::MachineSetSpec {
            cluster_name: cluster_name.to_string(),
            replicas: machine_set.spec.replicas,
            selector,
            template: capi::MachineTemplateSpec {
                metadata: capi::TemplateMeta {
                    labels: cluster_labels(template_meta.map(|m| &m.labels), cluster_name),
                    annotations: template_meta
                        .map(|m| m.annotations.clone())
                        .unwrap_or_default(),
                },
                spec: core_spec,
            },
            delete_policy: machine_set.spec.delete_policy.clone(),
            min_ready_seconds: machine_set.spec.min_ready_seconds,
        },
    };
    let template = AWSMachineTemplate {
        metadata: object_meta(&machine_set.metadata, cluster_name, options),
        spec: capa::AWSMachineTemplateSpec {
            template: capa::AWSMachineTemplateResource { spec: aws_spec },
        },
    };
    report.finish(core, template)
}

#[cfg(test)]
mod test {
    use super::*;
    use k8s_types::bolero::LegalValue;
    use k8s_types::config::{InfrastructureSpec, InfrastructureStatus};
    use k8s_types::legacy::{
        AWSResourceReference, BlockDeviceMappingSpec, EBSBlockDeviceSpec, MachineSetSpec,
        MachineTemplateSpec, ProviderSpec, TemplateMeta,
    };
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::errors::ConversionError;

    fn infrastructure(name: &str) -> Infrastructure {
        let mut infra = Infrastructure::new("cluster", InfrastructureSpec::default());
        infra.status = Some(InfrastructureStatus {
            infrastructure_name: name.to_string(),
            ..Default::default()
        });
        infra
    }

    fn legacy_machine(config: &AWSMachineProviderConfig) -> legacy::Machine {
        let mut machine = legacy::Machine::new(
            "worker-0",
            legacy::MachineSpec {
                provider_spec: ProviderSpec {
                    value: Some(serde_json::to_value(config).unwrap()),
                },
                ..Default::default()
            },
        );
        machine.metadata.namespace = Some("openshift-machine-api".to_string());
        machine
    }

    fn minimal_config() -> AWSMachineProviderConfig {
        AWSMachineProviderConfig {
            ami: AWSResourceReference {
                id: Some("ami-0123456789abcdef0".to_string()),
                ..Default::default()
            },
            instance_type: "m6i.xlarge".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_instance_id_from_provider_id() {
        assert_eq!(
            instance_id_from_provider_id("aws:///us-west-2a/i-05442bc41c3df969d"),
            Ok("i-05442bc41c3df969d".to_string())
        );
        assert_eq!(
            instance_id_from_provider_id("i-abc"),
            Ok("i-abc".to_string())
        );
        assert_eq!(
            instance_id_from_provider_id("aws:///us-west-2a/"),
            Err(ConversionFault::UnableToFindInstanceID)
        );
        assert_eq!(
            instance_id_from_provider_id("aws:///us-west-2a/x-05442bc41c3df969d"),
            Err(ConversionFault::UnableToFindInstanceID)
        );
    }

    #[test]
    fn test_decode_provider_config() {
        assert_eq!(decode_provider_config(None), Ok(None));
        assert_eq!(
            decode_provider_config(Some(&serde_json::json!({}))),
            Ok(None)
        );
        let decoded = decode_provider_config(Some(&serde_json::json!({
            "kind": "AWSMachineProviderConfig",
            "instanceType": "m6i.large",
        })))
        .unwrap()
        .unwrap();
        assert_eq!(decoded.instance_type, "m6i.large");
        assert!(matches!(
            decode_provider_config(Some(&serde_json::json!({"blockDevices": "nope"}))),
            Err(ConversionFault::ProviderSpecDecode(_))
        ));
    }

    #[test]
    fn test_missing_infrastructure_name() {
        let machine = legacy_machine(&minimal_config());
        let options = ConversionOptions::default();
        for infra in [None, Some(infrastructure(""))] {
            let rejected = convert_machine(&machine, infra.as_ref(), &options).unwrap_err();
            assert_eq!(
                rejected.errors.errors(),
                &[ConversionError {
                    field: "infrastructure.status.infrastructureName".to_string(),
                    fault: ConversionFault::MissingInfrastructureName,
                }]
            );
        }
    }

    #[test]
    #[traced_test]
    fn test_convert_machine() {
        let config = AWSMachineProviderConfig {
            block_devices: vec![BlockDeviceMappingSpec {
                ebs: Some(EBSBlockDeviceSpec {
                    volume_size: Some(20),
                    volume_type: Some("gp3".to_string()),
                    iops: Some(3000),
                    encrypted: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..minimal_config()
        };
        let mut machine = legacy_machine(&config);
        machine.spec.provider_id = Some("aws:///us-west-2a/i-05442bc41c3df969d".to_string());
        let infra = infrastructure("ci-ln-abcd");
        let options = ConversionOptions::default();

        let converted = convert_machine(&machine, Some(&infra), &options).unwrap();
        assert!(converted.warnings.is_empty());
        let core = &converted.core;
        let aws = &converted.template;

        assert_eq!(core.metadata.name.as_deref(), Some("worker-0"));
        assert_eq!(core.metadata.namespace.as_deref(), Some("openshift-cluster-api"));
        assert_eq!(
            core.metadata.labels.as_ref().unwrap()[CLUSTER_NAME_LABEL],
            "ci-ln-abcd"
        );
        assert_eq!(core.spec.cluster_name, "ci-ln-abcd");
        assert_eq!(
            core.spec.bootstrap.data_secret_name.as_deref(),
            Some("worker-user-data")
        );
        assert_eq!(core.spec.infrastructure_ref.kind.as_deref(), Some("AWSMachine"));
        assert_eq!(core.spec.infrastructure_ref.name.as_deref(), Some("worker-0"));
        assert_eq!(
            aws.spec.instance_id.as_deref(),
            Some("i-05442bc41c3df969d")
        );
        assert_eq!(aws.spec.provider_id, machine.spec.provider_id);
        assert_eq!(
            aws.spec.root_volume,
            Some(capa::Volume {
                size: 20,
                r#type: "gp3".to_string(),
                iops: 3000,
                encrypted: Some(true),
                ..Default::default()
            })
        );
        assert!(logs_contain("converting machine"));
    }

    #[test]
    fn test_errors_are_accumulated() {
        let config = AWSMachineProviderConfig {
            ami: AWSResourceReference {
                arn: Some("arn:aws:ec2:us-east-1::image/ami-0123".to_string()),
                ..Default::default()
            },
            block_devices: vec![
                BlockDeviceMappingSpec {
                    virtual_name: Some("ephemeral0".to_string()),
                    device_name: Some("/dev/sdb".to_string()),
                    ..Default::default()
                },
                BlockDeviceMappingSpec {
                    no_device: Some(String::new()),
                    device_name: Some("/dev/sdc".to_string()),
                    ..Default::default()
                },
            ],
            ..minimal_config()
        };
        let mut machine = legacy_machine(&config);
        machine.spec.provider_id = Some("aws:///us-west-2a/".to_string());
        let infra = infrastructure("ci-ln-abcd");

        let rejected =
            convert_machine(&machine, Some(&infra), &ConversionOptions::default()).unwrap_err();
        let faults: Vec<_> = rejected
            .errors
            .errors()
            .iter()
            .map(|e| (e.field.as_str(), e.fault.clone()))
            .collect();
        assert_eq!(
            faults,
            vec![
                (
                    "spec.providerSpec.value.blockDevices[0]",
                    ConversionFault::UnsupportedVolumeMapping
                ),
                (
                    "spec.providerSpec.value.blockDevices[1]",
                    ConversionFault::UnsupportedVolumeMapping
                ),
                (
                    "spec.providerSpec.value.ami",
                    ConversionFault::UnsupportedAmiArn
                ),
                ("spec.providerID", ConversionFault::UnableToFindInstanceID),
            ]
        );
    }

    #[test]
    fn test_empty_provider_spec() {
        let mut machine = legacy_machine(&minimal_config());
        machine.spec.provider_spec.value = None;
        let infra = infrastructure("ci-ln-abcd");
        let converted =
            convert_machine(&machine, Some(&infra), &ConversionOptions::default()).unwrap();
        assert_eq!(converted.template.spec, AWSMachineSpec::default());
        assert_eq!(converted.core.spec.failure_domain, None);
    }

    #[test]
    fn test_undecodable_provider_spec() {
        let mut machine = legacy_machine(&minimal_config());
        machine.spec.provider_spec.value = Some(serde_json::json!({"deviceIndex": "zero"}));
        let infra = infrastructure("ci-ln-abcd");
        let rejected =
            convert_machine(&machine, Some(&infra), &ConversionOptions::default()).unwrap_err();
        assert_eq!(rejected.errors.len(), 1);
        assert_eq!(rejected.errors.errors()[0].field, "spec.providerSpec.value");
    }

    #[test]
    fn test_convert_machine_set() {
        let config = AWSMachineProviderConfig {
            placement: legacy::Placement {
                availability_zone: Some("us-east-1a".to_string()),
                ..Default::default()
            },
            ..minimal_config()
        };
        let machine_set = legacy::MachineSet::new(
            "workers-us-east-1a",
            MachineSetSpec {
                replicas: Some(3),
                selector: LabelSelector {
                    match_labels: Some(BTreeMap::from([(
                        "machine.openshift.io/cluster-api-machineset".to_string(),
                        "workers-us-east-1a".to_string(),
                    )])),
                    ..Default::default()
                },
                template: MachineTemplateSpec {
                    metadata: Some(TemplateMeta {
                        labels: BTreeMap::from([(
                            "machine.openshift.io/cluster-api-machineset".to_string(),
                            "workers-us-east-1a".to_string(),
                        )]),
                        ..Default::default()
                    }),
                    spec: legacy::MachineSpec {
                        provider_id: Some("aws:///us-east-1a/i-0fedcba9876543210".to_string()),
                        ..legacy_machine(&config).spec
                    },
                },
                ..Default::default()
            },
        );
        let infra = infrastructure("ci-ln-abcd");

        let converted =
            convert_machine_set(&machine_set, Some(&infra), &ConversionOptions::default())
                .unwrap();
        let core = &converted.core.spec;
        assert_eq!(core.replicas, Some(3));
        assert_eq!(core.cluster_name, "ci-ln-abcd");
        assert_eq!(core.template.spec.cluster_name, "ci-ln-abcd");
        assert_eq!(core.template.spec.failure_domain.as_deref(), Some("us-east-1a"));
        assert_eq!(
            core.template.spec.infrastructure_ref.kind.as_deref(),
            Some("AWSMachineTemplate")
        );
        let selector = core.selector.match_labels.as_ref().unwrap();
        for (key, value) in selector {
            assert_eq!(core.template.metadata.labels.get(key), Some(value));
        }
        assert_eq!(
            core.template.spec.provider_id.as_deref(),
            Some("aws:///us-east-1a/i-0fedcba9876543210")
        );
        let aws = &converted.template.spec.template.spec;
        assert_eq!(aws.ami.id.as_deref(), Some("ami-0123456789abcdef0"));
        assert_eq!(aws.provider_id, core.template.spec.provider_id);
        assert_eq!(aws.instance_id.as_deref(), Some("i-0fedcba9876543210"));
    }

    #[test]
    fn test_machine_set_taints_are_rejected() {
        let mut spec = legacy_machine(&minimal_config()).spec;
        spec.taints = vec![k8s_openapi::api::core::v1::Taint {
            key: "dedicated".to_string(),
            effect: "NoSchedule".to_string(),
            ..Default::default()
        }];
        let machine_set = legacy::MachineSet::new(
            "workers",
            MachineSetSpec {
                template: MachineTemplateSpec {
                    metadata: None,
                    spec,
                },
                ..Default::default()
            },
        );
        let infra = infrastructure("ci-ln-abcd");
        let rejected =
            convert_machine_set(&machine_set, Some(&infra), &ConversionOptions::default())
                .unwrap_err();
        assert_eq!(rejected.errors.errors()[0].field, "spec.template.spec.taints");
    }

    #[test]
    fn test_legal_machines_convert() {
        let infra = infrastructure("ci-ln-abcd");
        let options = ConversionOptions::default();
        bolero::check!()
            .with_type::<LegalValue<AWSMachineProviderConfig>>()
            .for_each(|config| {
                let machine = legacy_machine(config.as_ref());
                let converted = convert_machine(&machine, Some(&infra), &options).unwrap();
                assert_eq!(
                    converted.core.spec.failure_domain,
                    config.as_ref().placement.availability_zone
                );
                assert_eq!(converted.template.spec.ami.id, config.as_ref().ami.id);
            });
    }
}
