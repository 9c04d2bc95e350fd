// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Structured core and AWS infrastructure objects back to legacy machines

mod aws;

use std::collections::BTreeMap;

use field::Path;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_types::capa::{self, AWSMachine, AWSMachineSpec, AWSMachineTemplate};
use k8s_types::capi::{self, CLUSTER_NAME_LABEL};
use k8s_types::legacy::{self, AWSMachineProviderConfig, ProviderSpec};
use tracing::debug;

use crate::errors::{ConversionFault, ConversionResult, Report};
use crate::options::ConversionOptions;

use aws::{CoreFields, convert_aws_machine_spec};

fn check_infrastructure_kind(
    spec: &capi::MachineSpec,
    expected: &'static str,
    path: &Path,
    report: &mut Report,
) {
    let kind = spec.infrastructure_ref.kind.as_deref().unwrap_or_default();
    if kind != expected {
        report.error(
            &path.child("infrastructureRef").child("kind"),
            ConversionFault::UnsupportedValue {
                value: kind.to_string(),
                supported: expected,
            },
        );
    }
}

fn provider_spec(
    spec: &AWSMachineSpec,
    core: &capi::MachineSpec,
    path: &Path,
    report: &mut Report,
) -> (AWSMachineProviderConfig, ProviderSpec) {
    let fields = CoreFields {
        failure_domain: core.failure_domain.as_deref(),
        data_secret_name: core.bootstrap.data_secret_name.as_deref(),
    };
    let config = convert_aws_machine_spec(spec, &fields, path, report);
    let value = report.check(
        path,
        serde_json::to_value(&config)
            .map_err(|e| ConversionFault::ProviderSpecEncode(e.to_string())),
    );
    (config, ProviderSpec { value })
}

/// Labels without the cluster name label
fn legacy_labels(labels: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
    let mut labels = labels.cloned().unwrap_or_default();
    labels.remove(CLUSTER_NAME_LABEL);
    labels
}

fn object_meta(source: &ObjectMeta, options: &ConversionOptions) -> ObjectMeta {
    let labels = legacy_labels(source.labels.as_ref());
    ObjectMeta {
        name: source.name.clone(),
        namespace: Some(options.mapi_namespace.clone()),
        labels: (!labels.is_empty()).then_some(labels),
        annotations: source.annotations.clone(),
        ..Default::default()
    }
}

/// Convert a core machine and its AWS machine into a legacy machine. The decoded provider
/// configuration is returned as the template.
///
/// # Errors
/// Returns every field of the structured objects that the legacy schema cannot express.
pub fn convert_machine(
    machine: &capi::Machine,
    aws_machine: &AWSMachine,
    options: &ConversionOptions,
) -> ConversionResult<legacy::Machine, AWSMachineProviderConfig> {
    debug!("converting machine {:?} back", machine.metadata.name);
    let mut report = Report::new();
    check_infrastructure_kind(
        &machine.spec,
        capa::AWS_MACHINE_KIND,
        &Path::new(&["spec"]),
        &mut report,
    );
    let (config, provider_spec) = provider_spec(
        &aws_machine.spec,
        &machine.spec,
        &Path::new(&["spec"]),
        &mut report,
    );
    let legacy = legacy::Machine {
        metadata: object_meta(&machine.metadata, options),
        spec: legacy::MachineSpec {
            metadata: None,
            provider_spec,
            provider_id: machine
                .spec
                .provider_id
                .clone()
                .or_else(|| aws_machine.spec.provider_id.clone()),
            taints: Vec::new(),
        },
    };
    report.finish(legacy, config)
}

/// Convert a core machine set and its AWS machine template into a legacy machine set.
///
/// # Errors
/// See [`convert_machine`].
pub fn convert_machine_set(
    machine_set: &capi::MachineSet,
    template: &AWSMachineTemplate,
    options: &ConversionOptions,
) -> ConversionResult<legacy::MachineSet, AWSMachineProviderConfig> {
    debug!("converting machine set {:?} back", machine_set.metadata.name);
    let mut report = Report::new();
    let core_template = &machine_set.spec.template;
    check_infrastructure_kind(
        &core_template.spec,
        capa::AWS_MACHINE_TEMPLATE_KIND,
        &Path::new(&["spec", "template", "spec"]),
        &mut report,
    );
    let (config, provider_spec) = provider_spec(
        &template.spec.template.spec,
        &core_template.spec,
        &Path::new(&["spec", "template", "spec"]),
        &mut report,
    );

    let mut selector = machine_set.spec.selector.clone();
    selector.match_labels = selector
        .match_labels
        .as_ref()
        .map(|labels| legacy_labels(Some(labels)))
        .filter(|labels| !labels.is_empty());

    let legacy = legacy::MachineSet {
        metadata: object_meta(&machine_set.metadata, options),
        spec: legacy::MachineSetSpec {
            replicas: machine_set.spec.replicas,
            selector,
            template: legacy::MachineTemplateSpec {
                metadata: Some(legacy::TemplateMeta {
                    labels: legacy_labels(Some(&core_template.metadata.labels)),
                    annotations: core_template.metadata.annotations.clone(),
                }),
                spec: legacy::MachineSpec {
                    metadata: None,
                    provider_spec,
                    provider_id: core_template.spec.provider_id.clone(),
                    taints: Vec::new(),
                },
            },
            delete_policy: machine_set.spec.delete_policy.clone(),
            min_ready_seconds: machine_set.spec.min_ready_seconds,
        },
    };
    report.finish(legacy, config)
}
