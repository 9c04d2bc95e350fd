// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Convert the machine objects found in a YAML stream

use convert::{ConversionOptions, Converted, capi2mapi, mapi2capi};
use k8s_types::capa::{AWSMachine, AWSMachineTemplate};
use k8s_types::config::Infrastructure;
use k8s_types::{capi, legacy};
use kube_core::Resource;
use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info};

use crate::reply::{ConvertReply, DriverError};

/// The objects of a stream, sorted by kind
#[derive(Debug, Default)]
struct Inventory {
    legacy_machines: Vec<legacy::Machine>,
    legacy_machine_sets: Vec<legacy::MachineSet>,
    infrastructures: Vec<Infrastructure>,
    machines: Vec<capi::Machine>,
    machine_sets: Vec<capi::MachineSet>,
    aws_machines: Vec<AWSMachine>,
    aws_machine_templates: Vec<AWSMachineTemplate>,
}

fn is<K: Resource<DynamicType = ()>>(api_version: &str, kind: &str) -> bool {
    let group = api_version.rsplit_once('/').map_or("", |(group, _)| group);
    K::group(&()) == group && K::kind(&()) == kind
}

fn decode<K: DeserializeOwned>(document: Value, into: &mut Vec<K>) -> Result<(), DriverError> {
    let object = serde_json::from_value(document)
        .map_err(|e| DriverError::Deserialize(format!("Failed to decode object: {e}")))?;
    into.push(object);
    Ok(())
}

impl Inventory {
    fn add(&mut self, document: Value) -> Result<(), DriverError> {
        let api_version = document["apiVersion"].as_str().unwrap_or_default().to_string();
        let kind = document["kind"].as_str().unwrap_or_default().to_string();
        debug!("found {kind} of {api_version:?}");
        let (v, k) = (api_version.as_str(), kind.as_str());
        if is::<legacy::Machine>(v, k) {
            decode(document, &mut self.legacy_machines)
        } else if is::<legacy::MachineSet>(v, k) {
            decode(document, &mut self.legacy_machine_sets)
        } else if is::<Infrastructure>(v, k) {
            decode(document, &mut self.infrastructures)
        } else if is::<capi::Machine>(v, k) {
            decode(document, &mut self.machines)
        } else if is::<capi::MachineSet>(v, k) {
            decode(document, &mut self.machine_sets)
        } else if is::<AWSMachine>(v, k) {
            decode(document, &mut self.aws_machines)
        } else if is::<AWSMachineTemplate>(v, k) {
            decode(document, &mut self.aws_machine_templates)
        } else {
            Err(DriverError::Input(format!(
                "unsupported object kind {kind:?} of {api_version:?}"
            )))
        }
    }

    fn primaries(&self) -> usize {
        self.legacy_machines.len()
            + self.legacy_machine_sets.len()
            + self.machines.len()
            + self.machine_sets.len()
    }
}

/// Read every document of a YAML (or JSON) stream. Empty documents are skipped.
fn read_documents(input: &str) -> Result<Vec<Value>, DriverError> {
    let mut documents = Vec::new();
    for document in serde_yaml_ng::Deserializer::from_str(input) {
        let value = Value::deserialize(document)
            .map_err(|e| DriverError::Deserialize(format!("Failed to parse input: {e}")))?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn single<'a, T>(objects: &'a [T], what: &str) -> Result<&'a T, DriverError> {
    match objects {
        [object] => Ok(object),
        [] => Err(DriverError::Input(format!("no {what} found"))),
        _ => Err(DriverError::Input(format!("more than one {what} found"))),
    }
}

fn to_value<T: Serialize>(object: &T) -> Result<Value, DriverError> {
    serde_json::to_value(object)
        .map_err(|e| DriverError::Environment(format!("Failed to encode object: {e}")))
}

fn forward<C: Serialize, T: Serialize>(
    result: Result<Converted<C, T>, convert::Rejected>,
) -> Result<ConvertReply, DriverError> {
    let converted = result.map_err(DriverError::Conversion)?;
    let objects = vec![to_value(&converted.core)?, to_value(&converted.template)?];
    Ok(ConvertReply::success(objects, converted.warnings))
}

fn backward<L: Serialize, T>(
    result: Result<Converted<L, T>, convert::Rejected>,
) -> Result<ConvertReply, DriverError> {
    let converted = result.map_err(DriverError::Conversion)?;
    Ok(ConvertReply::success(
        vec![to_value(&converted.core)?],
        converted.warnings,
    ))
}

fn dispatch(inventory: &Inventory, options: &ConversionOptions) -> Result<ConvertReply, DriverError> {
    if inventory.primaries() != 1 {
        return Err(DriverError::Input(format!(
            "expected exactly one Machine or MachineSet, found {}",
            inventory.primaries()
        )));
    }
    let infrastructure = inventory.infrastructures.first();
    if inventory.infrastructures.len() > 1 {
        return Err(DriverError::Input("more than one Infrastructure found".to_string()));
    }
    if let [machine] = inventory.legacy_machines.as_slice() {
        info!("converting legacy machine {:?}", machine.metadata.name);
        forward(mapi2capi::convert_machine(machine, infrastructure, options))
    } else if let [machine_set] = inventory.legacy_machine_sets.as_slice() {
        info!("converting legacy machine set {:?}", machine_set.metadata.name);
        forward(mapi2capi::convert_machine_set(machine_set, infrastructure, options))
    } else if let [machine] = inventory.machines.as_slice() {
        info!("converting machine {:?}", machine.metadata.name);
        let aws_machine = single(&inventory.aws_machines, "AWSMachine")?;
        backward(capi2mapi::convert_machine(machine, aws_machine, options))
    } else {
        let machine_set = single(&inventory.machine_sets, "MachineSet")?;
        info!("converting machine set {:?}", machine_set.metadata.name);
        let template = single(&inventory.aws_machine_templates, "AWSMachineTemplate")?;
        backward(capi2mapi::convert_machine_set(machine_set, template, options))
    }
}

/// Convert the single machine or machine set of `input`.
///
/// Legacy objects are converted into their structured pair and need the `Infrastructure`
/// descriptor of the cluster. Structured objects are converted back and need their AWS machine or
/// AWS machine template.
#[must_use]
pub fn convert(input: &str, options: &ConversionOptions) -> ConvertReply {
    let run = || -> Result<ConvertReply, DriverError> {
        let mut inventory = Inventory::default();
        for document in read_documents(input)? {
            inventory.add(document)?;
        }
        dispatch(&inventory, options)
    };
    run().unwrap_or_else(ConvertReply::from)
}
