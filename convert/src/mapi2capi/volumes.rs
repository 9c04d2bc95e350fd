// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use field::Path;
use k8s_types::capa::Volume;
use k8s_types::legacy::{BlockDeviceMappingSpec, EBSBlockDeviceSpec};

use crate::errors::{ConversionFault, Report};

/// Split block device mappings into the root volume and the additional volumes.
///
/// A mapping without a device name describes the root volume. Only EBS-backed mappings can be
/// expressed: every other mapping is reported as [`ConversionFault::UnsupportedVolumeMapping`].
pub(crate) fn convert_block_devices(
    mappings: &[BlockDeviceMappingSpec],
    path: &Path,
    report: &mut Report,
) -> (Option<Volume>, Vec<Volume>) {
    let mut root = None;
    let mut non_root = Vec::new();
    for (index, mapping) in mappings.iter().enumerate() {
        let path = path.index(index);
        let Some(ebs) = &mapping.ebs else {
            report.error(&path, ConversionFault::UnsupportedVolumeMapping);
            continue;
        };
        let Some(volume) = convert_ebs(ebs, &path.child("ebs"), report) else {
            continue;
        };
        match &mapping.device_name {
            None => {
                if root.is_some() {
                    report.warn(&path, "more than one root volume, the last one wins");
                }
                root = Some(volume);
            }
            Some(device_name) => non_root.push(Volume {
                device_name: device_name.clone(),
                ..volume
            }),
        }
    }
    (root, non_root)
}

fn convert_ebs(ebs: &EBSBlockDeviceSpec, path: &Path, report: &mut Report) -> Option<Volume> {
    if ebs.delete_on_termination == Some(false) {
        report.warn(
            &path.child("deleteOnTermination"),
            "volumes are always deleted on termination",
        );
    }
    let kms_key = &ebs.kms_key;
    if kms_key.filters.as_ref().is_some_and(|f| !f.is_empty()) {
        report.error(
            &path.child("kmsKey").child("filters"),
            ConversionFault::NotSupported("KMS key filters"),
        );
        return None;
    }
    let encryption_key = kms_key
        .id
        .clone()
        .or_else(|| kms_key.arn.clone())
        .unwrap_or_default();

    Some(Volume {
        device_name: String::new(),
        size: ebs.volume_size.unwrap_or_default(),
        r#type: ebs.volume_type.clone().unwrap_or_default(),
        iops: ebs.iops.unwrap_or_default(),
        throughput: ebs.throughput,
        encrypted: ebs.encrypted,
        encryption_key,
    })
}
