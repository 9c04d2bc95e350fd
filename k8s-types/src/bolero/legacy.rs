// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::ops::Bound;

use bolero::{Driver, TypeGenerator};

use crate::bolero::{LegalValue, generate_hex, generate_name};
use crate::legacy::{
    AWSMachineProviderConfig, AWSResourceReference, BlockDeviceMappingSpec, EBSBlockDeviceSpec,
    METADATA_AUTHENTICATION_OPTIONAL, METADATA_AUTHENTICATION_REQUIRED, MetadataServiceOptions,
    PROVIDER_CONFIG_API_VERSION, PROVIDER_CONFIG_KIND, Placement, SecretRef, TagSpecification,
};

const VOLUME_TYPES: [&str; 4] = ["gp2", "gp3", "io1", "io2"];
const INSTANCE_TYPES: [&str; 4] = ["m6i.xlarge", "m6i.2xlarge", "c5.large", "r5.4xlarge"];
const ZONES: [&str; 3] = ["us-east-1a", "us-west-2b", "eu-central-1c"];

fn pick<D: Driver>(d: &mut D, choices: &[&str]) -> Option<String> {
    let index = d.gen_usize(Bound::Included(&0), Bound::Excluded(&choices.len()))?;
    Some(choices[index].to_owned())
}

fn aws_id<D: Driver>(d: &mut D, prefix: &str) -> Option<AWSResourceReference> {
    Some(AWSResourceReference {
        id: Some(format!("{prefix}-{}", generate_hex(d, 17)?)),
        ..Default::default()
    })
}

fn generate_ebs<D: Driver>(d: &mut D) -> Option<EBSBlockDeviceSpec> {
    Some(EBSBlockDeviceSpec {
        delete_on_termination: None,
        encrypted: Some(d.produce::<bool>()?),
        kms_key: AWSResourceReference::default(),
        iops: Some(i64::from(d.gen_u16(Bound::Included(&0), Bound::Included(&16000))?)),
        throughput: None,
        volume_size: Some(i64::from(d.gen_u16(Bound::Included(&8), Bound::Included(&16384))?)),
        volume_type: Some(pick(d, &VOLUME_TYPES)?),
    })
}

/// A provider configuration which converts without errors: an AMI referenced by id, EBS-only
/// block devices with at most one root volume and unique device names.
impl TypeGenerator for LegalValue<AWSMachineProviderConfig> {
    fn generate<D: Driver>(d: &mut D) -> Option<Self> {
        let mut block_devices = Vec::new();
        if d.produce::<bool>()? {
            block_devices.push(BlockDeviceMappingSpec {
                ebs: Some(generate_ebs(d)?),
                ..Default::default()
            });
        }
        let num_extra = d.gen_u8(Bound::Included(&0), Bound::Included(&4))?;
        for n in 0..num_extra {
            block_devices.push(BlockDeviceMappingSpec {
                device_name: Some(format!("/dev/sd{}", char::from(b'b' + n))),
                ebs: Some(generate_ebs(d)?),
                ..Default::default()
            });
        }

        let num_tags = d.gen_usize(Bound::Included(&0), Bound::Included(&6))?;
        let mut tags = Vec::with_capacity(num_tags);
        for _ in 0..num_tags {
            tags.push(TagSpecification {
                name: generate_name(d, 3)?,
                value: generate_name(d, 8)?,
            });
        }

        let num_groups = d.gen_usize(Bound::Included(&0), Bound::Included(&3))?;
        let mut security_groups = Vec::with_capacity(num_groups);
        for _ in 0..num_groups {
            security_groups.push(aws_id(d, "sg")?);
        }

        let authentication = match d.gen_u8(Bound::Included(&0), Bound::Included(&2))? {
            0 => None,
            1 => Some(METADATA_AUTHENTICATION_OPTIONAL.to_owned()),
            _ => Some(METADATA_AUTHENTICATION_REQUIRED.to_owned()),
        };

        Some(LegalValue(AWSMachineProviderConfig {
            api_version: Some(PROVIDER_CONFIG_API_VERSION.to_owned()),
            kind: Some(PROVIDER_CONFIG_KIND.to_owned()),
            ami: aws_id(d, "ami")?,
            instance_type: pick(d, &INSTANCE_TYPES)?,
            tags,
            user_data_secret: Some(SecretRef {
                name: "worker-user-data".to_owned(),
            }),
            security_groups,
            subnet: aws_id(d, "subnet")?,
            placement: Placement {
                region: None,
                availability_zone: Some(pick(d, &ZONES)?),
                tenancy: None,
            },
            block_devices,
            metadata_service_options: MetadataServiceOptions { authentication },
            ..Default::default()
        }))
    }
}
