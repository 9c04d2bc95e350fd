// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::ops::Bound;

use bolero::{Driver, TypeGenerator};
use k8s_openapi::api::core::v1::ObjectReference;

use crate::bolero::{LegalValue, generate_name};
use crate::metal3::{Metal3Data, Metal3DataSpec};

fn reference(name: String, namespace: &str, kind: &str) -> ObjectReference {
    ObjectReference {
        name: Some(name),
        namespace: Some(namespace.to_owned()),
        kind: Some(kind.to_owned()),
        ..Default::default()
    }
}

/// A `Metal3Data` named after its template and index
impl TypeGenerator for LegalValue<Metal3Data> {
    fn generate<D: Driver>(d: &mut D) -> Option<Self> {
        let namespace = generate_name(d, 6)?;
        let template_len = d.gen_usize(Bound::Included(&1), Bound::Included(&20))?;
        let template_name = generate_name(d, template_len)?;
        let index = i32::from(d.gen_u16(Bound::Included(&0), Bound::Included(&u16::MAX))?);

        // The name may come from the template reference rather than the template object.
        let (template_reference, object_template_name) = if d.produce::<bool>()? {
            (Some(template_name.clone()), generate_name(d, 8)?)
        } else {
            (None, template_name.clone())
        };
        let claim_name = generate_name(d, 12)?;

        let mut data = Metal3Data::new(
            &format!("{template_name}-{index}"),
            Metal3DataSpec {
                index,
                template_reference,
                template: reference(object_template_name, &namespace, "Metal3DataTemplate"),
                claim: reference(claim_name, &namespace, "Metal3DataClaim"),
                meta_data: None,
                network_data: None,
            },
        );
        data.metadata.namespace = Some(namespace);
        Some(LegalValue(data))
    }
}
