// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Admission checks for the Metal3 data and IP address management resources.
//!
//! Every resource family implements [`Validator`] and [`Defaulter`]. A check never stops at the
//! first violation: all of them are collected and returned as one [`field::Invalid`] error
//! naming the rejected object.

#![deny(clippy::all, clippy::pedantic)]

pub mod ipam;
pub mod metal3;
mod references;

use field::{ErrorList, GroupKind, Invalid};
use kube::{Resource, ResourceExt};
use tracing::debug;

/// Create, update and delete checks of a resource family
pub trait Validator: Resource<DynamicType = ()> + Sized {
    /// # Errors
    /// Returns every violation found in the new object.
    fn validate_create(&self) -> Result<(), Invalid>;

    /// # Errors
    /// Returns every violation found in `self`, the candidate replacing `old`.
    fn validate_update(&self, old: &Self) -> Result<(), Invalid>;

    /// Deleting is always allowed.
    ///
    /// # Errors
    /// None of the families rejects a deletion.
    fn validate_delete(&self) -> Result<(), Invalid> {
        Ok(())
    }
}

/// Default-value injection. None of the families sets defaults.
pub trait Defaulter {
    fn apply_defaults(&mut self) {}
}

/// Group and kind of `K`
#[must_use]
pub fn group_kind<K: Resource<DynamicType = ()>>() -> GroupKind {
    GroupKind::new(&K::group(&()), &K::kind(&()))
}

/// Turn the collected errors into the result of a check on `object`
pub(crate) fn verdict<K: Resource<DynamicType = ()>>(
    object: &K,
    operation: &str,
    errors: ErrorList,
) -> Result<(), Invalid> {
    let kind = group_kind::<K>();
    let name = object.name_any();
    if errors.is_empty() {
        debug!("{operation} of {kind} {name:?} accepted");
    } else {
        debug!(
            "{operation} of {kind} {name:?} rejected with {} error(s)",
            errors.len()
        );
    }
    errors.into_invalid(kind, &name)
}

#[cfg(test)]
mod test {
    use super::*;
    use k8s_types::ipam::{IPAddress, IPClaim, IPPool};
    use k8s_types::metal3::{Metal3Data, Metal3DataClaim, Metal3DataTemplate};

    fn check_contract<T>()
    where
        T: Validator + Defaulter + Default + Clone,
    {
        let mut object = T::default();
        object.apply_defaults();
        assert!(object.validate_delete().is_ok());
        assert!(object.validate_update(&object.clone()).is_ok());
        // the verdict of a create check depends on the family, it just must not panic
        let _ = object.validate_create();
    }

    #[test]
    fn test_every_family_implements_the_contract() {
        check_contract::<Metal3Data>();
        check_contract::<Metal3DataTemplate>();
        check_contract::<Metal3DataClaim>();
        check_contract::<IPPool>();
        check_contract::<IPClaim>();
        check_contract::<IPAddress>();
    }

    #[test]
    fn test_group_kind() {
        assert_eq!(
            group_kind::<IPPool>().to_string(),
            "IPPool.ipam.metal3.io"
        );
        assert_eq!(
            group_kind::<Metal3Data>().to_string(),
            "Metal3Data.infrastructure.cluster.x-k8s.io"
        );
    }
}
