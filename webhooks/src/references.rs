// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use field::{ErrorList, FieldError, Path};
use k8s_openapi::api::core::v1::ObjectReference;

const IMMUTABLE: &str = "cannot be modified";

/// Report a reference that now points elsewhere. Name, namespace and kind are compared in that
/// order and only the first difference is reported.
pub(crate) fn check_reference_unchanged(
    old: &ObjectReference,
    new: &ObjectReference,
    path: &Path,
    errors: &mut ErrorList,
) {
    let dimensions = [
        ("name", &old.name, &new.name),
        ("namespace", &old.namespace, &new.namespace),
        ("kind", &old.kind, &new.kind),
    ];
    let changed = dimensions
        .into_iter()
        .find(|(_, before, after)| before != after);
    if let Some((dimension, _, value)) = changed {
        errors.push(FieldError::invalid(&path.child(dimension), value, IMMUTABLE));
    }
}

/// Report any change of a value that is fixed at creation
pub(crate) fn check_unchanged<T: PartialEq + serde::Serialize>(
    old: &T,
    new: &T,
    path: &Path,
    errors: &mut ErrorList,
) {
    if old != new {
        errors.push(FieldError::invalid(path, new, IMMUTABLE));
    }
}
