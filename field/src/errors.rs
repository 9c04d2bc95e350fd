// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::Path;

/// The class of a [`FieldError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The value is syntactically or semantically wrong
    Invalid,
    /// A mandatory value is missing
    Required,
}

impl ErrorType {
    /// The reason string Kubernetes uses for this class of error
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            ErrorType::Invalid => "Invalid value",
            ErrorType::Required => "Required value",
        }
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Render an offending value the way it would appear in the object, i.e. as JSON.
fn render<V: Serialize + ?Sized>(value: &V) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
}

/// A single violation, attached to the path of the field that caused it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ErrorType,
    pub field: String,
    pub bad_value: Option<String>,
    pub detail: String,
}

impl FieldError {
    fn new(kind: ErrorType, path: &Path, bad_value: Option<String>, detail: String) -> Self {
        Self {
            kind,
            field: path.to_string(),
            bad_value,
            detail,
        }
    }

    #[must_use]
    pub fn invalid<V: Serialize + ?Sized>(
        path: &Path,
        value: &V,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorType::Invalid,
            path,
            Some(render(value)),
            detail.into(),
        )
    }

    #[must_use]
    pub fn required(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, None, detail.into())
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)?;
        if let Some(value) = &self.bad_value {
            write!(f, ": {value}")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// One error carrying an ordered, non-empty list of independent errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregate<E>(Vec<E>);

impl<E> Aggregate<E> {
    /// Aggregate `errors`. Returns `None` if there is nothing to report.
    #[must_use]
    pub fn new(errors: Vec<E>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[E] {
        &self.0
    }

    #[must_use]
    #[allow(clippy::len_without_is_empty)] // never empty
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<E> From<E> for Aggregate<E> {
    fn from(error: E) -> Self {
        Self(vec![error])
    }
}

impl<E> Extend<E> for Aggregate<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<E: Display> Display for Aggregate<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{single}");
        }
        f.write_str("[")?;
        for (pos, error) in self.0.iter().enumerate() {
            if pos > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{error}")?;
        }
        f.write_str("]")
    }
}

impl<E: Display + std::fmt::Debug> std::error::Error for Aggregate<E> {}

/// Group and kind of a resource, used to name the object an [`Invalid`] error refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    #[must_use]
    pub fn new(group: &str, kind: &str) -> Self {
        Self {
            group: group.to_owned(),
            kind: kind.to_owned(),
        }
    }
}

impl Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// The rejection of an object: every field violation found, for one named object.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} {name:?} is invalid: {errors}")]
pub struct Invalid {
    pub kind: GroupKind,
    pub name: String,
    pub errors: Aggregate<FieldError>,
}

/// An ordered list of [`FieldError`]s, built up while checking an object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Succeed if the list is empty, otherwise fail with all the errors in it.
    ///
    /// # Errors
    ///
    /// Returns an [`Aggregate`] holding every error in the list if it is not empty.
    pub fn into_result(self) -> Result<(), Aggregate<FieldError>> {
        Aggregate::new(self.0).map_or(Ok(()), Err)
    }

    /// Succeed if the list is empty, otherwise reject the object `name` of kind `kind`.
    ///
    /// # Errors
    ///
    /// Returns an [`Invalid`] error holding every error in the list if it is not empty.
    pub fn into_invalid(self, kind: GroupKind, name: &str) -> Result<(), Invalid> {
        self.into_result().map_err(|errors| Invalid {
            kind,
            name: name.to_owned(),
            errors,
        })
    }
}

impl Extend<FieldError> for ErrorList {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<FieldError> for ErrorList {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
