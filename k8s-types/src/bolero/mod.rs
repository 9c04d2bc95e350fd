// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `bolero` generators for legal values of the resource types

pub mod ipam;
pub mod legacy;
pub mod metal3;

use std::ops::Bound;

use bolero::Driver;

/// A type on which implement `bolero::TypeGenerator` for legal values of `T`
///
/// Generally, `bolero` type generators should generate all possible values of `T` so that it is possible to test validation logic, etc.
/// But often it is desirable to generate only legal values.
/// Instead of having a custom named `bolero::ValueGenerator` struct, it is easier to implement `bolero::TypeGenerator` for `LegalValue<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct LegalValue<T>(T);

impl<T> AsRef<T> for LegalValue<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

/// Generate a DNS-label-like name of `len` characters
pub(crate) fn generate_name<D: Driver>(d: &mut D, len: usize) -> Option<String> {
    const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut result = String::with_capacity(len);
    let index = d.gen_usize(Bound::Included(&0), Bound::Excluded(&FIRST.len()))?;
    result.push(FIRST[index] as char);
    for _ in 1..len {
        let index = d.gen_usize(Bound::Included(&0), Bound::Excluded(&CHARS.len()))?;
        result.push(CHARS[index] as char);
    }
    Some(result)
}

/// Generate a lowercase hex string of `len` digits, as used in AWS resource ids
pub(crate) fn generate_hex<D: Driver>(d: &mut D, len: usize) -> Option<String> {
    const CHARS: &[u8] = b"0123456789abcdef";
    let mut result = String::with_capacity(len);
    for _ in 0..len {
        let index = d.gen_usize(Bound::Included(&0), Bound::Excluded(&CHARS.len()))?;
        result.push(CHARS[index] as char);
    }
    Some(result)
}
