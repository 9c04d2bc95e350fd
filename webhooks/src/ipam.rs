// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Checks of the IP address management family

use std::net::IpAddr;

use field::{ErrorList, FieldError, Invalid, Path};
use ipnet::IpNet;
use k8s_types::ipam::{IPAddress, IPClaim, IPPool, Pool};
use tracing::trace;

use crate::references::{check_reference_unchanged, check_unchanged};
use crate::{Defaulter, Validator, verdict};

const NOT_AN_ADDRESS: &str = "is not a valid IP address";

/// Whether `address` falls within `pool`. Every bound the pool sets must admit the address.
///
/// Returns `None` if a bound of the pool cannot be parsed, or the pool sets no bound at all.
fn pool_contains(pool: &Pool, address: IpAddr) -> Option<bool> {
    if pool.start.is_none() && pool.end.is_none() && pool.subnet.is_none() {
        return None;
    }
    let same_family = |bound: IpAddr| bound.is_ipv4() == address.is_ipv4();
    let mut contains = true;
    if let Some(start) = &pool.start {
        let start: IpAddr = start.parse().ok()?;
        contains &= same_family(start) && start <= address;
    }
    if let Some(end) = &pool.end {
        let end: IpAddr = end.parse().ok()?;
        contains &= same_family(end) && address <= end;
    }
    if let Some(subnet) = &pool.subnet {
        let subnet: IpNet = subnet.parse().ok()?;
        contains &= subnet.contains(&address);
    }
    Some(contains)
}

/// Whether any pool holds `address`. Pools are tried in order and the first match wins; a pool
/// with malformed bounds is skipped, it is reported by the range checks.
#[must_use]
pub fn address_in_pools(pools: &[Pool], address: IpAddr) -> bool {
    pools.iter().enumerate().any(|(index, pool)| match pool_contains(pool, address) {
        Some(contains) => contains,
        None => {
            trace!("skipping pool {index} while locating {address}");
            false
        }
    })
}

fn parse_address(value: &str, path: &Path, errors: &mut ErrorList) -> Option<IpAddr> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        errors.push(FieldError::invalid(path, value, NOT_AN_ADDRESS));
    }
    parsed
}

/// Every range must be well formed: addresses of one family with `start <= end`, and a subnet
/// in CIDR notation.
fn check_ranges(pool: &IPPool, errors: &mut ErrorList) {
    let pools_path = Path::new(&["spec", "pools"]);
    for (index, range) in pool.spec.pools.iter().enumerate() {
        let path = pools_path.index(index);
        let start = range
            .start
            .as_deref()
            .and_then(|start| parse_address(start, &path.child("start"), errors));
        let end = range
            .end
            .as_deref()
            .and_then(|end| parse_address(end, &path.child("end"), errors));
        if let (Some(start), Some(end)) = (start, end) {
            if start.is_ipv4() != end.is_ipv4() {
                errors.push(FieldError::invalid(
                    &path.child("end"),
                    &end,
                    "must be of the same IP family as start",
                ));
            } else if end < start {
                errors.push(FieldError::invalid(
                    &path.child("end"),
                    &end,
                    "must not be lower than start",
                ));
            }
        }
        if let Some(subnet) = &range.subnet {
            if subnet.parse::<IpNet>().is_err() {
                errors.push(FieldError::invalid(
                    &path.child("subnet"),
                    subnet,
                    "is not a valid CIDR",
                ));
            }
        }
    }

    let pre_allocations = Path::new(&["spec", "preAllocations"]);
    for (claim, address) in &pool.spec.pre_allocations {
        parse_address(address, &pre_allocations.key(claim), errors);
    }
}

/// Every pre-allocated address, and every address in use according to `old`, must remain inside
/// the pools of `new`. Unparsable addresses are left to the range checks.
fn check_bounds(new: &IPPool, old: &IPPool, errors: &mut ErrorList) {
    let pools = &new.spec.pools;
    let pre_allocations = Path::new(&["spec", "preAllocations"]);
    for (claim, address) in &new.spec.pre_allocations {
        let Ok(parsed) = address.parse() else {
            continue;
        };
        if !address_in_pools(pools, parsed) {
            errors.push(FieldError::invalid(
                &pre_allocations.key(claim),
                address,
                "pre-allocated address is out of bounds of the pools given",
            ));
        }
    }

    let in_use = old.status.iter().flat_map(|status| &status.allocations);
    for (allocation, address) in in_use {
        let Ok(parsed) = address.parse() else {
            continue;
        };
        if !address_in_pools(pools, parsed) {
            errors.push(FieldError::invalid(
                &Path::new(&["spec", "pools"]),
                address,
                format!("address in use by {allocation} is out of bounds of the pools given"),
            ));
        }
    }
}

impl Validator for IPPool {
    fn validate_create(&self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_ranges(self, &mut errors);
        verdict(self, "create", errors)
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_unchanged(
            &old.spec.name_prefix,
            &self.spec.name_prefix,
            &Path::new(&["spec", "namePrefix"]),
            &mut errors,
        );
        check_ranges(self, &mut errors);
        check_bounds(self, old, &mut errors);
        verdict(self, "update", errors)
    }
}

impl Defaulter for IPPool {}

impl Validator for IPClaim {
    fn validate_create(&self) -> Result<(), Invalid> {
        verdict(self, "create", ErrorList::new())
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        check_reference_unchanged(
            &old.spec.pool,
            &self.spec.pool,
            &Path::new(&["spec", "pool"]),
            &mut errors,
        );
        verdict(self, "update", errors)
    }
}

impl Defaulter for IPClaim {}

impl Validator for IPAddress {
    fn validate_create(&self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        let spec = Path::new(&["spec"]);
        for (field, reference) in [("pool", &self.spec.pool), ("claim", &self.spec.claim)] {
            if reference.name.as_deref().unwrap_or_default().is_empty() {
                errors.push(FieldError::required(
                    &spec.child(field).child("name"),
                    "must be set",
                ));
            }
        }
        if self.spec.address.is_empty() {
            errors.push(FieldError::required(&spec.child("address"), "must be set"));
        } else {
            parse_address(&self.spec.address, &spec.child("address"), &mut errors);
        }
        verdict(self, "create", errors)
    }

    fn validate_update(&self, old: &Self) -> Result<(), Invalid> {
        let mut errors = ErrorList::new();
        let spec = Path::new(&["spec"]);
        check_unchanged(
            &old.spec.address,
            &self.spec.address,
            &spec.child("address"),
            &mut errors,
        );
        check_reference_unchanged(
            &old.spec.pool,
            &self.spec.pool,
            &spec.child("pool"),
            &mut errors,
        );
        check_reference_unchanged(
            &old.spec.claim,
            &self.spec.claim,
            &spec.child("claim"),
            &mut errors,
        );
        verdict(self, "update", errors)
    }
}

impl Defaulter for IPAddress {}
