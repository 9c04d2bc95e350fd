// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::ops::Bound;

use bolero::{Driver, TypeGenerator};

use crate::bolero::{LegalValue, generate_name};
use crate::ipam::{IPPool, IPPoolSpec, IPPoolStatus, Pool};

/// Span of addresses covered by a generated pool: first address and number of extra addresses
struct Span {
    base: u32,
    extra: u32,
}

fn generate_pool<D: Driver>(d: &mut D) -> Option<(Pool, Span)> {
    let start = d.gen_u32(
        Bound::Included(&0x0a00_0000_u32),
        Bound::Included(&0xdf00_0000_u32),
    )?;
    if d.produce::<bool>()? {
        let extra = d.gen_u32(Bound::Included(&0), Bound::Included(&4096))?;
        let pool = Pool {
            start: Some(Ipv4Addr::from(start).to_string()),
            end: Some(Ipv4Addr::from(start + extra).to_string()),
            prefix: Some(16),
            ..Default::default()
        };
        Some((pool, Span { base: start, extra }))
    } else {
        let base = start & 0xffff_ff00;
        let pool = Pool {
            subnet: Some(format!("{}/24", Ipv4Addr::from(base))),
            ..Default::default()
        };
        Some((pool, Span { base, extra: 255 }))
    }
}

fn generate_addresses<D: Driver>(
    d: &mut D,
    spans: &[Span],
    key_prefix: &str,
) -> Option<BTreeMap<String, String>> {
    let count = d.gen_usize(Bound::Included(&0), Bound::Included(&8))?;
    let mut addresses = BTreeMap::new();
    for n in 0..count {
        let span = &spans[d.gen_usize(Bound::Included(&0), Bound::Excluded(&spans.len()))?];
        let offset = d.gen_u32(Bound::Included(&0), Bound::Included(&span.extra))?;
        addresses.insert(
            format!("{key_prefix}-{n}"),
            Ipv4Addr::from(span.base + offset).to_string(),
        );
    }
    Some(addresses)
}

/// An `IPPool` whose pre-allocations and allocations all fall within its ranges
impl TypeGenerator for LegalValue<IPPool> {
    fn generate<D: Driver>(d: &mut D) -> Option<Self> {
        let name = generate_name(d, 10)?;
        let num_pools = d.gen_usize(Bound::Included(&1), Bound::Included(&4))?;
        let mut pools = Vec::with_capacity(num_pools);
        let mut spans = Vec::with_capacity(num_pools);
        for _ in 0..num_pools {
            let (pool, span) = generate_pool(d)?;
            pools.push(pool);
            spans.push(span);
        }
        let pre_allocations = generate_addresses(d, &spans, "claim")?;
        let allocations = generate_addresses(d, &spans, &name)?;

        let mut pool = IPPool::new(
            &name,
            IPPoolSpec {
                pools,
                pre_allocations,
                name_prefix: name.clone(),
                ..Default::default()
            },
        );
        pool.status = Some(IPPoolStatus { allocations });
        Some(LegalValue(pool))
    }
}
