//! Hybrid curation — steady on even ingests, tilted on odd, half the sites each

use super::{steady, tilted};

pub(crate) fn assign_storage_site(capacity: u64, time: u64) -> Option<u64> {
    let half = capacity / 2;
    if time % 2 == 0 {
        steady::assign_storage_site(half, time / 2)
    } else {
        tilted::assign_storage_site(half, time / 2).map(|site| half + site)
    }
}

pub(crate) fn lookup_ingest_times(capacity: u64, num_ingests: u64) -> Vec<Option<u64>> {
    let half = capacity / 2;
    let even = steady::lookup_ingest_times(half, num_ingests.div_ceil(2))
        .into_iter()
        .map(|time| time.map(|t| 2 * t));
    let odd = tilted::lookup_ingest_times(half, num_ingests / 2)
        .into_iter()
        .map(|time| time.map(|t| 2 * t + 1));
    even.chain(odd).collect()
}
