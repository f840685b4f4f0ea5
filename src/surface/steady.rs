//! Steady curation — evenly spaced ingest times at every depth

use crate::policy::bit_length;

/// Site holding ingest `time` once its stride tier settles
fn site_of(capacity: u64, mut time: u64) -> u64 {
    let s = bit_length(capacity) - 1;
    while time >= capacity {
        let epoch = bit_length(time) - s;
        let base = capacity << (epoch - 1);
        let slot = (time - base) >> epoch;
        time = (2 * slot + 1) << (epoch - 1);
    }
    time
}

pub(crate) fn assign_storage_site(capacity: u64, time: u64) -> Option<u64> {
    if time < capacity {
        return Some(time);
    }
    let epoch = bit_length(time) - (bit_length(capacity) - 1);
    if time % (1 << epoch) != 0 {
        return None;
    }
    Some(site_of(capacity, time))
}

pub(crate) fn lookup_ingest_times(capacity: u64, num_ingests: u64) -> Vec<Option<u64>> {
    let mut sites = vec![None; capacity as usize];
    if num_ingests <= capacity {
        for time in 0..num_ingests {
            sites[time as usize] = Some(time);
        }
        return sites;
    }
    let epoch = bit_length(num_ingests - 1) - (bit_length(capacity) - 1);
    let base = capacity << (epoch - 1);
    let stride = 1u64 << epoch;
    let fresh = (num_ingests - base).div_ceil(stride);
    let survivors = (0..capacity)
        .filter(|k| k % 2 == 0 || k / 2 >= fresh)
        .map(|k| k * (stride / 2));
    let recent = (0..fresh).map(|j| base + j * stride);
    for time in survivors.chain(recent) {
        sites[site_of(capacity, time) as usize] = Some(time);
    }
    sites
}
