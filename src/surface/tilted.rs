//! Tilted curation — density rises toward the most recent ingests
//!
//! Sites split into `levels` rows of `width`. Ingest `t` lands on the row
//! given by the trailing zeros of `t + 1` and cycles within it, so low rows
//! churn fast and the top row keeps a sparse long tail.

use crate::policy::bit_length;

fn dimensions(capacity: u64) -> (u64, u64) {
    let s = bit_length(capacity) - 1;
    let levels = 1u64 << ((s + 1) / 2);
    (levels, capacity / levels)
}

pub(crate) fn assign_storage_site(capacity: u64, time: u64) -> Option<u64> {
    let (levels, width) = dimensions(capacity);
    let top = levels - 1;
    let level = u64::from((time + 1).trailing_zeros()).min(top);
    let index = if level < top {
        (time + 1 - (1 << level)) >> (level + 1)
    } else {
        ((time + 1) >> top) - 1
    };
    Some(level * width + index % width)
}

pub(crate) fn lookup_ingest_times(capacity: u64, num_ingests: u64) -> Vec<Option<u64>> {
    let (levels, width) = dimensions(capacity);
    let top = levels - 1;
    let mut sites = vec![None; capacity as usize];
    for level in 0..levels {
        let count = if level < top {
            (num_ingests + (1 << level)) >> (level + 1)
        } else {
            num_ingests >> top
        };
        for j in 0..width.min(count) {
            let index = count - 1 - ((count - 1 - j) % width);
            let time = if level < top {
                (1 << level) * (2 * index + 1) - 1
            } else {
                (1 << top) * (index + 1) - 1
            };
            sites[(level * width + j) as usize] = Some(time);
        }
    }
    sites
}
