//! Records — JSON-ready dictionaries for columns and populations
//!
//! Each record names its policy and bit width once, then carries every
//! column's differentiae as base64 packed bytes. Ranks are written only when
//! the policy cannot recompute them.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::packet::{decode_payload, encode_payload};
use super::SerializationError;
use crate::genome::{ColumnConfig, HereditaryStratigraphicColumn, Stratum};
use crate::policy::StratumRetentionPolicy;
use crate::specimen::Specimen;

/// Version stamped into records written by this crate
pub const HSTRAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fields shared by every column in a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub policy: String,
    pub differentia_bit_width: u32,
    pub hstrat_version: String,
    pub omits_num_padding_bits_header: bool,
}

/// One column's payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    /// Base64 of the packed differentiae, behind a padding byte unless omitted
    pub differentiae: String,
    pub num_strata_deposited: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratum_deposition_ranks: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratum_annotations: Option<Vec<Option<serde_json::Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    #[serde(flatten)]
    pub header: RecordHeader,
    #[serde(flatten)]
    pub column: ColumnEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(flatten)]
    pub header: RecordHeader,
    pub columns: Vec<ColumnEntry>,
}

impl ColumnRecord {
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl PopulationRecord {
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn header_for(policy: &StratumRetentionPolicy, differentia_bit_width: u32) -> RecordHeader {
    RecordHeader {
        policy: policy.to_string(),
        differentia_bit_width,
        hstrat_version: HSTRAT_VERSION.to_string(),
        omits_num_padding_bits_header: differentia_bit_width % 8 == 0 || policy.has_rank_scry(),
    }
}

fn entry_for(
    column: &HereditaryStratigraphicColumn,
    omits_num_padding_bits_header: bool,
) -> ColumnEntry {
    let payload = encode_payload(column, !omits_num_padding_bits_header);
    let stratum_deposition_ranks =
        (!column.policy().has_rank_scry()).then(|| column.iter_retained_ranks().collect());
    let stratum_annotations = column
        .iter_retained_strata()
        .any(|s| s.annotation.is_some())
        .then(|| column.iter_retained_strata().map(|s| s.annotation.clone()).collect());
    ColumnEntry {
        differentiae: STANDARD.encode(payload),
        num_strata_deposited: column.num_strata_deposited(),
        stratum_deposition_ranks,
        stratum_annotations,
    }
}

/// Warn once per foreign version seen in this process
fn note_version(version: &str) {
    static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    if version == HSTRAT_VERSION {
        return;
    }
    let first_sighting = SEEN
        .get_or_init(Default::default)
        .lock()
        .map(|mut seen| seen.insert(version.to_string()))
        .unwrap_or(true);
    if first_sighting {
        warn!(
            "Reading records written by hstrat {} with hstrat {}; proceeding best-effort",
            version, HSTRAT_VERSION
        );
    }
}

fn read_header(header: &RecordHeader) -> Result<StratumRetentionPolicy, SerializationError> {
    note_version(&header.hstrat_version);
    Ok(header.policy.parse()?)
}

fn read_entry(
    header: &RecordHeader,
    policy: StratumRetentionPolicy,
    entry: &ColumnEntry,
) -> Result<HereditaryStratigraphicColumn, SerializationError> {
    let payload = STANDARD.decode(&entry.differentiae)?;
    let n = entry.num_strata_deposited;
    let expected = match &entry.stratum_deposition_ranks {
        Some(ranks) => Some(ranks.len()),
        None => policy
            .calc_num_strata_retained_exact(n)
            .and_then(|count| usize::try_from(count).ok()),
    };
    let differentiae = decode_payload(
        &payload,
        header.differentia_bit_width,
        !header.omits_num_padding_bits_header,
        expected,
        &policy,
    )?;
    if let Some(annotations) = &entry.stratum_annotations {
        if annotations.len() != differentiae.len() {
            return Err(SerializationError::Malformed(format!(
                "{} annotations for {} differentiae",
                annotations.len(),
                differentiae.len()
            )));
        }
    }

    let strata = differentiae
        .into_iter()
        .enumerate()
        .map(|(i, differentia)| {
            let stratum = Stratum::new(differentia);
            let stratum = match &entry.stratum_deposition_ranks {
                Some(ranks) => stratum.with_rank(ranks[i]),
                None => stratum,
            };
            match &entry.stratum_annotations {
                Some(annotations) => stratum.with_annotation(annotations[i].clone()),
                None => stratum,
            }
        })
        .collect();
    let config = ColumnConfig {
        always_store_rank_in_stratum: entry.stratum_deposition_ranks.is_some(),
        ..ColumnConfig::new(policy, header.differentia_bit_width)
    };
    Ok(HereditaryStratigraphicColumn::from_retained_strata(config, n, strata)?)
}

pub fn col_to_records(column: &HereditaryStratigraphicColumn) -> ColumnRecord {
    let header = header_for(column.policy(), column.differentia_bit_width());
    let column = entry_for(column, header.omits_num_padding_bits_header);
    ColumnRecord { header, column }
}

pub fn col_from_records(
    record: &ColumnRecord,
) -> Result<HereditaryStratigraphicColumn, SerializationError> {
    let policy = read_header(&record.header)?;
    read_entry(&record.header, policy, &record.column)
}

/// Freeze a column record straight into a specimen
pub fn specimen_from_records(record: &ColumnRecord) -> Result<Specimen, SerializationError> {
    Ok(col_from_records(record)?.to_specimen())
}

/// Serialize a population; every column must share a policy and bit width
pub fn pop_to_records(
    columns: &[HereditaryStratigraphicColumn],
) -> Result<PopulationRecord, SerializationError> {
    let first = columns.first().ok_or_else(|| {
        SerializationError::Malformed("cannot record an empty population".to_string())
    })?;
    let header = header_for(first.policy(), first.differentia_bit_width());
    if let Some((index, _)) = columns.iter().enumerate().find(|(_, c)| {
        c.policy() != first.policy() || c.differentia_bit_width() != first.differentia_bit_width()
    }) {
        return Err(SerializationError::Malformed(format!(
            "column {index} differs in policy or bit width from column 0"
        )));
    }
    let columns: Vec<ColumnEntry> = columns
        .iter()
        .map(|c| entry_for(c, header.omits_num_padding_bits_header))
        .collect();
    debug!("Recorded population of {} columns under {}", columns.len(), header.policy);
    Ok(PopulationRecord { header, columns })
}

pub fn pop_from_records(
    record: &PopulationRecord,
) -> Result<Vec<HereditaryStratigraphicColumn>, SerializationError> {
    let policy = read_header(&record.header)?;
    record
        .columns
        .iter()
        .map(|entry| read_entry(&record.header, policy, entry))
        .collect()
}
