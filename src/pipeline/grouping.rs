//! Recipient grouping and address resolution.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::pipeline::types::{RedactedRecord, ReportRow};

/// Party whose reports go to the configured override address.
pub const SENTINEL_PARTY: &str = "A DISTRIBUIR - SUSPENSIVA";

/// Why a group was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The record's own address is empty or whitespace.
    EmptyAddress,
    /// Sentinel party, but no usable override address is configured.
    OverrideAddressUnset,
}

impl SkipReason {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "empty address",
            Self::OverrideAddressUnset => "override address unset",
        }
    }
}

/// Records sharing one (party, address) key, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientGroup {
    /// Responsible party as read from the records.
    pub party: String,
    /// Address as read from the records, before any override.
    pub email: String,
    /// Member records in source order.
    pub records: Vec<RedactedRecord>,
}

impl RecipientGroup {
    pub fn is_sentinel(&self) -> bool {
        self.party == SENTINEL_PARTY
    }

    /// The address to deliver to.
    ///
    /// The sentinel party always resolves to `override_address`, whatever
    /// the records carried. Empty, whitespace-only or absent results are
    /// reported as a skip.
    pub fn effective_address(&self, override_address: Option<&str>) -> Result<String, SkipReason> {
        let (candidate, reason) = if self.is_sentinel() {
            (override_address, SkipReason::OverrideAddressUnset)
        } else {
            (Some(self.email.as_str()), SkipReason::EmptyAddress)
        };

        match candidate {
            Some(address) if !address.trim().is_empty() => Ok(address.to_string()),
            _ => Err(reason),
        }
    }

    /// Rows in the shape the renderer expects.
    pub fn report_rows(&self) -> Vec<ReportRow> {
        self.records.iter().map(RedactedRecord::report_row).collect()
    }
}

/// Partition records by (party, address), keeping first-seen key order
/// and per-key insertion order.
pub fn group_by_recipient(records: Vec<RedactedRecord>) -> Vec<RecipientGroup> {
    info!("Grouping {} record(s) by responsible party", records.len());

    let mut groups: IndexMap<(String, String), Vec<RedactedRecord>> = IndexMap::new();
    for record in records {
        let key = (
            record.record().responsible_party.clone(),
            record.record().responsible_email.clone(),
        );
        groups.entry(key).or_default().push(record);
    }

    debug!(groups = groups.len(), "Grouping complete");

    groups
        .into_iter()
        .map(|((party, email), records)| RecipientGroup {
            party,
            email,
            records,
        })
        .collect()
}
