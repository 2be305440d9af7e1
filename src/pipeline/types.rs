//! Shared types for the filter-and-group pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Record ──────────────────────────────────────────────────────────

/// One row of the source report.
///
/// Text cells that were empty in the source are `""`. The clarification
/// date is `None` whenever the cell was blank or not a `dd/mm/YYYY` date.
/// Stages never mutate a record; they build new values from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Instrument identifier (`Instrumento`).
    pub instrument_id: String,
    /// Number of adjustments (`Número Ajustes`).
    pub adjustment_count: String,
    /// Work-plan situation (`Situação P.Trabalho`).
    pub work_situation: String,
    /// Amendment situation (`Situação TA`).
    pub ta_situation: String,
    /// Amendment number (`Número TA`).
    pub ta_number: String,
    /// Attachments tab (`Aba Anexos`).
    pub attachment_tab: String,
    /// Clarification date (`Data Esclarecimento`).
    pub clarification_date: Option<NaiveDate>,
    /// Clarification response (`Resposta Esclarecimento`).
    pub clarification_response: String,
    /// Responsible party (`Técnico`).
    pub responsible_party: String,
    /// Responsible party's address (`e-mail do Técnico`).
    pub responsible_email: String,
}

// ── Match evidence ──────────────────────────────────────────────────

/// Which of the three rules fired for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub work_pending: bool,
    pub ta_active: bool,
    pub cleared_yes: bool,
}

impl MatchEvidence {
    /// A record is matched when at least one rule fired.
    pub fn is_match(&self) -> bool {
        self.work_pending || self.ta_active || self.cleared_yes
    }
}

// ── Redacted record ─────────────────────────────────────────────────

/// A matched record with the evidence fields of non-firing rules blanked.
///
/// Only `pipeline::redact::redact` builds these, so every non-empty
/// evidence field is guaranteed to be the verbatim source value of a rule
/// that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedRecord {
    record: Record,
}

impl RedactedRecord {
    pub(crate) fn new(record: Record) -> Self {
        Self { record }
    }

    /// The redacted field values.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// True if any evidence field survived redaction.
    ///
    /// Pass-through fields (party, address, instrument, ...) are not considered.
    pub fn has_evidence(&self) -> bool {
        !(self.record.work_situation.is_empty()
            && self.record.ta_situation.is_empty()
            && self.record.clarification_response.is_empty())
    }

    /// Project onto the columns the report renderer shows.
    pub fn report_row(&self) -> ReportRow {
        ReportRow {
            responsible_party: self.record.responsible_party.clone(),
            instrument_id: self.record.instrument_id.clone(),
            work_situation: self.record.work_situation.clone(),
            ta_situation: self.record.ta_situation.clone(),
            clarification_response: self.record.clarification_response.clone(),
            attachment_tab: self.record.attachment_tab.clone(),
        }
    }
}

// ── Report row ──────────────────────────────────────────────────────

/// Row shape consumed by the report renderer, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub responsible_party: String,
    pub instrument_id: String,
    pub work_situation: String,
    pub ta_situation: String,
    pub clarification_response: String,
    pub attachment_tab: String,
}

impl ReportRow {
    /// Cell values in display order.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.responsible_party,
            &self.instrument_id,
            &self.work_situation,
            &self.ta_situation,
            &self.clarification_response,
            &self.attachment_tab,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_matches_when_any_flag_set() {
        assert!(!MatchEvidence::default().is_match());
        assert!(
            MatchEvidence {
                cleared_yes: true,
                ..Default::default()
            }
            .is_match()
        );
        assert!(
            MatchEvidence {
                ta_active: true,
                ..Default::default()
            }
            .is_match()
        );
    }

    #[test]
    fn has_evidence_ignores_pass_through_fields() {
        let redacted = RedactedRecord::new(Record {
            instrument_id: "900100".into(),
            responsible_party: "Ana".into(),
            responsible_email: "ana@example.com".into(),
            attachment_tab: "Sim".into(),
            ..Default::default()
        });
        assert!(!redacted.has_evidence());
    }

    #[test]
    fn report_row_column_order() {
        let redacted = RedactedRecord::new(Record {
            instrument_id: "900100".into(),
            ta_situation: "Cadastrada".into(),
            attachment_tab: "Anexos".into(),
            responsible_party: "Ana".into(),
            ..Default::default()
        });
        let row = redacted.report_row();
        assert_eq!(row.cells(), ["Ana", "900100", "", "Cadastrada", "", "Anexos"]);
    }
}
