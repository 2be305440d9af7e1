//! Field redaction and row compaction.

use tracing::debug;

use crate::pipeline::rules::RuleSet;
use crate::pipeline::types::{MatchEvidence, RedactedRecord, Record};

/// Blank the evidence fields whose rule did not fire.
///
/// Fields of firing rules are copied verbatim (source casing preserved).
/// Everything else passes through unchanged.
pub fn redact(record: &Record, evidence: MatchEvidence) -> RedactedRecord {
    let keep = |fired: bool, value: &str| {
        if fired {
            value.to_string()
        } else {
            String::new()
        }
    };

    RedactedRecord::new(Record {
        work_situation: keep(evidence.work_pending, &record.work_situation),
        ta_situation: keep(evidence.ta_active, &record.ta_situation),
        clarification_response: keep(evidence.cleared_yes, &record.clarification_response),
        ..record.clone()
    })
}

/// Evaluate every record and redact the matched ones, in source order.
///
/// Unmatched records are dropped.
pub fn select(rules: &RuleSet, records: &[Record]) -> Vec<RedactedRecord> {
    records
        .iter()
        .filter_map(|record| {
            let evidence = rules.evaluate(record);
            evidence.is_match().then(|| redact(record, evidence))
        })
        .collect()
}

/// Drop records whose evidence fields are all empty after redaction.
pub fn compact(records: Vec<RedactedRecord>) -> Vec<RedactedRecord> {
    let before = records.len();
    let kept: Vec<RedactedRecord> = records.into_iter().filter(|r| r.has_evidence()).collect();

    if kept.len() < before {
        debug!(dropped = before - kept.len(), "Compacted records without evidence");
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> Record {
        Record {
            instrument_id: "900100".into(),
            adjustment_count: "2".into(),
            work_situation: "Em Análise (aguardando parecer)".into(),
            ta_situation: "Concluída".into(),
            ta_number: "3".into(),
            attachment_tab: "Anexos".into(),
            clarification_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15),
            clarification_response: "Não".into(),
            responsible_party: "Ana".into(),
            responsible_email: "ana@example.com".into(),
        }
    }

    #[test]
    fn redact_keeps_only_fired_fields() {
        let record = full_record();
        let rules = RuleSet::default_rules();
        let redacted = redact(&record, rules.evaluate(&record));
        let out = redacted.record();

        assert_eq!(out.work_situation, "Em Análise (aguardando parecer)");
        assert_eq!(out.ta_situation, "");
        assert_eq!(out.clarification_response, "");
    }

    #[test]
    fn redact_passes_through_other_fields() {
        let record = full_record();
        let redacted = redact(
            &record,
            MatchEvidence {
                work_pending: true,
                ..Default::default()
            },
        );
        let out = redacted.record();

        assert_eq!(out.instrument_id, record.instrument_id);
        assert_eq!(out.adjustment_count, record.adjustment_count);
        assert_eq!(out.ta_number, record.ta_number);
        assert_eq!(out.attachment_tab, record.attachment_tab);
        assert_eq!(out.clarification_date, record.clarification_date);
        assert_eq!(out.responsible_party, record.responsible_party);
        assert_eq!(out.responsible_email, record.responsible_email);
    }

    #[test]
    fn redact_preserves_response_casing() {
        let record = Record {
            clarification_response: "sim".into(),
            ..full_record()
        };
        let redacted = redact(
            &record,
            MatchEvidence {
                cleared_yes: true,
                ..Default::default()
            },
        );
        assert_eq!(redacted.record().clarification_response, "sim");
    }

    #[test]
    fn select_drops_unmatched_and_keeps_order() {
        let rules = RuleSet::default_rules();
        let records = vec![
            Record {
                instrument_id: "1".into(),
                ta_situation: "Cadastrada".into(),
                ..Default::default()
            },
            Record {
                instrument_id: "2".into(),
                ta_situation: "Concluída".into(),
                ..Default::default()
            },
            Record {
                instrument_id: "3".into(),
                clarification_response: "SIM".into(),
                ..Default::default()
            },
        ];

        let selected = select(&rules, &records);
        let ids: Vec<&str> = selected
            .iter()
            .map(|r| r.record().instrument_id.as_str())
            .collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn compact_drops_records_without_evidence() {
        let with_evidence = redact(
            &full_record(),
            MatchEvidence {
                work_pending: true,
                ..Default::default()
            },
        );
        // Rule fired on an empty cell: nothing survives redaction.
        let hollow = redact(
            &Record {
                work_situation: String::new(),
                ..full_record()
            },
            MatchEvidence {
                work_pending: true,
                ..Default::default()
            },
        );

        let kept = compact(vec![hollow, with_evidence.clone()]);
        assert_eq!(kept, vec![with_evidence]);
    }

    #[test]
    fn compact_empty_input() {
        assert!(compact(Vec::new()).is_empty());
    }
}
