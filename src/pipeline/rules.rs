//! Business rules that decide which report rows need follow-up.
//!
//! Three independent predicates, all evaluated for every record:
//! - work plan awaiting an opinion → `work_pending`
//! - amendment registered or under analysis → `ta_active`
//! - clarification answered "SIM" (any casing) → `cleared_yes`
//!
//! Comparisons are exact string matches against the literals below, except
//! the clarification response which is compared after uppercasing.

use tracing::debug;

use crate::pipeline::types::{MatchEvidence, Record};

/// Work-plan situation that marks a record as pending.
pub const WORK_PENDING_SITUATION: &str = "Em Análise (aguardando parecer)";

/// Amendment situations that mark a record as active.
pub const TA_ACTIVE_SITUATIONS: &[&str] = &["Cadastrada", "Em Análise"];

/// Clarification response (uppercased) that marks a record as cleared.
pub const CLEARED_RESPONSE: &str = "SIM";

/// The literal values each rule compares against.
#[derive(Debug, Clone)]
pub struct RuleSet {
    work_pending_situation: String,
    ta_active_situations: Vec<String>,
    cleared_response: String,
}

impl RuleSet {
    /// The rule literals used by the report.
    pub fn default_rules() -> Self {
        Self {
            work_pending_situation: WORK_PENDING_SITUATION.into(),
            ta_active_situations: TA_ACTIVE_SITUATIONS.iter().map(|s| s.to_string()).collect(),
            cleared_response: CLEARED_RESPONSE.into(),
        }
    }

    /// Build a rule set from custom literals.
    ///
    /// `cleared_response` is stored uppercased so it compares against the
    /// uppercased cell value.
    pub fn new(
        work_pending_situation: &str,
        ta_active_situations: &[&str],
        cleared_response: &str,
    ) -> Self {
        Self {
            work_pending_situation: work_pending_situation.into(),
            ta_active_situations: ta_active_situations.iter().map(|s| s.to_string()).collect(),
            cleared_response: cleared_response.to_uppercase(),
        }
    }

    pub fn work_pending(&self, record: &Record) -> bool {
        record.work_situation == self.work_pending_situation
    }

    pub fn ta_active(&self, record: &Record) -> bool {
        self.ta_active_situations
            .iter()
            .any(|s| *s == record.ta_situation)
    }

    /// Empty responses never match, whatever the configured literal.
    pub fn cleared_yes(&self, record: &Record) -> bool {
        let response = &record.clarification_response;
        !response.is_empty() && response.to_uppercase() == self.cleared_response
    }

    /// Evaluate all three rules against a record. No short-circuiting.
    pub fn evaluate(&self, record: &Record) -> MatchEvidence {
        let evidence = MatchEvidence {
            work_pending: self.work_pending(record),
            ta_active: self.ta_active(record),
            cleared_yes: self.cleared_yes(record),
        };

        if evidence.is_match() {
            debug!(
                instrument = %record.instrument_id,
                work_pending = evidence.work_pending,
                ta_active = evidence.ta_active,
                cleared_yes = evidence.cleared_yes,
                "Record matched"
            );
        }

        evidence
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}
