//! Report processor: runs the pipeline and delivers one report per recipient.
//!
//! Flow:
//! 1. Rules + redaction → matched records only
//! 2. Compaction → records with at least one evidence field
//! 3. Grouping → one group per (party, address), first-seen order
//! 4. Per group: resolve address, render, send. Strictly one at a time.
//!
//! A skipped or failed group never stops the remaining ones.

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::channels::{Notifier, OutgoingReport};
use crate::pipeline::grouping::{RecipientGroup, SkipReason, group_by_recipient};
use crate::pipeline::redact::{compact, select};
use crate::pipeline::rules::RuleSet;
use crate::pipeline::types::Record;
use crate::render::{render_body, subject_for};

/// What the pure part of the pipeline decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// No record matched any rule.
    NoMatches,
    /// Records matched, but none kept an evidence field.
    NothingAfterCompaction { matched: usize },
    /// Groups ready for delivery.
    Ready {
        matched: usize,
        retained: usize,
        groups: Vec<RecipientGroup>,
    },
}

/// Result of handling one recipient group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent { address: String },
    Failed { address: String, error: String },
    Skipped { reason: SkipReason },
}

impl DeliveryOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Outcome for one (party, address) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub party: String,
    /// Address as read from the records, before any override.
    pub email: String,
    pub rows: usize,
    pub outcome: DeliveryOutcome,
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Records matching at least one rule.
    pub matched: usize,
    /// Matched records left after compaction.
    pub retained: usize,
    /// One entry per group, in delivery order.
    pub outcomes: Vec<RecipientOutcome>,
}

impl RunReport {
    fn empty(run_id: Uuid, matched: usize) -> Self {
        Self {
            run_id,
            matched,
            retained: 0,
            outcomes: Vec::new(),
        }
    }

    fn count(&self, label: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.label() == label)
            .count()
    }

    pub fn sent(&self) -> usize {
        self.count("sent")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }
}

/// Runs the filter-and-group pipeline and hands each group to a notifier.
pub struct ReportProcessor {
    rules: RuleSet,
    override_address: Option<String>,
    notifier: Box<dyn Notifier>,
}

impl ReportProcessor {
    pub fn new(
        rules: RuleSet,
        override_address: Option<String>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            rules,
            override_address,
            notifier,
        }
    }

    /// Evaluate, redact, compact and group. No side effects besides logging.
    pub fn plan(&self, records: &[Record]) -> Plan {
        info!("Applying business rules to {} record(s)", records.len());

        let selected = select(&self.rules, records);
        let matched = selected.len();
        if matched == 0 {
            return Plan::NoMatches;
        }

        let retained = compact(selected);
        if retained.is_empty() {
            return Plan::NothingAfterCompaction { matched };
        }

        Plan::Ready {
            matched,
            retained: retained.len(),
            groups: group_by_recipient(retained),
        }
    }

    /// Render the report for a group.
    pub fn render(&self, group: &RecipientGroup, address: String) -> OutgoingReport {
        OutgoingReport {
            subject: subject_for(&group.party),
            html_body: render_body(&group.party, &group.report_rows()),
            to: address,
        }
    }

    /// Run the whole pipeline over `records`, delivering sequentially.
    pub async fn run(&self, records: &[Record]) -> RunReport {
        let run_id = Uuid::new_v4();

        let (matched, retained, groups) = match self.plan(records) {
            Plan::NoMatches => {
                info!(%run_id, "No data matched the filtering rules. No emails to send.");
                return RunReport::empty(run_id, 0);
            }
            Plan::NothingAfterCompaction { matched } => {
                info!(
                    %run_id,
                    matched,
                    "No relevant data left after cleanup. No emails to send."
                );
                return RunReport::empty(run_id, matched);
            }
            Plan::Ready {
                matched,
                retained,
                groups,
            } => (matched, retained, groups),
        };

        info!(
            %run_id,
            matched,
            retained,
            groups = groups.len(),
            notifier = self.notifier.name(),
            "Delivering reports"
        );

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in &groups {
            let outcome = self.deliver(group).await;
            outcomes.push(RecipientOutcome {
                party: group.party.clone(),
                email: group.email.clone(),
                rows: group.records.len(),
                outcome,
            });
        }

        let report = RunReport {
            run_id,
            matched,
            retained,
            outcomes,
        };

        info!(
            %run_id,
            sent = report.sent(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Run complete"
        );

        report
    }

    async fn deliver(&self, group: &RecipientGroup) -> DeliveryOutcome {
        let address = match group.effective_address(self.override_address.as_deref()) {
            Ok(address) => address,
            Err(reason) => {
                warn!(
                    party = %group.party,
                    reason = reason.label(),
                    "Recipient address empty or invalid, skipping"
                );
                return DeliveryOutcome::Skipped { reason };
            }
        };

        if group.is_sentinel() {
            info!(
                party = %group.party,
                address = %address,
                "Redirecting report to override address"
            );
        }

        let report = self.render(group, address.clone());
        match self.notifier.send(&report).await {
            Ok(()) => {
                info!(
                    party = %group.party,
                    address = %address,
                    rows = group.records.len(),
                    "Report sent"
                );
                DeliveryOutcome::Sent { address }
            }
            Err(e) => {
                error!(
                    party = %group.party,
                    address = %address,
                    error = %e,
                    "Failed to send report"
                );
                DeliveryOutcome::Failed {
                    address,
                    error: e.to_string(),
                }
            }
        }
    }
}
