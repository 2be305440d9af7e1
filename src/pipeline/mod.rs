//! Filter-and-group pipeline.
//!
//! Every record from the loaded report flows through:
//! 1. `RuleSet::evaluate()` — three independent predicates
//! 2. `redact()` — blank evidence fields of rules that did not fire
//! 3. `compact()` — drop records with no evidence left
//! 4. `group_by_recipient()` — one group per (party, address)
//! 5. `ReportProcessor` — render and deliver each group in order
//!
//! Stages 1–4 are pure functions of their input.

pub mod grouping;
pub mod processor;
pub mod redact;
pub mod rules;
pub mod types;
