//! Analysis record
//!
//! The exclusively-owned, mutable context for one evaluation. The runner
//! threads it by `&mut` through the stages; each stage reads it and returns a
//! [`StageUpdate`] that is merged back with [`AnalysisRecord::apply`].
//!
//! Merge rules:
//! - scalar fields (resolved client, stage outputs) overwrite
//! - verdicts are deduplicated by analyzer; the first one wins
//! - flags, findings and recommendations are unioned as sets
//! - errors append

use crate::analyzers::history::TransactionAnalysis;
use crate::analyzers::holistic::HolisticAnalysis;
use crate::analyzers::physical::CheckAnalysis;
use crate::analyzers::policy::PolicyAnalysis;
use crate::models::check::Check;
use crate::models::client::Client;
use crate::models::event::{PipelineEvent, PipelineEventLog};
use crate::models::verdict::Verdict;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// Step label before any stage has run
pub const STEP_INITIALIZED: &str = "initialized";

/// Structured output of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Check(CheckAnalysis),
    Transaction(TransactionAnalysis),
    Policy(PolicyAnalysis),
    Holistic(HolisticAnalysis),
}

/// Partial result returned by a stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageUpdate {
    /// Account resolved by the stage (overwrites the record's)
    pub client: Option<Client>,
    pub output: Option<StageOutput>,
    pub verdicts: Vec<Verdict>,
    pub flags: Vec<String>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,

    /// Degradations the stage absorbed (the stage still produced a verdict)
    pub errors: Vec<String>,
}

impl StageUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdicts.push(verdict);
        self
    }

    pub fn with_output(mut self, output: StageOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_findings(mut self, findings: Vec<String>) -> Self {
        self.findings = findings;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

/// Accumulating context for one evaluation
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub run_id: Uuid,
    pub check: Check,
    pub client: Option<Client>,

    pub check_analysis: Option<CheckAnalysis>,
    pub transaction_analysis: Option<TransactionAnalysis>,
    pub policy_analysis: Option<PolicyAnalysis>,
    pub holistic_analysis: Option<HolisticAnalysis>,

    pub verdicts: Vec<Verdict>,
    pub flags: BTreeSet<String>,
    pub findings: BTreeSet<String>,
    pub recommendations: BTreeSet<String>,

    /// Instant the run is evaluated at (drives all date logic)
    pub as_of: DateTime<Utc>,
    pub started: Instant,
    pub errors: Vec<String>,
    pub current_step: String,
    pub events: PipelineEventLog,
}

impl AnalysisRecord {
    /// Fresh record for a check, optionally with a pre-resolved client
    pub fn new(check: Check, client: Option<Client>, as_of: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            check,
            client,
            check_analysis: None,
            transaction_analysis: None,
            policy_analysis: None,
            holistic_analysis: None,
            verdicts: Vec::new(),
            flags: BTreeSet::new(),
            findings: BTreeSet::new(),
            recommendations: BTreeSet::new(),
            as_of,
            started: Instant::now(),
            errors: Vec::new(),
            current_step: STEP_INITIALIZED.to_string(),
            events: PipelineEventLog::new(),
        }
    }

    /// Whether an analyzer already contributed a verdict
    pub fn has_verdict_from(&self, analyzer: &str) -> bool {
        self.verdicts.iter().any(|v| v.analyzer == analyzer)
    }

    /// Add a verdict unless the analyzer already has one
    ///
    /// Returns `false` when the verdict was ignored.
    pub fn push_verdict(&mut self, verdict: Verdict) -> bool {
        if self.has_verdict_from(&verdict.analyzer) {
            warn!(analyzer = %verdict.analyzer, "duplicate verdict ignored");
            self.events.log(PipelineEvent::DuplicateVerdictIgnored {
                analyzer: verdict.analyzer,
            });
            return false;
        }
        self.verdicts.push(verdict);
        true
    }

    /// Merge a stage update into the record
    ///
    /// Returns the number of flags that were new to the record.
    pub fn apply(&mut self, update: StageUpdate) -> usize {
        let StageUpdate {
            client,
            output,
            verdicts,
            flags,
            findings,
            recommendations,
            errors,
        } = update;

        if let Some(client) = client {
            self.client = Some(client);
        }

        match output {
            Some(StageOutput::Check(analysis)) => self.check_analysis = Some(analysis),
            Some(StageOutput::Transaction(analysis)) => self.transaction_analysis = Some(analysis),
            Some(StageOutput::Policy(analysis)) => self.policy_analysis = Some(analysis),
            Some(StageOutput::Holistic(analysis)) => self.holistic_analysis = Some(analysis),
            None => {}
        }

        for verdict in verdicts {
            self.push_verdict(verdict);
        }

        let before = self.flags.len();
        self.flags.extend(flags);
        self.findings.extend(findings);
        self.recommendations.extend(recommendations);
        self.errors.extend(errors);

        self.flags.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::verdict::{FraudVerdict, RiskLevel};

    fn record() -> AnalysisRecord {
        let now = Utc::now();
        AnalysisRecord::new(Check::new("C1", "CL1", 1_000, "Payee", now), None, now)
    }

    fn verdict(analyzer: &str, outcome: FraudVerdict) -> Verdict {
        Verdict::new(analyzer, outcome, 0.8, RiskLevel::Low, "", Utc::now())
    }

    #[test]
    fn test_first_verdict_per_analyzer_wins() {
        let mut rec = record();
        rec.apply(StageUpdate::new().with_verdict(verdict("a", FraudVerdict::Fraud)));
        rec.apply(StageUpdate::new().with_verdict(verdict("a", FraudVerdict::NotFraud)));

        assert_eq!(rec.verdicts.len(), 1);
        assert_eq!(rec.verdicts[0].verdict, FraudVerdict::Fraud);
        assert_eq!(rec.events.events_of_type("DuplicateVerdictIgnored").len(), 1);
    }

    #[test]
    fn test_flags_are_unioned() {
        let mut rec = record();
        let added = rec.apply(StageUpdate::new().with_flags(vec!["x".into(), "y".into()]));
        assert_eq!(added, 2);
        let added = rec.apply(StageUpdate::new().with_flags(vec!["y".into(), "z".into()]));
        assert_eq!(added, 1);
        assert_eq!(rec.flags.len(), 3);
    }

    #[test]
    fn test_initial_step() {
        assert_eq!(record().current_step, STEP_INITIALIZED);
    }
}
