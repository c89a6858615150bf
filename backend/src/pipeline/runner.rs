//! Pipeline runner
//!
//! Executes the analyzer stages in a fixed order over one exclusively-owned
//! [`AnalysisRecord`], then hands the record to the voting aggregator:
//!
//! ```text
//! For each check:
//! 1. Physical check analysis
//! 2. Transaction history analysis
//! 3. Policy analysis
//! 4. Holistic review (optional)
//! 5. Weighted voting
//! ```
//!
//! A stage that returns an error or panics is recorded
//! (`"<Stage> error: <message>"`, step `<stage>_error`) and the run moves on. The runner never aborts and
//! never retries.
//!
//! # Example
//!
//! ```rust
//! use check_fraud_core_rs::pipeline::{Pipeline, PipelineConfig};
//! use check_fraud_core_rs::policy::RuleSet;
//! use check_fraud_core_rs::repository::sample_repository;
//! use check_fraud_core_rs::{AnalysisClock, FraudVerdict};
//! use chrono::{TimeZone, Utc};
//! use std::sync::Arc;
//!
//! let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::new(
//!     config.clone(),
//!     Arc::new(sample_repository(config.rng_seed, as_of)),
//!     Arc::new(RuleSet::default_catalog().unwrap()),
//! )
//! .unwrap()
//! .with_clock(AnalysisClock::Fixed(as_of));
//!
//! let check = check_fraud_core_rs::repository::sample_check("CHECK_FRAUD002", as_of).unwrap();
//! let result = pipeline.run(check, None);
//! assert_eq!(result.final_verdict, FraudVerdict::Fraud);
//! ```

use crate::analyzers::{
    Analyzer, HolisticAnalyzer, HolisticReviewer, KeywordReviewer, PhysicalCheckAnalyzer,
    PolicyAnalyzer, StageError, TransactionHistoryAnalyzer, HOLISTIC_REVIEW,
};
use crate::core::AnalysisClock;
use crate::models::{AnalysisRecord, Check, Client, FinalResult, PipelineEvent};
use crate::pipeline::config::{ConfigError, PipelineConfig};
use crate::policy::RuleSet;
use crate::repository::Repository;
use crate::rng::RngManager;
use crate::voting::VotingAggregator;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sequential fraud analysis pipeline
pub struct Pipeline {
    config: PipelineConfig,
    clock: AnalysisClock,
    repository: Arc<Repository>,
    rules: Arc<RuleSet>,

    /// Physical, history and policy stages, in execution order
    stages: Vec<Box<dyn Analyzer>>,
    holistic: Box<dyn Analyzer>,
    aggregator: VotingAggregator,
}

impl Pipeline {
    /// Build a pipeline with the standard stages and the keyword reviewer
    pub fn new(
        config: PipelineConfig,
        repository: Arc<Repository>,
        rules: Arc<RuleSet>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let windows = config.windows();
        let stages: Vec<Box<dyn Analyzer>> = vec![
            Box::new(PhysicalCheckAnalyzer::new()),
            Box::new(TransactionHistoryAnalyzer::new(Arc::clone(&repository), windows)),
            Box::new(PolicyAnalyzer::new(
                Arc::clone(&rules),
                Arc::clone(&repository),
                windows,
            )),
        ];
        let holistic = Box::new(HolisticAnalyzer::new(
            Arc::new(KeywordReviewer),
            config.holistic_timeout(),
        ));

        Ok(Self {
            aggregator: config.aggregator(),
            config,
            clock: AnalysisClock::System,
            repository,
            rules,
            stages,
            holistic,
        })
    }

    /// Builder: set the clock that supplies each run's `as_of`
    pub fn with_clock(mut self, clock: AnalysisClock) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: use a different holistic reviewer
    pub fn with_reviewer(mut self, reviewer: Arc<dyn HolisticReviewer>) -> Self {
        self.holistic = Box::new(HolisticAnalyzer::new(
            reviewer,
            self.config.holistic_timeout(),
        ));
        self
    }

    /// Swap the stage that has the same id as `analyzer`
    ///
    /// Returns `false` (and drops `analyzer`) when no stage has that id.
    pub fn replace_analyzer(&mut self, analyzer: Box<dyn Analyzer>) -> bool {
        if analyzer.id() == self.holistic.id() {
            self.holistic = analyzer;
            return true;
        }
        match self.stages.iter_mut().find(|s| s.id() == analyzer.id()) {
            Some(slot) => {
                *slot = analyzer;
                true
            }
            None => false,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn clock(&self) -> AnalysisClock {
        self.clock
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Stage ids in execution order (holistic last)
    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|s| s.id())
            .chain(std::iter::once(self.holistic.id()))
            .collect()
    }

    /// Analyze a check with every stage, holistic review included
    pub fn run(&self, check: Check, client: Option<Client>) -> FinalResult {
        self.execute(check, client, true)
    }

    /// Analyze a check without the holistic review
    pub fn run_without_holistic(&self, check: Check, client: Option<Client>) -> FinalResult {
        self.execute(check, client, false)
    }

    fn execute(&self, check: Check, client: Option<Client>, include_holistic: bool) -> FinalResult {
        let mut record = AnalysisRecord::new(check, client, self.clock.now());
        let mut rng = RngManager::new(self.config.rng_seed);

        info!(
            run_id = %record.run_id,
            check_id = %record.check.check_id,
            holistic = include_holistic,
            "analysis started"
        );
        record.events.log(PipelineEvent::RunStarted {
            run_id: record.run_id.to_string(),
            check_id: record.check.check_id.clone(),
            holistic_enabled: include_holistic,
        });

        for stage in &self.stages {
            run_stage(stage.as_ref(), &mut record, &mut rng);
        }
        if include_holistic {
            run_stage(self.holistic.as_ref(), &mut record, &mut rng);
        }

        let mut result = self.aggregator.aggregate(&record);
        result.events.log(PipelineEvent::VotingCompleted {
            verdict: result.final_verdict,
            confidence: result.final_confidence,
            risk_level: result.final_risk_level,
            consensus: result.consensus_reached,
        });

        info!(
            run_id = %result.run_id,
            check_id = %result.check_id,
            verdict = %result.final_verdict,
            confidence = result.final_confidence,
            risk = %result.final_risk_level,
            errors = result.errors.len(),
            "analysis finished"
        );

        result
    }
}

/// Run one stage and merge its update, isolating failures
fn run_stage(stage: &dyn Analyzer, record: &mut AnalysisRecord, rng: &mut RngManager) {
    let id = stage.id();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| stage.analyze(record, rng)))
        .unwrap_or_else(|payload| Err(StageError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(update) => {
            let degraded = !update.errors.is_empty();
            if degraded && id == HOLISTIC_REVIEW {
                for reason in &update.errors {
                    record.events.log(PipelineEvent::ReviewerFallback {
                        reason: reason.clone(),
                    });
                }
            }

            let verdict = update.verdicts.first().map(|v| v.verdict);
            let flags_added = record.apply(update);
            record.events.log(PipelineEvent::StageCompleted {
                stage: id.to_string(),
                verdict,
                flags_added,
            });

            record.current_step = if degraded {
                format!("{}_error", id)
            } else {
                format!("{}_complete", id)
            };
            debug!(stage = id, verdict = ?verdict, flags_added, "stage complete");
        }
        Err(e) => {
            warn!(stage = id, error = %e, "stage failed");
            record
                .errors
                .push(format!("{} error: {}", stage.display_name(), e));
            record.events.log(PipelineEvent::StageFailed {
                stage: id.to_string(),
                message: e.to_string(),
            });
            record.current_step = format!("{}_error", id);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{StageError, POLICY_ANALYSIS};
    use crate::models::StageUpdate;
    use chrono::{TimeZone, Utc};

    struct Broken;

    impl Analyzer for Broken {
        fn id(&self) -> &'static str {
            POLICY_ANALYSIS
        }

        fn display_name(&self) -> &'static str {
            "Policy analysis"
        }

        fn analyze(&self, _: &AnalysisRecord, _: &mut RngManager) -> Result<StageUpdate, StageError> {
            Err(StageError::Failed("rule set unavailable".to_string()))
        }
    }

    struct Panicking;

    impl Analyzer for Panicking {
        fn id(&self) -> &'static str {
            POLICY_ANALYSIS
        }

        fn display_name(&self) -> &'static str {
            "Policy analysis"
        }

        fn analyze(&self, _: &AnalysisRecord, _: &mut RngManager) -> Result<StageUpdate, StageError> {
            panic!("context index out of range")
        }
    }

    fn pipeline() -> Pipeline {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Pipeline::new(
            PipelineConfig::default(),
            Arc::new(Repository::new()),
            Arc::new(RuleSet::default_catalog().unwrap()),
        )
        .unwrap()
        .with_clock(AnalysisClock::Fixed(at))
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            pipeline().stage_ids(),
            vec!["check_analysis", "transaction_history", "policy_analysis", "holistic_review"]
        );
    }

    #[test]
    fn test_stage_error_is_isolated() {
        let mut pipeline = pipeline();
        assert!(pipeline.replace_analyzer(Box::new(Broken)));

        let check = Check::new("C1", "CL1", 10_000, "Payee", Utc::now());
        let result = pipeline.run_without_holistic(check, None);

        assert_eq!(result.errors, vec!["Policy analysis error: rule set unavailable"]);
        assert!(result.verdict_from(POLICY_ANALYSIS).is_none());
        assert_eq!(result.verdicts.len(), 2);
        assert_eq!(result.events.events_of_type("StageFailed").len(), 1);
    }

    #[test]
    fn test_stage_panic_is_isolated() {
        let mut pipeline = pipeline();
        assert!(pipeline.replace_analyzer(Box::new(Panicking)));

        let check = Check::new("C1", "CL1", 10_000, "Payee", Utc::now());
        let result = pipeline.run_without_holistic(check, None);

        assert_eq!(
            result.errors,
            vec!["Policy analysis error: panicked: context index out of range"]
        );
        assert!(result.verdict_from(POLICY_ANALYSIS).is_none());
        assert_eq!(result.verdicts.len(), 2);
        assert_eq!(result.events.events_for_stage(POLICY_ANALYSIS).len(), 1);
        assert_eq!(result.events.events_of_type("StageFailed").len(), 1);
    }

    #[test]
    fn test_panic_message_from_formatted_payload() {
        let payload: Box<dyn Any + Send> = Box::new(format!("window {} too large", 7));
        assert_eq!(panic_message(payload.as_ref()), "window 7 too large");
        let opaque: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(opaque.as_ref()), "unknown panic");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            holistic_timeout_ms: 0,
            ..PipelineConfig::default()
        };
        let built = Pipeline::new(
            config,
            Arc::new(Repository::new()),
            Arc::new(RuleSet::default_catalog().unwrap()),
        );
        assert!(built.is_err());
    }
}
