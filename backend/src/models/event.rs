//! Pipeline event log
//!
//! Every significant state change during a run is recorded as a typed event
//! so a run can be inspected after the fact: which stages completed, which
//! failed and why, which verdicts were dropped as duplicates, whether the
//! holistic reviewer degraded.
//!
//! Events are appended in the order they occur. The log is serialized with
//! the final result.
//!
//! # Example
//!
//! ```rust
//! use check_fraud_core_rs::models::{PipelineEvent, PipelineEventLog};
//!
//! let mut log = PipelineEventLog::new();
//! log.log(PipelineEvent::StageFailed {
//!     stage: "policy_analysis".to_string(),
//!     message: "rule set unavailable".to_string(),
//! });
//! assert_eq!(log.events_for_stage("policy_analysis").len(), 1);
//! ```

use crate::models::verdict::{FraudVerdict, RiskLevel};
use serde::{Deserialize, Serialize};

/// Pipeline event capturing a state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Run accepted a check
    RunStarted {
        run_id: String,
        check_id: String,
        holistic_enabled: bool,
    },

    /// Stage returned an update that was merged
    StageCompleted {
        stage: String,
        verdict: Option<FraudVerdict>,
        flags_added: usize,
    },

    /// Stage raised an error; no verdict was recorded
    StageFailed { stage: String, message: String },

    /// A second verdict from the same analyzer was dropped
    DuplicateVerdictIgnored { analyzer: String },

    /// Holistic reviewer failed or timed out; fallback verdict used
    ReviewerFallback { reason: String },

    /// Aggregation finished
    VotingCompleted {
        verdict: FraudVerdict,
        confidence: f64,
        risk_level: RiskLevel,
        consensus: bool,
    },
}

impl PipelineEvent {
    /// Get event type as string
    pub fn event_type(&self) -> &str {
        match self {
            PipelineEvent::RunStarted { .. } => "RunStarted",
            PipelineEvent::StageCompleted { .. } => "StageCompleted",
            PipelineEvent::StageFailed { .. } => "StageFailed",
            PipelineEvent::DuplicateVerdictIgnored { .. } => "DuplicateVerdictIgnored",
            PipelineEvent::ReviewerFallback { .. } => "ReviewerFallback",
            PipelineEvent::VotingCompleted { .. } => "VotingCompleted",
        }
    }

    /// Stage or analyzer the event concerns, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineEvent::StageCompleted { stage, .. } => Some(stage),
            PipelineEvent::StageFailed { stage, .. } => Some(stage),
            PipelineEvent::DuplicateVerdictIgnored { analyzer } => Some(analyzer),
            _ => None,
        }
    }
}

/// Ordered event log for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineEventLog {
    events: Vec<PipelineEvent>,
}

impl PipelineEventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[PipelineEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&PipelineEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific stage
    pub fn events_for_stage(&self, stage: &str) -> Vec<&PipelineEvent> {
        self.events
            .iter()
            .filter(|e| e.stage() == Some(stage))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_of_type_filters() {
        let mut log = PipelineEventLog::new();
        log.log(PipelineEvent::StageCompleted {
            stage: "check_analysis".into(),
            verdict: Some(FraudVerdict::NotFraud),
            flags_added: 0,
        });
        log.log(PipelineEvent::DuplicateVerdictIgnored {
            analyzer: "check_analysis".into(),
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.events_of_type("StageCompleted").len(), 1);
        assert_eq!(log.events_for_stage("check_analysis").len(), 2);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = PipelineEvent::ReviewerFallback {
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "reviewer_fallback");
    }
}
