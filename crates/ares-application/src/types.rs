//! Result types returned by the chat manager.

use ares_core::safety::{QualityIssue, ViolationKind};
use ares_interaction::EngineStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A delivered patient reply with the bookkeeping around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply: String,
    /// History length after the turn was committed (and any eviction).
    pub message_count: usize,
    /// Problems the sanitizer corrected or flagged.
    pub violations: BTreeSet<ViolationKind>,
    /// Advisory findings from the response validator.
    pub quality_issues: Vec<QualityIssue>,
    pub length_warning: Option<String>,
}

/// Aggregate figures over all live sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub total_sessions: usize,
    pub total_messages: usize,
    pub avg_messages_per_session: f64,
    /// Session count per pathology key.
    pub pathology_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub engine: EngineStatus,
    pub engine_name: String,
    pub session_count: usize,
    pub uptime_secs: u64,
}

/// Caller-facing description of a pathology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathologyInfo {
    pub key: String,
    pub label: String,
    pub chief_complaint: String,
}
