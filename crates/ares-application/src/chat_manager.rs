//! Chat manager: session lifecycle and the turn state machine.

use crate::session_store::{SessionCell, SessionStore};
use crate::types::{GlobalStatistics, PathologyInfo, ServiceStatus, TurnReply};
use ares_core::config::{ChatConfig, EvictionPolicy};
use ares_core::generation::{GenerationParams, GenerationRequest, PatientEngine};
use ares_core::pathology::{PathologyCatalog, PathologyProfile};
use ares_core::prompt::{PromptBuilder, opening_message};
use ares_core::safety::{ResponseValidator, SafetyConfig, SanitizedResult, Sanitizer};
use ares_core::session::{ChatSession, SessionStatistics, SessionSummary};
use ares_core::{AresError, Result};
use ares_interaction::{ActiveEngine, EngineStatus};
use chrono::{TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

/// Owns every chat session and is the only component that mutates them.
///
/// Sessions are serialized individually: a `send`, `reset` or `delete` holds
/// that session's lock for its whole duration, including the generation
/// call, while other sessions proceed independently.
///
/// # Atomic turns
///
/// A failed turn (engine error, timeout, or a reply that sanitizes to
/// nothing) leaves the session history exactly as it was before the call.
pub struct ChatManager {
    catalog: Arc<PathologyCatalog>,
    engine: Arc<dyn PatientEngine>,
    engine_status: EngineStatus,
    prompt_builder: PromptBuilder,
    sanitizer: Sanitizer,
    validator: ResponseValidator,
    config: ChatConfig,
    default_params: GenerationParams,
    store: SessionStore,
    rng: StdMutex<StdRng>,
    started_at: Instant,
}

impl ChatManager {
    /// Creates a manager around an already selected engine.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Pathology profiles available to new sessions
    /// * `active` - Engine chosen at startup, with its status
    /// * `config` - Session limits and policies
    /// * `safety` - Sanitizer configuration
    /// * `default_params` - Parameters used when a turn supplies none
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is inconsistent, or
    /// `InvalidArgument` if `default_params` are out of range.
    pub fn new(
        catalog: Arc<PathologyCatalog>,
        active: ActiveEngine,
        config: ChatConfig,
        safety: SafetyConfig,
        default_params: GenerationParams,
    ) -> Result<Self> {
        if config.max_messages < 3 {
            return Err(AresError::config(
                "chat.max_messages must allow at least one turn (>= 3)",
            ));
        }
        default_params.validate()?;

        let rng = match config.pathology_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            catalog,
            engine: active.engine,
            engine_status: active.status,
            prompt_builder: PromptBuilder::new(config.prompt_style),
            sanitizer: Sanitizer::new(safety)?,
            validator: ResponseValidator::new(),
            config,
            default_params,
            store: SessionStore::new(),
            rng: StdMutex::new(rng),
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn default_params(&self) -> GenerationParams {
        self.default_params
    }

    /// Creates a session for `pathology_key`, or for a random pathology.
    ///
    /// The new session holds exactly one message: the system prompt built
    /// from the profile.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPathology` if an explicit key is unknown.
    pub async fn create(&self, pathology_key: Option<&str>) -> Result<ChatSession> {
        let profile = match pathology_key {
            Some(key) => self
                .catalog
                .get(key)
                .map_err(|_| AresError::InvalidPathology {
                    key: key.to_string(),
                    valid_options: self.catalog.keys(),
                })?,
            None => self.random_profile(),
        };

        let system_prompt = self.prompt_builder.system_prompt(profile)?;
        let session = ChatSession::new(profile.key.clone(), system_prompt);
        self.store.insert(session.clone()).await;

        tracing::info!(session_id = %session.id, pathology = %session.pathology_key, "Created chat session");
        Ok(session)
    }

    /// Returns a snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn get(&self, session_id: &str) -> Result<ChatSession> {
        let cell = self.cell(session_id).await?;
        let guard = cell.lock().await;
        guard
            .clone()
            .ok_or_else(|| AresError::not_found("session", session_id))
    }

    /// Summaries of all live sessions, oldest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for cell in self.store.snapshot().await {
            if let Some(session) = cell.lock().await.as_ref() {
                summaries.push(session.summary());
            }
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Deletes a session. Callers waiting on it observe `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let cell = self.cell(session_id).await?;
        let mut guard = cell.lock().await;
        if guard.take().is_none() {
            return Err(AresError::not_found("session", session_id));
        }
        self.store.remove(session_id).await;

        tracing::info!(session_id, "Deleted chat session");
        Ok(())
    }

    /// Truncates history back to the system message.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn reset(&self, session_id: &str) -> Result<ChatSession> {
        let cell = self.cell(session_id).await?;
        let mut guard = cell.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| AresError::not_found("session", session_id))?;

        session.reset();
        tracing::info!(session_id, "Reset chat session");
        Ok(session.clone())
    }

    /// Runs one turn and returns the sanitized patient reply.
    ///
    /// `params` falls back to the configured defaults when `None`.
    ///
    /// # Errors
    ///
    /// See [`ChatManager::send_detailed`].
    pub async fn send(
        &self,
        session_id: &str,
        message: &str,
        params: Option<GenerationParams>,
    ) -> Result<String> {
        self.send_detailed(session_id, message, params)
            .await
            .map(|turn| turn.reply)
    }

    /// Runs one turn and returns the reply with violations, quality issues
    /// and the conversation-length warning.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank or oversized message, or
    ///   out-of-range parameters (nothing is mutated)
    /// - `NotFound` if the session does not exist
    /// - `ConversationLimitReached` under the `reject` eviction policy
    /// - `ModelNotLoaded`, `GenerationFailure` or `RateLimited` from the
    ///   engine, a timeout, or a reply with nothing left after sanitizing;
    ///   the turn is rolled back
    pub async fn send_detailed(
        &self,
        session_id: &str,
        message: &str,
        params: Option<GenerationParams>,
    ) -> Result<TurnReply> {
        let message = self.validate_message(message)?;
        let params = params.unwrap_or(self.default_params);
        params.validate()?;

        let cell = self.cell(session_id).await?;
        let mut guard = cell.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| AresError::not_found("session", session_id))?;

        if self.config.eviction == EvictionPolicy::Reject
            && session.would_exceed(self.config.max_messages, 2)
        {
            return Err(AresError::ConversationLimitReached {
                session_id: session_id.to_string(),
                max_messages: self.config.max_messages,
            });
        }

        let profile = self.catalog.get(&session.pathology_key)?;
        let prompt = self
            .prompt_builder
            .build(profile, session.messages(), message)?;
        tracing::debug!(
            session_id,
            turns = prompt.turns.len(),
            chars = prompt.char_len(),
            "Built prompt"
        );
        let request = GenerationRequest::new(prompt, params)?;

        session.push_tentative_user(message);

        let sanitized = match self.generate_reply(&request, profile).await {
            Ok(sanitized) => sanitized,
            Err(err) => {
                Self::rollback(session, message, &err);
                return Err(err);
            }
        };

        session.commit_assistant(sanitized.text.clone());
        if self.config.eviction == EvictionPolicy::EvictOldest {
            let evicted = session.evict_oldest_turns(self.config.max_messages);
            if evicted > 0 {
                tracing::debug!(session_id, evicted, "Evicted oldest turns");
            }
        }

        if !sanitized.is_clean() {
            tracing::warn!(session_id, violations = ?sanitized.violations, "Sanitizer corrected reply");
        }
        let quality_issues = self.validator.validate(&sanitized.text);
        for issue in &quality_issues {
            tracing::warn!(session_id, issue = issue.description(), "Reply quality issue");
        }

        let message_count = session.message_count();
        Ok(TurnReply {
            reply: sanitized.text,
            message_count,
            violations: sanitized.violations,
            quality_issues,
            length_warning: self.sanitizer.conversation_length_warning(message_count),
        })
    }

    /// Statistics for one session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn statistics(&self, session_id: &str) -> Result<SessionStatistics> {
        let session = self.get(session_id).await?;
        Ok(session.statistics(self.config.max_messages))
    }

    /// A vague opening line for the session's patient.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn opening_message(&self, session_id: &str) -> Result<String> {
        let session = self.get(session_id).await?;
        let profile = self.catalog.get(&session.pathology_key)?;
        Ok(opening_message(profile))
    }

    pub async fn global_statistics(&self) -> GlobalStatistics {
        let summaries = self.list().await;
        let total_sessions = summaries.len();
        let total_messages: usize = summaries.iter().map(|s| s.message_count).sum();

        let mut pathology_distribution = BTreeMap::new();
        for summary in &summaries {
            *pathology_distribution
                .entry(summary.pathology_key.clone())
                .or_insert(0) += 1;
        }

        GlobalStatistics {
            total_sessions,
            total_messages,
            avg_messages_per_session: if total_sessions == 0 {
                0.0
            } else {
                total_messages as f64 / total_sessions as f64
            },
            pathology_distribution,
        }
    }

    /// Removes sessions idle for longer than the configured TTL and returns
    /// how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let Some(ttl) = i64::try_from(self.config.session_ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
        else {
            tracing::debug!(
                ttl_hours = self.config.session_ttl_hours,
                "Session TTL out of range, nothing expires"
            );
            return 0;
        };
        let now = Utc::now();
        let mut removed = 0;

        for cell in self.store.snapshot().await {
            let mut guard = cell.lock().await;
            let expired = guard
                .as_ref()
                .is_some_and(|session| session.is_expired(ttl, now));
            if !expired {
                continue;
            }
            if let Some(session) = guard.take() {
                self.store.remove(&session.id).await;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            engine: self.engine_status.clone(),
            engine_name: self.engine.name().to_string(),
            session_count: self.store.len().await,
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    pub fn engine_status(&self) -> &EngineStatus {
        &self.engine_status
    }

    /// Pathologies new sessions can be created with, in catalog order.
    pub fn pathologies(&self) -> Vec<PathologyInfo> {
        self.catalog
            .list()
            .iter()
            .map(|profile| PathologyInfo {
                key: profile.key.clone(),
                label: profile.label.clone(),
                chief_complaint: profile.chief_complaint.clone(),
            })
            .collect()
    }

    async fn cell(&self, session_id: &str) -> Result<SessionCell> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| AresError::not_found("session", session_id))
    }

    fn random_profile(&self) -> &PathologyProfile {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.catalog.random_with(&mut *rng)
    }

    fn validate_message<'a>(&self, message: &'a str) -> Result<&'a str> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(AresError::invalid_argument("message", "must not be empty"));
        }
        let length = message.chars().count();
        if length > self.config.max_user_message_chars {
            return Err(AresError::invalid_argument(
                "message",
                format!(
                    "{length} characters exceeds the limit of {}",
                    self.config.max_user_message_chars
                ),
            ));
        }
        Ok(trimmed)
    }

    /// Calls the engine under the timeout and sanitizes the result.
    async fn generate_reply(
        &self,
        request: &GenerationRequest,
        profile: &PathologyProfile,
    ) -> Result<SanitizedResult> {
        let timeout = Duration::from_secs(self.config.generation_timeout_secs);
        let raw = tokio::time::timeout(timeout, self.engine.generate(request))
            .await
            .map_err(|_| {
                AresError::generation(format!(
                    "generation timed out after {}s",
                    self.config.generation_timeout_secs
                ))
            })??;

        let sanitized = self.sanitizer.sanitize(&raw, profile);
        if sanitized.is_empty_output() {
            return Err(AresError::generation(
                "reply was empty after sanitization",
            ));
        }
        Ok(sanitized)
    }

    /// Removes the tentative user message, but only if it is still the last
    /// entry and matches what this turn appended.
    fn rollback(session: &mut ChatSession, message: &str, err: &AresError) {
        if session.rollback_tentative_user(message) {
            tracing::warn!(session_id = %session.id, error = %err, "Turn failed, rolled back");
        } else {
            tracing::error!(
                session_id = %session.id,
                error = %err,
                "Rollback precondition failed, history left untouched"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ares_interaction::{EngineKind, MockPatientEngine};

    fn manager(config: ChatConfig) -> ChatManager {
        let active = ActiveEngine {
            engine: Arc::new(MockPatientEngine::new()),
            status: EngineStatus {
                requested: EngineKind::Mock,
                active: EngineKind::Mock,
                degraded: false,
                reason: None,
            },
        };
        ChatManager::new(
            Arc::new(PathologyCatalog::builtin()),
            active,
            config,
            SafetyConfig::default(),
            GenerationParams::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_seeded_random_pathology_is_reproducible() {
        let config = ChatConfig {
            pathology_seed: Some(11),
            ..ChatConfig::default()
        };
        let first = manager(config.clone());
        let second = manager(config);

        for _ in 0..5 {
            let a = first.create(None).await.unwrap();
            let b = second.create(None).await.unwrap();
            assert_eq!(a.pathology_key, b.pathology_key);
        }
    }

    #[tokio::test]
    async fn test_unknown_pathology_lists_options() {
        let err = manager(ChatConfig::default())
            .create(Some("common_cold"))
            .await
            .unwrap_err();
        match err {
            AresError::InvalidPathology { key, valid_options } => {
                assert_eq!(key, "common_cold");
                assert_eq!(valid_options.len(), 8);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_validation_happens_before_lookup() {
        let manager = manager(ChatConfig::default());
        let err = manager.send("missing", "   ", None).await.unwrap_err();
        assert!(matches!(err, AresError::InvalidArgument { .. }));
    }

    #[test]
    fn test_rejects_tiny_message_cap() {
        let active = ActiveEngine {
            engine: Arc::new(MockPatientEngine::new()),
            status: EngineStatus {
                requested: EngineKind::Mock,
                active: EngineKind::Mock,
                degraded: false,
                reason: None,
            },
        };
        let result = ChatManager::new(
            Arc::new(PathologyCatalog::builtin()),
            active,
            ChatConfig {
                max_messages: 2,
                ..ChatConfig::default()
            },
            SafetyConfig::default(),
            GenerationParams::default(),
        );
        assert!(matches!(result, Err(AresError::Config(_))));
    }

    #[tokio::test]
    async fn test_opening_message_and_pathologies() {
        let manager = manager(ChatConfig::default());
        let session = manager.create(Some("dental_caries")).await.unwrap();
        let opening = manager.opening_message(&session.id).await.unwrap();
        assert!(opening.starts_with("Hi doctor."));
        assert_eq!(manager.pathologies().len(), 8);
    }
}
