//! End-to-end turn handling through the chat manager.

use ares_application::ChatManager;
use ares_core::AresError;
use ares_core::config::{ChatConfig, EvictionPolicy};
use ares_core::generation::{GenerationParams, GenerationRequest, PatientEngine};
use ares_core::pathology::PathologyCatalog;
use ares_core::safety::{SafetyConfig, ViolationKind};
use ares_core::session::MessageRole;
use ares_interaction::{ActiveEngine, EngineKind, EngineStatus, MockPatientEngine};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const DEFAULT_REPLY: &str = "It hurts when I chew on that side.";

/// Engine that plays back queued outcomes, then a default reply.
struct ScriptedEngine {
    outcomes: Mutex<VecDeque<ares_core::Result<String>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    fn new(outcomes: Vec<ares_core::Result<String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatientEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _request: &GenerationRequest) -> ares_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }
}

/// Engine whose calls only finish once two of them are in flight.
struct RendezvousEngine {
    barrier: tokio::sync::Barrier,
}

#[async_trait]
impl PatientEngine for RendezvousEngine {
    fn name(&self) -> &str {
        "rendezvous"
    }

    async fn generate(&self, _request: &GenerationRequest) -> ares_core::Result<String> {
        self.barrier.wait().await;
        Ok(DEFAULT_REPLY.to_string())
    }
}

fn manager_with(engine: Arc<dyn PatientEngine>, config: ChatConfig, safety: SafetyConfig) -> ChatManager {
    let active = ActiveEngine {
        engine,
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
        safety,
        GenerationParams::default(),
    )
    .unwrap()
}

fn scripted_manager(engine: Arc<ScriptedEngine>, config: ChatConfig) -> ChatManager {
    manager_with(engine, config, SafetyConfig::default())
}

#[tokio::test]
async fn test_mock_turn_appends_user_and_reply() {
    let manager = manager_with(
        Arc::new(MockPatientEngine::new()),
        ChatConfig::default(),
        SafetyConfig::default(),
    );
    let session = manager.create(Some("dental_caries")).await.unwrap();
    assert_eq!(session.message_count(), 1);

    let reply = manager
        .send(&session.id, "Where does it hurt?", None)
        .await
        .unwrap();

    let after = manager.get(&session.id).await.unwrap();
    assert_eq!(after.message_count(), 3);
    assert!(!reply.trim().is_empty());

    let profile = PathologyCatalog::builtin().get("dental_caries").unwrap().clone();
    assert!(!reply.to_lowercase().contains(&profile.diagnosis.to_lowercase()));
    assert_eq!(after.messages()[1].content, "Where does it hurt?");
    assert_eq!(after.messages()[2].role, MessageRole::Assistant);
    assert_eq!(after.messages()[2].content, reply);
}

#[tokio::test]
async fn test_deleted_session_is_not_found() {
    let manager = manager_with(
        Arc::new(MockPatientEngine::new()),
        ChatConfig::default(),
        SafetyConfig::default(),
    );
    let session = manager.create(None).await.unwrap();

    manager.delete(&session.id).await.unwrap();

    assert!(manager.get(&session.id).await.unwrap_err().is_not_found());
    assert!(manager.delete(&session.id).await.unwrap_err().is_not_found());
    assert!(manager.send(&session.id, "hello", None).await.unwrap_err().is_not_found());
    assert!(manager.reset(&session.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_generation_failure_leaves_session_untouched() {
    let engine = Arc::new(ScriptedEngine::new(vec![Err(AresError::generation("boom"))]));
    let manager = scripted_manager(engine.clone(), ChatConfig::default());
    let session = manager.create(Some("pericoronitis")).await.unwrap();

    let err = manager.send(&session.id, "Does it hurt?", None).await.unwrap_err();
    assert!(err.is_generation_failure());

    let after = manager.get(&session.id).await.unwrap();
    assert_eq!(after, session);
    assert_eq!(after.message_count(), 1);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_every_engine_error_rolls_back_exactly() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        Ok("First it was only with cold drinks.".to_string()),
        Err(AresError::model_not_loaded("still loading")),
        Err(AresError::rate_limited("slow down", Some(5))),
    ]));
    let manager = scripted_manager(engine, ChatConfig::default());
    let session = manager.create(Some("reversible_pulpitis")).await.unwrap();
    manager.send(&session.id, "When did it start?", None).await.unwrap();
    let before = manager.get(&session.id).await.unwrap();

    let err = manager.send(&session.id, "Any swelling?", None).await.unwrap_err();
    assert!(err.is_model_not_loaded());
    assert_eq!(manager.get(&session.id).await.unwrap(), before);

    let err = manager.send(&session.id, "Any swelling?", None).await.unwrap_err();
    assert!(matches!(err, AresError::RateLimited { retry_after_secs: Some(5), .. }));
    assert_eq!(manager.get(&session.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_reply_that_sanitizes_to_nothing_is_a_failure() {
    let profile = PathologyCatalog::builtin().get("dental_caries").unwrap().clone();
    let engine = Arc::new(ScriptedEngine::new(vec![Ok(profile.diagnosis.clone())]));
    let manager = scripted_manager(engine, ChatConfig::default());
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let err = manager.send(&session.id, "What do you have?", None).await.unwrap_err();
    assert!(err.is_generation_failure());
    assert_eq!(manager.get(&session.id).await.unwrap(), session);
}

#[tokio::test]
async fn test_leak_is_redacted_and_reported() {
    let engine = Arc::new(ScriptedEngine::new(vec![Ok(
        "My neighbour thinks it is tooth decay. It only hurts with sweets.".to_string(),
    )]));
    let manager = scripted_manager(engine, ChatConfig::default());
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let turn = manager
        .send_detailed(&session.id, "What do you think it is?", None)
        .await
        .unwrap();

    assert_eq!(turn.reply, "My neighbour thinks it is .... It only hurts with sweets.");
    assert!(turn.violations.contains(&ViolationKind::DiagnosisLeak));
    let stored = manager.get(&session.id).await.unwrap();
    assert_eq!(stored.messages()[2].content, turn.reply);
}

#[tokio::test]
async fn test_timeout_rolls_back() {
    let engine = Arc::new(
        ScriptedEngine::new(vec![Ok("too late".to_string())]).with_delay(Duration::from_secs(3)),
    );
    let config = ChatConfig {
        generation_timeout_secs: 1,
        ..ChatConfig::default()
    };
    let manager = scripted_manager(engine, config);
    let session = manager.create(Some("pulpal_necrosis")).await.unwrap();

    let err = manager.send(&session.id, "Still numb?", None).await.unwrap_err();
    assert!(err.is_generation_failure());
    assert!(err.to_string().contains("timed out"));
    assert_eq!(manager.get(&session.id).await.unwrap(), session);
}

#[tokio::test]
async fn test_boundaries_are_checked_before_generation() {
    let engine = Arc::new(ScriptedEngine::new(Vec::new()));
    let manager = scripted_manager(engine.clone(), ChatConfig::default());
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let too_long = "a".repeat(2001);
    let err = manager.send(&session.id, &too_long, None).await.unwrap_err();
    assert!(matches!(err, AresError::InvalidArgument { ref field, .. } if field == "message"));

    let too_many_tokens = GenerationParams::default().with_max_new_tokens(501);
    let err = manager
        .send(&session.id, "Hello", Some(too_many_tokens))
        .await
        .unwrap_err();
    assert!(matches!(err, AresError::InvalidArgument { ref field, .. } if field == "max_new_tokens"));

    assert_eq!(engine.calls(), 0);
    assert_eq!(manager.get(&session.id).await.unwrap(), session);

    let minimal_tokens = GenerationParams::default().with_max_new_tokens(10);
    manager
        .send(&session.id, "Hello", Some(minimal_tokens))
        .await
        .unwrap();
    manager
        .send(&session.id, &"a".repeat(2000), None)
        .await
        .unwrap();
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn test_reset_is_idempotent_and_keeps_identity() {
    let manager = manager_with(
        Arc::new(MockPatientEngine::new()),
        ChatConfig::default(),
        SafetyConfig::default(),
    );
    let session = manager.create(Some("acute_total_pulpitis")).await.unwrap();
    manager.send(&session.id, "Does it throb?", None).await.unwrap();
    manager.send(&session.id, "At night too?", None).await.unwrap();

    let first = manager.reset(&session.id).await.unwrap();
    let second = manager.reset(&session.id).await.unwrap();

    assert_eq!(first.messages(), second.messages());
    assert_eq!(second.message_count(), 1);
    assert_eq!(second.messages()[0], session.messages()[0]);
    assert_eq!(second.id, session.id);
    assert_eq!(second.pathology_key, session.pathology_key);
    assert!(second.updated_at >= session.updated_at);
}

#[tokio::test]
async fn test_evict_oldest_keeps_system_message() {
    let config = ChatConfig {
        max_messages: 5,
        ..ChatConfig::default()
    };
    let manager = manager_with(Arc::new(MockPatientEngine::new()), config, SafetyConfig::default());
    let session = manager.create(Some("dental_caries")).await.unwrap();

    for i in 0..4 {
        manager
            .send(&session.id, &format!("question number {i}"), None)
            .await
            .unwrap();
    }

    let after = manager.get(&session.id).await.unwrap();
    assert_eq!(after.message_count(), 5);
    assert_eq!(after.messages()[0], session.messages()[0]);
    assert_eq!(after.messages()[1].content, "question number 2");
    assert_eq!(after.messages()[3].content, "question number 3");
}

#[tokio::test]
async fn test_reject_policy_refuses_turn_without_mutation() {
    let engine = Arc::new(ScriptedEngine::new(Vec::new()));
    let config = ChatConfig {
        max_messages: 5,
        eviction: EvictionPolicy::Reject,
        ..ChatConfig::default()
    };
    let manager = scripted_manager(engine.clone(), config);
    let session = manager.create(Some("dental_caries")).await.unwrap();

    manager.send(&session.id, "one", None).await.unwrap();
    manager.send(&session.id, "two", None).await.unwrap();
    let before = manager.get(&session.id).await.unwrap();

    let err = manager.send(&session.id, "three", None).await.unwrap_err();
    assert!(matches!(err, AresError::ConversationLimitReached { max_messages: 5, .. }));
    assert!(err.is_client_error());
    assert_eq!(manager.get(&session.id).await.unwrap(), before);
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn test_turns_on_one_session_are_serialized() {
    let engine = Arc::new(ScriptedEngine::new(Vec::new()).with_delay(Duration::from_millis(200)));
    let manager = Arc::new(scripted_manager(engine, ChatConfig::default()));
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let first = {
        let manager = manager.clone();
        let id = session.id.clone();
        tokio::spawn(async move { manager.send(&id, "first question", None).await })
    };
    let second = {
        let manager = manager.clone();
        let id = session.id.clone();
        tokio::spawn(async move { manager.send(&id, "second question", None).await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let after = manager.get(&session.id).await.unwrap();
    let roles: Vec<MessageRole> = after.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
        ]
    );
}

#[tokio::test]
async fn test_separate_sessions_generate_concurrently() {
    let engine = Arc::new(RendezvousEngine {
        barrier: tokio::sync::Barrier::new(2),
    });
    let manager = Arc::new(manager_with(engine, ChatConfig::default(), SafetyConfig::default()));
    let a = manager.create(Some("dental_caries")).await.unwrap();
    let b = manager.create(Some("pericoronitis")).await.unwrap();

    let send_a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send(&a.id, "hello", None).await })
    };
    let send_b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send(&b.id, "hello", None).await })
    };

    let both = tokio::time::timeout(Duration::from_secs(5), async {
        (send_a.await.unwrap(), send_b.await.unwrap())
    })
    .await
    .expect("sessions blocked each other");
    assert!(both.0.is_ok());
    assert!(both.1.is_ok());
}

#[tokio::test]
async fn test_delete_waits_for_in_flight_turn() {
    let engine = Arc::new(ScriptedEngine::new(Vec::new()).with_delay(Duration::from_millis(200)));
    let manager = Arc::new(scripted_manager(engine, ChatConfig::default()));
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let turn = {
        let manager = manager.clone();
        let id = session.id.clone();
        tokio::spawn(async move { manager.send(&id, "hello", None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    manager.delete(&session.id).await.unwrap();
    assert!(turn.await.unwrap().is_ok());
    assert!(manager.get(&session.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_statistics_listing_and_cleanup() {
    let config = ChatConfig {
        session_ttl_hours: 0,
        ..ChatConfig::default()
    };
    let manager = manager_with(Arc::new(MockPatientEngine::new()), config, SafetyConfig::default());
    let a = manager.create(Some("dental_caries")).await.unwrap();
    manager.create(Some("dental_caries")).await.unwrap();
    manager.create(Some("pericoronitis")).await.unwrap();
    manager.send(&a.id, "Where is the pain?", None).await.unwrap();

    let listed = manager.list().await;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, a.id);

    let stats = manager.statistics(&a.id).await.unwrap();
    assert_eq!(stats.user_messages, 1);
    assert_eq!(stats.assistant_messages, 1);

    let global = manager.global_statistics().await;
    assert_eq!(global.total_sessions, 3);
    assert_eq!(global.total_messages, 5);
    assert_eq!(global.pathology_distribution.get("dental_caries"), Some(&2));
    assert_eq!(global.pathology_distribution.get("pericoronitis"), Some(&1));

    let status = manager.status().await;
    assert_eq!(status.session_count, 3);
    assert_eq!(status.engine_name, "mock");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.cleanup_expired().await, 3);
    assert!(manager.list().await.is_empty());
    assert!(manager.get(&a.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_huge_ttl_never_expires_sessions() {
    for session_ttl_hours in [10_000_000_000, u64::MAX] {
        let config = ChatConfig {
            session_ttl_hours,
            ..ChatConfig::default()
        };
        let manager = manager_with(Arc::new(MockPatientEngine::new()), config, SafetyConfig::default());
        let session = manager.create(Some("dental_caries")).await.unwrap();

        assert_eq!(manager.cleanup_expired().await, 0);
        assert!(manager.get(&session.id).await.is_ok());
    }
}

#[tokio::test]
async fn test_length_warning_after_threshold() {
    let safety = SafetyConfig {
        max_conversation_turns: 3,
        ..SafetyConfig::default()
    };
    let manager = manager_with(Arc::new(MockPatientEngine::new()), ChatConfig::default(), safety);
    let session = manager.create(Some("dental_caries")).await.unwrap();

    let turn = manager.send_detailed(&session.id, "Hello", None).await.unwrap();
    assert_eq!(turn.message_count, 3);
    assert!(turn.length_warning.unwrap().contains("3 messages"));
}
