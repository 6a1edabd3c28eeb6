use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use services::{AdvanceOutcome, Clock, PersistenceStatus, SessionError, WorkshopService};
use storage::repository::{CompletionRepository, InMemoryRepository, StorageError};
use workshop_core::distraction::AnswerOutcome;
use workshop_core::model::{
    CompletionEvent, Problem, ProblemId, ProblemKind, RunId, SectionId, SectionTemplate,
    SessionRecord, Stage, WorkshopPlan, WorkshopSettings,
};
use workshop_core::pools::{PassphrasePool, ProblemPool};
use workshop_core::time::fixed_now;

fn settings() -> WorkshopSettings {
    WorkshopSettings::default()
        .with_secret_seed(2024)
        .with_distraction_delay(Duration::from_secs(10))
}

fn id(raw: &str) -> SectionId {
    SectionId::new(raw)
}

/// Record store whose appends fail until `healthy` is set.
#[derive(Default)]
struct FlakyStore {
    healthy: AtomicBool,
    inner: InMemoryRepository,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StorageError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Connection("store offline".into()))
        }
    }
}

#[async_trait::async_trait]
impl CompletionRepository for FlakyStore {
    async fn append_completion(&self, event: &CompletionEvent) -> Result<i64, StorageError> {
        self.check()?;
        self.inner.append_completion(event).await
    }

    async fn completions_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<CompletionEvent>, StorageError> {
        self.inner.completions_for_run(run_id).await
    }

    async fn append_session_record(&self, record: &SessionRecord) -> Result<i64, StorageError> {
        self.check()?;
        self.inner.append_session_record(record).await
    }

    async fn get_session_record(&self, id: i64) -> Result<SessionRecord, StorageError> {
        self.inner.get_session_record(id).await
    }
}

#[tokio::test(start_paused = true)]
async fn full_workshop_persists_events_and_record() {
    let repo = InMemoryRepository::new();
    let service = WorkshopService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()))
        .with_settings(settings());

    let mut session = service.start_session().unwrap();
    let run_id = session.run_id().unwrap();

    let rejected = service
        .submit_secret(&mut session, &id("hearing"), "apple")
        .await
        .unwrap();
    assert_eq!(rejected.outcome, AdvanceOutcome::Rejected);
    assert_eq!(rejected.persistence, PersistenceStatus::NotNeeded);

    for section in ["hearing", "vision", "motor"] {
        let secret = session.secret_for(&id(section)).unwrap().to_lowercase();
        let result = service
            .submit_secret(&mut session, &id(section), &secret)
            .await
            .unwrap();
        assert_eq!(result.outcome, AdvanceOutcome::Accepted);
        assert_eq!(result.persistence, PersistenceStatus::Stored);
        assert!(!result.is_complete);
    }
    assert_eq!(session.stage(), Stage::Section(3));

    // Distraction auto-starts on entering the cognitive section.
    tokio::time::sleep(Duration::from_secs(11)).await;
    let problem = session.current_problem().expect("problem after delay");
    let blocked = service
        .submit_secret(&mut session, &id("cognitive"), "focus")
        .await
        .unwrap();
    assert_eq!(blocked.outcome, AdvanceOutcome::Blocked);

    assert_eq!(
        service.submit_distraction_answer(&session, "wrong"),
        AnswerOutcome::Incorrect
    );
    assert_eq!(
        service.submit_distraction_answer(&session, &format!(" {} ", problem.expected_answer())),
        AnswerOutcome::Correct
    );

    let done = service
        .submit_secret(&mut session, &id("cognitive"), " Focus ")
        .await
        .unwrap();
    assert_eq!(done.outcome, AdvanceOutcome::Accepted);
    assert!(done.is_complete);
    assert_eq!(done.persistence, PersistenceStatus::Stored);
    let record_id = done.record_id.expect("record stored");

    let events = repo.completions_for_run(run_id).await.unwrap();
    let order: Vec<&str> = events.iter().map(|e| e.section_id.as_str()).collect();
    assert_eq!(order, ["hearing", "vision", "motor", "cognitive"]);
    assert_eq!(events[3].distraction_score, Some(1));

    let record = repo.get_session_record(record_id).await.unwrap();
    assert_eq!(record.run_id(), run_id);
    assert_eq!(record.distraction_score(), 1);
    assert_eq!(record.secret_for(&id("cognitive")), Some("FOCUS"));

    // Finalizing again returns the stored id instead of appending twice.
    assert_eq!(service.finalize_record(&mut session).await.unwrap(), record_id);
}

#[tokio::test(start_paused = true)]
async fn storage_failure_keeps_progress_and_record_can_be_retried() {
    let store = Arc::new(FlakyStore::default());
    let service = WorkshopService::new(Clock::fixed(fixed_now()), store.clone())
        .with_settings(settings().with_auto_start_distraction(false));

    let mut session = service.start_session().unwrap();
    for section in ["hearing", "vision", "motor", "cognitive"] {
        let secret = session.secret_for(&id(section)).unwrap().to_string();
        let result = service
            .submit_secret(&mut session, &id(section), &secret)
            .await
            .unwrap();
        assert_eq!(result.outcome, AdvanceOutcome::Accepted);
        assert!(matches!(result.persistence, PersistenceStatus::Failed(_)));
    }
    assert_eq!(session.stage(), Stage::Complete);
    assert!(session.record_id().is_none());

    store.healthy.store(true, Ordering::SeqCst);
    let record_id = service.finalize_record(&mut session).await.unwrap();
    let record = store.get_session_record(record_id).await.unwrap();
    assert_eq!(record.secrets().len(), 4);
    assert_eq!(record.distraction_score(), 0);
}

#[tokio::test]
async fn caller_errors_do_not_touch_state() {
    let service = WorkshopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    )
    .with_settings(settings());

    let mut session = service.start_session().unwrap();
    let err = service
        .submit_secret(&mut session, &id("vision"), "anything")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotCurrent { .. }));
    assert!(session.captured_secrets().is_empty());

    assert!(matches!(
        service.finalize_record(&mut session).await,
        Err(SessionError::Incomplete)
    ));
    assert!(matches!(
        service.start_distraction(&session),
        Err(SessionError::NoDistraction(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn reset_mid_run_cancels_distraction_and_restarts_cleanly() {
    let repo = InMemoryRepository::new();
    let service = WorkshopService::new(Clock::fixed(fixed_now()), Arc::new(repo))
        .with_settings(settings());

    let mut session = service.start_session().unwrap();
    for section in ["hearing", "vision", "motor"] {
        let secret = session.secret_for(&id(section)).unwrap().to_string();
        service
            .submit_secret(&mut session, &id(section), &secret)
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(5)).await;
    service.stop_distraction(&session);
    service.reset_session(&mut session);
    assert_eq!(session.stage(), Stage::Intro);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(session.current_problem().is_none());
    assert_eq!(session.distraction_score(), 0);

    session.start();
    assert_eq!(session.progress().completed, 0);
    assert!(session.is_unlocked(&id("hearing")));
    assert!(!session.is_unlocked(&id("vision")));
}

#[tokio::test(start_paused = true)]
async fn custom_plan_and_pools_drive_the_run() {
    let plan = WorkshopPlan::new(vec![
        SectionTemplate::pooled("door", "Door").unwrap(),
        SectionTemplate::fixed("quiet", "Quiet room", "hush")
            .unwrap()
            .with_distraction(),
    ])
    .unwrap();
    let problems = ProblemPool::new(vec![
        Problem::new(ProblemId::new(1), ProblemKind::Math, "2 + 2", "4").unwrap(),
    ])
    .unwrap();
    let repo = InMemoryRepository::new();
    let service = WorkshopService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()))
        .with_settings(settings().with_distraction_delay(Duration::from_secs(3)))
        .with_plan(plan)
        .with_passphrases(PassphrasePool::new(["alpha", "beta", "gamma"]).unwrap())
        .with_problems(problems);
    assert_eq!(service.settings().distraction_delay(), Duration::from_secs(3));

    let mut session = service.start_session().unwrap();
    assert_eq!(session.progress().total, 2);
    let door = session.secret_for(&id("door")).unwrap().to_string();
    assert!(["ALPHA", "BETA", "GAMMA"].contains(&door.as_str()));
    service
        .submit_secret(&mut session, &id("door"), &door)
        .await
        .unwrap();
    assert!(session.distraction_active());

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(session.current_problem().unwrap().question(), "2 + 2");
    let blocked = service
        .submit_secret(&mut session, &id("quiet"), "hush")
        .await
        .unwrap();
    assert_eq!(blocked.outcome, AdvanceOutcome::Blocked);
    assert_eq!(
        service.submit_distraction_answer(&session, " 4 "),
        AnswerOutcome::Correct
    );

    let done = service
        .submit_secret(&mut session, &id("quiet"), "HUSH")
        .await
        .unwrap();
    assert_eq!(done.outcome, AdvanceOutcome::Accepted);
    assert!(done.is_complete);
    let record = repo
        .get_session_record(done.record_id.unwrap())
        .await
        .unwrap();
    assert_eq!(record.distraction_score(), 1);
    assert_eq!(record.secret_for(&id("door")), Some(door.as_str()));
}

#[tokio::test]
async fn reset_with_a_seed_still_reshuffles_pooled_secrets() {
    let repo = Arc::new(InMemoryRepository::new());
    let service = WorkshopService::new(Clock::fixed(fixed_now()), repo)
        .with_settings(WorkshopSettings::default().with_secret_seed(7));
    let pooled = |session: &services::SessionController| {
        ["vision", "motor"].map(|s| session.secret_for(&id(s)).unwrap().to_string())
    };

    let mut session = service.start_session().unwrap();
    let before = pooled(&session);
    let mut changed = false;
    for _ in 0..4 {
        service.reset_session(&mut session);
        session.start();
        changed |= pooled(&session) != before;
    }
    assert!(changed);
}
