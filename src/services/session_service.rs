use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dto::session_dto::SessionView;
use crate::error::{Error, Result};
use crate::models::question::Difficulty;
use crate::models::session::{
    word_count, ActiveRun, AnswerEntry, Mode, ProgressEntry, SessionEvent, SessionState,
    SolvedProblem, Submission, TestContent, MAX_ESSAY_CHARS, MAX_PRACTICE_QUESTIONS,
    MIN_ESSAY_WORDS,
};
use crate::models::test_config::{TestCategory, TestKind};
use crate::services::ai_service::{CompletionClient, GroqClient, LlmSettings};
use crate::services::generation_service::{GenerationNotice, GenerationService};
use crate::services::grading_service::{GradingService, ProgressSummary};
use crate::utils::time::{deadline_after, iso_date};

type SharedSession = Arc<Mutex<SessionState>>;

/// In-memory sessions. The per-session mutex is held for the whole of one event,
/// generation included, so events on one session never interleave.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub async fn insert(&self, state: SessionState) -> SharedSession {
        let id = state.id;
        let shared = Arc::new(Mutex::new(state));
        self.sessions.write().await.insert(id, shared.clone());
        shared
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", id)))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: SessionStore,
    generation: GenerationService,
    default_client: Option<Arc<dyn CompletionClient>>,
    http_client: reqwest::Client,
    llm: LlmSettings,
}

impl SessionService {
    pub fn new(
        store: SessionStore,
        generation: GenerationService,
        default_client: Option<Arc<dyn CompletionClient>>,
        http_client: reqwest::Client,
        llm: LlmSettings,
    ) -> Self {
        Self {
            store,
            generation,
            default_client,
            http_client,
            llm,
        }
    }

    pub async fn create(&self, now: DateTime<Utc>) -> SessionView {
        let shared = self.store.insert(SessionState::new(now)).await;
        let state = shared.lock().await;
        tracing::info!(session = %state.id, "session created");
        SessionView::from_state(&state, now)
    }

    /// Current view; an expired test is moved to results first.
    pub async fn view(&self, id: Uuid, now: DateTime<Utc>) -> Result<SessionView> {
        let shared = self.store.get(id).await?;
        let mut state = shared.lock().await;
        expire_if_due(&mut state, now);
        Ok(SessionView::from_state(&state, now))
    }

    pub async fn progress(&self, id: Uuid, now: DateTime<Utc>) -> Result<ProgressSummary> {
        let shared = self.store.get(id).await?;
        let mut state = shared.lock().await;
        expire_if_due(&mut state, now);
        Ok(GradingService::summarize_progress(&state.progress))
    }

    pub async fn set_api_key(
        &self,
        id: Uuid,
        api_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SessionView> {
        let shared = self.store.get(id).await?;
        let mut state = shared.lock().await;
        state.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        tracing::info!(session = %id, has_key = state.api_key.is_some(), "session API key updated");
        Ok(SessionView::from_state(&state, now))
    }

    /// Applies one event. Rejected events leave the session exactly as it was.
    pub async fn apply(
        &self,
        id: Uuid,
        event: SessionEvent,
        now: DateTime<Utc>,
    ) -> Result<SessionView> {
        let shared = self.store.get(id).await?;
        let mut guard = shared.lock().await;
        let state = &mut *guard;

        expire_if_due(state, now);
        if !state.mode.accepts(&event) {
            return Err(Error::Conflict(format!(
                "Cannot {} while in {} mode",
                event.name(),
                state.mode.as_str()
            )));
        }

        let from = state.mode;
        let event_name = event.name();
        let mut notices = Vec::new();

        match event {
            SessionEvent::GoToDashboard => {
                state.run = None;
                state.mode = Mode::Dashboard;
            }
            SessionEvent::GoToPractice => {
                state.run = None;
                state.mode = Mode::Practice;
            }
            SessionEvent::StartTest {
                category,
                difficulty,
            } => {
                let (run, generated) = self.start_test_run(state, category, difficulty, now).await?;
                notices = generated;
                state.run = Some(run);
                state.mode = Mode::Test;
            }
            SessionEvent::Retake => {
                let (category, difficulty) = state
                    .run
                    .as_ref()
                    .map(|r| (r.category, r.difficulty))
                    .ok_or_else(|| Error::Conflict("There is no finished test to retake".into()))?;
                let (run, generated) = self.start_test_run(state, category, difficulty, now).await?;
                notices = generated;
                state.run = Some(run);
                state.mode = Mode::Test;
            }
            SessionEvent::StartPractice {
                category,
                topic,
                count,
                difficulty,
            } => {
                validate_practice(category, &topic, count)?;
                let client = self.client_for(state);
                let generated = self
                    .generation
                    .generate(client.as_deref(), category, &topic, count, difficulty)
                    .await?;
                notices = generated.notices;
                state.run = Some(ActiveRun {
                    category,
                    difficulty,
                    practice_topic: Some(topic),
                    content: TestContent::MultipleChoice {
                        questions: generated.content,
                    },
                    current_question: 0,
                    answers: Vec::new(),
                    started_at: now,
                    deadline: None,
                    submission: None,
                    timed_out: false,
                });
                state.mode = Mode::PracticeQuestions;
            }
            SessionEvent::SubmitAnswer { label } => {
                record_answer(state, now, |q| AnswerEntry::answered(q, label))?;
            }
            SessionEvent::SkipQuestion => {
                record_answer(state, now, AnswerEntry::skipped)?;
            }
            SessionEvent::SubmitEssay { text } => {
                submit_essay(state, text, now)?;
            }
            SessionEvent::SubmitCoding { solutions } => {
                submit_coding(state, solutions, now)?;
            }
            SessionEvent::EndPractice => {
                state.run = None;
                state.mode = Mode::Practice;
            }
        }

        if from != state.mode {
            tracing::info!(
                session = %state.id,
                event = event_name,
                from = from.as_str(),
                to = state.mode.as_str(),
                "session transition"
            );
        }

        Ok(SessionView::from_state(state, now).with_notices(notices))
    }

    /// The session's own key when set, otherwise the server-wide client.
    pub fn client_for(&self, state: &SessionState) -> Option<Arc<dyn CompletionClient>> {
        match &state.api_key {
            Some(key) => Some(Arc::new(GroqClient::new(
                key.clone(),
                self.http_client.clone(),
                self.llm.clone(),
            ))),
            None => self.default_client.clone(),
        }
    }

    async fn start_test_run(
        &self,
        state: &SessionState,
        category: TestCategory,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<(ActiveRun, Vec<GenerationNotice>)> {
        let client = self.client_for(state);
        let client = client.as_deref();

        let (content, notices) = match category.kind() {
            TestKind::MultipleChoice => {
                let generated = self
                    .generation
                    .generate_test_questions(client, category, difficulty)
                    .await?;
                (
                    TestContent::MultipleChoice {
                        questions: generated.content,
                    },
                    generated.notices,
                )
            }
            TestKind::Essay => {
                let generated = self.generation.generate_essay_topic(client).await?;
                (
                    TestContent::Essay {
                        topic: generated.content,
                    },
                    generated.notices,
                )
            }
            TestKind::Coding => {
                let generated = self.generation.generate_coding_problems(client).await?;
                (
                    TestContent::Coding {
                        problems: generated.content,
                    },
                    generated.notices,
                )
            }
        };

        let run = ActiveRun {
            category,
            difficulty,
            practice_topic: None,
            content,
            current_question: 0,
            answers: Vec::new(),
            started_at: now,
            deadline: Some(deadline_after(now, category.config().time_limit_minutes)),
            submission: None,
            timed_out: false,
        };
        Ok((run, notices))
    }
}

fn validate_practice(category: TestCategory, topic: &str, count: usize) -> Result<()> {
    if !category.is_multiple_choice() {
        return Err(Error::BadRequest(format!("{} has no practice mode", category)));
    }
    if !category.config().topics.contains(&topic) {
        return Err(Error::BadRequest(format!("'{}' is not a topic of {}", topic, category)));
    }
    if count == 0 || count > MAX_PRACTICE_QUESTIONS {
        return Err(Error::BadRequest(format!(
            "Practice sessions have between 1 and {} questions",
            MAX_PRACTICE_QUESTIONS
        )));
    }
    Ok(())
}

fn expire_if_due(state: &mut SessionState, now: DateTime<Utc>) {
    if state.mode != Mode::Test {
        return;
    }
    let expired = state.run.as_ref().map_or(false, |run| run.is_expired(now));
    if expired {
        if let Some(run) = state.run.as_mut() {
            run.timed_out = true;
        }
        tracing::info!(session = %state.id, "time limit reached");
        finish_test(state, now);
    }
}

/// Enters results. Runs exactly once per test, so progress gets one entry per graded test.
fn finish_test(state: &mut SessionState, now: DateTime<Utc>) {
    state.mode = Mode::Results;
    let Some(run) = state.run.as_ref() else {
        return;
    };
    if let TestContent::MultipleChoice { questions } = &run.content {
        let summary = GradingService::summarize_mcq(&run.answers, questions.len());
        state.progress.push(ProgressEntry {
            date: iso_date(now),
            test_type: run.category.name().to_string(),
            score: summary.percentage,
        });
    }
}

fn record_answer(
    state: &mut SessionState,
    now: DateTime<Utc>,
    entry: impl FnOnce(&crate::models::question::QuestionRecord) -> AnswerEntry,
) -> Result<()> {
    let run = state
        .run
        .as_mut()
        .ok_or_else(|| Error::Conflict("No test in progress".into()))?;
    if run.content.kind() != TestKind::MultipleChoice {
        return Err(Error::Conflict(format!(
            "{} has no multiple-choice questions",
            run.category
        )));
    }
    let answer = run
        .current()
        .map(entry)
        .ok_or_else(|| Error::Conflict("All questions have been answered".into()))?;
    run.answers.push(answer);
    run.current_question += 1;

    if run.is_finished() {
        if run.is_practice() {
            state.mode = Mode::PracticeResultsReview;
        } else {
            finish_test(state, now);
        }
    }
    Ok(())
}

fn submit_essay(state: &mut SessionState, text: String, now: DateTime<Utc>) -> Result<()> {
    let run = state
        .run
        .as_mut()
        .ok_or_else(|| Error::Conflict("No test in progress".into()))?;
    if run.content.kind() != TestKind::Essay {
        return Err(Error::Conflict(format!("{} does not take an essay", run.category)));
    }
    let words = word_count(&text);
    if words < MIN_ESSAY_WORDS {
        return Err(Error::BadRequest(format!(
            "Essay must be at least {} words long, got {}",
            MIN_ESSAY_WORDS, words
        )));
    }
    if text.chars().count() > MAX_ESSAY_CHARS {
        return Err(Error::BadRequest(format!(
            "Essay must be at most {} characters long",
            MAX_ESSAY_CHARS
        )));
    }
    run.submission = Some(Submission::Essay {
        text,
        word_count: words,
    });
    finish_test(state, now);
    Ok(())
}

fn submit_coding(state: &mut SessionState, solutions: Vec<String>, now: DateTime<Utc>) -> Result<()> {
    let run = state
        .run
        .as_mut()
        .ok_or_else(|| Error::Conflict("No test in progress".into()))?;
    let problems = match &run.content {
        TestContent::Coding { problems } => problems,
        _ => {
            return Err(Error::Conflict(format!(
                "{} does not take code submissions",
                run.category
            )))
        }
    };
    if solutions.len() != problems.len() || solutions.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::BadRequest(
            "Please provide solutions for all problems before submitting".into(),
        ));
    }
    let solved = problems
        .iter()
        .zip(solutions)
        .map(|(problem, code)| SolvedProblem {
            problem_title: problem.title.clone(),
            user_code: code,
        })
        .collect();
    run.submission = Some(Submission::Coding { solutions: solved });
    finish_test(state, now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerLabel;
    use crate::services::ai_service::MockCompletionClient;
    use crate::services::question_bank::QuestionBank;
    use chrono::Duration;

    fn service_with(client: Option<Arc<dyn CompletionClient>>) -> SessionService {
        let bank = Arc::new(QuestionBank::builtin().unwrap());
        SessionService::new(
            SessionStore::default(),
            GenerationService::new(bank),
            client,
            reqwest::Client::new(),
            LlmSettings::default(),
        )
    }

    fn service() -> SessionService {
        service_with(None)
    }

    fn start(category: TestCategory) -> SessionEvent {
        SessionEvent::StartTest {
            category,
            difficulty: Difficulty::Easy,
        }
    }

    fn essay(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[tokio::test]
    async fn new_sessions_start_on_the_dashboard() {
        let svc = service();
        let view = svc.create(Utc::now()).await;
        assert_eq!(view.mode, Mode::Dashboard);
        assert!(view.run.is_none());
        assert_eq!(svc.store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let err = service().view(Uuid::new_v4(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn full_mcq_run_records_progress_once() {
        let svc = service();
        let now = Utc::now();
        let id = svc.create(now).await.id;

        let view = svc.apply(id, start(TestCategory::EnglishUsage), now).await.unwrap();
        assert_eq!(view.mode, Mode::Test);
        let run = view.run.unwrap();
        assert_eq!(run.total_questions, 20);
        assert_eq!(run.remaining_seconds, Some(30 * 60));
        assert!(!view.notices.is_empty());

        for i in 0..20 {
            let event = if i % 2 == 0 {
                SessionEvent::SubmitAnswer { label: AnswerLabel::B }
            } else {
                SessionEvent::SkipQuestion
            };
            svc.apply(id, event, now).await.unwrap();
        }

        let view = svc.view(id, now).await.unwrap();
        assert_eq!(view.mode, Mode::Results);
        assert!(view.results.is_some());

        // Reading results again must not add another progress entry.
        svc.view(id, now).await.unwrap();
        let progress = svc.progress(id, now).await.unwrap();
        assert_eq!(progress.tests_completed, 1);
        assert_eq!(progress.entries[0].test_type, "English Usage Test");
    }

    #[tokio::test]
    async fn illegal_events_are_rejected_without_side_effects() {
        let svc = service();
        let now = Utc::now();
        let id = svc.create(now).await.id;

        let err = svc.apply(id, SessionEvent::Retake, now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = svc
            .apply(id, SessionEvent::SubmitAnswer { label: AnswerLabel::A }, now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        assert_eq!(svc.view(id, now).await.unwrap().mode, Mode::Dashboard);
    }

    #[tokio::test]
    async fn deadline_moves_the_test_to_results() {
        let svc = service();
        let start_at = Utc::now();
        let id = svc.create(start_at).await.id;
        svc.apply(id, start(TestCategory::DomainDsa), start_at).await.unwrap();
        svc.apply(id, SessionEvent::SubmitAnswer { label: AnswerLabel::C }, start_at)
            .await
            .unwrap();

        let late = start_at + Duration::minutes(45);
        let err = svc.apply(id, SessionEvent::SkipQuestion, late).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let view = svc.view(id, late).await.unwrap();
        assert_eq!(view.mode, Mode::Results);
        match view.results.unwrap() {
            crate::dto::session_dto::ResultsView::MultipleChoice { summary, timed_out, review } => {
                assert!(timed_out);
                assert_eq!(review.len(), 1);
                assert_eq!(summary.total, 25);
            }
            other => panic!("unexpected results {:?}", other),
        }
        assert_eq!(svc.progress(id, late).await.unwrap().tests_completed, 1);
    }

    #[tokio::test]
    async fn essay_needs_enough_words() {
        let svc = service();
        let now = Utc::now();
        let id = svc.create(now).await.id;
        let view = svc.apply(id, start(TestCategory::WrittenEnglish), now).await.unwrap();
        assert!(view.run.unwrap().essay_topic.is_some());

        let err = svc
            .apply(id, SessionEvent::SubmitEssay { text: essay(119) }, now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = svc
            .apply(id, SessionEvent::SkipQuestion, now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let view = svc
            .apply(id, SessionEvent::SubmitEssay { text: essay(120) }, now)
            .await
            .unwrap();
        assert_eq!(view.mode, Mode::Results);
        // Essays are not scored.
        assert_eq!(svc.progress(id, now).await.unwrap().tests_completed, 0);
    }

    #[tokio::test]
    async fn coding_requires_every_solution() {
        let svc = service();
        let now = Utc::now();
        let id = svc.create(now).await.id;
        svc.apply(id, start(TestCategory::Coding), now).await.unwrap();

        let err = svc
            .apply(id, SessionEvent::SubmitCoding { solutions: vec!["print(1)".into(), "  ".into()] }, now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let view = svc
            .apply(id, SessionEvent::SubmitCoding { solutions: vec!["a".into(), "b".into()] }, now)
            .await
            .unwrap();
        assert_eq!(view.mode, Mode::Results);

        let view = svc.apply(id, SessionEvent::Retake, now).await.unwrap();
        assert_eq!(view.mode, Mode::Test);
        assert_eq!(view.run.unwrap().coding_problems.map(|p| p.len()), Some(2));
    }

    #[tokio::test]
    async fn practice_flow_ends_in_review_without_progress() {
        let svc = service();
        let now = Utc::now();
        let id = svc.create(now).await.id;
        svc.apply(id, SessionEvent::GoToPractice, now).await.unwrap();

        let bad_topic = SessionEvent::StartPractice {
            category: TestCategory::QuantitativeAbility,
            topic: "Poetry".into(),
            count: 3,
            difficulty: Difficulty::Easy,
        };
        assert!(matches!(svc.apply(id, bad_topic, now).await.unwrap_err(), Error::BadRequest(_)));

        let view = svc
            .apply(
                id,
                SessionEvent::StartPractice {
                    category: TestCategory::QuantitativeAbility,
                    topic: "Statistics".into(),
                    count: 3,
                    difficulty: Difficulty::Easy,
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(view.mode, Mode::PracticeQuestions);
        assert!(view.run.as_ref().unwrap().deadline.is_none());

        for _ in 0..3 {
            svc.apply(id, SessionEvent::SubmitAnswer { label: AnswerLabel::B }, now)
                .await
                .unwrap();
        }
        let view = svc.view(id, now + Duration::hours(5)).await.unwrap();
        assert_eq!(view.mode, Mode::PracticeResultsReview);

        let view = svc.apply(id, SessionEvent::EndPractice, now).await.unwrap();
        assert_eq!(view.mode, Mode::Practice);
        assert!(view.run.is_none());
        assert_eq!(svc.progress(id, now).await.unwrap().tests_completed, 0);
    }

    #[tokio::test]
    async fn empty_bank_keeps_the_previous_mode() {
        let bank = Arc::new(QuestionBank::from_parts(HashMap::new(), vec![], vec![]));
        let svc = SessionService::new(
            SessionStore::default(),
            GenerationService::new(bank),
            None,
            reqwest::Client::new(),
            LlmSettings::default(),
        );
        let now = Utc::now();
        let id = svc.create(now).await.id;

        let err = svc.apply(id, start(TestCategory::AnalyticalReasoning), now).await.unwrap_err();
        assert!(matches!(err, Error::NoContent(_)));
        assert_eq!(svc.view(id, now).await.unwrap().mode, Mode::Dashboard);
    }

    #[tokio::test]
    async fn default_client_is_used_until_a_session_key_is_set() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Ok("\"Open Source as a Career Path\"".to_string()));
        let svc = service_with(Some(Arc::new(mock)));
        let now = Utc::now();
        let id = svc.create(now).await.id;

        let view = svc.apply(id, start(TestCategory::WrittenEnglish), now).await.unwrap();
        assert_eq!(
            view.run.unwrap().essay_topic.as_deref(),
            Some("Open Source as a Career Path")
        );

        let view = svc.set_api_key(id, Some("  gsk-user ".into()), now).await.unwrap();
        assert!(view.has_api_key);
        let cleared = svc.set_api_key(id, Some("   ".into()), now).await.unwrap();
        assert!(!cleared.has_api_key);
    }
}
