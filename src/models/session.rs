use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::{AnswerLabel, CodingProblemRecord, Difficulty, QuestionRecord};
use crate::models::test_config::{TestCategory, TestKind};

pub const SKIPPED: &str = "Skipped";
pub const MIN_ESSAY_WORDS: usize = 120;
pub const MAX_ESSAY_CHARS: usize = 2000;
pub const MAX_PRACTICE_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Dashboard,
    Test,
    Results,
    Practice,
    PracticeQuestions,
    PracticeResultsReview,
}

impl Mode {
    /// Transition table. Content-kind checks (essay vs. questions) happen when the event is applied.
    pub fn accepts(self, event: &SessionEvent) -> bool {
        use SessionEvent::*;
        match (self, event) {
            (_, GoToDashboard | GoToPractice) => true,
            (Mode::Dashboard, StartTest { .. }) => true,
            (Mode::Results, Retake) => true,
            (Mode::Practice, StartPractice { .. }) => true,
            (Mode::Test | Mode::PracticeQuestions, SubmitAnswer { .. } | SkipQuestion) => true,
            (Mode::Test, SubmitEssay { .. } | SubmitCoding { .. }) => true,
            (Mode::PracticeResultsReview, EndPractice) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dashboard => "dashboard",
            Mode::Test => "test",
            Mode::Results => "results",
            Mode::Practice => "practice",
            Mode::PracticeQuestions => "practice_questions",
            Mode::PracticeResultsReview => "practice_results_review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    GoToDashboard,
    GoToPractice,
    StartTest {
        category: TestCategory,
        #[serde(default)]
        difficulty: Difficulty,
    },
    Retake,
    StartPractice {
        category: TestCategory,
        topic: String,
        count: usize,
        #[serde(default)]
        difficulty: Difficulty,
    },
    SubmitAnswer {
        label: AnswerLabel,
    },
    SkipQuestion,
    SubmitEssay {
        text: String,
    },
    SubmitCoding {
        solutions: Vec<String>,
    },
    EndPractice,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::GoToDashboard => "go_to_dashboard",
            SessionEvent::GoToPractice => "go_to_practice",
            SessionEvent::StartTest { .. } => "start_test",
            SessionEvent::Retake => "retake",
            SessionEvent::StartPractice { .. } => "start_practice",
            SessionEvent::SubmitAnswer { .. } => "submit_answer",
            SessionEvent::SkipQuestion => "skip_question",
            SessionEvent::SubmitEssay { .. } => "submit_essay",
            SessionEvent::SubmitCoding { .. } => "submit_coding",
            SessionEvent::EndPractice => "end_practice",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestContent {
    MultipleChoice { questions: Vec<QuestionRecord> },
    Essay { topic: String },
    Coding { problems: Vec<CodingProblemRecord> },
}

impl TestContent {
    pub fn kind(&self) -> TestKind {
        match self {
            TestContent::MultipleChoice { .. } => TestKind::MultipleChoice,
            TestContent::Essay { .. } => TestKind::Essay,
            TestContent::Coding { .. } => TestKind::Coding,
        }
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        match self {
            TestContent::MultipleChoice { questions } => questions,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEntry {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl AnswerEntry {
    pub fn answered(question: &QuestionRecord, label: AnswerLabel) -> Self {
        Self {
            question: question.prompt.clone(),
            user_answer: label.to_string(),
            correct_answer: question.correct_label.to_string(),
            is_correct: question.is_correct(label),
            explanation: question.rationale.clone(),
        }
    }

    pub fn skipped(question: &QuestionRecord) -> Self {
        Self {
            question: question.prompt.clone(),
            user_answer: SKIPPED.to_string(),
            correct_answer: question.correct_label.to_string(),
            is_correct: false,
            explanation: question.rationale.clone(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.user_answer == SKIPPED
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Essay { text: String, word_count: usize },
    Coding { solutions: Vec<SolvedProblem> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedProblem {
    pub problem_title: String,
    pub user_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub test_type: String,
    pub score: f64,
}

/// One test or practice run, from generation until the session leaves it.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub category: TestCategory,
    pub difficulty: Difficulty,
    pub practice_topic: Option<String>,
    pub content: TestContent,
    pub current_question: usize,
    pub answers: Vec<AnswerEntry>,
    pub started_at: DateTime<Utc>,
    /// Practice runs are untimed.
    pub deadline: Option<DateTime<Utc>>,
    pub submission: Option<Submission>,
    pub timed_out: bool,
}

impl ActiveRun {
    pub fn is_practice(&self) -> bool {
        self.practice_topic.is_some()
    }

    pub fn current(&self) -> Option<&QuestionRecord> {
        self.content.questions().get(self.current_question)
    }

    pub fn is_finished(&self) -> bool {
        self.current_question >= self.content.questions().len()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map_or(false, |deadline| now >= deadline)
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub mode: Mode,
    pub run: Option<ActiveRun>,
    pub progress: Vec<ProgressEntry>,
    /// User-supplied provider key; overrides the server key for this session only.
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: Mode::Dashboard,
            run: None,
            progress: Vec::new(),
            api_key: None,
            created_at: now,
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
