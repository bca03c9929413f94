use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{CodingProblemRecord, Difficulty, QuestionRecord};
use crate::models::session::{
    ActiveRun, AnswerEntry, Mode, SessionState, Submission, TestContent,
};
use crate::models::test_config::{TestCategory, TestKind};
use crate::services::generation_service::GenerationNotice;
use crate::services::grading_service::{GradingService, McqSummary};
use crate::utils::time::remaining_seconds;

/// A question as shown while it is being answered; the key and rationale stay server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&QuestionRecord> for QuestionView {
    fn from(record: &QuestionRecord) -> Self {
        Self {
            question: record.prompt.clone(),
            options: record.choices.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub category: TestCategory,
    pub kind: TestKind,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_topic: Option<String>,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub remaining_seconds: Option<i64>,
    pub total_questions: usize,
    pub answered: usize,
    pub current_question: Option<QuestionView>,
    /// Feedback for the most recent answer, shown right after it is submitted.
    pub last_answer: Option<AnswerEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essay_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding_problems: Option<Vec<CodingProblemRecord>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultsView {
    MultipleChoice {
        summary: McqSummary,
        review: Vec<AnswerEntry>,
        timed_out: bool,
    },
    Essay {
        topic: String,
        submission: Option<Submission>,
        timed_out: bool,
    },
    Coding {
        problems: Vec<CodingProblemRecord>,
        submission: Option<Submission>,
        timed_out: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub mode: Mode,
    pub has_api_key: bool,
    pub run: Option<RunView>,
    pub results: Option<ResultsView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<GenerationNotice>,
}

impl SessionView {
    pub fn from_state(state: &SessionState, now: DateTime<Utc>) -> Self {
        let run = state.run.as_ref();
        let results = match state.mode {
            Mode::Results | Mode::PracticeResultsReview => run.map(results_view),
            _ => None,
        };

        Self {
            id: state.id,
            mode: state.mode,
            has_api_key: state.api_key.is_some(),
            run: run.map(|r| run_view(r, now)),
            results,
            notices: Vec::new(),
        }
    }

    pub fn with_notices(mut self, notices: Vec<GenerationNotice>) -> Self {
        self.notices = notices;
        self
    }
}

fn run_view(run: &ActiveRun, now: DateTime<Utc>) -> RunView {
    let (essay_topic, coding_problems) = match &run.content {
        TestContent::Essay { topic } => (Some(topic.clone()), None),
        TestContent::Coding { problems } => (None, Some(problems.clone())),
        TestContent::MultipleChoice { .. } => (None, None),
    };

    RunView {
        category: run.category,
        kind: run.content.kind(),
        difficulty: run.difficulty,
        practice_topic: run.practice_topic.clone(),
        started_at: run.started_at,
        deadline: run.deadline,
        remaining_seconds: run.deadline.map(|d| remaining_seconds(d, now)),
        total_questions: run.content.questions().len(),
        answered: run.answers.len(),
        current_question: run.current().map(QuestionView::from),
        last_answer: run.answers.last().cloned(),
        essay_topic,
        coding_problems,
    }
}

fn results_view(run: &ActiveRun) -> ResultsView {
    match &run.content {
        TestContent::MultipleChoice { questions } => ResultsView::MultipleChoice {
            summary: GradingService::summarize_mcq(&run.answers, questions.len()),
            review: run.answers.clone(),
            timed_out: run.timed_out,
        },
        TestContent::Essay { topic } => ResultsView::Essay {
            topic: topic.clone(),
            submission: run.submission.clone(),
            timed_out: run.timed_out,
        },
        TestContent::Coding { problems } => ResultsView::Coding {
            problems: problems.clone(),
            submission: run.submission.clone(),
            timed_out: run.timed_out,
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetApiKeyRequest {
    /// `null` or blank clears the key.
    #[validate(length(max = 200))]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: TestCategory,
    pub icon: &'static str,
    pub kind: TestKind,
    pub time_limit_minutes: u32,
    pub question_count: usize,
    pub topics: Vec<&'static str>,
}

impl From<TestCategory> for CatalogEntry {
    fn from(category: TestCategory) -> Self {
        let config = category.config();
        Self {
            name: category,
            icon: config.icon,
            kind: config.kind,
            time_limit_minutes: config.time_limit_minutes,
            question_count: config.question_count,
            topics: config.topics.to_vec(),
        }
    }
}
