use serde::Serialize;

use crate::models::session::{AnswerEntry, ProgressEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McqSummary {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub tests_completed: usize,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    pub entries: Vec<ProgressEntry>,
}

pub struct GradingService;

impl GradingService {
    pub fn grade(percentage: f64) -> Grade {
        if percentage >= 80.0 {
            Grade::A
        } else if percentage >= 60.0 {
            Grade::B
        } else {
            Grade::C
        }
    }

    /// Questions never reached before the deadline count against the total.
    pub fn summarize_mcq(answers: &[AnswerEntry], total_questions: usize) -> McqSummary {
        let correct = answers.iter().filter(|a| a.is_correct).count();
        let percentage = if total_questions > 0 {
            correct as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };

        McqSummary {
            correct,
            total: total_questions,
            percentage,
            grade: Self::grade(percentage),
        }
    }

    pub fn summarize_progress(entries: &[ProgressEntry]) -> ProgressSummary {
        let scores: Vec<f64> = entries.iter().map(|e| e.score).collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        let best_score = scores.iter().copied().fold(None, |best: Option<f64>, s| {
            Some(best.map_or(s, |b| b.max(s)))
        });

        ProgressSummary {
            tests_completed: entries.len(),
            average_score,
            best_score,
            entries: entries.to_vec(),
        }
    }
}
