use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::question::{CodingProblemRecord, Difficulty, QuestionRecord};
use crate::models::test_config::TestCategory;
use crate::services::ai_service::CompletionClient;
use crate::services::extractor::{parse_records, SchemaRecord};
use crate::services::prompts;
use crate::services::question_bank::{sample_with_repetition, QuestionBank};

pub const CODING_PROBLEM_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Provider,
    Bank,
    /// Some topics of a graded test came from the provider, others from the bank.
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ProviderUnavailable,
    MalformedResponse,
    ProviderCallFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl GenerationNotice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Generated<T> {
    pub content: T,
    pub source: ContentSource,
    pub notices: Vec<GenerationNotice>,
}

#[derive(Clone)]
pub struct GenerationService {
    bank: Arc<QuestionBank>,
}

impl GenerationService {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Up to `count` questions for one topic.
    ///
    /// Zero usable records from the provider means a full bank fallback of
    /// exactly `count`. A short but non-empty provider batch is returned as is.
    pub async fn generate(
        &self,
        client: Option<&dyn CompletionClient>,
        category: TestCategory,
        topic: &str,
        count: usize,
        difficulty: Difficulty,
    ) -> Result<Generated<Vec<QuestionRecord>>> {
        if count == 0 {
            return Err(Error::BadRequest("At least one question must be requested".into()));
        }
        let prompt = prompts::question_prompt(category, topic, count, difficulty).ok_or_else(|| {
            Error::BadRequest(format!("Question generation is not available for {}", category))
        })?;

        let mut notices = Vec::new();
        let what = format!("{} - {}", category, topic);
        let generated: Vec<QuestionRecord> =
            request_records(client, &prompt, &what, &mut notices).await;

        if !generated.is_empty() {
            tracing::info!(
                category = %category,
                topic,
                requested = count,
                received = generated.len(),
                "using generated questions"
            );
            let content = if generated.len() > count {
                sample_with_repetition(&generated, count, &mut rand::thread_rng())
            } else {
                generated
            };
            return Ok(Generated {
                content,
                source: ContentSource::Provider,
                notices,
            });
        }

        let fallback = self.bank.sample(category, Some(difficulty), count);
        if fallback.is_empty() {
            tracing::error!(category = %category, %difficulty, "question bank has no records");
            return Err(Error::NoContent(format!("{} ({})", category, difficulty)));
        }
        tracing::warn!(category = %category, topic, count, "using sample questions");
        Ok(Generated {
            content: fallback,
            source: ContentSource::Bank,
            notices,
        })
    }

    /// Full content of a graded multiple-choice test, spread across the category's topics.
    pub async fn generate_test_questions(
        &self,
        client: Option<&dyn CompletionClient>,
        category: TestCategory,
        difficulty: Difficulty,
    ) -> Result<Generated<Vec<QuestionRecord>>> {
        if !category.is_multiple_choice() {
            return Err(Error::BadRequest(format!("{} is not a multiple-choice test", category)));
        }
        let config = category.config();

        let mut questions = Vec::with_capacity(config.question_count);
        let mut notices: Vec<GenerationNotice> = Vec::new();
        let mut sources = Vec::new();

        for (topic, count) in topic_counts(config.topics, config.question_count) {
            let generated = self.generate(client, category, topic, count, difficulty).await?;
            questions.extend(generated.content);
            sources.push(generated.source);
            for notice in generated.notices {
                if !notices.contains(&notice) {
                    notices.push(notice);
                }
            }
        }

        questions.shuffle(&mut rand::thread_rng());
        questions.truncate(config.question_count);
        if questions.is_empty() {
            return Err(Error::NoContent(format!("{} ({})", category, difficulty)));
        }

        let source = if sources.iter().all(|s| *s == ContentSource::Provider) {
            ContentSource::Provider
        } else if sources.iter().all(|s| *s == ContentSource::Bank) {
            ContentSource::Bank
        } else {
            ContentSource::Mixed
        };

        Ok(Generated {
            content: questions,
            source,
            notices,
        })
    }

    pub async fn generate_coding_problems(
        &self,
        client: Option<&dyn CompletionClient>,
    ) -> Result<Generated<Vec<CodingProblemRecord>>> {
        let mut notices = Vec::new();
        let generated: Vec<CodingProblemRecord> =
            request_records(client, prompts::CODING_PROBLEMS, "coding problems", &mut notices).await;

        if !generated.is_empty() {
            let content = if generated.len() > CODING_PROBLEM_COUNT {
                sample_with_repetition(&generated, CODING_PROBLEM_COUNT, &mut rand::thread_rng())
            } else {
                generated
            };
            return Ok(Generated {
                content,
                source: ContentSource::Provider,
                notices,
            });
        }

        let fallback = self.bank.sample_coding_problems(CODING_PROBLEM_COUNT);
        if fallback.is_empty() {
            return Err(Error::NoContent(TestCategory::Coding.to_string()));
        }
        tracing::warn!("using sample coding problems");
        Ok(Generated {
            content: fallback,
            source: ContentSource::Bank,
            notices,
        })
    }

    pub async fn generate_essay_topic(
        &self,
        client: Option<&dyn CompletionClient>,
    ) -> Result<Generated<String>> {
        let mut notices = Vec::new();

        let generated = match client {
            None => {
                notices.push(unavailable_notice());
                None
            }
            Some(client) => match client.complete(prompts::ESSAY_TOPIC).await {
                Ok(raw) => {
                    let topic = raw.trim().replace('"', "").trim().to_string();
                    if topic.is_empty() {
                        notices.push(GenerationNotice::new(
                            NoticeKind::MalformedResponse,
                            "AI response did not contain an essay topic. Using a sample topic.",
                        ));
                        None
                    } else {
                        Some(topic)
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "essay topic generation failed");
                    notices.push(call_failure_notice("essay topic", &e));
                    None
                }
            },
        };

        if let Some(topic) = generated {
            return Ok(Generated {
                content: topic,
                source: ContentSource::Provider,
                notices,
            });
        }

        let topic = self
            .bank
            .random_essay_topic()
            .ok_or_else(|| Error::NoContent(TestCategory::WrittenEnglish.to_string()))?;
        Ok(Generated {
            content: topic,
            source: ContentSource::Bank,
            notices,
        })
    }
}

/// One provider call; every failure mode collapses into an empty batch plus a notice.
async fn request_records<T: SchemaRecord>(
    client: Option<&dyn CompletionClient>,
    prompt: &str,
    what: &str,
    notices: &mut Vec<GenerationNotice>,
) -> Vec<T> {
    let client = match client {
        Some(client) => client,
        None => {
            tracing::warn!(what, "no completion client configured");
            notices.push(unavailable_notice());
            return Vec::new();
        }
    };

    match client.complete(prompt).await {
        Ok(raw) => {
            let records = parse_records::<T>(&raw);
            if records.is_empty() {
                tracing::warn!(what, response_len = raw.len(), "no valid records in AI response");
                notices.push(GenerationNotice::new(
                    NoticeKind::MalformedResponse,
                    format!(
                        "AI generated content for {} was malformed or empty after validation. Using samples.",
                        what
                    ),
                ));
            }
            records
        }
        Err(e) => {
            tracing::error!(what, error = ?e, "completion request failed");
            notices.push(call_failure_notice(what, &e));
            Vec::new()
        }
    }
}

fn unavailable_notice() -> GenerationNotice {
    GenerationNotice::new(
        NoticeKind::ProviderUnavailable,
        "Groq API key is missing or invalid. Using sample content.",
    )
}

fn call_failure_notice(what: &str, err: &Error) -> GenerationNotice {
    GenerationNotice::new(
        NoticeKind::ProviderCallFailure,
        format!("Error generating {} from Groq: {}. Using samples.", what, err),
    )
}

/// Even split of `total` across `topics`, remainder going to the first topics.
fn topic_counts(topics: &'static [&'static str], total: usize) -> Vec<(&'static str, usize)> {
    if topics.is_empty() {
        return Vec::new();
    }
    let base = total / topics.len();
    let mut remaining = total % topics.len();

    topics
        .iter()
        .map(|topic| {
            let mut count = base;
            if remaining > 0 {
                count += 1;
                remaining -= 1;
            }
            (*topic, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}
