use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::question::{CodingProblemRecord, Difficulty, QuestionRecord};
use crate::models::test_config::TestCategory;
use crate::services::extractor::RecordSchema;

const BUILTIN_BANK: &str = include_str!("../../data/question_bank.json");

#[derive(Debug, Deserialize)]
struct BankDocument {
    version: u32,
    questions: HashMap<TestCategory, Vec<QuestionRecord>>,
    coding_problems: Vec<CodingProblemRecord>,
    essay_topics: Vec<String>,
}

/// Hand-authored fallback content, keyed by test category and difficulty.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    version: u32,
    questions: HashMap<TestCategory, Vec<QuestionRecord>>,
    coding_problems: Vec<CodingProblemRecord>,
    essay_topics: Vec<String>,
}

impl QuestionBank {
    /// The bank compiled into the binary from `data/question_bank.json`.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_BANK)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: BankDocument = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid question bank: {}", e)))?;
        let bank = Self {
            version: doc.version,
            questions: doc.questions,
            coding_problems: doc.coding_problems,
            essay_topics: doc.essay_topics,
        };
        bank.check_records()?;
        Ok(bank)
    }

    pub fn from_parts(
        questions: HashMap<TestCategory, Vec<QuestionRecord>>,
        coding_problems: Vec<CodingProblemRecord>,
        essay_topics: Vec<String>,
    ) -> Self {
        Self {
            version: 0,
            questions,
            coding_problems,
            essay_topics,
        }
    }

    /// Bank records are the reference shape for generated ones, so they must pass the same checks.
    fn check_records(&self) -> Result<()> {
        for (category, records) in &self.questions {
            if !category.is_multiple_choice() {
                return Err(Error::Config(format!(
                    "Question bank v{} holds multiple-choice records for {}",
                    self.version, category
                )));
            }
            for record in records {
                if record.difficulty.is_none() {
                    return Err(Error::Config(format!(
                        "Question bank v{}: '{}' has no difficulty",
                        self.version, record.prompt
                    )));
                }
                check_shape(record, RecordSchema::Question, &record.prompt)?;
            }
        }
        for problem in &self.coding_problems {
            check_shape(problem, RecordSchema::CodingProblem, &problem.title)?;
        }
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Records of `category` at `difficulty`; `None` is the "Any" wildcard.
    pub fn pool(&self, category: TestCategory, difficulty: Option<Difficulty>) -> Vec<&QuestionRecord> {
        self.questions
            .get(&category)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| difficulty.is_none() || r.difficulty == difficulty)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sample(
        &self,
        category: TestCategory,
        difficulty: Option<Difficulty>,
        count: usize,
    ) -> Vec<QuestionRecord> {
        self.sample_with_rng(category, difficulty, count, &mut rand::thread_rng())
    }

    /// Exactly `count` records when the pool is non-empty, an empty vector otherwise.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        category: TestCategory,
        difficulty: Option<Difficulty>,
        count: usize,
        rng: &mut R,
    ) -> Vec<QuestionRecord> {
        let pool = self.pool(category, difficulty);
        sample_with_repetition(&pool, count, rng)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn sample_coding_problems(&self, count: usize) -> Vec<CodingProblemRecord> {
        self.sample_coding_problems_with_rng(count, &mut rand::thread_rng())
    }

    pub fn sample_coding_problems_with_rng<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Vec<CodingProblemRecord> {
        sample_with_repetition(&self.coding_problems, count, rng)
    }

    pub fn random_essay_topic(&self) -> Option<String> {
        self.essay_topics.choose(&mut rand::thread_rng()).cloned()
    }
}

fn check_shape<T: serde::Serialize>(record: &T, schema: RecordSchema, label: &str) -> Result<()> {
    let accepted = match serde_json::to_value(record)? {
        JsonValue::Object(map) => schema.accepts(&map),
        _ => false,
    };
    if accepted {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Question bank record '{}' does not satisfy its schema",
            label
        )))
    }
}

/// Draws `count` items from `pool`.
///
/// Without replacement while the pool is large enough. Otherwise every item is
/// taken `count / pool.len()` times, the remainder is a random subset of the
/// pool, and the whole result is shuffled.
pub fn sample_with_repetition<T: Clone, R: Rng + ?Sized>(
    pool: &[T],
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    if pool.is_empty() || count == 0 {
        return Vec::new();
    }
    if count <= pool.len() {
        return pool.choose_multiple(rng, count).cloned().collect();
    }

    let full_copies = count / pool.len();
    let remainder = count % pool.len();

    let mut picked = Vec::with_capacity(count);
    for _ in 0..full_copies {
        picked.extend_from_slice(pool);
    }
    picked.extend(pool.choose_multiple(rng, remainder).cloned());
    picked.shuffle(rng);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerLabel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(prompt: &str, difficulty: Difficulty) -> QuestionRecord {
        QuestionRecord {
            prompt: prompt.to_string(),
            choices: vec!["A) 1".into(), "B) 2".into(), "C) 3".into(), "D) 4".into()],
            correct_label: AnswerLabel::A,
            rationale: String::new(),
            difficulty: Some(difficulty),
        }
    }

    fn numbered_bank(easy: usize, hard: usize) -> QuestionBank {
        let mut records = Vec::new();
        for i in 0..easy {
            records.push(record(&format!("easy-{}", i), Difficulty::Easy));
        }
        for i in 0..hard {
            records.push(record(&format!("hard-{}", i), Difficulty::Hard));
        }
        let mut questions = HashMap::new();
        questions.insert(TestCategory::DomainDsa, records);
        QuestionBank::from_parts(questions, vec![], vec![])
    }

    fn occurrences(records: &[QuestionRecord], prompt: &str) -> usize {
        records.iter().filter(|r| r.prompt == prompt).count()
    }

    #[test]
    fn builtin_bank_loads_and_covers_every_difficulty() {
        let bank = QuestionBank::builtin().expect("builtin bank");
        assert!(bank.version() >= 1);
        for category in TestCategory::ALL.iter().filter(|c| c.is_multiple_choice()) {
            for difficulty in Difficulty::ALL {
                assert!(
                    !bank.pool(*category, Some(difficulty)).is_empty(),
                    "{} has no {} records",
                    category,
                    difficulty
                );
            }
        }
        assert!(bank.sample_coding_problems(2).len() == 2);
        assert!(bank.random_essay_topic().is_some());
    }

    #[test]
    fn quantitative_hard_pool_is_repeated_to_fill_the_request() {
        let bank = QuestionBank::builtin().unwrap();
        let category: TestCategory = "Quantitative Ability Test".parse().unwrap();
        let pool = bank.pool(category, Some(Difficulty::Hard));
        assert_eq!(pool.len(), 2);

        let sampled = bank.sample(category, Some(Difficulty::Hard), 5);
        assert_eq!(sampled.len(), 5);
        for record in pool {
            assert!(occurrences(&sampled, &record.prompt) >= 2);
        }
        assert!(sampled.iter().all(|r| r.difficulty == Some(Difficulty::Hard)));
    }

    #[test]
    fn small_requests_are_distinct_and_match_the_filter() {
        let bank = numbered_bank(6, 3);
        let mut rng = StdRng::seed_from_u64(7);
        for count in 1..=6 {
            let sampled = bank.sample_with_rng(TestCategory::DomainDsa, Some(Difficulty::Easy), count, &mut rng);
            assert_eq!(sampled.len(), count);
            assert!(sampled.iter().all(|r| r.difficulty == Some(Difficulty::Easy)));
            let mut prompts: Vec<_> = sampled.iter().map(|r| r.prompt.clone()).collect();
            prompts.sort();
            prompts.dedup();
            assert_eq!(prompts.len(), count);
        }
    }

    #[test]
    fn large_requests_repeat_every_record_at_least_floor_times() {
        let bank = numbered_bank(3, 0);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sampled = bank.sample_with_rng(TestCategory::DomainDsa, Some(Difficulty::Easy), 4, &mut rng);
            assert_eq!(sampled.len(), 4);
            for i in 0..3 {
                assert!(occurrences(&sampled, &format!("easy-{}", i)) >= 1);
            }

            // 8 = 2 full copies of 3 plus a remainder of 2.
            let sampled = bank.sample_with_rng(TestCategory::DomainDsa, Some(Difficulty::Easy), 8, &mut rng);
            assert_eq!(sampled.len(), 8);
            let counts: Vec<usize> = (0..3)
                .map(|i| occurrences(&sampled, &format!("easy-{}", i)))
                .collect();
            assert!(counts.iter().all(|c| (2..=3).contains(c)), "seed {}: {:?}", seed, counts);
            assert_eq!(counts.iter().filter(|c| **c == 3).count(), 2);
        }
    }

    #[test]
    fn repeated_output_is_shuffled_not_blocked() {
        let bank = numbered_bank(10, 0);
        let mut rng = StdRng::seed_from_u64(42);
        let sampled = bank.sample_with_rng(TestCategory::DomainDsa, Some(Difficulty::Easy), 30, &mut rng);

        let blocked: Vec<String> = (0..3)
            .flat_map(|_| (0..10).map(|i| format!("easy-{}", i)))
            .collect();
        let got: Vec<String> = sampled.iter().map(|r| r.prompt.clone()).collect();
        assert_eq!(got.len(), 30);
        assert_ne!(got, blocked);
        for i in 0..10 {
            assert_eq!(occurrences(&sampled, &format!("easy-{}", i)), 3);
        }
    }

    #[test]
    fn any_difficulty_selects_the_whole_category() {
        let bank = numbered_bank(2, 2);
        assert_eq!(bank.pool(TestCategory::DomainDsa, None).len(), 4);
        let sampled = bank.sample(TestCategory::DomainDsa, None, 4);
        assert_eq!(sampled.len(), 4);
    }

    #[test]
    fn missing_combinations_yield_nothing() {
        let bank = numbered_bank(2, 0);
        assert!(bank.sample(TestCategory::DomainDsa, Some(Difficulty::Medium), 5).is_empty());
        assert!(bank.sample(TestCategory::EnglishUsage, None, 5).is_empty());
        assert!(bank.sample(TestCategory::DomainDsa, Some(Difficulty::Easy), 0).is_empty());
    }

    #[test]
    fn bank_rejects_records_that_fail_the_schema() {
        let raw = r#"{
            "version": 1,
            "questions": {
                "Domain Test (DSA)": [
                    {"question": "Q", "options": ["A) 1", "B) 2", "C) 3"], "correct_answer": "A", "explanation": "", "difficulty": "Easy"}
                ]
            },
            "coding_problems": [],
            "essay_topics": []
        }"#;
        assert!(matches!(QuestionBank::from_json(raw), Err(Error::Config(_))));
    }

    #[test]
    fn bank_rejects_records_without_difficulty() {
        let raw = r#"{
            "version": 1,
            "questions": {
                "Domain Test (DSA)": [
                    {"question": "Q", "options": ["A) 1", "B) 2", "C) 3", "D) 4"], "correct_answer": "A", "explanation": ""}
                ]
            },
            "coding_problems": [],
            "essay_topics": []
        }"#;
        assert!(QuestionBank::from_json(raw).is_err());
    }

    #[test]
    fn coding_problems_repeat_when_the_set_is_small() {
        let problem = CodingProblemRecord {
            title: "Two Sum".into(),
            description: "d".into(),
            difficulty: Difficulty::Easy,
            example: "e".into(),
        };
        let bank = QuestionBank::from_parts(HashMap::new(), vec![problem.clone()], vec![]);
        assert_eq!(bank.sample_coding_problems(2), vec![problem.clone(), problem]);
        assert!(bank.random_essay_topic().is_none());
    }
}
