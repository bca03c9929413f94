//! Recovery of structured records from free-form LLM output.
//!
//! Extraction runs in two tiers. The array scan takes everything from the
//! first `[` to the last `]` and parses it as one JSON array; the span is
//! deliberately greedy so that nested `options` arrays never cut it short.
//! When that fails, the object scan looks for objects opening on the schema's
//! anchor key and parses each one on its own, skipping the broken ones.
//!
//! Extraction only guarantees syntactically valid JSON objects. Whether a
//! record is usable is decided separately by [`validate`].

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

use crate::models::question::{AnswerLabel, CodingProblemRecord, Difficulty, QuestionRecord};

pub type RawRecord = Map<String, JsonValue>;

pub const CHOICE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSchema {
    Question,
    CodingProblem,
}

impl RecordSchema {
    /// Key a well-formed object of this schema starts with.
    pub fn anchor_key(&self) -> &'static str {
        match self {
            RecordSchema::Question => "question",
            RecordSchema::CodingProblem => "title",
        }
    }

    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            RecordSchema::Question => &["question", "options", "correct_answer", "explanation"],
            RecordSchema::CodingProblem => &["title", "description", "difficulty", "example"],
        }
    }

    fn anchor_pattern(&self) -> &'static Regex {
        static QUESTION_ANCHOR: OnceLock<Regex> = OnceLock::new();
        static TITLE_ANCHOR: OnceLock<Regex> = OnceLock::new();

        let (cell, key) = match self {
            RecordSchema::Question => (&QUESTION_ANCHOR, "question"),
            RecordSchema::CodingProblem => (&TITLE_ANCHOR, "title"),
        };
        cell.get_or_init(|| {
            Regex::new(&format!(r#"\{{\s*"{}"\s*:"#, key)).expect("anchor pattern is a valid regex")
        })
    }

    /// Whether `record` satisfies every structural rule of this schema.
    pub fn accepts(&self, record: &RawRecord) -> bool {
        let has_required = self
            .required_keys()
            .iter()
            .all(|key| record.get(*key).map_or(false, |v| !v.is_null()));
        if !has_required {
            return false;
        }

        match self {
            RecordSchema::Question => question_shape_ok(record),
            RecordSchema::CodingProblem => coding_problem_shape_ok(record),
        }
    }
}

fn question_shape_ok(record: &RawRecord) -> bool {
    let prompt_ok = record
        .get("question")
        .and_then(|v| v.as_str())
        .map_or(false, |s| !s.trim().is_empty());
    if !prompt_ok || !record["explanation"].is_string() {
        return false;
    }

    let choices: Vec<&str> = match record["options"].as_array() {
        Some(arr) if arr.len() == CHOICE_COUNT => match arr.iter().map(|v| v.as_str()).collect() {
            Some(choices) => choices,
            None => return false,
        },
        _ => return false,
    };

    // Labels must read A, B, C, D in position order, so the key letter names exactly one choice.
    let labels_in_order = choices
        .iter()
        .zip(AnswerLabel::ALL)
        .all(|(choice, expected)| AnswerLabel::from_choice(choice) == Some(expected));

    labels_in_order
        && record["correct_answer"]
            .as_str()
            .and_then(AnswerLabel::from_letter)
            .is_some()
}

fn coding_problem_shape_ok(record: &RawRecord) -> bool {
    let text_fields_ok = ["title", "description", "example"]
        .iter()
        .all(|key| record[*key].is_string());
    text_fields_ok
        && record["difficulty"]
            .as_str()
            .map_or(false, |d| d.parse::<Difficulty>().is_ok())
}

/// A typed record that can be recovered from generated text.
pub trait SchemaRecord: DeserializeOwned {
    const SCHEMA: RecordSchema;
}

impl SchemaRecord for QuestionRecord {
    const SCHEMA: RecordSchema = RecordSchema::Question;
}

impl SchemaRecord for CodingProblemRecord {
    const SCHEMA: RecordSchema = RecordSchema::CodingProblem;
}

/// Recovers candidate records from `raw_text`. Never fails: no structure means an empty vector.
pub fn extract(raw_text: &str, schema: RecordSchema) -> Vec<RawRecord> {
    if let Some(records) = scan_array(raw_text) {
        tracing::debug!(count = records.len(), "array scan recovered records");
        return records;
    }

    let records = scan_objects(raw_text, schema);
    tracing::debug!(
        count = records.len(),
        anchor = schema.anchor_key(),
        "object scan recovered records"
    );
    records
}

/// Keeps the records that satisfy `schema`, in their original order.
pub fn validate(records: Vec<RawRecord>, schema: RecordSchema) -> Vec<RawRecord> {
    let total = records.len();
    let valid: Vec<RawRecord> = records.into_iter().filter(|r| schema.accepts(r)).collect();
    if valid.len() < total {
        tracing::debug!(dropped = total - valid.len(), kept = valid.len(), "dropped invalid records");
    }
    valid
}

/// Extract, validate and deserialize in one go.
pub fn parse_records<T: SchemaRecord>(raw_text: &str) -> Vec<T> {
    validate(extract(raw_text, T::SCHEMA), T::SCHEMA)
        .into_iter()
        .filter_map(|record| serde_json::from_value(JsonValue::Object(record)).ok())
        .collect()
}

fn scan_array(text: &str) -> Option<Vec<RawRecord>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }

    let items = match serde_json::from_str::<JsonValue>(&text[start..=end]) {
        Ok(JsonValue::Array(items)) => items,
        _ => return None,
    };

    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            JsonValue::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    // An array of plain strings is a lone `options` list, not a record array.
    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}

fn scan_objects(text: &str, schema: RecordSchema) -> Vec<RawRecord> {
    schema
        .anchor_pattern()
        .find_iter(text)
        .filter_map(|m| {
            let mut stream =
                serde_json::Deserializer::from_str(&text[m.start()..]).into_iter::<JsonValue>();
            match stream.next() {
                Some(Ok(JsonValue::Object(map))) => Some(map),
                _ => None,
            }
        })
        .collect()
}
