use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

// Any letter case: generated problems come back as "easy", "HARD", ...
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Position label of a multiple-choice option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLabel {
    A,
    B,
    C,
    D,
}

impl AnswerLabel {
    pub const ALL: [AnswerLabel; 4] = [AnswerLabel::A, AnswerLabel::B, AnswerLabel::C, AnswerLabel::D];

    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "A" => Some(AnswerLabel::A),
            "B" => Some(AnswerLabel::B),
            "C" => Some(AnswerLabel::C),
            "D" => Some(AnswerLabel::D),
            _ => None,
        }
    }

    /// Reads the label token an option starts with: `"B) text"`, `"B. text"` or `"B: text"`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        let mut chars = choice.trim_start().chars();
        let letter = chars.next()?;
        let separator = chars.next()?;
        if !matches!(separator, ')' | '.' | ':') {
            return None;
        }
        let mut buf = [0u8; 4];
        Self::from_letter(letter.encode_utf8(&mut buf))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerLabel::A => "A",
            AnswerLabel::B => "B",
            AnswerLabel::C => "C",
            AnswerLabel::D => "D",
        }
    }
}

impl fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Generated records sometimes carry an off-list label ("Moderate"); only bank records rely on it.
fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_str().and_then(|s| s.parse().ok())))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(rename = "options")]
    pub choices: Vec<String>,
    #[serde(rename = "correct_answer")]
    pub correct_label: AnswerLabel,
    #[serde(rename = "explanation")]
    pub rationale: String,
    #[serde(
        default,
        deserialize_with = "lenient_difficulty",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<Difficulty>,
}

impl QuestionRecord {
    pub fn is_correct(&self, label: AnswerLabel) -> bool {
        self.correct_label == label
    }

    pub fn choice_for(&self, label: AnswerLabel) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| AnswerLabel::from_choice(c) == Some(label))
            .map(|c| c.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingProblemRecord {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub example: String,
}
