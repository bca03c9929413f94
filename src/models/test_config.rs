use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestCategory {
    #[serde(rename = "English Usage Test")]
    EnglishUsage,
    #[serde(rename = "Analytical Reasoning Test")]
    AnalyticalReasoning,
    #[serde(rename = "Quantitative Ability Test")]
    QuantitativeAbility,
    #[serde(rename = "Written English Test")]
    WrittenEnglish,
    #[serde(rename = "Coding Test")]
    Coding,
    #[serde(rename = "Domain Test (DSA)")]
    DomainDsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    MultipleChoice,
    Essay,
    Coding,
}

#[derive(Debug, Clone, Copy)]
pub struct TestConfig {
    pub topics: &'static [&'static str],
    pub time_limit_minutes: u32,
    pub question_count: usize,
    pub icon: &'static str,
    pub kind: TestKind,
}

const ENGLISH_USAGE: TestConfig = TestConfig {
    topics: &[
        "Articles, Prepositions and Voice",
        "Phrases, Idioms and Sequencing",
        "Reading Comprehension",
        "Sentence Correction and Speech",
        "Synonyms, Antonyms and Spellings",
    ],
    time_limit_minutes: 30,
    question_count: 20,
    icon: "📚",
    kind: TestKind::MultipleChoice,
};

const ANALYTICAL_REASONING: TestConfig = TestConfig {
    topics: &[
        "Logical Reasoning",
        "Critical Reasoning",
        "Flowcharts and Visual Reasoning",
        "Odd One Out and Analogies",
        "Series and Coding-Decoding",
    ],
    time_limit_minutes: 45,
    question_count: 25,
    icon: "🧠",
    kind: TestKind::MultipleChoice,
};

const QUANTITATIVE_ABILITY: TestConfig = TestConfig {
    topics: &[
        "Speed, Distance, Time and Work",
        "Profit, Loss and Interest",
        "Ratio, Percentage and Progressions",
        "Number System, Algebra and Equations",
        "Geometry, Mensuration and Trigonometry",
        "Statistics",
        "Data Interpretation",
    ],
    time_limit_minutes: 60,
    question_count: 30,
    icon: "📊",
    kind: TestKind::MultipleChoice,
};

const WRITTEN_ENGLISH: TestConfig = TestConfig {
    topics: &["Essay Writing (min. 120 words)"],
    time_limit_minutes: 30,
    question_count: 1,
    icon: "✍️",
    kind: TestKind::Essay,
};

const CODING: TestConfig = TestConfig {
    topics: &["Programming Problems", "Algorithm Implementation"],
    time_limit_minutes: 90,
    question_count: 2,
    icon: "💻",
    kind: TestKind::Coding,
};

const DOMAIN_DSA: TestConfig = TestConfig {
    topics: &[
        "Data Structures",
        "Algorithms",
        "Time Complexity",
        "Space Complexity",
    ],
    time_limit_minutes: 45,
    question_count: 25,
    icon: "🔧",
    kind: TestKind::MultipleChoice,
};

impl TestCategory {
    pub const ALL: [TestCategory; 6] = [
        TestCategory::EnglishUsage,
        TestCategory::AnalyticalReasoning,
        TestCategory::QuantitativeAbility,
        TestCategory::WrittenEnglish,
        TestCategory::Coding,
        TestCategory::DomainDsa,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TestCategory::EnglishUsage => "English Usage Test",
            TestCategory::AnalyticalReasoning => "Analytical Reasoning Test",
            TestCategory::QuantitativeAbility => "Quantitative Ability Test",
            TestCategory::WrittenEnglish => "Written English Test",
            TestCategory::Coding => "Coding Test",
            TestCategory::DomainDsa => "Domain Test (DSA)",
        }
    }

    pub fn config(&self) -> &'static TestConfig {
        match self {
            TestCategory::EnglishUsage => &ENGLISH_USAGE,
            TestCategory::AnalyticalReasoning => &ANALYTICAL_REASONING,
            TestCategory::QuantitativeAbility => &QUANTITATIVE_ABILITY,
            TestCategory::WrittenEnglish => &WRITTEN_ENGLISH,
            TestCategory::Coding => &CODING,
            TestCategory::DomainDsa => &DOMAIN_DSA,
        }
    }

    pub fn kind(&self) -> TestKind {
        self.config().kind
    }

    pub fn is_multiple_choice(&self) -> bool {
        self.kind() == TestKind::MultipleChoice
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestCategory::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| format!("unknown test category '{}'", s))
    }
}
