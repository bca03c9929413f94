use crate::models::question::Difficulty;
use crate::models::test_config::TestCategory;

const RECORD_RULES: &str = "Each question must have 4 options labelled 'A) ', 'B) ', 'C) ', 'D) ' and include the correct answer letter (e.g., 'A') with an explanation.
Format the whole reply as a single JSON array of objects. Each object must have 'question', 'options' (an array of 4 strings), 'correct_answer' (a single letter 'A','B','C','D'), and 'explanation' keys.
Do not add any text before or after the array.";

const ENGLISH_USAGE: &str = r#"Generate {count} {difficulty} multiple choice questions for '{topic}' for a CSE employability test.
{rules}
Make questions practical and relevant to technical communication. Ensure options are distinct and plausible.
Example format:
[
    {
        "question": "Which of the following is an example of an article?",
        "options": ["A) quickly", "B) and", "C) the", "D) run"],
        "correct_answer": "C",
        "explanation": "The word 'the' is a definite article."
    }
]"#;

const ANALYTICAL_REASONING: &str = r#"Generate {count} {difficulty} analytical reasoning questions for '{topic}' for a CSE employability test.
{rules}
Focus on logical thinking and problem-solving skills, and give a detailed explanation.
Example format:
[
    {
        "question": "If all A are B, and all B are C, then all A are what?",
        "options": ["A) B", "B) C", "C) D", "D) A"],
        "correct_answer": "B",
        "explanation": "Since all A are B and all B are C, it follows that all A are C."
    }
]"#;

const QUANTITATIVE_ABILITY: &str = r#"Generate {count} {difficulty} quantitative ability questions for '{topic}' for a CSE employability test.
{rules}
Include numerical problems with a step-by-step solution in the explanation.
Example format:
[
    {
        "question": "What is 20% of 150?",
        "options": ["A) 20", "B) 30", "C) 40", "D) 50"],
        "correct_answer": "B",
        "explanation": "(20/100) * 150 = 0.20 * 150 = 30."
    }
]"#;

const DOMAIN_DSA: &str = r#"Generate {count} {difficulty} Data Structures and Algorithms questions for '{topic}' for a CSE employability test.
{rules}
Focus on practical DSA concepts and implementation.
Example format:
[
    {
        "question": "Which data structure uses LIFO principle?",
        "options": ["A) Queue", "B) Stack", "C) Linked List", "D) Array"],
        "correct_answer": "B",
        "explanation": "A stack follows Last-In, First-Out: the last element added is the first removed."
    }
]"#;

pub const CODING_PROBLEMS: &str = r#"Generate 2 coding problems for a CSE employability test.
Each problem must have: 'title', 'description', 'difficulty' (Easy/Medium/Hard), and 'example' (showing input and expected output).
Focus on fundamental programming concepts like arrays, strings, loops, and basic algorithms.
Format as a JSON array of objects. Each object must have these exact keys.
Example format:
[
    {
        "title": "Reverse a String",
        "description": "Write a function that takes a string as input and returns the string reversed.",
        "difficulty": "Easy",
        "example": "Input: 'hello'\nOutput: 'olleh'"
    },
    {
        "title": "Find Largest Element in Array",
        "description": "Write a function that finds and returns the largest element in an array of integers.",
        "difficulty": "Easy",
        "example": "Input: [3, 1, 4, 1, 5, 9, 2, 6]\nOutput: 9"
    }
]"#;

pub const ESSAY_TOPIC: &str = "Generate a concise and thought-provoking essay topic for CSE students' employability test.
The topic should be related to technology, engineering, or professional development.
Return only the topic title, without any introductory or concluding remarks.";

/// Question-generation prompt for `category`, or `None` when the category is not multiple choice.
pub fn question_prompt(
    category: TestCategory,
    topic: &str,
    count: usize,
    difficulty: Difficulty,
) -> Option<String> {
    let template = match category {
        TestCategory::EnglishUsage => ENGLISH_USAGE,
        TestCategory::AnalyticalReasoning => ANALYTICAL_REASONING,
        TestCategory::QuantitativeAbility => QUANTITATIVE_ABILITY,
        TestCategory::DomainDsa => DOMAIN_DSA,
        TestCategory::WrittenEnglish | TestCategory::Coding => return None,
    };

    Some(
        template
            .replace("{rules}", RECORD_RULES)
            .replace("{count}", &count.to_string())
            .replace("{difficulty}", &difficulty.as_str().to_lowercase())
            .replace("{topic}", topic),
    )
}
