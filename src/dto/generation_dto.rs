use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::Difficulty;
use crate::models::test_config::TestCategory;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateQuestionsRequest {
    pub category: TestCategory,
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(range(min = 1, max = 50))]
    pub count: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
}
