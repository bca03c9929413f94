pub mod ai_service;
pub mod extractor;
pub mod generation_service;
pub mod grading_service;
pub mod prompts;
pub mod question_bank;
pub mod session_service;
