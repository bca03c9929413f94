pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    ai_service::{CompletionClient, GroqClient, LlmSettings},
    generation_service::GenerationService,
    question_bank::QuestionBank,
    session_service::{SessionService, SessionStore},
};
use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub generation_service: GenerationService,
    pub session_service: SessionService,
    /// Server-wide provider client; `None` when no API key is configured.
    pub default_client: Option<Arc<dyn CompletionClient>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let llm = LlmSettings::from(config);
        let http_client = Client::builder().timeout(llm.timeout).build()?;

        let default_client = config.groq_api_key.clone().map(|key| {
            Arc::new(GroqClient::new(key, http_client.clone(), llm.clone())) as Arc<dyn CompletionClient>
        });
        if default_client.is_none() {
            tracing::warn!("GROQ_API_KEY is not set; serving sample content unless a session supplies a key");
        }

        let bank = Arc::new(QuestionBank::builtin()?);
        tracing::info!(version = bank.version(), "question bank loaded");

        Ok(Self::from_parts(bank, default_client, http_client, llm))
    }

    pub fn from_parts(
        bank: Arc<QuestionBank>,
        default_client: Option<Arc<dyn CompletionClient>>,
        http_client: Client,
        llm: LlmSettings,
    ) -> Self {
        let generation_service = GenerationService::new(bank);
        let session_service = SessionService::new(
            SessionStore::default(),
            generation_service.clone(),
            default_client.clone(),
            http_client,
            llm,
        );

        Self {
            generation_service,
            session_service,
            default_client,
        }
    }
}
