pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    ai_service::{AIService, LlmSettings},
    attempt_service::AttemptService,
    buffer_service::{BufferSettings, QuestionBuffer},
    generator::QuestionGenerator,
};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub question_buffer: QuestionBuffer,
    pub generator: Arc<dyn QuestionGenerator>,
    pub attempt_service: AttemptService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;

        let ai_service = AIService::new(LlmSettings::from_config(config), http_client);

        Ok(Self::with_generator(
            Arc::new(ai_service),
            config.buffer_settings(),
            &config.data_dir,
        ))
    }

    pub fn with_generator(
        generator: Arc<dyn QuestionGenerator>,
        settings: BufferSettings,
        data_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            question_buffer: QuestionBuffer::new(settings),
            generator,
            attempt_service: AttemptService::new(data_dir),
        }
    }
}
