pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    evaluation_service::EvaluationService, extraction_service::ExtractionService,
};
use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub evaluation_service: EvaluationService,
    pub uploads_dir: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let extraction_service = ExtractionService::from_config(config, http_client);
        let evaluation_service = EvaluationService::new(extraction_service);

        Self {
            evaluation_service,
            uploads_dir: config.uploads_dir.clone(),
        }
    }
}
