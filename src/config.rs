use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

/// Runtime configuration, read once at startup and passed by reference
/// into `AppState::new`. Backend credentials are optional: a backend
/// with missing credentials is never added to the extraction chain.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub uploads_dir: String,
    pub gemini_api_key: Option<String>,
    pub azure_openai_key: Option<String>,
    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_deployment: Option<String>,
    pub cohere_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploaded_sheets".to_string()),
            gemini_api_key: get_env_opt("GEMINI_API_KEY"),
            azure_openai_key: get_env_opt("AZURE_OPENAI_KEY"),
            azure_openai_endpoint: get_env_opt("AZURE_OPENAI_ENDPOINT"),
            azure_openai_deployment: get_env_opt("AZURE_OPENAI_DEPLOYMENT_NAME"),
            cohere_api_key: get_env_opt("COHERE_API_KEY"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

// Empty strings count as unset so a blank line in .env does not enable a backend.
fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
