use crate::error::{Error, Result};
use crate::services::buffer_service::{BufferSettings, DEFAULT_BUFFER_CAPACITY, DEFAULT_LOW_WATER_MARK};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub exam_name: String,
    pub questions_per_batch: usize,
    pub shuffle_options: bool,
    pub buffer_capacity: usize,
    pub low_water_mark: usize,
    pub warmup_topics: Vec<String>,
    pub data_dir: String,
    pub log_json: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            llm_api_url: get_env_or("LLM_API_URL", "https://ollama.com/api/chat"),
            llm_api_key: get_env("LLM_API_KEY")?,
            llm_model: get_env_or("LLM_MODEL", "deepseek-v3.1:671b"),
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 380)?,
            exam_name: get_env_or("EXAM_NAME", "BEL Probationary Engineer (Computer Science)"),
            questions_per_batch: get_env_parse_or("QUESTIONS_PER_BATCH", 10)?,
            shuffle_options: get_env_parse_or("SHUFFLE_OPTIONS", true)?,
            buffer_capacity: get_env_parse_or("BUFFER_CAPACITY", DEFAULT_BUFFER_CAPACITY)?,
            low_water_mark: get_env_parse_or("LOW_WATER_MARK", DEFAULT_LOW_WATER_MARK)?,
            warmup_topics: parse_topic_list(&get_env_or("WARMUP_TOPICS", "Data Structures")),
            data_dir: get_env_or("DATA_DIR", "data"),
            log_json: get_env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        };

        if config.questions_per_batch == 0 {
            return Err(Error::Config("QUESTIONS_PER_BATCH must be at least 1".to_string()));
        }
        if config.low_water_mark >= config.buffer_capacity {
            return Err(Error::Config(format!(
                "LOW_WATER_MARK ({}) must be below BUFFER_CAPACITY ({})",
                config.low_water_mark, config.buffer_capacity
            )));
        }

        Ok(config)
    }

    pub fn buffer_settings(&self) -> BufferSettings {
        BufferSettings {
            capacity: self.buffer_capacity,
            low_water_mark: self.low_water_mark,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_topic_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_list_skips_blank_entries() {
        assert_eq!(
            parse_topic_list("Data Structures, DBMS ,, "),
            vec!["Data Structures".to_string(), "DBMS".to_string()]
        );
        assert!(parse_topic_list("").is_empty());
    }
}
