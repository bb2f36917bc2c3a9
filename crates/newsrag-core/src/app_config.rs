use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory holding `{query}_{epoch_ms}.jsonl` article dumps.
    pub dump_dir: PathBuf,
    /// Directory holding persisted `.nrix` vector indexes.
    pub index_dir: PathBuf,
    pub dump_max_age_hours: u64,
    pub tei_url: String,
    pub embed_batch_size: usize,
    pub max_chunk_words: usize,
    pub top_k: usize,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("dump_dir", &self.dump_dir)
            .field("index_dir", &self.index_dir)
            .field("dump_max_age_hours", &self.dump_max_age_hours)
            .field("tei_url", &self.tei_url)
            .field("embed_batch_size", &self.embed_batch_size)
            .field("max_chunk_words", &self.max_chunk_words)
            .field("top_k", &self.top_k)
            .field("llm_api_key", &"[redacted]")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
