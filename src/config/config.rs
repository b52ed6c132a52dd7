use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub openai: Option<OpenAiConfig>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub system_prompt: String,
    pub default_session_key: String,
    /// Number of prior messages sent with each turn. Zero sends the whole history.
    pub max_history_messages: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub program: String,
    pub context_lines: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful research assistant. \
Help the user understand the paper they are reading. Use the search_document tool \
to look up passages in the paper before answering questions about its content.";

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5001)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("llm.provider", "openai")?
            .set_default("llm.openai.api_base", "https://api.deepseek.com")?
            .set_default("llm.openai.api_key", "${DEEPSEEK_API_KEY}")?
            .set_default("llm.openai.default_model", "deepseek-chat")?
            .set_default("chat.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("chat.default_session_key", "default")?
            .set_default("chat.max_history_messages", 0)?
            .set_default("search.program", "rg")?
            .set_default("search.context_lines", 2)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PAPERCHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${DEEPSEEK_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.storage.upload_dir =
            PathBuf::from(expand_env(&app_config.storage.upload_dir.to_string_lossy()));

        if let Some(ref mut openai) = app_config.llm.openai {
            openai.api_key = expand_env(&openai.api_key);
            openai.api_base = expand_env(&openai.api_base);
            openai.default_model = expand_env(&openai.default_model);
        }

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| "".to_string())
    } else {
        val.to_string()
    }
}
