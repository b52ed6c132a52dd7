use serde::{Deserialize, Serialize};

/// Form posted by the chat panel.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
    #[serde(default)]
    pub current_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
