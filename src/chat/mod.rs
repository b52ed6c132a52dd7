//! One chat turn: context assembly, completion, optional document search, history.

pub mod session;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::documents::base_name;
use crate::documents::annotations::{AnnotationError, AnnotationStore, Annotations};
use crate::llm::models::{ChatOptions, ChatResponse, Message, ToolDefinition};
use crate::llm::{LlmError, LlmProvider};
use crate::tools::search::SEARCH_TOOL_NAME;
use crate::tools::{ToolContext, ToolRegistry};
use session::SessionStore;

pub const NO_RESPONSE: &str = "No response";
pub const DEFAULT_SESSION_KEY: &str = "default";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Annotations(#[from] AnnotationError),
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub default_session_key: String,
    pub max_history_messages: usize,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            system_prompt: config.chat.system_prompt.clone(),
            default_session_key: config.chat.default_session_key.clone(),
            max_history_messages: config.chat.max_history_messages,
            model: None,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: crate::config::DEFAULT_SYSTEM_PROMPT.to_string(),
            default_session_key: DEFAULT_SESSION_KEY.to_string(),
            max_history_messages: 0,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

pub struct ChatOrchestrator {
    llm: Arc<dyn LlmProvider>,
    sessions: Arc<dyn SessionStore>,
    annotations: AnnotationStore,
    tools: ToolRegistry,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        sessions: Arc<dyn SessionStore>,
        annotations: AnnotationStore,
        tools: ToolRegistry,
        settings: ChatSettings,
    ) -> Self {
        Self {
            llm,
            sessions,
            annotations,
            tools,
            settings,
        }
    }

    /// Sessions are keyed by the document's base name, the same name its
    /// sidecar and extract are stored under.
    pub fn session_key<'a>(&'a self, document: Option<&'a str>) -> &'a str {
        selected_document(document).unwrap_or(self.settings.default_session_key.as_str())
    }

    pub fn history(&self, document: Option<&str>) -> Vec<Message> {
        self.sessions.get(self.session_key(document))
    }

    /// Runs one turn and returns the assistant's reply, or [`NO_RESPONSE`] when it is empty.
    pub async fn chat(&self, document: Option<&str>, user_message: &str) -> Result<String, ChatError> {
        let document = selected_document(document);
        let key = self.session_key(document).to_string();

        let annotations = match document {
            Some(doc) => self.annotations.load(doc)?,
            None => Annotations::default(),
        };

        let mut messages = self.build_messages(&key, &annotations, user_message);

        let first = self
            .llm
            .chat(&messages, self.options(Some(self.tools.get_definitions())))
            .await
            .inspect_err(|e| {
                warn!(session = %key, provider = self.llm.name(), error = %e, "Chat completion failed")
            })?;

        let executed = self.run_tool_calls(document, &first, &mut messages).await;

        let final_content = if executed > 0 {
            debug!(session = %key, tools = executed, "Requesting follow-up completion");
            self.llm
                .chat(&messages, self.options(None))
                .await
                .inspect_err(|e| {
                    warn!(session = %key, provider = self.llm.name(), error = %e, "Follow-up completion failed")
                })?
                .content
        } else {
            first.content
        };

        self.sessions.append(&key, Message::user(user_message));
        self.sessions.append(&key, Message::assistant(final_content.clone()));

        if final_content.is_empty() {
            Ok(NO_RESPONSE.to_string())
        } else {
            Ok(final_content)
        }
    }

    fn build_messages(&self, key: &str, annotations: &Annotations, user_message: &str) -> Vec<Message> {
        let mut history = self.sessions.get(key);
        let limit = self.settings.max_history_messages;
        if limit > 0 && history.len() > limit {
            history.drain(..history.len() - limit);
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt(&self.settings.system_prompt, annotations)));
        messages.extend(history);
        messages.push(Message::user(user_message));
        messages
    }

    /// Executes each requested search and appends the call/result pair. Returns
    /// how many tools ran.
    async fn run_tool_calls(
        &self,
        document: Option<&str>,
        response: &ChatResponse,
        messages: &mut Vec<Message>,
    ) -> usize {
        let ctx = ToolContext { document };
        let mut executed = 0;

        for call in &response.tool_calls {
            if call.function.name != SEARCH_TOOL_NAME {
                debug!(tool = %call.function.name, "Ignoring unsupported tool call");
                continue;
            }

            info!(tool = %call.function.name, id = %call.id, "Executing tool call");
            let output = self
                .tools
                .call_tool(&call.function.name, ctx, &call.function.arguments)
                .await;

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone(),
                vec![call.clone()],
            ));
            messages.push(Message::tool_result(call.id.clone(), output));
            executed += 1;
        }

        executed
    }

    fn options(&self, tools: Option<Vec<ToolDefinition>>) -> ChatOptions {
        ChatOptions {
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            tools,
        }
    }
}

fn selected_document(document: Option<&str>) -> Option<&str> {
    document
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| base_name(d).unwrap_or(d))
}

/// Base prompt followed by one line per highlight, then one per note.
pub fn system_prompt(base: &str, annotations: &Annotations) -> String {
    let mut prompt = base.to_string();
    for highlight in &annotations.highlights {
        prompt.push_str("\n- Highlight: ");
        prompt.push_str(&highlight.text);
    }
    for note in &annotations.notes {
        prompt.push_str("\n- Note: ");
        prompt.push_str(&note.text);
    }
    prompt
}
