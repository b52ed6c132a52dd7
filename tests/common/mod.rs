#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use paperchat::chat::session::InMemorySessionStore;
use paperchat::chat::{ChatOrchestrator, ChatSettings};
use paperchat::documents::annotations::AnnotationStore;
use paperchat::documents::converter::{ConvertError, DocumentConverter};
use paperchat::llm::models::{ChatOptions, ChatResponse, FunctionCall, Message, ToolCall, ToolDefinition};
use paperchat::llm::{LlmError, LlmProvider};
use paperchat::tools::search::{DocumentSearcher, SearchDocumentTool, SearchError};
use paperchat::tools::ToolRegistry;

pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tools: options.tools,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Api("no scripted response left".to_string())))
    }
}

pub fn reply(content: &str) -> Result<ChatResponse, LlmError> {
    Ok(ChatResponse {
        content: content.to_string(),
        model: "scripted-model".to_string(),
        ..Default::default()
    })
}

pub fn tool_request(content: &str, calls: &[(&str, &str, &str)]) -> Result<ChatResponse, LlmError> {
    Ok(ChatResponse {
        content: content.to_string(),
        model: "scripted-model".to_string(),
        usage: None,
        tool_calls: calls
            .iter()
            .map(|(id, name, arguments)| ToolCall {
                id: id.to_string(),
                r#type: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            })
            .collect(),
    })
}

/// Searcher that records its queries and answers with a fixed result.
pub struct FakeSearcher {
    output: Option<String>,
    pub queries: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeSearcher {
    pub fn returning(output: &str) -> Self {
        Self {
            output: Some(output.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentSearcher for FakeSearcher {
    async fn search(&self, path: &Path, query: &str) -> Result<String, SearchError> {
        self.queries
            .lock()
            .unwrap()
            .push((path.to_path_buf(), query.to_string()));
        match &self.output {
            Some(output) => Ok(output.clone()),
            None => Err(SearchError::Failed {
                program: "rg".to_string(),
                status: "exit status: 2".to_string(),
                stderr: "simulated failure".to_string(),
            }),
        }
    }
}

pub struct FakeConverter {
    pub text: Option<String>,
}

impl DocumentConverter for FakeConverter {
    fn convert(&self, pdf_path: &Path) -> Result<String, ConvertError> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => Err(ConvertError::Extract {
                path: pdf_path.display().to_string(),
                message: "simulated failure".to_string(),
            }),
        }
    }
}

pub struct Harness {
    pub llm: Arc<ScriptedLlm>,
    pub searcher: Arc<FakeSearcher>,
    pub sessions: Arc<InMemorySessionStore>,
    pub orchestrator: ChatOrchestrator,
}

pub fn harness(root: &Path, llm: ScriptedLlm, searcher: FakeSearcher) -> Harness {
    harness_with_settings(
        root,
        llm,
        searcher,
        ChatSettings {
            system_prompt: "You help with papers.".to_string(),
            ..ChatSettings::default()
        },
    )
}

pub fn harness_with_settings(
    root: &Path,
    llm: ScriptedLlm,
    searcher: FakeSearcher,
    settings: ChatSettings,
) -> Harness {
    let llm = Arc::new(llm);
    let searcher = Arc::new(searcher);
    let sessions = Arc::new(InMemorySessionStore::new());
    let tools = ToolRegistry::new().with_tool(Arc::new(SearchDocumentTool::new(root, searcher.clone())));

    let orchestrator = ChatOrchestrator::new(
        llm.clone(),
        sessions.clone(),
        AnnotationStore::new(root),
        tools,
        settings,
    );

    Harness {
        llm,
        searcher,
        sessions,
        orchestrator,
    }
}
