use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::documents::{base_name, extract_file_name};
use crate::llm::models::{function_type, FunctionDefinition, ToolDefinition};
use crate::tools::{Tool, ToolContext};

pub const SEARCH_TOOL_NAME: &str = "search_document";
pub const NO_RESULTS: &str = "No results found";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Line-oriented text search over a single file.
#[async_trait]
pub trait DocumentSearcher: Send + Sync {
    /// Matching lines with surrounding context. An empty string means no match.
    async fn search(&self, path: &Path, query: &str) -> Result<String, SearchError>;
}

/// Case-insensitive search through a `rg` subprocess.
pub struct RipgrepSearcher {
    program: String,
    context_lines: u32,
}

impl RipgrepSearcher {
    pub fn new(program: impl Into<String>, context_lines: u32) -> Self {
        Self {
            program: program.into(),
            context_lines,
        }
    }
}

impl Default for RipgrepSearcher {
    fn default() -> Self {
        Self::new("rg", 2)
    }
}

#[async_trait]
impl DocumentSearcher for RipgrepSearcher {
    async fn search(&self, path: &Path, query: &str) -> Result<String, SearchError> {
        let output = tokio::process::Command::new(&self.program)
            .arg("--ignore-case")
            .arg("--context")
            .arg(self.context_lines.to_string())
            .arg("-e")
            .arg(query)
            .arg(path)
            .output()
            .await
            .map_err(|source| SearchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // rg exits 1 when nothing matched.
        match output.status.code() {
            Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
            _ => Err(SearchError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct SearchArguments {
    query: String,
}

/// The `search_document` tool: searches the text extract of the selected document.
pub struct SearchDocumentTool {
    root: PathBuf,
    searcher: Arc<dyn DocumentSearcher>,
}

impl SearchDocumentTool {
    pub fn new(root: impl Into<PathBuf>, searcher: Arc<dyn DocumentSearcher>) -> Self {
        Self {
            root: root.into(),
            searcher,
        }
    }

    pub fn extract_path(&self, document: &str) -> Option<PathBuf> {
        base_name(document).map(|name| self.root.join(extract_file_name(name)))
    }
}

#[async_trait]
impl Tool for SearchDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            r#type: function_type(),
            function: FunctionDefinition {
                name: SEARCH_TOOL_NAME.to_string(),
                description: "Search the current document content using ripgrep. Use this when you need to find specific information or verify claims in the paper.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query"
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }

    async fn call(&self, ctx: ToolContext<'_>, arguments: &str) -> String {
        let args: SearchArguments = match serde_json::from_str(arguments) {
            Ok(a) => a,
            Err(e) => return format!("Error parsing arguments: {}", e),
        };

        let Some(document) = ctx.document else {
            return "Error: no document is selected".to_string();
        };
        let Some(path) = self.extract_path(document) else {
            return format!("Error: invalid document name '{}'", document);
        };

        info!(document, query = %args.query, "Searching document");
        match self.searcher.search(&path, &args.query).await {
            Ok(output) if output.trim().is_empty() => NO_RESULTS.to_string(),
            Ok(output) => output,
            Err(e) => {
                warn!(document, error = %e, "Document search failed");
                format!("Error running search: {}", e)
            }
        }
    }
}
