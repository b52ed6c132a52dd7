use std::sync::Arc;

use crate::chat::session::InMemorySessionStore;
use crate::chat::{ChatOrchestrator, ChatSettings};
use crate::config::AppConfig;
use crate::documents::annotations::AnnotationStore;
use crate::documents::converter::PdfExtractConverter;
use crate::documents::DocumentLibrary;
use crate::llm::LlmProvider;
use crate::tools::search::{RipgrepSearcher, SearchDocumentTool};
use crate::tools::ToolRegistry;

/// Everything a request handler or the terminal chat needs, wired from config.
pub struct Services {
    pub library: DocumentLibrary,
    pub annotations: AnnotationStore,
    pub orchestrator: ChatOrchestrator,
}

impl Services {
    pub fn build(config: &AppConfig, llm: Arc<dyn LlmProvider>) -> Self {
        let root = config.storage.upload_dir.clone();
        let library = DocumentLibrary::new(root.clone(), Arc::new(PdfExtractConverter));
        let annotations = AnnotationStore::new(root.clone());

        let searcher = Arc::new(RipgrepSearcher::new(
            config.search.program.clone(),
            config.search.context_lines,
        ));
        let tools = ToolRegistry::new().with_tool(Arc::new(SearchDocumentTool::new(root, searcher)));

        let orchestrator = ChatOrchestrator::new(
            llm,
            Arc::new(InMemorySessionStore::new()),
            annotations.clone(),
            tools,
            ChatSettings::from_config(config),
        );

        Self {
            library,
            annotations,
            orchestrator,
        }
    }
}
