pub mod commands;

use std::io::{self, Write};
use std::path::Path;

use crate::cli::commands::Commands;
use crate::config::AppConfig;
use crate::documents::annotations::AnnotationStore;
use crate::documents::converter::PdfExtractConverter;
use crate::documents::DocumentLibrary;
use crate::llm::ProviderFactory;
use crate::services::Services;

/// Runs every subcommand except `serve`. Returns the process exit code.
pub async fn run_cli(command: Commands, config_path: String) -> i32 {
    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return 1;
        }
    };
    let root = config.storage.upload_dir.clone();

    match command {
        Commands::Serve => {
            eprintln!("serve is handled by the server entry point");
            1
        }
        Commands::Documents => {
            let library = DocumentLibrary::new(root, std::sync::Arc::new(PdfExtractConverter));
            match library.list() {
                Ok(names) if names.is_empty() => {
                    println!("No documents uploaded.");
                    0
                }
                Ok(names) => {
                    for name in names {
                        println!("{}", name);
                    }
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::Annotations { document } => {
            let store = AnnotationStore::new(root);
            let rendered = store
                .load(&document)
                .map_err(|e| e.to_string())
                .and_then(|a| serde_json::to_string_pretty(&a).map_err(|e| e.to_string()));
            match rendered {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::Convert { path } => {
            let library = DocumentLibrary::new(root, std::sync::Arc::new(PdfExtractConverter));
            let bytes = match std::fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", path, e);
                    return 1;
                }
            };
            let file_name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(path);
            match library.ingest(&file_name, &bytes).await {
                Ok(stored) => {
                    println!("Converted {} into {}", stored, library.root().display());
                    0
                }
                Err(e) => {
                    eprintln!("Conversion failed: {}", e);
                    1
                }
            }
        }
        Commands::Chat { document } => run_repl(document, config).await,
    }
}

async fn run_repl(document: Option<String>, config: AppConfig) -> i32 {
    let llm = match ProviderFactory::create_default(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to init LLM provider: {}", e);
            return 1;
        }
    };
    let services = Services::build(&config, llm);
    let orchestrator = services.orchestrator;

    println!("--- Paperchat Terminal Chat ---");
    println!(
        "Session: {}",
        orchestrator.session_key(document.as_deref())
    );
    println!("Type /exit to quit.");
    println!("-------------------------------");

    let stdin = io::stdin();
    loop {
        print!("\nUser> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return 1;
            }
        }
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        match orchestrator.chat(document.as_deref(), text).await {
            Ok(reply) => println!("Assistant> {}", reply),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    0
}
