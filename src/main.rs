use actix_web::{web, App, HttpServer};
use clap::Parser;
use paperchat::cli::{commands::{Cli, Commands}, run_cli};
use paperchat::config::AppConfig;
use paperchat::llm::ProviderFactory;
use paperchat::services::Services;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        let code = run_cli(cli.command, cli.config).await;
        std::process::exit(code);
    }

    info!("Starting paperchat server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let llm_provider = match ProviderFactory::create_default(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to initialize LLM provider: {}", e);
            std::process::exit(1);
        }
    };

    info!("Using LLM provider {}", llm_provider.name());
    let services = Services::build(&config, llm_provider);
    if let Err(e) = services.library.ensure_root() {
        error!("Failed to prepare upload directory: {}", e);
        std::process::exit(1);
    }
    info!("Storing documents in {}", services.library.root().display());

    let library = web::Data::new(services.library);
    let annotations = web::Data::new(services.annotations);
    let orchestrator = web::Data::new(services.orchestrator);

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(library.clone())
            .app_data(annotations.clone())
            .app_data(orchestrator.clone())
            .configure(paperchat::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
