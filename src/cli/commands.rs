use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "paperchat", version, about = "Read, annotate and chat about PDF papers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Chat about a document in the terminal
    Chat {
        /// Stored document to discuss; omit to use the default session
        #[arg(short, long)]
        document: Option<String>,
    },

    /// Import a PDF into the upload directory and extract its text
    Convert {
        /// Path to the PDF
        path: String,
    },

    /// List stored documents
    Documents,

    /// Print the annotations of a document as JSON
    Annotations {
        document: String,
    },
}
