use clap::{Parser, Subcommand};
use tutor_chat::Result;
use tutor_chat::commands::{clear_history, run_ask, run_chat, show_history};
use tutor_chat::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "tutor-chat")]
#[command(about = "A chat assistant with document-grounded answers and persistent memory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Ask a single question and exit
    Ask {
        /// The question to ask
        question: String,
    },
    /// Configure API endpoint, models, and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Show or clear the stored conversation history
    History {
        /// Delete the stored conversation history
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat => {
            run_chat()?;
        }
        Commands::Ask { question } => {
            run_ask(&question)?;
        }
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::History { clear } => {
            if clear {
                clear_history()?;
            } else {
                show_history()?;
            }
        }
    }

    Ok(())
}
