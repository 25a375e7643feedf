use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, ConfigError, OpenRouterConfig};
use crate::openrouter::OpenRouterClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Tutor Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("API Configuration").bold().yellow());
    eprintln!("Configure the OpenRouter (or OpenAI-compatible) endpoint.");
    eprintln!();

    configure_openrouter(&mut config.openrouter)?;
    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match test_connection(&config) {
        Ok(()) => eprintln!("{}", style("✓ API connection successful!").green()),
        Err(e) => {
            eprintln!("{}", style("⚠ Warning: Could not reach the API").yellow());
            eprintln!("  {}", e);
            eprintln!("You can continue, but chat will fail until this is fixed.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("API Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openrouter.base_url).cyan());
    eprintln!(
        "  API Key Env: {}",
        style(&config.openrouter.api_key_env).cyan()
    );
    eprintln!(
        "  Chat Model: {}",
        style(&config.openrouter.chat_model).cyan()
    );
    eprintln!(
        "  Embedding Model: {}",
        style(&config.openrouter.embedding_model).cyan()
    );
    eprintln!(
        "  Embed Batch Size: {}",
        style(config.openrouter.batch_size).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!("  Chunk Size: {}", style(config.retrieval.chunk_size).cyan());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!(
        "History file: {}",
        style(config.history_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    match Config::load() {
        Ok(config) => {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        }
        Err(_) => {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                openrouter: OpenRouterConfig::default(),
                retrieval: crate::retrieval::RetrievalConfig::default(),
                base_dir: super::get_config_dir()?,
            })
        }
    }
}

fn configure_openrouter(openrouter: &mut OpenRouterConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openrouter.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OpenRouterConfig {
                base_url: input.clone(),
                ..OpenRouterConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;
    openrouter.base_url = base_url;

    openrouter.api_key_env = Input::new()
        .with_prompt("API key environment variable")
        .default(openrouter.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Variable name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    openrouter.chat_model = Input::new()
        .with_prompt("Chat model")
        .default(openrouter.chat_model.clone())
        .interact_text()?;

    openrouter.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(openrouter.embedding_model.clone())
        .interact_text()?;

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    eprintln!();
    eprintln!("{}", style("Retrieval Configuration").bold().yellow());

    config.retrieval.chunk_size = Input::new()
        .with_prompt("Chunk size (characters)")
        .default(config.retrieval.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=10_000).contains(input) {
                Ok(())
            } else {
                Err("Chunk size must be between 1 and 10000")
            }
        })
        .interact_text()?;

    config.retrieval.top_k = Input::new()
        .with_prompt("Chunks retrieved per query")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=50).contains(input) {
                Ok(())
            } else {
                Err("Top K must be between 1 and 50")
            }
        })
        .interact_text()?;

    Ok(())
}

fn test_connection(config: &Config) -> Result<()> {
    if std::env::var(&config.openrouter.api_key_env).is_err() {
        anyhow::bail!(
            "Environment variable {} is not set",
            config.openrouter.api_key_env
        );
    }

    let client = OpenRouterClient::new(config)?.with_retry_attempts(1);
    client.ping()
}
