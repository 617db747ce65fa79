//! LLM backend diagnostics.

use console::style;

use crate::cli::icons::{error, success, warning};
use crate::config::Config;
use crate::llm::LlmClient;

/// Report whether the configured backend answers.
pub async fn cmd_llm_status(config: &Config) -> anyhow::Result<()> {
    let llm = &config.llm;
    println!("Provider: {}", llm.provider);
    println!("Endpoint: {}", llm.endpoint);
    println!("Model:    {}", llm.model);

    if !llm.enabled {
        println!("{} LLM annotation is disabled in configuration", warning());
        return Ok(());
    }

    let client = LlmClient::new(llm.clone())?;
    if client.is_available().await {
        println!("{} LLM service available", success());
    } else {
        println!("{} LLM service not available at {}", error(), llm.endpoint);
        println!("  Make sure Ollama is running: ollama serve");
    }
    Ok(())
}

/// List the models the backend offers, marking the configured one.
pub async fn cmd_llm_models(config: &Config) -> anyhow::Result<()> {
    let client = LlmClient::new(config.llm.clone())?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("{} No models available", warning());
        return Ok(());
    }

    for model in models {
        if model == config.llm.model {
            println!("{} {}", style("*").green(), style(model).bold());
        } else {
            println!("  {}", model);
        }
    }
    Ok(())
}
