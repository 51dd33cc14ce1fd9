//! Provider CLI commands: chat, query, health.

use std::io::Write;

use anyhow::{Context, Result, bail};
use console::style;
use futures_util::StreamExt;

use deepcision_infra::config::{DeepSeekSettings, ProcessEnv};
use deepcision_infra::llm::deepseek::DeepSeekProvider;
use deepcision_types::llm::{ChatOverrides, ChatRequest, Message};

use crate::state::AppState;

/// Arguments for [`chat`].
pub struct ChatArgs {
    pub role: String,
    pub provider: Option<String>,
    pub prompt: String,
    pub overrides: ChatOverrides,
}

/// Run one role-composed chat turn and print the answer.
pub async fn chat(state: &AppState, args: ChatArgs, json: bool) -> Result<()> {
    let agent = state
        .roles
        .create_agent(&args.role)
        .with_context(|| format!("role '{}' not found", args.role))?;
    let provider_name = args
        .provider
        .unwrap_or_else(|| agent.role().api_type.clone());

    let result = match state.apis.get_api(&provider_name) {
        Some(provider) => provider.chat(&args.prompt, &agent, &args.overrides).await,
        None => {
            state.roles.terminate_agent(&agent.id());
            bail!(
                "provider '{provider_name}' is not configured (available: {})",
                state.apis.names().join(", ")
            );
        }
    };
    state.roles.terminate_agent(&agent.id());
    let content = result?;

    if json {
        let out = serde_json::json!({
            "provider": provider_name,
            "role": args.role,
            "agent_id": agent.id().to_string(),
            "content": content,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} {} via {}",
            style("▸").cyan().bold(),
            style(&agent.role().name).bold(),
            style(&provider_name).dim()
        );
        println!();
        println!("{content}");
        println!();
    }
    Ok(())
}

/// Send a bare prompt, optionally streaming from DeepSeek.
pub async fn query(state: &AppState, provider_name: &str, prompt: &str, stream: bool, json: bool) -> Result<()> {
    if stream {
        if provider_name != "deepseek" {
            bail!("streaming is only supported for deepseek");
        }
        return stream_deepseek(state, prompt).await;
    }

    let provider = state
        .apis
        .get_api(provider_name)
        .with_context(|| format!("provider '{provider_name}' is not configured"))?;
    let content = provider.query(prompt).await?;

    if json {
        let out = serde_json::json!({ "provider": provider_name, "content": content });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{content}");
    }
    Ok(())
}

async fn stream_deepseek(state: &AppState, prompt: &str) -> Result<()> {
    let config = state.config.providers.get("deepseek").cloned().unwrap_or_default();
    let provider = DeepSeekProvider::new(DeepSeekSettings::resolve(&config, &ProcessEnv)?)?;

    let mut chunks = provider.chat_stream(&ChatRequest::new(vec![Message::user(prompt)]));
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        write!(stdout, "{}", chunk?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

/// Probe every registered provider.
pub async fn health(state: &AppState, json: bool) -> Result<()> {
    let report = state.apis.health_report().await;

    if json {
        let out: Vec<_> = report
            .iter()
            .map(|(name, healthy)| serde_json::json!({ "name": name, "healthy": healthy }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    if report.is_empty() {
        println!(
            "  {} No providers configured. Set {} or add a {} section to the config file.",
            style("i").blue().bold(),
            style("DEEPSEEK_API_KEY").cyan(),
            style("providers").cyan()
        );
    }
    for (name, healthy) in &report {
        let mark = if *healthy {
            style("✓").green()
        } else {
            style("✗").red()
        };
        let model = state.apis.get_api(name).map(|p| p.model()).unwrap_or("-");
        println!("  {mark} {:<12} {}", name, style(model).dim());
    }
    println!();
    Ok(())
}
