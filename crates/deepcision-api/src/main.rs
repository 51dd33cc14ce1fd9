//! Deepcision CLI and REST API entry point.
//!
//! Binary name: `dcsn`
//!
//! Loads `.env` and the config file, registers providers and roles, then
//! dispatches to a command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;

use deepcision_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use deepcision_types::llm::ChatOverrides;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let tracing_options = TracingOptions {
        otel: cli.otel,
        json: cli.json,
        default_directive: TracingOptions::directive_for(cli.quiet, cli.verbose).to_string(),
    };
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init(cli.config.as_deref()).await?;
    let result = run(cli, state).await;

    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Deepcision API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let roles = state.roles.clone();
            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            roles.terminate_all_agents();
            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Chat {
            role,
            provider,
            temperature,
            max_tokens,
            model,
            prompt,
        } => {
            let args = cli::llm::ChatArgs {
                role,
                provider,
                prompt,
                overrides: ChatOverrides {
                    temperature,
                    max_tokens,
                    model,
                },
            };
            cli::llm::chat(&state, args, cli.json).await?;
        }

        Commands::Query {
            provider,
            stream,
            prompt,
        } => {
            cli::llm::query(&state, &provider, &prompt, stream, cli.json).await?;
        }

        Commands::Health => {
            cli::llm::health(&state, cli.json).await?;
        }

        Commands::Roles => {
            cli::role::list_roles(&state, cli.json)?;
        }

        Commands::Tokens { tokenizer, text } => {
            cli::tokens::count_tokens(&state, &tokenizer, &text, cli.json)?;
        }

        Commands::Search {
            max_results,
            news,
            advanced,
            query,
        } => {
            let args = cli::search::SearchArgs {
                query,
                max_results,
                news,
                advanced,
            };
            cli::search::search(&state, args, cli.json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
