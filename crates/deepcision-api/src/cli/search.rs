//! `dcsn search`: Tavily web search.

use anyhow::Result;
use console::style;

use deepcision_infra::config::{ProcessEnv, TavilySettings};
use deepcision_infra::search::{SearchDepth, SearchRequest, SearchTopic, TavilyClient};

use crate::state::AppState;

pub struct SearchArgs {
    pub query: String,
    pub max_results: u32,
    pub news: bool,
    pub advanced: bool,
}

pub async fn search(state: &AppState, args: SearchArgs, json: bool) -> Result<()> {
    let config = state.config.providers.get("tavily").cloned().unwrap_or_default();
    let client = TavilyClient::new(TavilySettings::resolve(&config, &ProcessEnv)?)?;

    let request = SearchRequest::new(args.query)
        .with_max_results(args.max_results)
        .with_topic(if args.news { SearchTopic::News } else { SearchTopic::General })
        .with_depth(if args.advanced { SearchDepth::Advanced } else { SearchDepth::Basic });
    let results = client.search(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!();
    let hits = results["results"].as_array().map(Vec::as_slice).unwrap_or_default();
    if hits.is_empty() {
        println!("  {} No results.", style("i").blue().bold());
    }
    for hit in hits {
        println!(
            "  {} {}",
            style("•").cyan(),
            style(hit["title"].as_str().unwrap_or("(untitled)")).bold()
        );
        println!("    {}", style(hit["url"].as_str().unwrap_or_default()).dim());
    }
    println!();
    Ok(())
}
