//! `dcsn roles`: list loaded role definitions.

use anyhow::Result;
use console::style;

use crate::state::AppState;

pub fn list_roles(state: &AppState, json: bool) -> Result<()> {
    let names = state.roles.role_names();

    if json {
        let roles: Vec<_> = names
            .iter()
            .filter_map(|name| state.roles.get_role(name).map(|role| (name, role)))
            .map(|(name, role)| {
                serde_json::json!({
                    "key": name,
                    "name": role.name,
                    "description": role.description,
                    "api_type": role.api_type,
                    "concurrent": role.concurrent,
                    "temperature": role.temperature,
                    "max_tokens": role.max_tokens,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&roles)?);
        return Ok(());
    }

    println!();
    if names.is_empty() {
        println!(
            "  {} No roles loaded. Point {} at a JSON role template file.",
            style("i").blue().bold(),
            style("role_templates").cyan()
        );
        println!();
        return Ok(());
    }

    for name in names {
        let Some(role) = state.roles.get_role(name) else {
            continue;
        };
        println!(
            "  {} {:<16} {:<11} {}",
            style("•").cyan(),
            style(name).bold(),
            role.api_type,
            style(&role.description).dim()
        );
    }
    println!();
    Ok(())
}
