//! Catalog command handlers

use anyhow::Result;
use colored::*;
use launchpad_core::domain::template::ParameterSpec;

use crate::api::ApiClient;

pub async fn list_templates(client: &ApiClient, page: u32, page_size: u32) -> Result<()> {
    let list = client.list_templates(page, page_size).await?;

    if list.workflow_templates.is_empty() {
        println!("{}", "No workflow templates found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Found {} template(s) ({} total):",
            list.workflow_templates.len(),
            list.total_count
        )
        .bold()
    );
    println!();
    for template in list.workflow_templates {
        let version = template.version.as_deref().unwrap_or("-");
        println!(
            "  {} {} {}",
            template.uid.cyan(),
            template.name,
            format!("(version {})", version).dimmed()
        );
    }

    Ok(())
}

pub async fn show_parameters(client: &ApiClient, uid: &str, version: Option<&str>) -> Result<()> {
    let version = version.unwrap_or("0");
    let response = client.get_template_parameters(uid, version).await?;

    if response.parameters.is_empty() {
        println!("{}", format!("{} has no public parameters.", uid).yellow());
        return Ok(());
    }

    println!("{}", format!("Parameters of {}:", uid).bold());
    println!();
    for param in &response.parameters {
        print_parameter(param);
    }

    Ok(())
}

fn print_parameter(param: &ParameterSpec) {
    let required = if param.required {
        " (required)".red().to_string()
    } else {
        String::new()
    };
    println!("  {}{}", param.name.cyan(), required);

    if let Some(display_name) = &param.display_name {
        println!("    {} {}", "Name:".dimmed(), display_name);
    }
    if let Some(default) = param.value.as_deref().filter(|v| !v.is_empty()) {
        println!("    {} {}", "Default:".dimmed(), default);
    }
    if let Some(hint) = &param.hint {
        println!("    {} {}", "Hint:".dimmed(), hint);
    }
    if !param.options.is_empty() {
        let options: Vec<&str> = param.options.iter().map(|o| o.value.as_str()).collect();
        println!("    {} {}", "Options:".dimmed(), options.join(", "));
    }
}

pub async fn show_node_pool(client: &ApiClient) -> Result<()> {
    let response = client.get_node_pool().await?;
    let pool = response.node_pool;

    println!("{} {}", "Node pool label:".bold(), pool.label);
    for option in pool.options {
        println!("  {} {}", option.value.cyan(), option.name.dimmed());
    }

    Ok(())
}

pub async fn list_checkpoints(client: &ApiClient, uid: &str, model: Option<&str>) -> Result<()> {
    let response = client.list_checkpoints(uid, model).await?;

    if response.keys.is_empty() {
        println!("{}", format!("No checkpoints found for {}.", uid).yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} checkpoint(s):", response.keys.len()).bold());
    for key in response.keys {
        println!("  {}", key);
    }

    Ok(())
}
