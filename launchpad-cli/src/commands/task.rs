//! Task command handlers

use anyhow::Result;
use colored::*;

use crate::api::ApiClient;

pub async fn list_formats(client: &ApiClient) -> Result<()> {
    let response = client.list_dump_formats().await?;

    println!("{}", "Dump formats:".bold());
    for format in response.dump_formats {
        println!("  {:<24} {}", format.tag.cyan(), format.name);
    }

    Ok(())
}

pub async fn show_counts(client: &ApiClient, task_id: u64) -> Result<()> {
    let response = client.get_object_counts(task_id).await?;

    if response.counts.is_empty() {
        println!("{}", format!("Task {} has no labels.", task_id).yellow());
        return Ok(());
    }

    println!("{}", format!("Objects in task {}:", task_id).bold());
    for count in response.counts {
        let number = if count.count == 0 {
            count.count.to_string().dimmed()
        } else {
            count.count.to_string().green()
        };
        println!("  {:<24} {}", count.label, number);
    }

    Ok(())
}

pub async fn show_output_path(client: &ApiClient, task_id: u64, template_uid: &str) -> Result<()> {
    let path = client.get_output_path(task_id, template_uid).await?;
    println!("{}", path.name);
    Ok(())
}

pub async fn show_annotation_path(client: &ApiClient, task_id: u64) -> Result<()> {
    let path = client.get_annotation_path(task_id).await?;
    println!("{}", path.name);
    Ok(())
}
