//! Submit command handler

use anyhow::Result;
use colored::*;
use launchpad_core::dto::submission::SubmitTrainingRun;
use serde_json::Value as JsonValue;

use crate::api::ApiClient;

/// Parse a single key=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

pub async fn submit(
    client: &ApiClient,
    task_id: u64,
    template: String,
    version: Option<String>,
    params: Vec<(String, String)>,
    dump_format: Option<String>,
) -> Result<()> {
    let req = SubmitTrainingRun {
        workflow_template: Some(template),
        workflow_template_version: version,
        parameters: params
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect(),
        dump_format,
    };

    println!("{}", format!("Submitting training run for task {}...", task_id).dimmed());

    let execution = client.submit(task_id, &req).await?;

    println!("{}", "✓ Training run submitted".green().bold());
    println!("  {} {}", "Execution:".bold(), execution.uid);
    if !execution.namespace.is_empty() {
        println!("  {} {}", "Namespace:".bold(), execution.namespace);
    }
    if let Some(created_at) = execution.created_at {
        println!("  {} {}", "Created:".bold(), created_at);
    }
    for label in &execution.labels {
        println!("  {} {}={}", "Label:".dimmed(), label.key, label.value);
    }

    Ok(())
}
