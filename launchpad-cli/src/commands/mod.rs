//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod catalog;
mod submit;
mod task;

use anyhow::Result;
use clap::Subcommand;

use crate::api::ApiClient;
use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List dataset export formats
    Formats,
    /// List workflow templates
    Templates {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },
    /// Show the public parameters of a template
    Parameters {
        /// Template uid
        uid: String,
        /// Template version (latest when omitted)
        #[arg(short, long)]
        version: Option<String>,
    },
    /// Show the cluster node pool
    NodePool,
    /// Show per-label object counts of a task
    Counts {
        /// Task ID
        task: u64,
    },
    /// Preview the output path of a run
    OutputPath {
        /// Task ID
        task: u64,
        /// Template uid
        #[arg(short, long)]
        template: String,
    },
    /// Preview the dataset path of a task
    AnnotationPath {
        /// Task ID
        task: u64,
    },
    /// List checkpoints produced by a template
    Checkpoints {
        /// Template uid
        uid: String,
        /// Only checkpoints of this reference model
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Submit a training run for a task
    Submit {
        /// Task ID
        task: u64,
        /// Template uid
        #[arg(short, long)]
        template: String,
        /// Template version (latest when omitted)
        #[arg(short, long)]
        version: Option<String>,
        /// Parameters (format: KEY=value)
        #[arg(short, long, value_parser = submit::parse_key_val)]
        param: Vec<(String, String)>,
        /// Dump format tag
        #[arg(long)]
        dump_format: Option<String>,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.server_url);

    match command {
        Commands::Formats => task::list_formats(&client).await,
        Commands::Templates { page, page_size } => {
            catalog::list_templates(&client, page, page_size).await
        }
        Commands::Parameters { uid, version } => {
            catalog::show_parameters(&client, &uid, version.as_deref()).await
        }
        Commands::NodePool => catalog::show_node_pool(&client).await,
        Commands::Counts { task } => task::show_counts(&client, task).await,
        Commands::OutputPath { task, template } => {
            task::show_output_path(&client, task, &template).await
        }
        Commands::AnnotationPath { task } => task::show_annotation_path(&client, task).await,
        Commands::Checkpoints { uid, model } => {
            catalog::list_checkpoints(&client, &uid, model.as_deref()).await
        }
        Commands::Submit {
            task,
            template,
            version,
            param,
            dump_format,
        } => submit::submit(&client, task, template, version, param, dump_format).await,
    }
}
