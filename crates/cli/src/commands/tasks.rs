//! Task execution CLI commands

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_error, print_json, print_table, OutputFormat};
use clusterpulse_lib::models::{RunningTask, TaskExecutionResult, TaskStatus};

#[derive(Serialize)]
struct RunScriptRequest<'a> {
    script: &'a str,
    script_type: &'a str,
    timeout_seconds: u64,
    env: std::collections::HashMap<String, String>,
}

#[derive(Tabled)]
struct RunningTaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Type")]
    script_type: String,
    #[tabled(rename = "Started")]
    started: String,
}

/// Parse a KEY=VALUE environment pair
pub fn parse_env_pair(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid environment pair '{raw}', expected KEY=VALUE"),
    }
}

/// Run a script on the agent and print its result
pub async fn run_script(
    client: &ApiClient,
    script: &str,
    script_type: &str,
    timeout_seconds: u64,
    env_pairs: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let request = RunScriptRequest {
        script,
        script_type,
        timeout_seconds,
        env: env_pairs.iter().cloned().collect(),
    };

    let result: TaskExecutionResult = client
        .post(
            "api/v1/tasks/run",
            &request,
            std::time::Duration::from_secs(timeout_seconds + 30),
        )
        .await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let status = match result.status {
                TaskStatus::Success => "success",
                TaskStatus::Failed => "failed",
            };
            println!("{}", "Task Result".bold());
            println!("{}", "=".repeat(40));
            println!("Status:    {}", color_status(status));
            println!("Exit code: {}", result.exit_code);
            println!("Duration:  {:.2}s", result.duration_seconds);
            if !result.stdout.is_empty() {
                println!();
                println!("{}", "stdout".bold());
                println!("{}", "-".repeat(40));
                print!("{}", result.stdout);
                if !result.stdout.ends_with('\n') {
                    println!();
                }
            }
            if !result.stderr.is_empty() {
                println!();
                println!("{}", "stderr".bold());
                println!("{}", "-".repeat(40));
                eprint!("{}", result.stderr);
                if !result.stderr.ends_with('\n') {
                    eprintln!();
                }
            }
        }
    }

    if result.status == TaskStatus::Failed {
        print_error("task failed");
        std::process::exit(result.exit_code.clamp(1, 255));
    }

    Ok(())
}

/// List tasks currently in flight on the agent
pub async fn show_running(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let tasks: Vec<RunningTask> = client.get("api/v1/tasks/running").await?;

    match format {
        OutputFormat::Json => print_json(&tasks)?,
        OutputFormat::Table => {
            let rows: Vec<RunningTaskRow> = tasks
                .iter()
                .map(|t| RunningTaskRow {
                    id: t.id,
                    script_type: t.script_type.clone(),
                    started: format_timestamp(t.started_at),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

fn format_timestamp(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}
