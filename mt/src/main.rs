//! mt - local maintenance action scheduler
//!
//! CLI entry point for executing and queueing maintenance actions.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{info, warn};

use maintenance::cli::{Cli, Command, OutputFormat};
use maintenance::config::{Config, LoggingConfig};
use maintenance::{
    ActionDescription, ActionFactory, ActionProperties, ActionRecord, ActionSnapshot, ActionState, Lifecycle,
    MaintenanceError, MaintenanceFeature, Plan,
};

fn setup_logging(logging: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&logging.level);
    let level: tracing::Level = level.parse().context(format!("Invalid log level: {}", level))?;
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let log_file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config.logging, cli.log_level.as_deref()).context("Failed to setup logging")?;

    info!(
        "mt loaded config: threads={}, seconds-actions-block={}",
        config.maintenance.threads, config.maintenance.seconds_actions_block
    );

    match cli.command {
        Command::Exec {
            fields,
            properties,
            format,
        } => cmd_exec(&config, fields, properties, &format),
        Command::Run {
            plan,
            threads,
            timeout_secs,
            format,
        } => cmd_run(&config, &plan, threads, Duration::from_secs(timeout_secs), &format).await,
        Command::Types => cmd_types(),
        Command::Config => cmd_config(&config),
    }
}

/// Execute a single action on this thread
fn cmd_exec(config: &Config, fields: Vec<(String, String)>, properties: Option<String>, format: &OutputFormat) -> Result<()> {
    let description = ActionDescription::from_pairs(fields);
    let properties = match properties {
        Some(raw) => ActionProperties::new(serde_json::from_str(&raw).context("Invalid --properties JSON")?),
        None => ActionProperties::empty(),
    };

    let feature = MaintenanceFeature::new(
        config.maintenance.clone(),
        ActionFactory::with_builtin(),
        Arc::new(Lifecycle::ready()),
    );

    match feature.add_action(description, properties, true) {
        Ok(record) => print_records(std::slice::from_ref(&record), format),
        Err(MaintenanceError::ActionFailed(record)) => {
            print_records(std::slice::from_ref(&*record), format)?;
            Err(eyre!("Action {} failed: {}", record.id, record.result))
        }
        Err(e) => Err(e).context("Submission rejected"),
    }
}

/// Queue a plan and run it on the worker pool
async fn cmd_run(
    config: &Config,
    plan_path: &std::path::Path,
    threads: Option<usize>,
    timeout: Duration,
    format: &OutputFormat,
) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let lifecycle = Arc::new(Lifecycle::new());
    let feature = Arc::new(MaintenanceFeature::new(
        config.maintenance.clone(),
        ActionFactory::with_builtin(),
        Arc::clone(&lifecycle),
    ));

    let mut rejected = 0usize;
    for (index, entry) in plan.actions.iter().enumerate() {
        let description = entry.description().context(format!("Invalid plan entry {}", index))?;
        let properties = entry.properties().context(format!("Invalid plan entry {}", index))?;
        match feature.add_action(description.clone(), properties, false) {
            Ok(record) => println!("{} queued #{} {}", "✓".green(), record.id, description),
            Err(e) => {
                rejected += 1;
                println!("{} rejected {}: {}", "✗".red(), description, e);
            }
        }
    }

    lifecycle.signal_ready();
    let threads = threads.unwrap_or(config.maintenance.threads);
    feature.start(threads)?;

    let drained = if threads == 0 {
        warn!("No worker threads; queued actions stay READY");
        false
    } else {
        let waiter = {
            let feature = Arc::clone(&feature);
            tokio::task::spawn_blocking(move || feature.wait_until_idle(timeout))
        };
        tokio::select! {
            result = waiter => result.context("Idle waiter failed")?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, draining in-flight actions");
                false
            }
        }
    };

    feature.begin_shutdown();
    {
        let feature = Arc::clone(&feature);
        tokio::task::spawn_blocking(move || feature.join())
            .await
            .context("Worker pool join failed")?;
    }

    print_records(&feature.records(), format)?;

    let stats = feature.stats();
    println!();
    println!(
        "{} accepted, {} rejected, {} complete, {} failed",
        stats.total_accepted,
        rejected,
        stats.total_completed.to_string().green(),
        stats.total_failed.to_string().red()
    );
    if !drained {
        println!("{}", "Not all actions reached a terminal state".yellow());
    }
    Ok(())
}

fn cmd_types() -> Result<()> {
    let factory = ActionFactory::with_builtin();
    for name in factory.names() {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn print_records(records: &[ActionRecord], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<ActionSnapshot> = records.iter().map(ActionSnapshot::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Yaml => {
            let rows: Vec<ActionSnapshot> = records.iter().map(ActionSnapshot::from).collect();
            print!("{}", serde_yaml::to_string(&rows)?);
        }
        OutputFormat::Table => {
            println!(
                "{:>4}  {:<10}  {:>6}  {:>8}  {}",
                "ID".bold(),
                "STATE".bold(),
                "RESULT".bold(),
                "PROGRESS".bold(),
                "DESCRIPTION".bold()
            );
            for record in records {
                println!(
                    "{:>4}  {:<10}  {:>6}  {:>8}  {}",
                    record.id,
                    colored_state(record.state),
                    record.result.code,
                    record.progress,
                    record.description
                );
            }
        }
        OutputFormat::Text => {
            for record in records {
                println!(
                    "#{} {} {} progress={} result={}",
                    record.id,
                    record.description.to_string().cyan(),
                    colored_state(record.state),
                    record.progress,
                    record.result
                );
            }
        }
    }
    Ok(())
}

fn colored_state(state: ActionState) -> ColoredString {
    let label = state.to_string();
    match state {
        ActionState::Ready => label.cyan(),
        ActionState::Executing => label.yellow(),
        ActionState::Complete => label.green(),
        ActionState::Failed => label.red(),
    }
}
