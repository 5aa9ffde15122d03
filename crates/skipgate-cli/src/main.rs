use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use skipgate_core::{Decision, PolicyEvaluator, explain, rules::fingerprint};
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod output;
mod source;

use config::SkipgateConfig;
use output::OutputFormat;
use source::GitCollector;

#[derive(Parser)]
#[command(
    name = "skipgate",
    version,
    about = "skipgate — decides whether a pipeline stage should be skipped from commit-message tags"
)]
struct Cli {
    /// Path to skipgate.toml (defaults to ./skipgate.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the commit: exit 0 to proceed, 78 to skip, 2 if the rules are invalid
    Evaluate(InputArgs),
    /// Show how each rule fares against the full message and the change log
    Explain(InputArgs),
    /// Print the resolved rule set and its fingerprint
    Rules {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct InputArgs {
    #[command(flatten)]
    message: MessageArgs,

    /// A change-log entry (repeatable)
    #[arg(long = "changelog", value_name = "TEXT")]
    changelog: Vec<String>,

    /// File with one change-log entry per line
    #[arg(long, value_name = "PATH")]
    changelog_file: Option<PathBuf>,

    /// Use the first lines of the last N commits as change-log entries
    #[arg(long, value_name = "N")]
    git_changelog: Option<usize>,

    /// Repository to query with --git / --git-changelog
    #[arg(long, value_name = "DIR")]
    repo: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

/// Where the full commit message comes from. At most one may be given.
#[derive(Args)]
#[group(multiple = false)]
struct MessageArgs {
    /// The full commit message
    #[arg(long, value_name = "TEXT")]
    message: Option<String>,

    /// Read the full commit message from a file
    #[arg(long, value_name = "PATH")]
    message_file: Option<PathBuf>,

    /// Read the full commit message from stdin
    #[arg(long)]
    stdin: bool,

    /// Read the full message of HEAD with `git log -1`
    #[arg(long)]
    git: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the decision
    let filter = EnvFilter::from_env("SKIPGATE_LOG");
    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let (config, origin) = SkipgateConfig::discover(cli.config.as_deref())?;
    tracing::info!(
        origin = %origin,
        rules = config.rules.len(),
        "Loaded configuration"
    );

    match cli.command {
        Command::Evaluate(args) => {
            let (full_message, change_log) = collect_inputs(&args, &config).await?;

            let decision = match PolicyEvaluator::from_rules(&config.rules) {
                Ok(evaluator) => evaluator.evaluate(full_message.as_deref(), &change_log),
                Err(e) => {
                    tracing::error!(error = %e, "Invalid rule set");
                    Decision::from(e)
                }
            };

            println!(
                "{}",
                output::render_decision(&decision, &fingerprint(&config.rules), args.format)?
            );
            Ok(output::exit_code(&decision))
        }
        Command::Explain(args) => {
            let (full_message, change_log) = collect_inputs(&args, &config).await?;
            let report = explain(full_message.as_deref(), &change_log, &config.rules);

            println!("{}", output::render_report(&report, args.format)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Rules { format } => {
            let compiled = PolicyEvaluator::from_rules(&config.rules);
            let rule_set_fingerprint = match &compiled {
                Ok(evaluator) => evaluator.rule_set().fingerprint().to_string(),
                Err(_) => fingerprint(&config.rules),
            };

            let rendered = output::render_rules(
                &config.rules,
                &rule_set_fingerprint,
                &origin.to_string(),
                format,
            )?;
            println!("{rendered}");

            match compiled {
                Ok(_) => Ok(ExitCode::SUCCESS),
                Err(e) => {
                    tracing::error!(error = %e, "Invalid rule set");
                    Ok(output::exit_code(&Decision::from(e)))
                }
            }
        }
    }
}

async fn collect_inputs(
    args: &InputArgs,
    config: &SkipgateConfig,
) -> Result<(Option<String>, Vec<String>)> {
    let git = GitCollector::new(&config.git, args.repo.clone());

    let full_message = if let Some(message) = &args.message.message {
        Some(message.trim().to_string())
    } else if let Some(path) = &args.message.message_file {
        Some(source::read_message_file(path).await?)
    } else if args.message.stdin {
        Some(source::read_stdin().await?)
    } else if args.message.git {
        Some(
            git.head_message()
                .await
                .context("Failed to read the HEAD commit message")?,
        )
    } else {
        None
    };

    let mut change_log = args.changelog.clone();
    if let Some(path) = &args.changelog_file {
        change_log.extend(source::read_change_log_file(path).await?);
    }
    if let Some(count) = args.git_changelog {
        change_log.extend(
            git.recent_subjects(count)
                .await
                .context("Failed to read recent commit subjects")?,
        );
    }

    tracing::debug!(
        full_message = full_message.is_some(),
        change_log_entries = change_log.len(),
        "Collected commit text"
    );

    Ok((full_message, change_log))
}
