//! CLI for the fixrev rewrite engine.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fixrev::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fixrev")]
#[command(author, version, about = "Reverts defensive guards in C sources", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the rewrites the checks would make
    Check {
        #[command(flatten)]
        run: RunArgs,

        /// Print edits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite files in place
    Fix {
        #[command(flatten)]
        run: RunArgs,

        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },

    /// List the available checks and their rules
    Checks,
}

#[derive(Args)]
struct RunArgs {
    /// File or directory to process
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Checks to run (comma-separated); defaults to all
    #[arg(short, long, value_delimiter = ',')]
    checks: Vec<String>,

    /// Configuration file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Glob pattern to exclude
    #[arg(long)]
    exclude: Vec<String>,
}

impl RunArgs {
    fn fixrev(&self) -> Result<Fixrev> {
        let mut config = match &self.config {
            Some(path) => FixrevConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => FixrevConfig::default(),
        };
        if !self.checks.is_empty() {
            config = config.with_checks(self.checks.iter().cloned());
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());
        Ok(Fixrev::in_dir(&self.path).config(config))
    }
}

#[derive(Serialize)]
struct EditReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    edit: &'a Edit,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { run, json } => cmd_check(&run, json),
        Commands::Fix { run, dry_run } => cmd_fix(&run, dry_run),
        Commands::Checks => cmd_checks(),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "fixrev=info",
        2 => "fixrev=debug",
        _ => "fixrev=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_check(run: &RunArgs, json: bool) -> Result<ExitCode> {
    let result = run.fixrev()?.dry_run().run().context("Check failed")?;

    if json {
        let reports: Vec<EditReport> = result
            .edits()
            .map(|(path, edit)| EditReport { path, edit })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (path, edit) in result.edits() {
            println!(
                "{}:{}:{}: [{}] {}",
                path.display(),
                edit.line,
                edit.column,
                edit.check,
                edit.message
            );
        }
        report_failures(&result);
    }

    Ok(if result.edit_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_fix(run: &RunArgs, dry_run: bool) -> Result<ExitCode> {
    let mut fixrev = run.fixrev()?;
    if dry_run {
        fixrev = fixrev.dry_run();
    }
    let result = fixrev.run().context("Fix failed")?;

    if dry_run {
        println!("{}", result.colorized_diff());
        println!("\n{}", result.summary);
    } else {
        println!(
            "Applied {} edit(s) to {} file(s)",
            result.edit_count(),
            result.files_modified()
        );
    }
    report_failures(&result);

    Ok(ExitCode::SUCCESS)
}

fn cmd_checks() -> Result<ExitCode> {
    let rules = FixrevConfig::default().build_rule_set()?;
    println!("Available checks:");
    for check in CHECKS {
        println!("  {check}");
        for rule in rules.rules().iter().filter(|r| r.check() == *check) {
            let triggers: Vec<String> = rule
                .triggers()
                .iter()
                .map(|t| format!("{t:?}").to_lowercase())
                .collect();
            println!(
                "    {} ({}): {} => {}",
                rule.name(),
                triggers.join(", "),
                rule.message_template(),
                rule.edit_template()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_failures(result: &FixrevResult) {
    for failure in &result.failures {
        eprintln!("warning: skipped {}: {}", failure.path.display(), failure.error);
    }
}
