//! Check Fraud CLI - Main entry point
//!
//! Runs the fraud pipeline over the built-in sample data set.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use check_fraud_core_rs::repository::{all_sample_checks, sample_check, sample_repository};
use check_fraud_core_rs::{
    AnalysisClock, Check, FinalResult, FraudVerdict, Pipeline, PipelineConfig, RuleSet,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "check-fraud")]
#[command(version, about = "Check fraud decision pipeline", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: tracing::Level,

    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fraud rule catalog (JSON); the built-in catalog when omitted
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sample checks
    List,

    /// Analyze one sample check
    Analyze {
        /// Sample check ID (e.g. CHECK001, CHECK_FRAUD002)
        #[arg(long)]
        check_id: String,

        /// Skip the holistic review stage
        #[arg(long)]
        no_holistic: bool,

        /// Print every analyzer's reasoning
        #[arg(short, long)]
        verbose: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze every sample check and print a summary table
    Batch {
        /// Skip the holistic review stage
        #[arg(long)]
        no_holistic: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    // One instant for the whole invocation keeps sample data and runs aligned
    let as_of = AnalysisClock::System.now();

    match cli.command {
        Commands::List => cmd_list(as_of),

        Commands::Analyze {
            check_id,
            no_holistic,
            verbose,
            json,
        } => {
            let pipeline = build_pipeline(cli.config, cli.rules, as_of)?;
            let check = sample_check(&check_id, as_of)
                .ok_or_else(|| anyhow!("unknown sample check: {}", check_id))?;
            let result = run(&pipeline, check, no_holistic);

            if json {
                println!("{}", result.to_json_pretty()?);
            } else {
                print_result(&result, verbose);
            }
            Ok(())
        }

        Commands::Batch { no_holistic } => {
            let pipeline = build_pipeline(cli.config, cli.rules, as_of)?;
            cmd_batch(&pipeline, as_of, no_holistic);
            Ok(())
        }
    }
}

fn build_pipeline(
    config: Option<PathBuf>,
    rules: Option<PathBuf>,
    as_of: DateTime<Utc>,
) -> anyhow::Result<Pipeline> {
    let config = match config {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let rules = match rules {
        Some(path) => RuleSet::from_file(&path)
            .with_context(|| format!("loading rules {}", path.display()))?,
        None => RuleSet::default_catalog()?,
    };

    let repository = sample_repository(config.rng_seed, as_of);
    let pipeline = Pipeline::new(config, Arc::new(repository), Arc::new(rules))?
        .with_clock(AnalysisClock::Fixed(as_of));
    Ok(pipeline)
}

fn run(pipeline: &Pipeline, check: Check, no_holistic: bool) -> FinalResult {
    if no_holistic {
        pipeline.run_without_holistic(check, None)
    } else {
        pipeline.run(check, None)
    }
}

fn cmd_list(as_of: DateTime<Utc>) -> anyhow::Result<()> {
    println!("{:<16} {:<10} {:>12}  {}", "CHECK ID", "CLIENT", "AMOUNT", "PAYEE");
    println!("{}", "-".repeat(60));
    for check in all_sample_checks(as_of) {
        println!(
            "{:<16} {:<10} {:>12}  {}",
            check.check_id,
            check.client_id,
            format!("${:.2}", check.amount_dollars()),
            check.payee
        );
    }
    Ok(())
}

fn cmd_batch(pipeline: &Pipeline, as_of: DateTime<Utc>, no_holistic: bool) {
    println!(
        "{:<16} {:<10} {:>10}  {:<9} {:<9}",
        "CHECK ID", "VERDICT", "CONFIDENCE", "RISK", "CONSENSUS"
    );
    println!("{}", "-".repeat(60));

    let mut fraud = 0;
    let checks = all_sample_checks(as_of);
    let total = checks.len();
    for check in checks {
        let result = run(pipeline, check, no_holistic);
        if result.final_verdict == FraudVerdict::Fraud {
            fraud += 1;
        }
        println!(
            "{:<16} {:<10} {:>9.1}%  {:<9} {:<9}",
            result.check_id,
            result.final_verdict,
            result.final_confidence * 100.0,
            result.final_risk_level,
            if result.consensus_reached { "yes" } else { "no" }
        );
    }

    println!("\n{} of {} checks flagged as fraud", fraud, total);
}

fn print_result(result: &FinalResult, verbose: bool) {
    println!("{}", result.notes);

    println!("\nAnalyzer Verdicts:");
    for v in &result.verdicts {
        println!(
            "  - {:<20} {:<10} {:>5.1}%  {}",
            v.analyzer,
            v.verdict,
            v.confidence * 100.0,
            v.risk_level
        );
        if verbose {
            for line in v.reasoning.lines() {
                println!("      {}", line);
            }
        }
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &result.recommendations {
            println!("  - {}", rec);
        }
    }

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for err in &result.errors {
            println!("  - {}", err);
        }
    }

    println!("\nAnalysis ID: {}", result.analysis_id);
    println!("Processing time: {:.3}s", result.processing_time_seconds);
}
