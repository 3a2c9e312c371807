//! `rcpt batch`: run extraction over every OCR text file matching a glob.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use rcpt_core::{ExtractionResult, ReceiptExtractor, ReceiptParser};

use super::config::load_config;
use super::parse::{
    append_to_ledger, build_parser, csv_delimiter, format_receipt, timestamp, OutputFormat,
    StrategyArg,
};

const SUMMARY_FILE: &str = "summary.csv";

#[derive(Args)]
pub struct BatchArgs {
    /// Glob selecting .txt/.text files, e.g. "scans/*.txt"
    #[arg(required = true)]
    input: String,

    /// Directory for per-receipt outputs and the summary
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Format of each per-receipt output
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Price ranking strategy (overrides config)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Write summary.csv with one line per input
    #[arg(long)]
    summary: bool,

    /// Append one sheet row per receipt to a CSV ledger
    #[arg(long)]
    append: Option<PathBuf>,

    /// Record failures and keep going instead of aborting
    #[arg(long)]
    continue_on_error: bool,
}

struct FileOutcome {
    path: PathBuf,
    result: Result<ExtractionResult, String>,
    elapsed_ms: u64,
}

impl FileOutcome {
    fn file_name(&self) -> &str {
        self.path.file_name().and_then(|s| s.to_str()).unwrap_or("")
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let started = Instant::now();

    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.strategy)?;
    let delimiter = csv_delimiter(&config)?;

    let files = collect_inputs(&args.input)?;
    println!("{} {} receipt file(s) matched", style("ℹ").blue(), files.len());

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} receipts")?
            .progress_chars("#>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let file_started = Instant::now();
        let result = extract_file(&path, &parser).map_err(|e| e.to_string());
        let elapsed_ms = file_started.elapsed().as_millis() as u64;

        if let Err(reason) = &result {
            if !args.continue_on_error {
                progress.abandon();
                error!("{}: {}", path.display(), reason);
                anyhow::bail!("Failed on {}: {}", path.display(), reason);
            }
            warn!("Skipping {}: {}", path.display(), reason);
        }

        outcomes.push(FileOutcome { path, result, elapsed_ms });
        progress.inc(1);
    }
    progress.finish_and_clear();

    let recorded_at = timestamp(&config)?;
    for outcome in &outcomes {
        let Ok(extraction) = &outcome.result else {
            continue;
        };

        if let Some(dir) = &args.output_dir {
            let stem = outcome
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipt");
            let target = dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&target, format_receipt(&extraction.receipt, args.format, &recorded_at, &config)?)?;
            debug!("{} -> {}", outcome.path.display(), target.display());
        }

        if let Some(ledger) = &args.append {
            append_to_ledger(ledger, &extraction.receipt.to_sheet_row(recorded_at.as_str()), delimiter)?;
        }
    }

    if args.summary {
        let summary_path = match &args.output_dir {
            Some(dir) => dir.join(SUMMARY_FILE),
            None => PathBuf::from(SUMMARY_FILE),
        };
        write_summary(&summary_path, &outcomes, delimiter)?;
        println!("{} Summary: {}", style("✓").green(), summary_path.display());
    }

    report(&outcomes, started);
    Ok(())
}

fn collect_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let files: Vec<PathBuf> = glob(pattern)?
        .filter_map(Result::ok)
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("text"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No .txt files match {}", pattern);
    }
    Ok(files)
}

fn extract_file(path: &Path, parser: &ReceiptParser) -> anyhow::Result<ExtractionResult> {
    let text = String::from_utf8(fs::read(path)?)
        .map_err(|_| anyhow::anyhow!("{} is not valid UTF-8", path.display()))?;

    if text.trim().is_empty() {
        anyhow::bail!("File is empty");
    }

    Ok(parser.extract(&text))
}

fn report(outcomes: &[FileOutcome], started: Instant) {
    let failures: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let ok = outcomes.len() - failures.len();

    println!();
    println!(
        "{} Processed {} files in {:?}: {} ok, {} failed",
        style("✓").green(),
        outcomes.len(),
        started.elapsed(),
        style(ok).green(),
        style(failures.len()).red()
    );

    for outcome in failures {
        if let Err(reason) = &outcome.result {
            println!("  {} {}: {}", style("✗").red(), outcome.path.display(), reason);
        }
    }
}

fn write_summary(path: &Path, outcomes: &[FileOutcome], delimiter: u8) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "establishment",
        "date",
        "price",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let elapsed = outcome.elapsed_ms.to_string();
        match &outcome.result {
            Ok(extraction) => {
                let receipt = &extraction.receipt;
                let confidence = format!("{:.2}", extraction.fields.confidence());
                wtr.write_record([
                    outcome.file_name(),
                    "success",
                    receipt.establishment.as_str(),
                    receipt.date.as_str(),
                    receipt.price.as_str(),
                    confidence.as_str(),
                    elapsed.as_str(),
                    "",
                ])?;
            }
            Err(reason) => {
                wtr.write_record([
                    outcome.file_name(),
                    "error",
                    "",
                    "",
                    "",
                    "",
                    elapsed.as_str(),
                    reason.as_str(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
