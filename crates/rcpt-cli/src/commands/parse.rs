//! Parse command - extract fields from a single OCR text file.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use rcpt_core::models::config::{PriceStrategy, RcptConfig};
use rcpt_core::models::receipt::{ParsedReceipt, SheetRow};
use rcpt_core::{ExtractionResult, ReceiptExtractor, ReceiptParser};

use super::config::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input text file with OCR output ("-" reads stdin)
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Price ranking strategy (overrides config)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Append the sheet row to a CSV ledger
    #[arg(long)]
    append: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output with header
    Csv,
    /// Plain text summary
    Text,
    /// Single sheet row (CSV, with timestamp)
    Row,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv | OutputFormat::Row => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Keyword score, then amount, then later line
    KeywordScore,
    /// Largest amount wins
    MaxValue,
}

impl From<StrategyArg> for PriceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::KeywordScore => PriceStrategy::KeywordScore,
            StrategyArg::MaxValue => PriceStrategy::MaxValue,
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.strategy)?;

    let text = read_input(&args.input).await?;
    info!("Parsing {} ({} bytes)", args.input, text.len());

    let result = parser.extract(&text);
    for warning in &result.warnings {
        debug!("{}", warning);
    }

    let recorded_at = timestamp(&config)?;
    let output = format_receipt(&result.receipt, args.format, &recorded_at, &config)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    if let Some(ledger) = &args.append {
        let row = result.receipt.to_sheet_row(recorded_at.as_str());
        append_to_ledger(ledger, &row, csv_delimiter(&config)?)?;
        eprintln!(
            "{} Appended row to {}",
            style("✓").green(),
            ledger.display()
        );
    }

    if args.show_confidence {
        print_confidence(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Build the parser from config, applying a CLI strategy override.
pub fn build_parser(
    config: &RcptConfig,
    strategy: Option<StrategyArg>,
) -> anyhow::Result<ReceiptParser> {
    let mut extraction = config.extraction.clone();
    if let Some(strategy) = strategy {
        extraction.price_strategy = strategy.into();
    }

    ReceiptParser::from_config(&extraction)
        .map_err(|e| anyhow::anyhow!("Invalid extraction config: {}", e))
}

async fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    Ok(tokio::fs::read_to_string(path).await?)
}

/// Local time in the configured sheet timestamp format.
pub fn timestamp(config: &RcptConfig) -> anyhow::Result<String> {
    let mut out = String::new();
    write!(out, "{}", chrono::Local::now().format(&config.output.timestamp_format)).map_err(|_| {
        anyhow::anyhow!(
            "Invalid timestamp format: {:?}",
            config.output.timestamp_format
        )
    })?;
    Ok(out)
}

pub fn csv_delimiter(config: &RcptConfig) -> anyhow::Result<u8> {
    u8::try_from(config.output.csv_delimiter).map_err(|_| {
        anyhow::anyhow!(
            "CSV delimiter must be a single-byte character, got {:?}",
            config.output.csv_delimiter
        )
    })
}

pub fn format_receipt(
    receipt: &ParsedReceipt,
    format: OutputFormat,
    recorded_at: &str,
    config: &RcptConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt, csv_delimiter(config)?),
        OutputFormat::Text => Ok(format_text(receipt)),
        OutputFormat::Row => format_row(&receipt.to_sheet_row(recorded_at), csv_delimiter(config)?),
    }
}

fn format_csv(receipt: &ParsedReceipt, delimiter: u8) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(vec![]);

    wtr.write_record(["establishment", "date", "price", "details"])?;
    wtr.write_record([
        &receipt.establishment,
        &receipt.date,
        &receipt.price,
        &receipt.details,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_row(row: &SheetRow, delimiter: u8) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(vec![]);

    wtr.write_record(row.as_record())?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(receipt: &ParsedReceipt) -> String {
    let mut output = String::new();

    output.push_str(&format!("Establishment: {}\n", receipt.establishment));
    output.push_str(&format!("Date:          {}\n", receipt.date));
    output.push_str(&format!("Price:         {}\n", receipt.price));

    if !receipt.details.is_empty() {
        output.push_str(&format!("Details:       {}\n", receipt.details));
    }

    output
}

/// Append a row to a CSV ledger, writing the header for a new file.
pub fn append_to_ledger(path: &Path, row: &SheetRow, delimiter: u8) -> anyhow::Result<()> {
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(file);

    if is_new {
        wtr.write_record(SheetRow::HEADERS)?;
    }
    wtr.write_record(row.as_record())?;
    wtr.flush()?;

    Ok(())
}

fn print_confidence(result: &ExtractionResult) {
    let fields = &result.fields;

    eprintln!();
    eprintln!(
        "{} Overall confidence: {:.1}%",
        style("ℹ").blue(),
        fields.confidence() * 100.0
    );

    let rows = [
        ("establishment", fields.establishment.as_ref().map(|m| m.confidence)),
        ("date", fields.date.as_ref().map(|m| m.confidence)),
        ("price", fields.price.as_ref().map(|m| m.confidence)),
    ];
    for (name, confidence) in rows {
        match confidence {
            Some(c) => eprintln!("  {:<14} {:.0}%", name, c * 100.0),
            None => eprintln!("  {:<14} {}", name, style("not found").yellow()),
        }
    }

    match result.date_value {
        Some(date) => eprintln!("  {:<14} {}", "date value", date),
        None => eprintln!("  {:<14} {}", "date value", style("unreadable").yellow()),
    }

    if fields.candidates.len() > 1 {
        eprintln!("  {} price candidates considered", fields.candidates.len());
    }

    for warning in &result.warnings {
        warn!("{}", warning);
    }
}
