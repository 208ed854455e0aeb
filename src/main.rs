use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use crate::report::NormalizedReportRecord;
use crate::summary::ReportSummary;

mod coerce;
mod cost;
mod dynamic;
mod error;
mod load;
mod payout;
mod report;
mod reserved;
mod summary;
mod timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    /// Checkout collections on dynamic accounts
    Dynamic,
    /// Collections and settlements on reserved accounts
    Reserved,
    /// Outbound transfers
    Payout,
}

impl ReportKind {
    fn name(self) -> &'static str {
        match self {
            ReportKind::Dynamic => "dynamic",
            ReportKind::Reserved => "reserved",
            ReportKind::Payout => "payout",
        }
    }

    fn default_output(self) -> PathBuf {
        PathBuf::from(format!("{}_report.csv", self.name()))
    }

    fn build(self, input: &Path) -> error::Result<Vec<NormalizedReportRecord>> {
        let csv_reader = load::csv_reader(input)?;
        let records = match self {
            ReportKind::Dynamic => {
                dynamic::build(load::read_rows(csv_reader, &dynamic::REQUIRED_COLUMNS)?)
            }
            ReportKind::Reserved => {
                reserved::build(load::read_rows(csv_reader, &reserved::REQUIRED_COLUMNS)?)
            }
            ReportKind::Payout => {
                payout::build(load::read_rows(csv_reader, &payout::REQUIRED_COLUMNS)?)
            }
        };
        Ok(records)
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Per-transaction revenue reports from transaction exports")]
struct Cli {
    /// Which export the input is
    #[arg(value_enum)]
    kind: ReportKind,

    /// Input CSV file, `-` for stdin
    input: PathBuf,

    /// Output CSV file, `-` for stdout [default: <kind>_report.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a summary of the report to stderr
    #[arg(long)]
    summary: bool,

    /// Log progress (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let records = cli.kind.build(&cli.input).with_context(|| {
        format!(
            "failed to build {} report from {}",
            cli.kind.name(),
            cli.input.display()
        )
    })?;

    let output = cli.output.unwrap_or_else(|| cli.kind.default_output());
    write_output(&output, &records)
        .with_context(|| format!("failed to write report to {}", output.display()))?;
    info!(
        "wrote {} {} rows to {}",
        records.len(),
        cli.kind.name(),
        output.display()
    );

    let summary = ReportSummary::from_records(&records);
    info!("{} report summary:\n{summary}", cli.kind.name());
    if cli.summary {
        eprintln!("{summary}");
    }

    Ok(())
}

fn write_output(output: &Path, records: &[NormalizedReportRecord]) -> error::Result<()> {
    if output == Path::new("-") {
        let stdout = std::io::stdout();
        report::write_report(stdout.lock(), records)
    } else {
        let mut writer = BufWriter::new(std::fs::File::create(output)?);
        report::write_report(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}
