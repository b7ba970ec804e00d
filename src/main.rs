use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tkhq_audit::{
    output_file_name, parse_audit_date, parse_delimiter, read_table_from_path, write_table,
    write_table_to_path, Assembler, AuditConfig, AuditContext, AuditError, AuditOutcome,
    LabelStyle,
};

/// Exit status when the input itself is unusable (clap already owns 2 for bad arguments)
const EXIT_BAD_INPUT: u8 = 3;

#[derive(Parser)]
#[command(name = "tkhq-audit", version, about = "Flag overdue and undated customs declarations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate a CSV export and write the result
    Analyze {
        #[command(flatten)]
        run: RunArgs,

        /// Output path, or "-" for stdout (default: ket_qua_TKHQ_DDMMYYYY.csv next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print flag counts without writing a file
    Summary {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// CSV export of the declarations
    #[arg(long, short)]
    input: PathBuf,

    /// Reference date for the audit, e.g. 2025-05-31
    #[arg(long, short = 'd', env = "TKHQ_AUDIT_DATE")]
    audit_date: String,

    /// JSON configuration file
    #[arg(long, short, env = "TKHQ_CONFIG")]
    config: Option<PathBuf>,

    /// Field delimiter of the input (and output)
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Header style of the derived columns: english or vietnamese
    #[arg(long)]
    labels: Option<LabelStyle>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Malformed or incomplete input gets its own status so scripts can tell it from I/O failures
fn exit_status(err: &anyhow::Error) -> u8 {
    let structural = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<AuditError>())
        .any(AuditError::is_structural);

    if structural {
        EXIT_BAD_INPUT
    } else {
        1
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tkhq_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze { run, output } => run_analyze(&run, output.as_deref()),
        Command::Summary { run } => run_summary(&run),
    }
}

struct Prepared {
    outcome: AuditOutcome,
    delimiter: u8,
}

fn prepare(args: &RunArgs) -> Result<Prepared> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AuditConfig::default(),
    };
    if let Some(labels) = args.labels {
        config.labels = labels;
    }

    let delimiter = parse_delimiter(&args.delimiter)?;
    let audit_date = parse_audit_date(&args.audit_date, config.day_first)?;

    let table = read_table_from_path(&args.input, delimiter)?;
    let outcome = Assembler::new(config)
        .annotate(&table, &AuditContext::new(audit_date))
        .with_context(|| format!("Cannot audit {}", args.input.display()))?;

    Ok(Prepared { outcome, delimiter })
}

fn run_analyze(args: &RunArgs, output: Option<&Path>) -> Result<()> {
    let Prepared { outcome, delimiter } = prepare(args)?;

    match output {
        Some(path) if path == Path::new("-") => {
            write_table(io::stdout().lock(), &outcome.table, delimiter)?;
        }
        _ => {
            let path = match output {
                Some(path) => path.to_path_buf(),
                None => args
                    .input
                    .with_file_name(output_file_name(outcome.summary.audit_date)),
            };
            write_table_to_path(&path, &outcome.table, delimiter)?;

            print_summary(&outcome);
            println!("✓ Wrote {} rows to {}", outcome.table.row_count(), path.display());
        }
    }

    Ok(())
}

fn run_summary(args: &RunArgs) -> Result<()> {
    let Prepared { outcome, .. } = prepare(args)?;
    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &AuditOutcome) {
    let s = &outcome.summary;

    println!("📋 TKHQ audit as of {}", s.audit_date);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Declarations:            {}", s.total_rows);
    println!("  Missing due date:        {}", s.missing_due_date);
    println!("  Overdue, not filed:      {}", s.overdue_unfiled);
    println!("  Overdue beyond threshold: {}", s.overdue_over_threshold);
    println!("  Extension recorded:      {}", s.extension);
    if let Some(max) = s.max_overdue_days {
        println!("  Longest overdue:         {} days", max);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_get_bad_input_status() {
        let err = anyhow::Error::new(AuditError::MissingColumns {
            columns: vec!["DECLARATION_DUE_DATE".to_string()],
        })
        .context("Cannot audit export.csv");

        assert_eq!(exit_status(&err), EXIT_BAD_INPUT);
    }

    #[test]
    fn test_other_errors_get_generic_status() {
        let err = anyhow::Error::new(AuditError::InvalidAuditDate("soon".to_string()));
        assert_eq!(exit_status(&err), 1);

        let err = anyhow::anyhow!("Failed to open file: export.csv");
        assert_eq!(exit_status(&err), 1);
    }
}
