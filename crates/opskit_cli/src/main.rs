use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opskit_report::util::{format_date, resolve_reference_date};
use opskit_report::{
    SpecToolkitConfig, compare_chgs, derive_incident_statistics, generate_chg_report,
    generate_incident_report, parse_incident_document, process_tests, update_occurrences,
    write_comparison_workbook,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const C_LOG_FILE_DEFAULT: &str = "chg_logs.log";

/// QD operations toolkit: test-result merge, occurrences refresh and shift reports.
#[derive(Parser)]
#[command(name = "opskit", version)]
struct Args {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Append logs to a file instead of stderr (defaults to `chg_logs.log` when given without a value).
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = C_LOG_FILE_DEFAULT, global = true)]
    log_file: Option<PathBuf>,

    /// JSON file overriding the built-in business tables.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append the notebook's validated test rows to the daily tracking workbook.
    MergeTests {
        /// Test notebook workbook.
        #[arg(long)]
        notebook: PathBuf,
        /// Daily tracking workbook.
        #[arg(long)]
        daily: PathBuf,
        /// Date stamped on the appended rows (`DD/MM/YYYY`, default today).
        #[arg(long)]
        date: Option<String>,
        /// Output workbook (default: overwrite `--daily`).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Refresh the occurrences workbook from the functional and critical extractions.
    UpdateOccurrences {
        #[arg(long)]
        base: PathBuf,
        #[arg(long)]
        functional: PathBuf,
        #[arg(long)]
        critical: PathBuf,
        /// Output workbook (default: overwrite `--base`).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the CHG digest for the overnight window.
    ChgReport {
        workbook: PathBuf,
        /// Reference day (`DD/MM/YYYY` or `YYYY-MM-DD`, default today).
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the incident report from an incident export (file or `-` for stdin).
    IncidentReport {
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Report date (`DD/MM/YYYY` or `YYYY-MM-DD`, default today).
        #[arg(long)]
        date: Option<String>,
        /// Print per-category counts as JSON instead of the report.
        #[arg(long)]
        stats: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Reconcile the principal CHG table against the e-mail table.
    CompareChgs {
        #[arg(long)]
        principal: PathBuf,
        #[arg(long)]
        email: PathBuf,
        /// Output workbook with the new, missing and common sheets.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;
    let cfg = load_config(args.config.as_deref())?;
    run(args.command, &cfg)
}

fn init_logging(c_level: &str, path_log: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(c_level))
        .with_context(|| format!("invalid log level `{c_level}`"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match path_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SpecToolkitConfig> {
    let Some(path) = path else {
        return Ok(SpecToolkitConfig::default());
    };
    let c_json = fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    serde_json::from_str(&c_json).with_context(|| format!("invalid config {}", path.display()))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}

fn emit_text(c_text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_bytes(path, c_text.as_bytes()),
        None => {
            println!("{c_text}");
            Ok(())
        }
    }
}

fn run(command: Command, cfg: &SpecToolkitConfig) -> Result<()> {
    match command {
        Command::MergeTests {
            notebook,
            daily,
            date,
            output,
        } => {
            let v_notebook = read_bytes(&notebook)?;
            let v_daily = read_bytes(&daily)?;
            let merged = process_tests(&v_notebook, &v_daily, date.as_deref(), &cfg.merge)
                .context("test merge failed")?;
            for c_warning in &merged.report.warnings {
                warn!(warning = %c_warning, "merge warning");
            }
            let path_out = output.unwrap_or(daily);
            write_bytes(&path_out, &merged.bytes)?;
            info!(
                rows = merged.n_rows_appended,
                date = %merged.report.date,
                output = %path_out.display(),
                "test rows appended"
            );
            println!(
                "{} rows appended to {}",
                merged.n_rows_appended,
                path_out.display()
            );
        }
        Command::UpdateOccurrences {
            base,
            functional,
            critical,
            output,
        } => {
            let refreshed = update_occurrences(
                &read_bytes(&base)?,
                &read_bytes(&functional)?,
                &read_bytes(&critical)?,
                &cfg.occurrences,
            )
            .context("occurrences refresh failed")?;
            let path_out = output.unwrap_or(base);
            write_bytes(&path_out, &refreshed.bytes)?;
            println!(
                "{} records written to {}",
                refreshed.n_records,
                path_out.display()
            );
        }
        Command::ChgReport {
            workbook,
            date,
            output,
        } => {
            let reference_date = resolve_reference_date(date.as_deref())?;
            let report = generate_chg_report(&read_bytes(&workbook)?, reference_date, &cfg.chg)
                .context("CHG report failed")?;
            info!(
                date = %format_date(report.reference_date),
                selected = report.n_selected,
                bad_dates = report.n_rows_bad_date,
                "CHG report generated"
            );
            emit_text(&report.text, output.as_deref())?;
        }
        Command::IncidentReport {
            input,
            date,
            stats,
            output,
        } => {
            let c_json = read_incident_input(&input)?;
            let c_text = if stats {
                let doc = parse_incident_document(&c_json)?;
                serde_json::to_string_pretty(&derive_incident_statistics(&doc.records))?
            } else {
                let date = resolve_reference_date(date.as_deref())?;
                generate_incident_report(&c_json, date, &cfg.incident)
                    .context("incident report failed")?
            };
            emit_text(&c_text, output.as_deref())?;
        }
        Command::CompareChgs {
            principal,
            email,
            output,
        } => {
            let cmp = compare_chgs(&read_bytes(&principal)?, &read_bytes(&email)?)
                .context("CHG comparison failed")?;
            for c_warning in &cmp.warnings {
                warn!(warning = %c_warning, "comparison warning");
            }
            let (bytes, _) = write_comparison_workbook(&cmp)?;
            write_bytes(&output, &bytes)?;
            let (n_new, n_missing, n_common) = cmp.counts();
            println!("new: {n_new}, missing: {n_missing}, common: {n_common}");
        }
    }
    Ok(())
}

fn read_incident_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut c_json = String::new();
        io::stdin()
            .read_to_string(&mut c_json)
            .context("cannot read incident export from stdin")?;
        return Ok(c_json);
    }
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}
