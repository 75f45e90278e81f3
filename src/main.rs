//! Entry point and operator CLI.
//!
//! - No subcommand: interactive menu. [1] searches an account and prints the
//!   summary, [2] builds the full one-pager and exports it.
//! - `lookup --acct ...`: one-shot report for scripts.
//! - `chunk --input ... --out ...`: split a CSV or workbook export into partitions.
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use onepager::chunker::{self, ChunkOptions};
use onepager::output;
use onepager::util::{format_int, normalize_account};
use onepager::{AppConfig, FollowUpInputs, LookupError, RecordStore, ReportAssembler};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "onepager")]
#[command(about = "Account lookup and NPA one-pager generation over partitioned JSON")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a one-pager for a single account
    Lookup(LookupArgs),
    /// Split a CSV or workbook export into prefix partitions plus a manifest
    Chunk(ChunkArgs),
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Account number (non-digits are ignored)
    #[arg(long)]
    acct: String,

    /// Follow-up date
    #[arg(long, default_value = "")]
    dt: String,

    /// Proposed OTS amount
    #[arg(long, default_value = "")]
    amt: String,

    #[arg(long, default_value = "")]
    remarks: String,

    /// Base adjustment subtracted from the outstanding in the P&L impact
    #[arg(long)]
    adj: Option<String>,

    /// Also write the report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write the report as a Field,Value CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Export to split (.csv, or .xlsb/.xlsx/.xls/.ods workbook)
    #[arg(long)]
    input: PathBuf,

    /// Output folder for partitions and manifest
    #[arg(long)]
    out: PathBuf,

    /// Worksheet to read when the input is a workbook
    #[arg(long, default_value = chunker::DEFAULT_SHEET)]
    sheet: String,

    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
    prefix_len: u64,

    /// Write a prefix bucket to disk after this many accounts
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    flush: u64,
}

/// Read a single line after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu after generating a one-pager.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn explain(err: &LookupError) -> String {
    match err {
        LookupError::InvalidIdentifier => "Account number required.".to_string(),
        LookupError::AccountNotFound { account } => format!("Account {} not found.", account),
        LookupError::ManifestUnavailable { .. } => format!("Dataset unavailable: {}", err),
    }
}

/// Handle option [1]: look the account up and show the on-screen summary.
fn handle_search(assembler: &ReportAssembler) {
    let acct = read_line("Account number: ");
    match assembler.assemble(&acct, &FollowUpInputs::default()) {
        Ok(report) => output::preview_report("Account summary", None, &report.summary_slots()),
        Err(e) => println!("{}\n", explain(&e)),
    }
}

/// Handle option [2]: collect follow-up inputs, print and export the one-pager.
fn handle_one_pager(assembler: &ReportAssembler) {
    let acct = read_line("Account number: ");
    if normalize_account(&acct).is_empty() {
        println!("Account number required.\n");
        return;
    }
    let follow = FollowUpInputs {
        date: read_line("Follow-up date: "),
        amount: read_line("Proposed OTS amount: "),
        remarks: read_line("Remarks: "),
        base_adjustment: None,
    };
    let report = match assembler.assemble(&acct, &follow) {
        Ok(r) => r,
        Err(e) => {
            println!("{}\n", explain(&e));
            return;
        }
    };

    output::preview_report("NPA One-Pager", Some(report.account.as_str()), &report.slots());
    let json = format!("onepager_{}.json", report.account);
    let csv = format!("onepager_{}.csv", report.account);
    if let Err(e) = output::write_json(&json, &report) {
        eprintln!("Write error: {}", e);
    }
    if let Err(e) = output::write_report_csv(&csv, &report) {
        eprintln!("Write error: {}", e);
    }
    println!("(Exported to {} and {})\n", json, csv);
}

fn interactive(store: &RecordStore) {
    let assembler = ReportAssembler::new(store);
    loop {
        println!("Account One-Pager");
        println!("[1] Search account");
        println!("[2] Generate one-pager");
        println!("[3] Exit\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_search(&assembler),
            "2" => {
                println!();
                handle_one_pager(&assembler);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => break,
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}

fn run_lookup(store: &RecordStore, args: LookupArgs) -> Result<()> {
    let follow = FollowUpInputs {
        date: args.dt,
        amount: args.amt,
        remarks: args.remarks,
        base_adjustment: args.adj,
    };
    let report = ReportAssembler::new(store).assemble(&args.acct, &follow)?;

    output::preview_report("NPA One-Pager", Some(report.account.as_str()), &report.slots());
    if let Some(path) = &args.json {
        output::write_json(path, &report)
            .map_err(|e| anyhow!("writing {}: {}", path.display(), e))?;
    }
    if let Some(path) = &args.csv {
        output::write_report_csv(path, &report)
            .map_err(|e| anyhow!("writing {}: {}", path.display(), e))?;
    }
    Ok(())
}

fn run_chunk(args: ChunkArgs) -> Result<()> {
    let options = ChunkOptions {
        prefix_len: args.prefix_len as usize,
        flush_every: args.flush as usize,
        sheet: args.sheet,
    };
    let report = chunker::build_chunks(&args.input, &args.out, &options)?;
    println!(
        "Done. {} rows read, {} skipped, {} partitions written to {}.",
        format_int(report.total_rows),
        format_int(report.skipped_rows),
        report.partitions.len(),
        args.out.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Some(Command::Chunk(args)) => run_chunk(args),
        Some(Command::Lookup(args)) => {
            let store = AppConfig::from_env()?.build_store()?;
            run_lookup(&store, args)
        }
        None => {
            let config = AppConfig::from_env()?;
            log::info!("reading partitions from {}", config.data_location);
            let store = config.build_store()?;
            interactive(&store);
            Ok(())
        }
    }
}
