use std::fs::File;
use std::io::BufWriter;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tally::cli::{AddArgs, Cli, Command, DbArgs, ExportArgs, ScanArgs};
use tally::config::{self, Config, FileConfig};
use tally::error::{Error, Result};
use tally::export;
use tally::platform;
use tally::report;
use tally::scan::{self, cancel::CancelToken, progress::ConsoleProgress, AddOutcome};
use tally::store::Store;
use tally::util;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "tally=debug" } else { "tally=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_scan(args: &ScanArgs, file_config: &FileConfig, must_exist: bool) -> Result<()> {
    let config = Config::from_scan_args(args, file_config)?;

    let mut store = if must_exist {
        Store::open_existing(&config.database)?
    } else {
        Store::open(&config.database)?
    };

    let cancel = match config.timeout {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::new(),
    };

    let result = if config.json_output {
        scan::run(&mut store, &config.scan, &cancel, &scan::progress::NoProgress)
    } else {
        scan::run(&mut store, &config.scan, &cancel, &ConsoleProgress::default())
    };

    let scan_report = match (result, config.timeout) {
        (Err(Error::Cancelled), Some(timeout)) => {
            warn!(
                "scan did not finish within {}, nothing was written",
                humantime::format_duration(timeout)
            );
            return Err(Error::Cancelled);
        }
        (result, _) => result?,
    };

    report::print(&scan_report, &config);
    Ok(())
}

fn run_add(args: &AddArgs, file_config: &FileConfig) -> Result<()> {
    let db_path = config::resolve_db_path(&args.db, file_config)?;
    let mut store = Store::open(&db_path)?;

    match scan::add_path(&mut store, &args.path)? {
        AddOutcome::Added(record) => {
            let size = record.size_bytes.map(util::format_bytes).unwrap_or_else(|| "folder".to_string());
            println!("added: {} ({size})", record.path);
        }
        AddOutcome::AlreadyPresent => {
            println!("already in inventory: {}", args.path.display());
        }
    }
    Ok(())
}

fn run_export(args: &ExportArgs, file_config: &FileConfig) -> Result<()> {
    let db_path = config::resolve_db_path(&args.db, file_config)?;
    let store = Store::open_existing(&db_path)?;
    let records = store.records()?;

    let file = File::create(&args.out).map_err(|e| Error::io(&args.out, e))?;
    let mut out = BufWriter::new(file);
    let written = export::write_all(&records, args.style, &mut out).map_err(|e| Error::io(&args.out, e))?;

    println!("exported {written} records from {} to {}", db_path.display(), args.out.display());
    Ok(())
}

fn run_duplicates(args: &DbArgs, file_config: &FileConfig) -> Result<()> {
    let db_path = config::resolve_db_path(args, file_config)?;
    let store = Store::open_existing(&db_path)?;
    let duplicates = store.duplicate_names()?;

    if duplicates.is_empty() {
        println!("No duplicate names found.");
        return Ok(());
    }

    println!("{:<8} Name", "Count");
    println!("{}", "-".repeat(60));
    for (name, count) in duplicates {
        println!("{count:<8} {name}");
    }
    Ok(())
}

fn run_volumes() {
    let volumes = platform::volumes();
    if volumes.is_empty() {
        println!("No volumes found.");
        return;
    }

    println!("{:<4} {:<30} Mount point", "#", "Device");
    println!("{}", "-".repeat(60));
    for (i, volume) in volumes.iter().enumerate() {
        println!("{:<4} {:<30} {}", i + 1, volume.device, volume.mount_point.display());
    }
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Command::Scan(a) | Command::Update(a) if a.verbose);
    init_logging(verbose);

    let file_config = match FileConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Scan(args) => run_scan(args, &file_config, false),
        Command::Update(args) => run_scan(args, &file_config, true),
        Command::Add(args) => run_add(args, &file_config),
        Command::Export(args) => run_export(args, &file_config),
        Command::Duplicates(args) => run_duplicates(args, &file_config),
        Command::Volumes => {
            run_volumes();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
