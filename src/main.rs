use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use leapconv::config::Config;
use leapconv::convert::{convert, Mode, Record};
use leapconv::*;

/// Convert Unix, GPS, and GPS week/seconds timestamps to UTC
#[derive(Parser, Debug)]
#[command(name = "leapconv", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// auto, unix, gps, gps-week-seconds, or paragraph
    #[arg(short, long, default_value = "auto")]
    mode: Mode,

    /// Fetch a fresh leap second table even if the config says not to
    #[arg(long, conflicts_with = "offline")]
    refresh: bool,

    /// Use the built-in leap second table
    #[arg(long)]
    offline: bool,

    /// Print the leap second table in use and exit
    #[arg(long)]
    leaps: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Text to convert; read from stdin if absent
    input: Vec<String>,
}

fn print(index: usize, record: &Record) {
    println!("#{} {}", index + 1, record);
    if let Record::Converted(c) = record {
        println!("  Human readable (UTC)  {}", c.human_utc);
        println!("  Unix / POSIX seconds  {}", c.unix_seconds);
        println!("  Unix milliseconds     {}", c.unix_millis);
        println!("  GPS seconds           {}", c.gps_seconds);
        println!("  GPS WWWWSSSSSS        {}", c.gps_week_seconds);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::init_with_level(tracing::Level::DEBUG);
    } else {
        logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let table = Arc::new(Table::default());
    if !cli.offline && (cli.refresh || config.leapsecs.refresh) {
        let handle = nist::spawn_refresh(Arc::clone(&table), config.leapsecs.clone());
        let status = handle
            .join()
            .map_err(|_| anyhow!("leap second refresh panicked"))?;
        tracing::info!("{}", status);
    }
    if cli.leaps {
        print!("{}", table.current());
        return Ok(());
    }

    let input = if cli.input.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        cli.input.join(" ")
    };
    if input.trim().is_empty() {
        println!("Add some text or time before converting.");
        return Ok(());
    }

    let records = convert(&table.current(), &input, cli.mode);
    match records.len() {
        0 => println!("No valid time values found in the input."),
        1 => println!("Converted 1 value."),
        n => println!("Converted {} values.", n),
    }
    for (i, record) in records.iter().enumerate() {
        print(i, record);
    }
    Ok(())
}
