mod app;

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use luadeobf_core::{DeobfConfig, Pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --verbose enables debug for our crates; RUST_LOG wins when set
    let default_filter = if cli.verbose {
        "luadeobf_core=debug,luadeobf=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();

    let result = run(&cli);

    if cli.pause {
        print!("Press enter to close the script.");
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok();
    }

    result
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let mut pipeline = Pipeline::from_config(&config)?;
    let (output, report) = pipeline
        .run_with_report(&source)
        .with_context(|| format!("failed to deobfuscate {}", cli.input.display()))?;

    for pass in &report.passes {
        info!(pass = pass.name, changed = pass.changed, "pass summary");
    }

    fs::write(&cli.output, output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    println!("Deobfuscated saved to {}", cli.output.display());
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<DeobfConfig> {
    let mut config = match &cli.config {
        Some(path) => DeobfConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DeobfConfig::default(),
    };

    if cli.no_fold {
        config.fold_arithmetic = false;
    }
    if let Some(width) = cli.indent {
        config.indent_width = width;
    }

    Ok(config)
}
