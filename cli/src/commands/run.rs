use std::path::PathBuf;

use acdps::{load_dataset, write_output, Config, Pipeline};
use anyhow::Result;

use crate::cli::{Cli, RunArgs};

/// Configuration file values with command-line overrides applied.
fn effective_config(args: &RunArgs) -> Result<Config> {
    let mut config = super::config::load(args.config.as_deref())?;

    if let Some(format) = args.format { config.output_format = format.into() }
    if let Some(n) = args.lower_limit { config.lower_limit = n }
    if let Some(n) = args.limit_to_stop { config.limit_to_stop = n }
    if let Some(p) = args.percent_range { config.percent_range = p }
    if let Some(s) = args.buffer_step { config.buffer_step = s }

    config.validate()?;
    Ok(config)
}

pub fn run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let config = effective_config(args)?;
    let out_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));

    println!("[acdps] loading input from {}", args.input.display());
    let dataset = load_dataset(&args.input, &config)?;
    println!(
        "[acdps] {} districts, {} sectors, {} seeds",
        dataset.districts.len(), dataset.sectors.len(), dataset.seeds.len(),
    );

    println!(
        "[acdps] aggregating with limit_to_stop={} (+{}%), lower_limit={}, buffer_step={}",
        config.limit_to_stop, config.percent_range, config.lower_limit, config.buffer_step,
    );
    let output = Pipeline::new(config.clone())?.run(&dataset)?;
    println!(
        "[acdps] built {} units, {} orphan sectors, {} diagnostics",
        output.acdps.len(), output.orphans.len(), output.report.diagnostics.len(),
    );

    if cli.verbose > 0 {
        for (kind, count) in output.report.summary() {
            println!("[acdps]   {kind}: {count}");
        }
    }
    if cli.verbose > 1 {
        for diagnostic in &output.report.diagnostics {
            eprintln!("[acdps] {diagnostic}");
        }
    }

    println!("[acdps] writing {} output to {}", config.output_format.extension(), out_dir.display());
    for path in write_output(&output, &out_dir, &config)? {
        if cli.verbose > 0 { println!("[acdps]   {}", path.display()) }
    }

    Ok(())
}
