//! `model-search`: compose SQL for a model search request.

use std::io::Read;

use clap::Parser;
use helios_model_search_cli::{CliConfig, init_logging, run};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let needs_request = config
        .output_format()
        .map(|format| format.needs_request())
        .unwrap_or(false);
    let request = match &config.request {
        Some(request) => request.clone(),
        None if needs_request => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
        None => String::new(),
    };

    info!(
        entity = ?config.entity,
        output = %config.output,
        strategy = %config.relation_strategy,
        "Running model search"
    );

    println!("{}", run(&config, &request)?);
    Ok(())
}
