use anyhow::Result;
use clap::Parser;

use pattern_scout::{Cli, analyze_symbol, data::load_candle_file};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (symbol, requests) = load_candle_file(&cli.input)?;
    log::info!(
        "analyzing {} across {} timeframe(s)",
        symbol,
        requests.len()
    );

    let report = analyze_symbol(&symbol, &requests)?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
