mod app;
mod sink;
mod storage;

use anyhow::{Result, bail};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let paradigm = args.get(1).map(String::as_str);
    let config_path = args.get(2).map(std::path::Path::new);

    match paradigm {
        Some("gonogo") => app::run_gonogo(config_path),
        Some("rhythm") => app::run_rhythm(config_path),
        _ => bail!("usage: cadence <gonogo|rhythm> [config.json]"),
    }
}
