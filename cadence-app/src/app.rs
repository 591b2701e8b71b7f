use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use cadence_core::{AbortReason, RunMeta};
use cadence_experiment::{GoNogoConfig, GoNogoRunner, RhythmConfig, RhythmRunner};
use cadence_experiment::build_trial_schedule;
use cadence_timing::{AbortFlag, high_precision_sleep};

use crate::sink::ConsoleSink;
use crate::storage;

/// Host loop step for the polled Go/No-Go machine.
const UPDATE_STEP: Duration = Duration::from_millis(1);

/// Headless stand-in for the ESC key: pressing Enter while a run is active
/// requests an abort. The watcher thread stays parked on stdin and dies with
/// the process.
fn watch_stdin_for_abort(flag: AbortFlag) {
    std::thread::spawn(move || {
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_ok() {
            flag.request();
        }
    });
}

fn load_config<C: DeserializeOwned + Default>(path: Option<&Path>) -> Result<C> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(C::default()),
    }
}

pub fn run_gonogo(config_path: Option<&Path>) -> Result<()> {
    let config: GoNogoConfig = load_config(config_path)?;
    config.validate()?;

    let mut rng = rand::rng();
    let schedule = build_trial_schedule(&config, &mut rng)?;
    let meta = RunMeta::new(&config.paradigm_name, "");

    let abort = AbortFlag::new();
    watch_stdin_for_abort(abort.clone());

    let mut sink = ConsoleSink::default();
    let mut runner = GoNogoRunner::new(config, schedule, meta);
    runner.start(&mut sink);
    while !runner.is_terminal() {
        if abort.is_set() {
            runner.abort(AbortReason::EscPressed, &mut sink);
            break;
        }
        runner.update(&mut sink);
        high_precision_sleep(UPDATE_STEP);
    }
    let log = runner.into_log();

    if let Some(metrics) = &log.metrics {
        info!(
            go_hit_percent = ?metrics.go_hit_percent,
            nogo_commission_percent = ?metrics.nogo_commission_percent,
            mean_rt_go_hit = ?metrics.mean_rt_go_hit,
            mean_rt_nogo_commission = ?metrics.mean_rt_nogo_commission,
            "session metrics"
        );
    }

    persist(
        &log,
        log.config.test_mode,
        &log.config.output_folder,
        &log.config.paradigm_name,
        log.experiment_start.map(|p| p.wall),
    )
}

pub fn run_rhythm(config_path: Option<&Path>) -> Result<()> {
    let config: RhythmConfig = load_config(config_path)?;
    config.validate()?;
    let meta = RunMeta::new(&config.paradigm_name, "");

    let mut sink = ConsoleSink::default();
    let runner = RhythmRunner::new(config, meta);
    watch_stdin_for_abort(runner.abort_flag());
    let log = runner.run(&mut sink);

    persist(
        &log,
        log.config.test_mode,
        &log.config.output_folder,
        &log.config.paradigm_name,
        log.paradigm_start.map(|p| p.wall),
    )
}

fn persist<T: serde::Serialize>(
    log: &T,
    test_mode: bool,
    output_folder: &str,
    prefix: &str,
    start_wall: Option<chrono::DateTime<chrono::Local>>,
) -> Result<()> {
    if test_mode {
        warn!("test mode: log not written");
        return Ok(());
    }
    let folder = Path::new(output_folder);
    storage::ensure_directory(folder)?;
    let start = start_wall.unwrap_or_else(chrono::Local::now);
    let path = storage::build_timestamped_path(folder, prefix, &start, "json");
    storage::save_log_json(log, &path)?;
    info!(path = %path.display(), "log saved");
    Ok(())
}
