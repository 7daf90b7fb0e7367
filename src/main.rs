//! # minehealth
//!
//! Command-line host for the minehealth monitor.
//!
//! ## Usage
//!
//! ```bash
//! # Monitor with stock thresholds
//! minehealth
//!
//! # Reproducible run, stop after 100 ticks, log alerts
//! minehealth --seed 7 --ticks 100 --alert-csv-file alerts.csv
//!
//! # One-off failure prediction
//! MINEHEALTH_PREDICT_URL=http://localhost:8080/predict \
//!     minehealth predict --component sheave --temperature 61
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use minehealth::config::{Command, Config, MonitorArgs, PredictArgs};
use minehealth::prediction::{run_prediction, HttpPredictor, PredictionRequest};
use minehealth::{ui, CsvLog, LogNotifier, Monitor, Result, Simulator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let outcome = match config.command {
        Some(Command::Predict(ref args)) => predict(args),
        Some(Command::Monitor) | None => monitor(&config.monitor),
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn monitor(args: &MonitorArgs) -> Result<()> {
    let simulator = match args.seed {
        Some(seed) => Simulator::seeded(seed),
        None => Simulator::from_entropy(),
    }
    .with_history_mode(args.history_mode);

    let log = CsvLog::open(args.csv_file.as_deref(), args.alert_csv_file.as_deref())?;
    let mut monitor = Monitor::new(
        simulator,
        args.threshold_store(),
        args.alert_settings(),
        LogNotifier,
    )
    .with_log(log);

    // Setup Ctrl+C / SIGTERM handler
    let running = Arc::new(AtomicBool::new(true));
    setup_signal_handler(running.clone());

    ui::run_headless(
        &mut monitor,
        &running,
        Duration::from_secs(args.interval.max(1)),
        args.ticks,
    )
}

fn predict(args: &PredictArgs) -> Result<()> {
    let mut request = PredictionRequest {
        component_type: args.component,
        temperature: args.temperature,
        corrosion: args.corrosion,
        diameter_reduction: args.diameter_reduction,
        strength: args.strength,
        historical_data: None,
    };
    if let Some(ref notes) = args.notes {
        request = request.with_notes(notes.clone());
    }

    let predictor = HttpPredictor::new(&args.endpoint, Duration::from_secs(args.timeout))?;
    match run_prediction(&predictor, &request) {
        Ok(response) => {
            println!("{}", ui::format_prediction(&request, &response));
            Ok(())
        }
        Err(err) => {
            eprintln!("Prediction failed. Please try again.");
            Err(err.into())
        }
    }
}

/// Global flag for signal handler (must be static for signal safety).
static SIGNAL_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Set up signal handlers for graceful shutdown.
fn setup_signal_handler(running: Arc<AtomicBool>) {
    // Forward the signal flag to `running` from a watcher thread
    std::thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            if SIGNAL_RECEIVED.load(Ordering::Relaxed) {
                running.store(false, Ordering::Relaxed);
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    });

    unsafe {
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

/// Signal handler that sets the signal flag (async-signal-safe).
extern "C" fn signal_handler(_: i32) {
    SIGNAL_RECEIVED.store(true, Ordering::Relaxed);
}
