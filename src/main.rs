//! Application entry point — Auscult.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the classifier client from config.
//! 5. Create the command / event channels and the shared frame buffer.
//! 6. Spawn the capture controller on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use auscult::{
    app::AusculApp,
    audio::MicSource,
    config::AppConfig,
    remote::{ApiClassifier, Classifier},
    session::{new_shared_buffer, CaptureCommand, CaptureController, CaptureTiming, SessionEvent},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([440.0, 320.0])
        .with_min_inner_size([360.0, 260.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Auscult starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads — capture controller + HTTP)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Classifier client
    let classifier: Arc<dyn Classifier> = Arc::new(ApiClassifier::from_config(&config.remote));

    // 5. Channels + shared frame buffer
    let (cmd_tx, cmd_rx) = mpsc::channel::<CaptureCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(64);
    let buffer = new_shared_buffer();

    // 6. Capture controller on the tokio runtime
    let timing = CaptureTiming {
        tick: Duration::from_millis(config.capture.tick_ms),
        grace: Duration::from_millis(config.capture.grace_ms),
    };
    let controller = CaptureController::new(
        Box::new(MicSource::new()),
        Arc::clone(&buffer),
        event_tx,
        timing,
    );
    rt.spawn(controller.run(cmd_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = AusculApp::new(
        cmd_tx,
        event_rx,
        buffer,
        classifier,
        rt.handle().clone(),
        config.clone(),
    );
    let options = native_options(&config);

    eframe::run_native("Auscult", options, Box::new(move |_cc| Ok(Box::new(app))))
}
