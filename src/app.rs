//! Auscult desktop window — egui/eframe application.
//!
//! # Architecture
//!
//! [`AusculApp`] is the top-level [`eframe::App`].  It owns two channel
//! endpoints:
//!
//! * `cmd_tx` — sends [`CaptureCommand`]s to the capture controller.
//! * `event_rx` — receives [`SessionEvent`]s from the controller.
//!
//! The UI mirrors the controller's [`CaptureState`] and renders one of the
//! two waveform paths: live (while a session is active) or static with a
//! playback cursor (once an artifact exists).  Playback runs on this thread;
//! classification requests are spawned onto the tokio runtime and polled.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::codec;
use crate::config::AppConfig;
use crate::playback::{PlaybackController, PlaybackState};
use crate::remote::{Classification, Classifier, RemoteError};
use crate::session::{CaptureCommand, CaptureState, ClipDuration, SessionEvent, SharedFrameBuffer};
use crate::viz::{palette, StaticWaveform, WaveformView};

/// Height of the waveform canvas in pixels.
const WAVEFORM_HEIGHT: f32 = 140.0;

// ---------------------------------------------------------------------------
// AusculApp
// ---------------------------------------------------------------------------

/// eframe application — capture, review, classify.
pub struct AusculApp {
    // ── Capture mirror ───────────────────────────────────────────────────
    capture_state: CaptureState,
    elapsed: Duration,
    target: ClipDuration,
    error_line: Option<String>,

    // ── Artifact / playback ──────────────────────────────────────────────
    /// Decoded samples of the current artifact, for static rendering.
    artifact_samples: Vec<f32>,
    /// Bumped on every new artifact so the raster cache re-renders.
    artifact_revision: u64,
    playback: PlaybackController,
    playback_state: PlaybackState,

    // ── Classification ───────────────────────────────────────────────────
    classification: Option<Classification>,
    classify_rx: Option<std_mpsc::Receiver<Result<Classification, RemoteError>>>,

    // ── Rendering ────────────────────────────────────────────────────────
    view: WaveformView,
    static_wave: StaticWaveform,
    dark_mode: bool,

    // ── Channels / services ──────────────────────────────────────────────
    cmd_tx: mpsc::Sender<CaptureCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,
    buffer: SharedFrameBuffer,
    classifier: Arc<dyn Classifier>,
    rt: tokio::runtime::Handle,

    // ── Configuration ────────────────────────────────────────────────────
    config: AppConfig,
}

impl AusculApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cmd_tx: mpsc::Sender<CaptureCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        buffer: SharedFrameBuffer,
        classifier: Arc<dyn Classifier>,
        rt: tokio::runtime::Handle,
        config: AppConfig,
    ) -> Self {
        let target = ClipDuration::from_secs(config.capture.default_duration_secs)
            .unwrap_or_default();

        Self {
            capture_state: CaptureState::Idle,
            elapsed: Duration::ZERO,
            target,
            error_line: None,
            artifact_samples: Vec::new(),
            artifact_revision: 0,
            playback: PlaybackController::new(),
            playback_state: PlaybackState::default(),
            classification: None,
            classify_rx: None,
            view: WaveformView {
                line_width: config.ui.line_width,
                amplify: config.ui.amplify,
            },
            static_wave: StaticWaveform::new(),
            dark_mode: config.ui.dark_mode,
            cmd_tx,
            event_rx,
            buffer,
            classifier,
            rt,
            config,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending session events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SessionEvent::StateChanged(state) => {
                    self.capture_state = state;
                    if state == CaptureState::Recording {
                        // One in-memory artifact per session: the previous
                        // one is gone the moment a new capture begins.
                        self.elapsed = Duration::ZERO;
                        self.error_line = None;
                        self.discard_artifact();
                    }
                }
                SessionEvent::Progress { elapsed, .. } => {
                    self.elapsed = elapsed;
                }
                SessionEvent::Completed(artifact) => {
                    match codec::decode_wav(artifact.bytes()) {
                        Ok(decoded) => self.artifact_samples = decoded.samples,
                        Err(e) => {
                            log::warn!("app: artifact decode for rendering failed: {e}");
                            self.artifact_samples = Vec::new();
                        }
                    }
                    self.artifact_revision += 1;
                    self.playback.load(artifact);
                    self.classification = None;
                }
                SessionEvent::Failed { message, .. } => {
                    self.error_line = Some(message);
                }
            }
        }
    }

    /// Poll an in-flight classification request, if any.
    fn poll_classification(&mut self) {
        let Some(rx) = &self.classify_rx else { return };
        match rx.try_recv() {
            Ok(Ok(verdict)) => {
                self.classification = Some(verdict);
                self.classify_rx = None;
            }
            Ok(Err(e)) => {
                self.error_line = Some(format!("Classification failed: {e}"));
                self.classify_rx = None;
            }
            Err(std_mpsc::TryRecvError::Empty) => {}
            Err(std_mpsc::TryRecvError::Disconnected) => {
                self.error_line = Some("Classification task vanished".into());
                self.classify_rx = None;
            }
        }
    }

    fn discard_artifact(&mut self) {
        self.artifact_samples = Vec::new();
        self.playback.unload();
        self.playback_state = PlaybackState::default();
        self.classification = None;
        self.static_wave.invalidate();
    }

    // ── Actions ──────────────────────────────────────────────────────────

    fn start_capture(&mut self) {
        let _ = self.cmd_tx.try_send(CaptureCommand::Start {
            target: self.target,
        });
    }

    fn stop_capture(&mut self) {
        let _ = self.cmd_tx.try_send(CaptureCommand::Stop);
    }

    fn toggle_playback(&mut self) {
        if let Err(e) = self.playback.toggle() {
            // Reported, never fatal; capture state is untouched.
            self.error_line = Some(e.to_string());
        }
    }

    fn export_artifact(&mut self) {
        let name = format!(
            "auscult-{}.wav",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        );
        let path = crate::config::AppPaths::new().export_dir.join(name);
        match self.playback.export_wav(&path) {
            Ok(()) => log::info!("app: exported WAV to {}", path.display()),
            Err(e) => self.error_line = Some(e.to_string()),
        }
    }

    fn request_classification(&mut self) {
        let Some(artifact) = self.playback.artifact().cloned() else {
            return;
        };
        let (tx, rx) = std_mpsc::channel();
        let classifier = Arc::clone(&self.classifier);
        self.rt.spawn(async move {
            let _ = tx.send(classifier.classify(&artifact).await);
        });
        self.classify_rx = Some(rx);
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_status_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(self.capture_state.label())
                    .color(self.state_color())
                    .size(13.0),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.capture_state == CaptureState::Recording {
                    ui.label(
                        egui::RichText::new(format!(
                            "{:.1} / {} s",
                            self.elapsed.as_secs_f32(),
                            self.target.as_secs()
                        ))
                        .size(12.0),
                    );
                }
                // Theme flip re-renders colors only; decimation is untouched.
                let icon = if self.dark_mode { "light" } else { "dark" };
                if ui.small_button(icon).clicked() {
                    self.dark_mode = !self.dark_mode;
                }
            });
        });
    }

    fn draw_capture_row(&mut self, ui: &mut egui::Ui) {
        let active = self.capture_state.is_active();

        ui.horizontal(|ui| {
            for duration in ClipDuration::ALL {
                let selected = self.target == duration;
                if ui
                    .add_enabled(!active, egui::SelectableLabel::new(selected, duration.label()))
                    .clicked()
                {
                    self.target = duration;
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if active {
                    if ui.button("Stop").clicked() {
                        self.stop_capture();
                    }
                } else if ui.button("Record").clicked() {
                    self.start_capture();
                }
            });
        });
    }

    fn draw_waveform(&mut self, ui: &mut egui::Ui) {
        let colors = palette(self.dark_mode);

        if self.capture_state.is_active() {
            let snapshot = self
                .buffer
                .lock()
                .map(|buf| buf.snapshot())
                .unwrap_or_default();
            let progress =
                self.elapsed.as_secs_f32() / self.target.duration().as_secs_f32();
            self.view
                .live(ui, WAVEFORM_HEIGHT, &snapshot, progress, &colors);
        } else if !self.artifact_samples.is_empty() {
            let width = ui.available_width().max(1.0) as usize;
            let texture = self.static_wave.ensure(
                ui.ctx(),
                &self.artifact_samples,
                width,
                WAVEFORM_HEIGHT as usize,
                self.dark_mode,
                self.artifact_revision,
                &self.view,
                &colors,
            );
            let texture = texture.clone();
            self.view.static_view(
                ui,
                WAVEFORM_HEIGHT,
                &texture,
                self.playback_state.cursor_frac(),
                &colors,
            );
        } else {
            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), WAVEFORM_HEIGHT),
                egui::Sense::hover(),
            );
            ui.painter().rect_filled(rect, 2.0, colors.background);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No recording yet",
                egui::FontId::proportional(13.0),
                colors.grid,
            );
        }
    }

    fn draw_playback_row(&mut self, ui: &mut egui::Ui) {
        if self.playback.artifact().is_none() {
            return;
        }

        ui.horizontal(|ui| {
            let label = if self.playback_state.is_playing {
                "Pause"
            } else {
                "Play"
            };
            if ui.button(label).clicked() {
                self.toggle_playback();
            }

            ui.label(
                egui::RichText::new(format!(
                    "{:.1} / {:.1} s",
                    self.playback_state.position.as_secs_f32(),
                    self.playback_state.duration.as_secs_f32()
                ))
                .size(12.0),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Export WAV").clicked() {
                    self.export_artifact();
                }
                let classifying = self.classify_rx.is_some();
                if ui
                    .add_enabled(!classifying, egui::Button::new("Classify"))
                    .clicked()
                {
                    self.request_classification();
                }
            });
        });

        if let Some(verdict) = &self.classification {
            ui.label(
                egui::RichText::new(format!(
                    "{} ({:.0}% confidence)",
                    verdict.label.as_str(),
                    verdict.confidence * 100.0
                ))
                .color(egui::Color32::from_rgb(80, 200, 120))
                .size(12.0),
            );
        } else if self.classify_rx.is_some() {
            ui.label(egui::RichText::new("Classifying…").size(12.0));
        }
    }

    fn draw_error_line(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.error_line.clone() {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(message)
                        .color(egui::Color32::from_rgb(255, 136, 68))
                        .size(12.0),
                );
                if ui.small_button("x").clicked() {
                    self.error_line = None;
                }
            });
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn state_color(&self) -> egui::Color32 {
        match self.capture_state {
            CaptureState::Idle => egui::Color32::from_rgb(120, 120, 120),
            CaptureState::Acquiring => egui::Color32::from_rgb(230, 200, 80),
            CaptureState::Recording => egui::Color32::from_rgb(255, 68, 68),
            CaptureState::Stopping => egui::Color32::from_rgb(230, 200, 80),
            CaptureState::Processing => egui::Color32::from_rgb(68, 136, 255),
            CaptureState::Error => egui::Color32::from_rgb(255, 136, 68),
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AusculApp {
    /// Called every frame by eframe.  Polls channels, refreshes playback
    /// position, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.poll_classification();
        self.playback_state = self.playback.poll();

        // --- Repaint scheduling: exactly one pending frame at a time ------
        if self.capture_state.is_active() {
            // ~30 fps for the live waveform.
            ctx.request_repaint_after(Duration::from_millis(33));
        } else if self.playback_state.is_playing || self.classify_rx.is_some() {
            // ~20 Hz position reporting drives the static-path cursor.
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_status_row(ui);
            ui.separator();
            self.draw_capture_row(ui);
            ui.add_space(4.0);
            self.draw_waveform(ui);
            ui.add_space(4.0);
            self.draw_playback_row(ui);
            self.draw_error_line(ui);
        });
    }

    /// Persist UI settings on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.ui.dark_mode = self.dark_mode;
        if let Err(e) = self.config.save() {
            log::warn!("app: failed to save settings: {e}");
        }
        log::info!("Auscult closing");
    }
}
