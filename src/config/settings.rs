//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for the capture session timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Cooperative tick period in milliseconds.
    pub tick_ms: u64,
    /// Grace added past the target before the hard deadline forces a stop.
    pub grace_ms: u64,
    /// Default target duration in seconds.  Must be one of the recognized
    /// values {5, 10, 15, 30}; anything else falls back to 10.
    pub default_duration_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            grace_ms: 500,
            default_duration_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

/// Connection details for the external classification / denoising services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the classification service.
    pub classifier_url: String,
    /// Base URL of the denoising service.
    pub denoiser_url: String,
    /// API key — `None` for services that require no authentication.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a service response before timing out.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            classifier_url: "http://localhost:8080".into(),
            denoiser_url: "http://localhost:8081".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window appearance and waveform rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
    /// Render the waveform with the dark palette.
    pub dark_mode: bool,
    /// Width of one decimated waveform stroke in pixels.
    pub line_width: f32,
    /// Vertical gain applied to the waveform (biological signals are quiet).
    pub amplify: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
            dark_mode: true,
            line_width: 2.0,
            amplify: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use auscult::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture timer settings.
    pub capture: CaptureConfig,
    /// External service connection settings.
    pub remote: RemoteConfig,
    /// UI / waveform settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.capture.tick_ms, loaded.capture.tick_ms);
        assert_eq!(original.capture.grace_ms, loaded.capture.grace_ms);
        assert_eq!(
            original.capture.default_duration_secs,
            loaded.capture.default_duration_secs
        );

        assert_eq!(original.remote.classifier_url, loaded.remote.classifier_url);
        assert_eq!(original.remote.denoiser_url, loaded.remote.denoiser_url);
        assert_eq!(original.remote.api_key, loaded.remote.api_key);
        assert_eq!(original.remote.timeout_secs, loaded.remote.timeout_secs);

        assert_eq!(original.ui.dark_mode, loaded.ui.dark_mode);
        assert_eq!(original.ui.line_width, loaded.ui.line_width);
        assert_eq!(original.ui.amplify, loaded.ui.amplify);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.capture.tick_ms, default.capture.tick_ms);
        assert_eq!(config.remote.classifier_url, default.remote.classifier_url);
        assert_eq!(config.ui.dark_mode, default.ui.dark_mode);
    }

    /// Verify default timer values.
    #[test]
    fn default_timer_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.capture.tick_ms, 100);
        assert_eq!(cfg.capture.grace_ms, 500);
        assert_eq!(cfg.capture.default_duration_secs, 10);
        assert!(cfg.remote.api_key.is_none());
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.capture.default_duration_secs = 30;
        cfg.remote.classifier_url = "https://classify.example.org".into();
        cfg.remote.api_key = Some("sk-test".into());
        cfg.remote.timeout_secs = 60;
        cfg.ui.dark_mode = false;
        cfg.ui.window_position = Some((100.0, 200.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.capture.default_duration_secs, 30);
        assert_eq!(loaded.remote.classifier_url, "https://classify.example.org");
        assert_eq!(loaded.remote.api_key, Some("sk-test".into()));
        assert_eq!(loaded.remote.timeout_secs, 60);
        assert!(!loaded.ui.dark_mode);
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
    }
}
