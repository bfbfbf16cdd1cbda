//! Auscult — fixed-duration bio-acoustic sample recorder.
//!
//! Captures short heart/lung sound clips from a microphone, renders a live
//! and post-hoc waveform, produces a canonical in-memory WAV artifact, plays
//! it back, and submits it to external classification / denoising services.
//!
//! # Module map
//!
//! | Module     | Responsibility |
//! |------------|----------------|
//! | [`audio`]    | cpal capture stream + bounded frame buffer |
//! | [`codec`]    | deterministic PCM/WAV encoder and artifact type |
//! | [`session`]  | capture state machine and dual-timer auto-stop |
//! | [`viz`]      | waveform decimation, theming, raster cache, widget |
//! | [`playback`] | rodio playback + position clock + WAV export |
//! | [`remote`]   | classification / denoising service contracts |
//! | [`config`]   | TOML settings and platform paths |
//! | [`app`]      | egui window wiring it all together |

pub mod app;
pub mod audio;
pub mod codec;
pub mod config;
pub mod playback;
pub mod remote;
pub mod session;
pub mod viz;
