//! Classification service client.
//!
//! Contract: the artifact is uploaded as a multipart `file` part; the
//! response is `{ "label": "normal" | "abnormal" | "artifact",
//! "confidence": 0.0..=1.0 }`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::EncodedAudioArtifact;
use crate::config::RemoteConfig;

use super::RemoteError;

// ---------------------------------------------------------------------------
// Label / Classification
// ---------------------------------------------------------------------------

/// Verdict categories the classifier can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Normal,
    Abnormal,
    /// The sample is dominated by capture noise, not a biological signal.
    Artifact,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Abnormal => "abnormal",
            Label::Artifact => "artifact",
        }
    }
}

/// A classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub confidence: f32,
}

impl Classification {
    /// Enforce the contract: confidence must lie in `[0, 1]`.
    pub fn validated(self) -> Result<Self, RemoteError> {
        if !(0.0..=1.0).contains(&self.confidence) || !self.confidence.is_finite() {
            return Err(RemoteError::Contract(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// Async classification seam.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn Classifier>`).
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        artifact: &EncodedAudioArtifact,
    ) -> Result<Classification, RemoteError>;
}

// ---------------------------------------------------------------------------
// ApiClassifier
// ---------------------------------------------------------------------------

/// HTTP classifier client.  All connection details come from
/// [`RemoteConfig`]; nothing is hardcoded.
pub struct ApiClassifier {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl ApiClassifier {
    /// Build a client from application config, with the configured
    /// per-request timeout.
    pub fn from_config(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Classifier for ApiClassifier {
    async fn classify(
        &self,
        artifact: &EncodedAudioArtifact,
    ) -> Result<Classification, RemoteError> {
        let part = reqwest::multipart::Part::bytes(artifact.bytes().to_vec())
            .file_name("sample.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!(
            "{}/classify",
            self.config.classifier_url.trim_end_matches('/')
        );

        let mut req = self.client.post(&url).multipart(form);

        // Authorization only when a non-empty key is configured.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let verdict: Classification = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        verdict.validated()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
