//! Denoising service client.
//!
//! Contract: a noise-reference recording and the captured artifact go up as
//! multipart parts `noise` and `audio`; the response body is a denoised WAV
//! in the same canonical layout, which is validated and rebuilt into an
//! [`EncodedAudioArtifact`].

use async_trait::async_trait;

use crate::codec::EncodedAudioArtifact;
use crate::config::RemoteConfig;

use super::RemoteError;

// ---------------------------------------------------------------------------
// Denoiser trait
// ---------------------------------------------------------------------------

/// Async denoising seam.
#[async_trait]
pub trait Denoiser: Send + Sync {
    /// Submit `noise_ref` (a WAV of ambient noise) and the captured
    /// artifact; returns the denoised artifact.
    async fn denoise(
        &self,
        noise_ref: Vec<u8>,
        artifact: &EncodedAudioArtifact,
    ) -> Result<EncodedAudioArtifact, RemoteError>;
}

// ---------------------------------------------------------------------------
// ApiDenoiser
// ---------------------------------------------------------------------------

/// HTTP denoiser client configured from [`RemoteConfig`].
pub struct ApiDenoiser {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl ApiDenoiser {
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
impl Denoiser for ApiDenoiser {
    async fn denoise(
        &self,
        noise_ref: Vec<u8>,
        artifact: &EncodedAudioArtifact,
    ) -> Result<EncodedAudioArtifact, RemoteError> {
        let noise_part = reqwest::multipart::Part::bytes(noise_ref)
            .file_name("noise.wav")
            .mime_str("audio/wav")?;
        let audio_part = reqwest::multipart::Part::bytes(artifact.bytes().to_vec())
            .file_name("sample.wav")
            .mime_str("audio/wav")?;
        let form = reqwest::multipart::Form::new()
            .part("noise", noise_part)
            .part("audio", audio_part);

        let url = format!(
            "{}/denoise",
            self.config.denoiser_url.trim_end_matches('/')
        );

        let mut req = self.client.post(&url).multipart(form);
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?.to_vec();
        EncodedAudioArtifact::from_wav_bytes(bytes)
            .map_err(|e| RemoteError::Contract(format!("response is not a canonical WAV: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_wav;

    /// An in-memory denoiser that echoes the input back, exercising the
    /// trait-object seam the app relies on.
    struct Echo;

    #[async_trait]
    impl Denoiser for Echo {
        async fn denoise(
            &self,
            _noise_ref: Vec<u8>,
            artifact: &EncodedAudioArtifact,
        ) -> Result<EncodedAudioArtifact, RemoteError> {
            EncodedAudioArtifact::from_wav_bytes(artifact.bytes().to_vec())
                .map_err(|e| RemoteError::Contract(e.to_string()))
        }
    }

    #[tokio::test]
    async fn denoiser_round_trips_a_canonical_artifact() {
        let artifact = encode_wav(&vec![0.2_f32; 960], 48_000, 1).unwrap();
        let denoiser: std::sync::Arc<dyn Denoiser> = std::sync::Arc::new(Echo);

        let out = denoiser.denoise(vec![0; 44], &artifact).await.unwrap();
        assert_eq!(out.bytes(), artifact.bytes());
        assert_eq!(out.sample_rate(), 48_000);
    }

    #[test]
    fn non_wav_response_violates_contract() {
        let err = EncodedAudioArtifact::from_wav_bytes(b"not a wav".to_vec()).unwrap_err();
        assert!(RemoteError::Contract(err.to_string())
            .to_string()
            .contains("contract"));
    }
}
