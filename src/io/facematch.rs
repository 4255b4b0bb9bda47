//! HTTP client for the external face-match service
//!
//! The service holds the enrolled face gallery; the engine only forwards
//! image bytes (base64 in a JSON body) and reads back the best match with
//! its similarity score. Matches below the configured similarity cutoff
//! are treated as no-match.

use crate::domain::types::EmployeeId;
use crate::io::{FaceMatch, IdentityMatcher};
use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct MatchRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    /// Best gallery match; null when nothing cleared the service's own cutoff
    employee_id: Option<i64>,
    #[serde(default)]
    similarity: f64,
}

/// Thin adapter over the face-recognition vendor API
pub struct FaceMatchClient {
    http: reqwest::Client,
    base_url: String,
    min_similarity: f64,
}

impl FaceMatchClient {
    pub fn new(base_url: &str, min_similarity: f64, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build face match http client")?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), min_similarity })
    }

    /// Apply the local similarity cutoff on top of the service's answer
    fn to_match(response: MatchResponse, min_similarity: f64) -> Option<FaceMatch> {
        let employee_id = response.employee_id?;
        if response.similarity < min_similarity {
            debug!(
                employee_id = %employee_id,
                similarity = %response.similarity,
                "face_match_below_cutoff"
            );
            return None;
        }
        Some(FaceMatch { employee_id: EmployeeId(employee_id), similarity: response.similarity })
    }
}

#[async_trait]
impl IdentityMatcher for FaceMatchClient {
    async fn match_face(&self, image: &[u8]) -> anyhow::Result<Option<FaceMatch>> {
        let body = MatchRequest { image: BASE64.encode(image) };

        let response = self
            .http
            .post(format!("{}/match", self.base_url))
            .json(&body)
            .send()
            .await
            .context("face match request failed")?
            .error_for_status()
            .context("face match service returned an error")?;

        let parsed: MatchResponse =
            response.json().await.context("invalid face match response")?;

        Ok(Self::to_match(parsed, self.min_similarity))
    }
}
