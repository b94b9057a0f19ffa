use crate::analysis::{
    AnalysisClient, NetworkError, RawAnalysisResult, Submission, MAX_UPLOAD_BYTES,
};
use crate::config::{AnalysisEndpoint, UploadTimeout};
use crate::recorder::MediaBlob;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

/// Uploads one finished recording per call as a multipart request: the
/// media part plus the scenario id/prompt as plain form fields.
#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: AnalysisEndpoint, timeout: UploadTimeout) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.as_str().to_owned(),
            timeout: timeout.duration(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.endpoint = base_url;
        self
    }
}

impl AnalysisClient for HttpAnalysisClient {
    fn submit(
        &self,
        blob: MediaBlob,
        submission: Submission,
    ) -> BoxFuture<'_, Result<RawAnalysisResult, NetworkError>> {
        let this = self.clone();
        async move {
            let size_bytes = blob.len();
            if size_bytes > MAX_UPLOAD_BYTES {
                return Err(NetworkError::PayloadTooLarge { size_bytes });
            }

            tracing::info!(
                size_bytes,
                mime = blob.mime_type.as_str(),
                scenario = %submission.scenario_id,
                "submitting recording for analysis"
            );

            let media = Part::bytes(blob.bytes.to_vec())
                .file_name("recording")
                .mime_str(blob.mime_type.as_str())
                .map_err(|e| {
                    NetworkError::ServiceUnavailable(format!("could not build upload: {e}"))
                })?;
            let form = Form::new()
                .part("media", media)
                .text("scenario_id", submission.scenario_id)
                .text("scenario_prompt", submission.scenario_prompt);

            let response = this
                .client
                .post(&this.endpoint)
                .multipart(form)
                .timeout(this.timeout)
                .send()
                .await
                .map_err(map_send_error)?;

            let status = response.status();
            if status.as_u16() == 413 {
                return Err(NetworkError::PayloadTooLarge { size_bytes });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NetworkError::ServiceUnavailable(format!(
                    "HTTP {status}: {body}"
                )));
            }

            let raw: RawAnalysisResult = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout
                } else {
                    NetworkError::InvalidResponse(format!("undecodable body: {e}"))
                }
            })?;

            // A response that reports failure is not forwarded downstream.
            if !raw.success {
                let detail = raw
                    .error
                    .unwrap_or_else(|| "service reported failure without detail".to_owned());
                return Err(NetworkError::InvalidResponse(detail));
            }

            Ok(raw)
        }
        .boxed()
    }
}

fn map_send_error(error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout
    } else if error.is_connect() {
        NetworkError::ServiceUnavailable(format!("connection failed: {error}"))
    } else {
        NetworkError::ServiceUnavailable(error.to_string())
    }
}
