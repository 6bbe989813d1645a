//! reqwest implementation of the three service contracts.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    ClassificationService, ExtractionService, FilePayload, RemoteDocument, RemoteDocumentService,
    ServiceFuture,
};
use crate::error::ServiceError;
use crate::model::{ClassificationResult, PredictResponse};
use crate::{Config, Endpoints, RenderMode};

const PREDICT_FAILED: &str = "Prediction failed.";
const EXTRACT_FAILED: &str = "Failed to extract text.";
const STATUS_FAILED: &str = "Could not check Drive status.";
const AUTH_FAILED: &str = "Could not start Drive authorization.";
const DOWNLOAD_FAILED: &str = "Download failed.";

/// Talks to the backend over HTTP. One instance serves all three contracts.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    render_mode: RenderMode,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("textprobe/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            endpoints: config.endpoints.clone(),
            render_mode: config.render_mode,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractBody {
    text: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    auth_url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadBody {
    text: Option<String>,
    filename: Option<String>,
    error: Option<String>,
}

fn unreachable(e: reqwest::Error) -> ServiceError {
    ServiceError::Unavailable(e.to_string())
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

/// Decode a service response. Non-success statuses become
/// [`ServiceError::Rejected`] carrying the body's `error` field, or `fallback`
/// when the body has none.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    resp: reqwest::Response,
    fallback: &str,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        let message = non_blank(resp.json::<ErrorBody>().await.ok().and_then(|b| b.error))
            .unwrap_or_else(|| fallback.to_string());
        tracing::warn!(status = status.as_u16(), %message, "service rejected request");
        return Err(ServiceError::Rejected {
            status: Some(status.as_u16()),
            message,
        });
    }
    resp.json::<T>().await.map_err(|e| ServiceError::Rejected {
        status: Some(status.as_u16()),
        message: format!("{fallback} Unexpected response: {e}"),
    })
}

/// A success status can still carry `{error}`; treat that as a rejection.
fn embedded_error(error: Option<String>) -> Result<(), ServiceError> {
    match non_blank(error) {
        Some(message) => Err(ServiceError::Rejected {
            status: None,
            message,
        }),
        None => Ok(()),
    }
}

impl ClassificationService for HttpBackend {
    fn classify<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, ClassificationResult> {
        Box::pin(async move {
            let url = self.url(self.endpoints.predict_path(self.render_mode));
            tracing::debug!(%url, chars = text.len(), "POST classification");
            let resp = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "text": text }))
                .send()
                .await
                .map_err(unreachable)?;
            let body: PredictResponse = decode_response(resp, PREDICT_FAILED).await?;
            Ok(body.into())
        })
    }
}

impl ExtractionService for HttpBackend {
    fn extract<'a>(&'a self, file: &'a FilePayload) -> ServiceFuture<'a, String> {
        Box::pin(async move {
            let url = self.url(&self.endpoints.extract);
            tracing::debug!(%url, filename = %file.filename, bytes = file.bytes.len(), "POST extraction");
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone());
            let form = reqwest::multipart::Form::new().part("file", part);
            let resp = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(unreachable)?;
            let body: ExtractBody = decode_response(resp, EXTRACT_FAILED).await?;
            embedded_error(body.error)?;
            Ok(body.text.unwrap_or_default())
        })
    }
}

impl RemoteDocumentService for HttpBackend {
    fn status(&self) -> ServiceFuture<'_, bool> {
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url(&self.endpoints.drive_status))
                .send()
                .await
                .map_err(unreachable)?;
            let body: StatusBody = decode_response(resp, STATUS_FAILED).await?;
            Ok(body.authenticated)
        })
    }

    fn auth_url(&self) -> ServiceFuture<'_, String> {
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url(&self.endpoints.drive_auth))
                .send()
                .await
                .map_err(unreachable)?;
            let body: AuthBody = decode_response(resp, AUTH_FAILED).await?;
            embedded_error(body.error)?;
            non_blank(body.auth_url).ok_or_else(|| ServiceError::Rejected {
                status: None,
                message: AUTH_FAILED.to_string(),
            })
        })
    }

    fn download<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, RemoteDocument> {
        Box::pin(async move {
            let url = self.url(&self.endpoints.drive_download);
            tracing::debug!(%url, file_id, "POST download");
            let resp = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "file_id": file_id }))
                .send()
                .await
                .map_err(unreachable)?;
            let body: DownloadBody = decode_response(resp, DOWNLOAD_FAILED).await?;
            embedded_error(body.error)?;
            Ok(RemoteDocument {
                text: body.text.unwrap_or_default(),
                filename: non_blank(body.filename).unwrap_or_else(|| file_id.to_string()),
            })
        })
    }
}
