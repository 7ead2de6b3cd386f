//! Text detection over a local video with the Video Intelligence REST API.

use anyhow::Context;
use base64::Engine;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const VIDEO_INTELLIGENCE_API_BASE: &str = "https://videointelligence.googleapis.com/v1";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub enum Auth {
    /// Tokens minted from a service account file, refreshed by `gouth`.
    ServiceAccount(Arc<gouth::Token>),
    ApiKey(String),
    Bearer(String),
}

/// Where credentials come from, in order of preference.
#[derive(Debug, PartialEq)]
pub enum CredentialSource {
    ServiceAccount(PathBuf),
    ApiKey(String),
    Bearer(String),
}

impl CredentialSource {
    /// `GOOGLE_APPLICATION_CREDENTIALS`, then `GOOGLE_API_KEY`, then
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub fn select(
        credentials: Option<String>,
        api_key: Option<String>,
        access_token: Option<String>,
    ) -> anyhow::Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        if let Some(path) = non_empty(credentials) {
            return Ok(CredentialSource::ServiceAccount(PathBuf::from(path)));
        }
        if let Some(key) = non_empty(api_key) {
            return Ok(CredentialSource::ApiKey(key));
        }
        if let Some(token) = non_empty(access_token) {
            return Ok(CredentialSource::Bearer(token));
        }
        anyhow::bail!(
            "set GOOGLE_APPLICATION_CREDENTIALS, GOOGLE_API_KEY or GOOGLE_OAUTH_ACCESS_TOKEN"
        )
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::select(
            env::var("GOOGLE_APPLICATION_CREDENTIALS").ok(),
            env::var("GOOGLE_API_KEY").ok(),
            env::var("GOOGLE_OAUTH_ACCESS_TOKEN").ok(),
        )
    }
}

impl Auth {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(CredentialSource::from_env()?)
    }

    pub fn from_source(source: CredentialSource) -> anyhow::Result<Self> {
        Ok(match source {
            CredentialSource::ServiceAccount(path) => {
                let token = gouth::Builder::new()
                    .file(&path)
                    .scopes(&[CLOUD_PLATFORM_SCOPE])
                    .build()
                    .map_err(|e| {
                        anyhow::anyhow!("loading credentials {}: {:?}", path.display(), e)
                    })?;
                Auth::ServiceAccount(Arc::new(token))
            }
            CredentialSource::ApiKey(key) => Auth::ApiKey(key),
            CredentialSource::Bearer(token) => Auth::Bearer(token),
        })
    }

    async fn apply(
        &self,
        request: reqwest::RequestBuilder,
    ) -> anyhow::Result<reqwest::RequestBuilder> {
        Ok(match self {
            Auth::ServiceAccount(token) => {
                // gouth refreshes over a blocking HTTP client.
                let token = Arc::clone(token);
                let value = tokio::task::spawn_blocking(move || token.header_value())
                    .await?
                    .map_err(|e| anyhow::anyhow!("header_value error: {:?}", e))?;
                request.header(reqwest::header::AUTHORIZATION, value.as_str())
            }
            Auth::ApiKey(key) => request.header("x-goog-api-key", key),
            Auth::Bearer(token) => request.bearer_auth(token),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<Status>,
    pub response: Option<AnnotateVideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateVideoResponse {
    #[serde(default)]
    pub annotation_results: Vec<VideoAnnotationResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnnotationResults {
    #[serde(default)]
    pub text_annotations: Vec<TextAnnotation>,
    pub error: Option<Status>,
}

#[derive(Debug, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TextSegment>,
}

#[derive(Debug, Deserialize)]
pub struct TextSegment {
    pub segment: Option<VideoSegment>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub frames: Vec<TextFrame>,
}

/// Offsets are in seconds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSegment {
    #[serde(default, deserialize_with = "seconds")]
    pub start_time_offset: Option<f64>,
    #[serde(default, deserialize_with = "seconds")]
    pub end_time_offset: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFrame {
    pub rotated_bounding_box: Option<BoundingPoly>,
    #[serde(default, deserialize_with = "seconds")]
    pub time_offset: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// Normalized to `[0, 1]`. Zero coordinates are omitted on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// Parses the JSON form of `google.protobuf.Duration`, e.g. `"1.500s"`.
pub fn parse_duration(value: &str) -> anyhow::Result<f64> {
    let number = value
        .strip_suffix('s')
        .ok_or_else(|| anyhow::anyhow!("duration {:?} has no 's' suffix", value))?;
    number
        .parse::<f64>()
        .with_context(|| format!("bad duration {:?}", value))
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    value
        .map(|v| parse_duration(&v).map_err(serde::de::Error::custom))
        .transpose()
}

impl AnnotateVideoResponse {
    /// A single video was submitted, so only the first result matters.
    pub fn first_result(&self) -> anyhow::Result<&VideoAnnotationResults> {
        let result = self
            .annotation_results
            .first()
            .ok_or_else(|| anyhow::anyhow!("response has no annotation results"))?;
        if let Some(error) = &result.error {
            anyhow::bail!("video annotation failed ({}): {}", error.code, error.message);
        }
        Ok(result)
    }
}

pub struct VideoIntelligence {
    client: reqwest::Client,
    auth: Auth,
    base_url: String,
}

impl VideoIntelligence {
    pub fn new(auth: Auth) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
            base_url: VIDEO_INTELLIGENCE_API_BASE.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Submits `input_content` for `TEXT_DETECTION` and blocks until the
    /// operation finishes or `timeout` elapses.
    pub async fn detect_text(
        &self,
        input_content: &[u8],
        timeout: Duration,
        poll_interval: Duration,
    ) -> anyhow::Result<AnnotateVideoResponse> {
        let start_time = std::time::Instant::now();
        let operation = self.annotate(input_content).await?;
        log::debug!("Started operation {}", operation.name);

        let response = tokio::time::timeout(timeout, self.wait(operation, poll_interval))
            .await
            .map_err(|_| {
                anyhow::anyhow!("text detection timed out after {}s", timeout.as_secs())
            })??;

        log::trace!(
            "annotate_video took {}ms, {} bytes input",
            start_time.elapsed().as_millis(),
            input_content.len()
        );
        Ok(response)
    }

    async fn annotate(&self, input_content: &[u8]) -> anyhow::Result<Operation> {
        let body = json!({
            "inputContent": base64::engine::general_purpose::STANDARD.encode(input_content),
            "features": ["TEXT_DETECTION"],
            "videoContext": {},
        });
        let request = self
            .client
            .post(format!("{}/videos:annotate", self.base_url))
            .json(&body);
        send(self.auth.apply(request).await?).await
    }

    async fn wait(
        &self,
        mut operation: Operation,
        poll_interval: Duration,
    ) -> anyhow::Result<AnnotateVideoResponse> {
        while !operation.done {
            tokio::time::sleep(poll_interval).await;
            let request = self
                .client
                .get(format!("{}/{}", self.base_url, operation.name));
            operation = send(self.auth.apply(request).await?).await?;
            log::trace!("Operation {} done: {}", operation.name, operation.done);
        }

        if let Some(error) = operation.error {
            anyhow::bail!("annotate_video error ({}): {}", error.code, error.message);
        }
        Ok(operation.response.unwrap_or_default())
    }
}

async fn send(request: reqwest::RequestBuilder) -> anyhow::Result<Operation> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Video Intelligence API returned {}: {}", status, body);
    }
    Ok(response.json().await?)
}

pub async fn read_video(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Writes text, first segment timing, confidence and first frame geometry
/// for every annotation.
pub fn write_report(result: &VideoAnnotationResults, out: &mut impl Write) -> io::Result<()> {
    for annotation in &result.text_annotations {
        writeln!(out, "\nText: {}", annotation.text)?;

        let Some(segment) = annotation.segments.first() else {
            continue;
        };
        let (start_time, end_time) = segment
            .segment
            .as_ref()
            .map(|times| {
                (
                    times.start_time_offset.unwrap_or_default(),
                    times.end_time_offset.unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        writeln!(out, "start_time: {:?}, end_time: {:?}", start_time, end_time)?;
        writeln!(out, "Confidence: {:?}", segment.confidence)?;

        let Some(frame) = segment.frames.first() else {
            continue;
        };
        writeln!(
            out,
            "Time offset for the first frame: {:?}",
            frame.time_offset.unwrap_or_default()
        )?;
        writeln!(out, "Rotated Bounding Box Vertices:")?;
        if let Some(bounding_box) = &frame.rotated_bounding_box {
            for vertex in &bounding_box.vertices {
                writeln!(out, "\tVertex.x: {:?}, Vertex.y: {:?}", vertex.x, vertex.y)?;
            }
        }
    }
    Ok(())
}
