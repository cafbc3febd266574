//! Downstream service HTTP client.

use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use classlens_models::{AttentionResult, BoundingBox, HandRaisingResult, RecognitionResult};

use crate::error::{DownstreamError, DownstreamResult};
use crate::metrics;
use crate::registry::{Service, ServiceRegistry};
use crate::types::{CoordsResponse, FacesResponse};

/// Configuration shared by all downstream calls.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout applied to every downstream call
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the four downstream analysis services.
///
/// Holds one connection pool; cheap to share behind an `Arc`.
pub struct DownstreamClient {
    http: Client,
    registry: ServiceRegistry,
}

impl DownstreamClient {
    /// Create a new client over the given registry.
    pub fn new(registry: ServiceRegistry, config: ClientConfig) -> DownstreamResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, registry })
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Request face bounding boxes for a frame.
    pub async fn localize_coords(&self, image: &[u8]) -> DownstreamResult<Vec<BoundingBox>> {
        let form = Form::new().part("image", image_part(image, "frame.jpg"));
        let body: CoordsResponse = self
            .post_multipart(Service::Localization, "/localize-coords", form)
            .await?;
        Ok(body.coordinates)
    }

    /// Request cropped face images for a frame.
    pub async fn localize_faces(&self, image: &[u8]) -> DownstreamResult<Vec<Vec<u8>>> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        let form = Form::new().part("image", image_part(image, "frame.jpg"));
        let body: FacesResponse = self
            .post_multipart(Service::Localization, "/localize-faces", form)
            .await?;

        body.faces
            .iter()
            .map(|encoded| {
                STANDARD
                    .decode(encoded)
                    .map_err(|e| DownstreamError::InvalidResponse {
                        service: Service::Localization,
                        detail: format!("face crop is not valid base64: {e}"),
                    })
            })
            .collect()
    }

    /// Map a face image to a person identity.
    pub async fn identify(&self, face_image: &[u8]) -> DownstreamResult<RecognitionResult> {
        let form = Form::new().part("image", image_part(face_image, "face.jpg"));
        self.post_multipart(Service::Recognition, "/identify", form)
            .await
    }

    /// Classify a recognized face as focused or unfocused.
    pub async fn detect_attention(
        &self,
        face_image: &[u8],
        person_id: &str,
        lecture_id: &str,
        timestamp: &str,
    ) -> DownstreamResult<AttentionResult> {
        let form = Form::new()
            .part("image", image_part(face_image, "face.jpg"))
            .text("face_id", person_id.to_string())
            .text("lecture_id", lecture_id.to_string())
            .text("timestamp", timestamp.to_string());
        self.post_multipart(Service::Attention, "/detect-face-attention", form)
            .await
    }

    /// Detect whether a recognized student has a hand raised.
    pub async fn detect_hand_raising(
        &self,
        face_image: &[u8],
        person_id: &str,
        timestamp: &str,
    ) -> DownstreamResult<HandRaisingResult> {
        let form = Form::new()
            .part("image", image_part(face_image, "face.jpg"))
            .text("student_id", person_id.to_string())
            .text("timestamp", timestamp.to_string());
        self.post_multipart(Service::HandRaising, "/detect-hand-raising", form)
            .await
    }

    /// Forward an arbitrary request to a downstream service.
    ///
    /// Used by the proxy routes; the response is relayed untouched, so
    /// non-2xx statuses are not mapped to errors here.
    pub async fn forward(
        &self,
        service: Service,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> DownstreamResult<Response> {
        let url = format!(
            "{}/{}",
            self.registry.resolve(service),
            path_and_query.trim_start_matches('/')
        );
        debug!(%service, %url, "forwarding request to downstream service");

        self.http
            .request(method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        form: Form,
    ) -> DownstreamResult<T> {
        let url = format!("{}{}", self.registry.resolve(service), path);
        debug!(%service, %url, "calling downstream service");

        let start = Instant::now();
        let result = self.http.post(&url).multipart(form).send().await;
        let latency = start.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                metrics::record_request(service, "transport_error", latency);
                warn!(%service, error = %source, "downstream request failed");
                return Err(DownstreamError::Transport { service, source });
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_request(service, "error", latency);
            let body = response.text().await.unwrap_or_default();
            warn!(%service, status = status.as_u16(), "downstream service returned an error");
            return Err(DownstreamError::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }

        metrics::record_request(service, "ok", latency);
        response
            .json::<T>()
            .await
            .map_err(|e| DownstreamError::InvalidResponse {
                service,
                detail: e.to_string(),
            })
    }
}

fn image_part(image: &[u8], file_name: &'static str) -> Part {
    Part::bytes(image.to_vec())
        .file_name(file_name)
        .mime_str("image/jpeg")
        .expect("static mime type is valid")
}
