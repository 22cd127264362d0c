use super::types::{MaskResponse, SegmentationBackend, SegmentationRequest};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

const REMOVE_BG_PATH: &str = "/remove-bg";
const PREDICT_PATH: &str = "/predict";

/// Hosted segmentation service.
///
/// Requests without prompt points go to `/remove-bg` (automatic cutout);
/// requests with points go to `/predict` with JSON `points` and `labels`
/// form fields. No client-level timeout is set here: the deadline is owned
/// by [`super::SegmentationClient`].
#[derive(Clone)]
pub struct HttpSegmentation {
    client: Client,
    base_url: String,
}

impl HttpSegmentation {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Segmentation backend at {}", base_url);
        Self { client, base_url }
    }

    fn endpoint(&self, request: &SegmentationRequest) -> String {
        let path = if request.has_points() {
            PREDICT_PATH
        } else {
            REMOVE_BG_PATH
        };
        format!("{}{}", self.base_url, path)
    }

    fn form(request: &SegmentationRequest) -> Result<Form> {
        let image = &request.image;
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)?;

        let mut form = Form::new().part("file", part);
        if request.has_points() {
            let (points, labels) = request
                .prompt_json()
                .map_err(|e| SessionError::backend(format!("Failed to encode prompt points: {e}")))?;
            form = form.text("points", points).text("labels", labels);
        }
        Ok(form)
    }
}

#[async_trait]
impl SegmentationBackend for HttpSegmentation {
    async fn segment(&self, request: &SegmentationRequest) -> Result<MaskResponse> {
        let url = self.endpoint(request);
        tracing::debug!("POST {} ({} points)", url, request.points.len());

        let response = self
            .client
            .post(&url)
            .multipart(Self::form(request)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Segmentation backend returned {}: {}", status, body);
            let message = if body.trim().is_empty() {
                "Backend Error".to_string()
            } else {
                body
            };
            return Err(SessionError::Backend {
                status: Some(status.as_u16()),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?;

        Ok(MaskResponse { content_type, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Upload;
    use crate::segmentation::{PointLabel, PromptPoint};

    fn request(points: Vec<PromptPoint>) -> SegmentationRequest {
        SegmentationRequest::new(Upload::new("a.png", "image/png", vec![1, 2, 3]), points)
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let backend = HttpSegmentation::with_client(Client::new(), "http://localhost:7860/");
        assert_eq!(
            backend.endpoint(&request(Vec::new())),
            "http://localhost:7860/remove-bg"
        );
    }

    #[test]
    fn test_points_select_predict_endpoint() {
        let backend = HttpSegmentation::with_client(Client::new(), "http://localhost:7860");
        let req = request(vec![PromptPoint::new(1.0, 2.0, PointLabel::Foreground)]);
        assert_eq!(backend.endpoint(&req), "http://localhost:7860/predict");
        assert!(HttpSegmentation::form(&req).is_ok());
    }
}
