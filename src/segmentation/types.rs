use crate::error::Result;
use crate::input::Upload;
use async_trait::async_trait;
use bytes::Bytes;

/// Whether a prompt point marks the subject or the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLabel {
    Background = 0,
    Foreground = 1,
}

/// Interactive segmentation hint, in native image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptPoint {
    pub x: f32,
    pub y: f32,
    pub label: PointLabel,
}

impl PromptPoint {
    pub fn new(x: f32, y: f32, label: PointLabel) -> Self {
        Self { x, y, label }
    }
}

/// One user-triggered segmentation attempt. There is no retry state:
/// a failed attempt is simply dropped.
#[derive(Debug, Clone)]
pub struct SegmentationRequest {
    pub image: Upload,
    pub points: Vec<PromptPoint>,
}

impl SegmentationRequest {
    pub fn new(image: Upload, points: Vec<PromptPoint>) -> Self {
        Self { image, points }
    }

    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }

    /// JSON form fields for the point-prompt endpoint: `[[x,y],...]` and `[1,0,...]`
    pub fn prompt_json(&self) -> serde_json::Result<(String, String)> {
        let points: Vec<[f32; 2]> = self.points.iter().map(|p| [p.x, p.y]).collect();
        let labels: Vec<u8> = self.points.iter().map(|p| p.label as u8).collect();
        Ok((serde_json::to_string(&points)?, serde_json::to_string(&labels)?))
    }
}

/// Raw body returned by a segmentation backend
#[derive(Debug, Clone)]
pub struct MaskResponse {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Trait for segmentation backends
/// Allows swapping the hosted endpoint for a local or fake implementation
#[async_trait]
pub trait SegmentationBackend: Send + Sync {
    /// Send one request and return the undecoded response body.
    /// Non-success statuses must already be mapped to `SessionError::Backend`.
    async fn segment(&self, request: &SegmentationRequest) -> Result<MaskResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_json_shapes() {
        let request = SegmentationRequest::new(
            Upload::new("a.png", "image/png", Vec::new()),
            vec![
                PromptPoint::new(10.0, 20.5, PointLabel::Foreground),
                PromptPoint::new(3.0, 4.0, PointLabel::Background),
            ],
        );
        let (points, labels) = request.prompt_json().unwrap();
        assert_eq!(points, "[[10.0,20.5],[3.0,4.0]]");
        assert_eq!(labels, "[1,0]");
    }
}
