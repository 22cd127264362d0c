use super::types::{MaskResponse, SegmentationBackend, SegmentationRequest};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Backend that waits `delay` and then returns a canned response
pub(crate) struct FakeBackend {
    pub delay: Duration,
    pub response: Result<MaskResponse>,
    pub calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn png(image: &RgbaImage, delay: Duration) -> Self {
        let mut buf = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        Self::raw("image/png", buf.into_inner(), delay)
    }

    pub(crate) fn raw(content_type: &str, bytes: Vec<u8>, delay: Duration) -> Self {
        Self {
            delay,
            response: Ok(MaskResponse {
                content_type: content_type.to_string(),
                bytes: Bytes::from(bytes),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(status: u16, message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Err(SessionError::Backend {
                status: Some(status),
                message: message.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SegmentationBackend for FakeBackend {
    async fn segment(&self, _request: &SegmentationRequest) -> Result<MaskResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.delay).await;
        match &self.response {
            Ok(r) => Ok(r.clone()),
            Err(SessionError::Backend { status, message }) => Err(SessionError::Backend {
                status: *status,
                message: message.clone(),
            }),
            Err(e) => Err(SessionError::backend(e.to_string())),
        }
    }
}

