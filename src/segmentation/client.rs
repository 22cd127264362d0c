use super::types::{SegmentationBackend, SegmentationRequest};
use crate::config::Config;
use crate::error::{Result, SessionError};
use image::RgbaImage;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::Instrument;

/// Advisory raised when the backend has been silent long enough that it is
/// probably loading its model. The request keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColdStartWarning {
    pub elapsed: Duration,
}

impl std::fmt::Display for ColdStartWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server warming up ({} s without a response)",
            self.elapsed.as_secs()
        )
    }
}

/// Runs one segmentation request against a backend with a hard deadline
/// and a cold-start advisory timer, then validates and decodes the mask.
pub struct SegmentationClient<B> {
    backend: B,
    timeout: Duration,
    cold_start_after: Duration,
}

impl<B: SegmentationBackend> SegmentationClient<B> {
    pub fn new(backend: B, timeout: Duration, cold_start_after: Duration) -> Self {
        Self {
            backend,
            timeout,
            cold_start_after,
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, config.timeout, config.cold_start_after)
    }

    /// Send the request once. `on_cold_start` fires at most once; the
    /// backend future is dropped (aborted) when the deadline passes.
    pub async fn segment<F>(&self, request: &SegmentationRequest, mut on_cold_start: F) -> Result<RgbaImage>
    where
        F: FnMut(ColdStartWarning),
    {
        let span = tracing::debug_span!("segment", points = request.points.len());
        self.run(request, &mut on_cold_start).instrument(span).await
    }

    async fn run<F>(&self, request: &SegmentationRequest, on_cold_start: &mut F) -> Result<RgbaImage>
    where
        F: FnMut(ColdStartWarning),
    {
        let started = Instant::now();

        let call = self.backend.segment(request);
        tokio::pin!(call);
        let deadline = sleep(self.timeout);
        tokio::pin!(deadline);
        let cold_start = sleep(self.cold_start_after);
        tokio::pin!(cold_start);
        let mut warned = false;

        let response = loop {
            tokio::select! {
                biased;

                result = &mut call => break result?,
                _ = &mut deadline => {
                    tracing::warn!("Segmentation aborted after {:?}", self.timeout);
                    return Err(SessionError::Timeout { after: self.timeout });
                }
                _ = &mut cold_start, if !warned => {
                    warned = true;
                    let warning = ColdStartWarning { elapsed: started.elapsed() };
                    tracing::warn!("{}", warning);
                    on_cold_start(warning);
                }
            }
        };

        tracing::debug!(
            "Segmentation responded in {:.1}s with {} ({} bytes)",
            started.elapsed().as_secs_f32(),
            response.content_type,
            response.bytes.len()
        );

        if !response.content_type.starts_with("image/") {
            return Err(SessionError::backend(format!(
                "Received invalid type: '{}'. Backend might be down.",
                response.content_type
            )));
        }

        let mask = image::load_from_memory(&response.bytes)
            .map_err(|e| SessionError::backend(format!("Failed to load result image: {e}")))?
            .to_rgba8();

        Ok(mask)
    }
}
