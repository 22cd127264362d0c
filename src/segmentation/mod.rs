mod client;
#[cfg(test)]
pub(crate) mod fake;
mod interpret;
mod remote;
pub mod types;

pub use client::{ColdStartWarning, SegmentationClient};
pub use interpret::{MaskInterpreter, MaskKind};
pub use remote::HttpSegmentation;
pub use types::{MaskResponse, PointLabel, PromptPoint, SegmentationBackend, SegmentationRequest};

use crate::config::Config;
use crate::error::Result;

/// Create the default segmentation client (hosted HTTP backend)
pub fn create_default_client(config: &Config) -> Result<SegmentationClient<HttpSegmentation>> {
    let backend = HttpSegmentation::new(&config.api_url)?;
    Ok(SegmentationClient::from_config(backend, config))
}
