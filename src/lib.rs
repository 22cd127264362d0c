pub mod compositor;
pub mod config;
pub mod error;
pub mod input;
pub mod mask;
pub mod output;
pub mod segmentation;
pub mod session;
pub mod view;

pub use error::{Result, SessionError};
pub use session::{EditingSession, SessionState};
