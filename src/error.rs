use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file type .{0} not allowed")]
    UnsupportedFormat(String),
    #[error("file too large ({size} bytes, max {limit})")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("image processing failed: {0}")]
    ImageProcessingFailed(#[source] image::ImageError),
    #[error("storage write failed: {0}")]
    StorageWriteFailed(anyhow::Error),
}

impl MediaError {
    /// Client mistakes the caller can fix by resubmitting; everything else
    /// is a server-side fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MediaError::UnsupportedFormat(_) | MediaError::PayloadTooLarge { .. }
        )
    }
}
