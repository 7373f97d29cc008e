use thiserror::Error;

use crate::features::tickets::models::normalize_qr_value;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("No QR code found")]
    NotFound,

    #[error("Failed to decode QR code: {0}")]
    Qr(String),

    #[error("Decoder task failed: {0}")]
    Aborted(String),
}

/// Extracts the text payload of a QR code from raw image bytes.
///
/// Implementations return the payload already normalized.
pub trait QrDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError>;
}

/// Decoder for PNG/JPEG uploads backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageQrDecoder;

impl QrDecoder for ImageQrDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let luma = image::load_from_memory(bytes)?.to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(luma);

        // Photos may contain several codes; the first readable one wins
        let mut last_error = None;
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => {
                    let value = normalize_qr_value(&content);
                    if !value.is_empty() {
                        return Ok(value);
                    }
                }
                Err(e) => last_error = Some(DecodeError::Qr(format!("{:?}", e))),
            }
        }

        Err(last_error.unwrap_or(DecodeError::NotFound))
    }
}
