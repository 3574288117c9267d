use crate::error::ScanError;

use super::dto::RawCapture;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Precondition check on an uploaded or captured image. Pure, no side
/// effects. Must run before any encode or network work.
pub fn validate(capture: &RawCapture) -> Result<(), ScanError> {
    if !capture.content_type.starts_with("image/") {
        return Err(ScanError::Upload(format!(
            "unsupported file type '{}', please select an image",
            capture.content_type
        )));
    }
    if capture.len() > MAX_IMAGE_BYTES {
        return Err(ScanError::Upload(
            "image size must be less than 5MB".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;

    #[test]
    fn oversized_jpeg_is_rejected_as_upload() {
        let capture = RawCapture::new(vec![0u8; 6 * 1024 * 1024], "image/jpeg");
        let err = validate(&capture).unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Upload);
    }

    #[test]
    fn small_png_passes() {
        let capture = RawCapture::new(vec![0u8; 10 * 1024], "image/png");
        assert!(validate(&capture).is_ok());
    }

    #[test]
    fn non_image_mime_is_rejected_as_upload() {
        let capture = RawCapture::new(vec![0u8; 1024], "text/plain");
        let err = validate(&capture).unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Upload);
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn exactly_at_ceiling_passes() {
        let capture = RawCapture::new(vec![0u8; MAX_IMAGE_BYTES], "image/jpeg");
        assert!(validate(&capture).is_ok());
    }
}
