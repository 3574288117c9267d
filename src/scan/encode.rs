use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::ScanError;

use super::dto::RawCapture;

/// Transport-safe encoding of a capture's bytes. Carries no data-URL
/// prefix; the remote contract expects the bare payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Encode a capture for transport. Async to match the remote clients'
/// interface. Fails with an upload error when there is nothing to read.
pub async fn encode(capture: &RawCapture) -> Result<EncodedImage, ScanError> {
    if capture.is_empty() {
        return Err(ScanError::Upload(
            "image data is empty or unreadable".into(),
        ));
    }
    Ok(EncodedImage(STANDARD.encode(&capture.bytes)))
}

/// Drop a `data:<mime>;base64,` prefix if the caller supplied a data URL
/// instead of a bare payload.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        match payload.split_once(',') {
            Some((_, rest)) => rest,
            None => payload,
        }
    } else {
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;

    #[tokio::test]
    async fn encodes_standard_base64_without_prefix() {
        let capture = RawCapture::new(&b"hello food"[..], "image/jpeg");
        let encoded = encode(&capture).await.unwrap();
        assert_eq!(encoded.as_str(), "aGVsbG8gZm9vZA==");
        assert!(!encoded.as_str().starts_with("data:"));
    }

    #[tokio::test]
    async fn empty_capture_is_an_upload_error() {
        let capture = RawCapture::new(Vec::new(), "image/jpeg");
        let err = encode(&capture).await.unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Upload);
    }

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(
            strip_data_url_prefix("data:image/jpeg;base64,aGVsbG8="),
            "aGVsbG8="
        );
        assert_eq!(strip_data_url_prefix("aGVsbG8="), "aGVsbG8=");
    }
}
