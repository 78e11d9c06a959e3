//! Uploaded 3D model files
//!
//! The browser base64-encodes file inputs before submitting JSON, so uploads
//! arrive as `{ name, content_type, data }`. The payload is kept encoded in the
//! store and decoded once here to validate it and measure its size.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::ValidationError;

const MAX_FILE_NAME_LEN: usize = 255;

/// Content types the AR viewer can load
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "model/gltf-binary",
    "model/gltf+json",
    "model/vnd.usdz+zip",
    "application/octet-stream",
];

/// Validated model upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    pub file_name: String,
    pub content_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
    pub size: usize,
}

impl ModelFile {
    pub fn new(
        file_name: &str,
        content_type: &str,
        data: &str,
        max_bytes: usize,
    ) -> Result<Self, ValidationError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ValidationError::Empty { field: "file name" });
        }
        if file_name.len() > MAX_FILE_NAME_LEN
            || file_name.contains(['/', '\\'])
            || file_name.chars().any(char::is_control)
        {
            return Err(ValidationError::InvalidFormat {
                field: "file name",
                reason: "must be a plain file name",
            });
        }

        let content_type = if content_type.trim().is_empty() {
            guess_content_type(file_name)
        } else {
            content_type.trim()
        };
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(ValidationError::InvalidFormat {
                field: "content type",
                reason: "unsupported model format",
            });
        }

        let data = strip_data_url(data.trim());
        if data.is_empty() {
            return Err(ValidationError::Empty { field: "file data" });
        }
        let decoded = STANDARD.decode(data).map_err(|_| ValidationError::InvalidFormat {
            field: "file data",
            reason: "not valid base64",
        })?;
        if decoded.len() > max_bytes {
            return Err(ValidationError::TooLong {
                field: "file data",
                max: max_bytes,
            });
        }

        Ok(Self {
            file_name: file_name.to_owned(),
            content_type: content_type.to_owned(),
            data: data.to_owned(),
            size: decoded.len(),
        })
    }

    /// Decode stored data for download.
    pub fn decode(data: &str) -> Option<Vec<u8>> {
        STANDARD.decode(data).ok()
    }
}

/// `FileReader.readAsDataURL` produces `data:<type>;base64,<payload>`.
fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some((_, payload)) = data.split_once(";base64,") {
            return payload;
        }
    }
    data
}

fn guess_content_type(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".glb") {
        "model/gltf-binary"
    } else if lower.ends_with(".gltf") {
        "model/gltf+json"
    } else if lower.ends_with(".usdz") {
        "model/vnd.usdz+zip"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    #[test]
    fn accepts_glb_and_guesses_type() {
        let file = ModelFile::new("chair.glb", "", &encoded(b"glTF\x02\x00"), 1024).unwrap();
        assert_eq!(file.content_type, "model/gltf-binary");
        assert_eq!(file.size, 6);
    }

    #[test]
    fn strips_data_url_prefix() {
        let data = format!("data:model/gltf-binary;base64,{}", encoded(b"abc"));
        let file = ModelFile::new("a.glb", "model/gltf-binary", &data, 1024).unwrap();
        assert_eq!(file.data, encoded(b"abc"));
    }

    #[test]
    fn rejects_oversized_upload() {
        let err = ModelFile::new("big.glb", "", &encoded(&[0u8; 64]), 32).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 32, .. }));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(ModelFile::new("x.glb", "", "***", 1024).is_err());
        assert!(ModelFile::new("../x.glb", "", &encoded(b"a"), 1024).is_err());
        assert!(ModelFile::new("x.png", "image/png", &encoded(b"a"), 1024).is_err());
    }

    #[test]
    fn rejects_control_characters_in_file_name() {
        for name in ["chair\n.glb", "chair\r.glb", "chair\u{7f}.glb", "\tchair\0.glb"] {
            let err = ModelFile::new(name, "", &encoded(b"glTF"), 1024).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { field: "file name", .. }),
                "{name:?} accepted"
            );
        }
        assert!(ModelFile::new("chaise longue é.glb", "", &encoded(b"glTF"), 1024).is_ok());
    }
}
