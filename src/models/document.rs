use bytes::Bytes;

/// Media types the extraction pipeline accepts.
pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = [
    "image/jpeg",
    "image/png",
    "image/jpg",
    "application/pdf",
];

/// Documents smaller than this are dropped by the gateway filter.
pub const MIN_DOCUMENT_BYTES: usize = 10;

/// Student scripts smaller than this are rejected as empty/corrupt uploads.
pub const MIN_SCRIPT_BYTES: usize = 100;

/// One uploaded file, owned for the duration of a single request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn is_supported_media_type(&self) -> bool {
        SUPPORTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == "application/pdf"
    }

    pub fn is_near_empty(&self) -> bool {
        self.bytes.len() < MIN_DOCUMENT_BYTES
    }

    /// Canonical on-disk extension for the declared media type; `None`
    /// exactly when the type is outside the supported set.
    pub fn extension(&self) -> Option<&'static str> {
        match self.media_type.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "application/pdf" => Some("pdf"),
            _ => None,
        }
    }
}
