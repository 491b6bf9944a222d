use thiserror::Error;

/// Largest accepted upload. Payloads must be strictly smaller.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Image types accepted for avatars, tour images, logos and banners
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Pre-flight failures. Raised before any I/O so the action is aborted
/// with no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only JPG/PNG images can be uploaded (got {0})")]
    UnsupportedType(String),
    #[error("Image must be smaller than 2MB (got {size} bytes)")]
    TooLarge { size: usize },
    #[error("No file provided")]
    EmptyPayload,
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Page must be at least 1")]
    InvalidPage,
    #[error("Page size must be at least 1")]
    InvalidPageSize,
}

/// A file picked by the operator, not yet uploaded
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    /// Declared type. Guessed from the file name when not given.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_raw()
            .map(str::to_string);
        UploadFile {
            name,
            content_type,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Same payload under another file name (used for the fixed logo name)
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        UploadFile {
            name: name.into(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Check that a file is a JPG/PNG image under the size ceiling.
///
/// Both the declared type and the sniffed magic bytes must be an accepted
/// image type. Returns the sniffed MIME type used as the stored content type.
pub fn validate_image(file: &UploadFile) -> Result<&'static str, ValidationError> {
    if file.bytes.is_empty() {
        return Err(ValidationError::EmptyPayload);
    }

    if let Some(declared) = file.content_type.as_deref() {
        if !ACCEPTED_IMAGE_TYPES.contains(&declared) {
            return Err(ValidationError::UnsupportedType(declared.to_string()));
        }
    }

    let sniffed = match infer::get(&file.bytes) {
        Some(kind) if ACCEPTED_IMAGE_TYPES.contains(&kind.mime_type()) => kind.mime_type(),
        Some(kind) => return Err(ValidationError::UnsupportedType(kind.mime_type().to_string())),
        None => return Err(ValidationError::UnsupportedType("unknown".to_string())),
    };

    if file.size() >= MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge { size: file.size() });
    }

    Ok(sniffed)
}
