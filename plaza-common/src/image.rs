use base64::{display::Base64Display, prelude::BASE64_STANDARD};
use std::fmt::{Debug, Formatter};

/// An image picked by the user, held in memory until it is uploaded.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Inline `data:` URL for previewing the image before it is stored.
    #[must_use]
    pub fn data_url(&self) -> String {
        let encoded = Base64Display::new(&self.bytes, &BASE64_STANDARD);
        format!("data:{};base64,{encoded}", self.mime_type)
    }
}

impl Debug for ImageUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
