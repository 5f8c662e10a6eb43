use derive_more::Display;

/// Bounds on how much unprocessed input a decoder buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderLimits {
    /// Largest header block, delimiter included.
    pub max_header_bytes: usize,
    /// Largest accepted `Content-Length`.
    pub max_content_length: usize,
}

impl DecoderLimits {
    pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;
    pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

    pub fn with_max_content_length(self, max_content_length: usize) -> Self {
        Self {
            max_content_length,
            ..self
        }
    }

    pub fn with_max_header_bytes(self, max_header_bytes: usize) -> Self {
        Self {
            max_header_bytes,
            ..self
        }
    }
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: Self::DEFAULT_MAX_HEADER_BYTES,
            max_content_length: Self::DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LimitKind {
    #[display(fmt = "header block")]
    HeaderBlock,
    #[display(fmt = "message body")]
    Body,
}
