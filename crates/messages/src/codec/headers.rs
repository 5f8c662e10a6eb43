use std::fmt::Display;

use derive_more::Display;

// Not an official IANA Media Type:
// https://www.iana.org/assignments/media-types/media-types.xhtml
pub(crate) const JSON_RPC_CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";
// https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#contentPart
const DEPRECATED_CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf8";

pub(crate) const CONTENT_LENGTH_HEADER_NAME: &str = "Content-Length";
pub(crate) const CONTENT_TYPE_HEADER_NAME: &str = "Content-Type";

/// Marks the end of the header block.
pub(crate) const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";
const LINE_DELIMITER: &[u8] = b"\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonRpcHeaders {
    pub content_length: usize,
}

impl Display for JsonRpcHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}\r\n",
            CONTENT_LENGTH_HEADER_NAME, self.content_length
        )
    }
}

#[derive(Debug, Display)]
pub enum HeadersParseError {
    #[display(fmt = "header value is not UTF-8: {}", _0)]
    Utf8(std::str::Utf8Error),
    #[display(fmt = "duplicate Content-Length header")]
    DuplicateContentLength,
    #[display(fmt = "invalid Content-Length {:?}: {}", value, source)]
    ContentLength {
        value: String,
        source: std::num::ParseIntError,
    },
    #[display(fmt = "missing Content-Length header")]
    MissingContentLength,
}

impl std::error::Error for HeadersParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeadersParseError::Utf8(err) => Some(err),
            HeadersParseError::ContentLength { source, .. } => Some(source),
            HeadersParseError::DuplicateContentLength | HeadersParseError::MissingContentLength => {
                None
            }
        }
    }
}

/// A header block the message boundary can't be recovered from.
#[derive(Debug, Display)]
pub enum FramingError {
    #[display(fmt = "malformed header block {:?}: {}", header_text, source)]
    Malformed {
        header_text: String,
        source: httparse::Error,
    },
    #[display(fmt = "invalid header block {:?}: {}", header_text, source)]
    Headers {
        header_text: String,
        source: HeadersParseError,
    },
}

impl std::error::Error for FramingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FramingError::Malformed { source, .. } => Some(source),
            FramingError::Headers { source, .. } => Some(source),
        }
    }
}

impl JsonRpcHeaders {
    /// Parses a complete header block, delimiter included.
    pub fn parse(header_block: &[u8]) -> Result<Self, FramingError> {
        let header_text = || String::from_utf8_lossy(header_block).into_owned();

        // One slot per line, the block's size is already bounded by the decoder limits.
        let line_count = header_block
            .windows(LINE_DELIMITER.len())
            .filter(|window| *window == LINE_DELIMITER)
            .count();
        let mut headers_buffer = vec![httparse::EMPTY_HEADER; line_count];
        match httparse::parse_headers(header_block, &mut headers_buffer) {
            Ok(httparse::Status::Complete((_, headers))) => {
                JsonRpcHeaders::try_from(headers).map_err(|source| FramingError::Headers {
                    header_text: header_text(),
                    source,
                })
            }
            // The block always ends with the delimiter, so httparse can't ask for more.
            Ok(httparse::Status::Partial) => Err(FramingError::Malformed {
                header_text: header_text(),
                source: httparse::Error::NewLine,
            }),
            Err(source) => Err(FramingError::Malformed {
                header_text: header_text(),
                source,
            }),
        }
    }
}

impl TryFrom<&[httparse::Header<'_>]> for JsonRpcHeaders {
    type Error = HeadersParseError;

    fn try_from(headers: &[httparse::Header]) -> Result<Self, Self::Error> {
        let mut content_length_header_index: Option<usize> = None;
        for (header_index, header) in headers.iter().enumerate() {
            if header.name.eq_ignore_ascii_case(CONTENT_LENGTH_HEADER_NAME) {
                match content_length_header_index.is_some() {
                    true => return Err(HeadersParseError::DuplicateContentLength),
                    false => content_length_header_index = Some(header_index),
                }
            } else if header.name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER_NAME) {
                let content_type_bytes = header.value;
                if content_type_bytes != JSON_RPC_CONTENT_TYPE.as_bytes()
                    && content_type_bytes != DEPRECATED_CONTENT_TYPE.as_bytes()
                {
                    tracing::warn!(
                        content_type = %String::from_utf8_lossy(content_type_bytes),
                        "Ignoring unexpected content type."
                    );
                }
            } else {
                tracing::trace!(header = header.name, "Ignoring unknown header.");
            }
        }

        let Some(content_length_header_index) = content_length_header_index else {
            return Err(HeadersParseError::MissingContentLength);
        };

        let content_length_str = std::str::from_utf8(headers[content_length_header_index].value)
            .map_err(HeadersParseError::Utf8)?
            .trim();

        Ok(JsonRpcHeaders {
            content_length: content_length_str.parse().map_err(|source| {
                HeadersParseError::ContentLength {
                    value: content_length_str.to_owned(),
                    source,
                }
            })?,
        })
    }
}

/// Offset just past the header delimiter, if the block is complete.
pub(crate) fn find_header_end(src: &[u8]) -> Option<usize> {
    src.windows(HEADER_DELIMITER.len())
        .position(|window| window == HEADER_DELIMITER)
        .map(|delimiter_index| delimiter_index + HEADER_DELIMITER.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace_with_crlf(str: &str) -> String {
        str.replace('\n', "\r\n")
    }

    #[test]
    fn displays_header() {
        let header = JsonRpcHeaders { content_length: 10 };
        let expected_string = replace_with_crlf(indoc::indoc! {"
                    Content-Length: 10
                "});
        assert_eq!(expected_string, header.to_string());
    }

    #[test_log::test]
    fn ignores_unknown_headers() {
        let headers = [
            httparse::Header {
                name: "X-Trace",
                value: b"abc",
            },
            httparse::Header {
                name: CONTENT_LENGTH_HEADER_NAME,
                value: b"10",
            },
        ];
        assert_eq!(
            JsonRpcHeaders { content_length: 10 },
            JsonRpcHeaders::try_from(&headers[..]).unwrap()
        )
    }

    #[test]
    fn fails_on_duplicate_content_length() {
        let headers = [
            httparse::Header {
                name: CONTENT_LENGTH_HEADER_NAME,
                value: b"1",
            },
            httparse::Header {
                name: "content-length",
                value: b"2",
            },
        ];
        assert!(matches!(
            JsonRpcHeaders::try_from(&headers[..]),
            Err(HeadersParseError::DuplicateContentLength),
        ))
    }

    #[test_log::test]
    fn tolerates_content_type_mismatch() {
        let headers = [
            httparse::Header {
                name: CONTENT_TYPE_HEADER_NAME,
                value: b"text/plain",
            },
            httparse::Header {
                name: CONTENT_LENGTH_HEADER_NAME,
                value: b"2",
            },
        ];
        assert!(JsonRpcHeaders::try_from(&headers[..]).is_ok())
    }

    #[test]
    fn allows_missing_content_type() {
        let headers = [httparse::Header {
            name: CONTENT_LENGTH_HEADER_NAME,
            value: b"10",
        }];
        assert!(JsonRpcHeaders::try_from(&headers[..]).is_ok())
    }

    #[test]
    fn fails_on_missing_content_length() {
        let headers = [httparse::Header {
            name: CONTENT_TYPE_HEADER_NAME,
            value: JSON_RPC_CONTENT_TYPE.as_bytes(),
        }];

        assert!(matches!(
            JsonRpcHeaders::try_from(&headers[..]),
            Err(HeadersParseError::MissingContentLength),
        ))
    }

    #[test]
    fn fails_on_non_numeric_content_length() {
        let headers = [httparse::Header {
            name: CONTENT_LENGTH_HEADER_NAME,
            value: b"abc",
        }];

        assert!(matches!(
            JsonRpcHeaders::try_from(&headers[..]),
            Err(HeadersParseError::ContentLength { value, .. }) if value == "abc",
        ))
    }

    #[test]
    fn matches_header_names_case_insensitively() {
        let headers = [httparse::Header {
            name: "content-length",
            value: b"3",
        }];
        assert_eq!(
            3,
            JsonRpcHeaders::try_from(&headers[..])
                .unwrap()
                .content_length
        )
    }

    #[test]
    fn backwards_compatible_utf8_content_type_header() {
        let headers = [
            httparse::Header {
                name: CONTENT_LENGTH_HEADER_NAME,
                value: b"10",
            },
            httparse::Header {
                name: CONTENT_TYPE_HEADER_NAME,
                value: DEPRECATED_CONTENT_TYPE.as_bytes(),
            },
        ];
        assert!(JsonRpcHeaders::try_from(&headers[..]).is_ok())
    }

    #[test]
    fn parses_header_block() {
        let header_block = format!(
            "{}: {}\r\n{}: 42\r\n\r\n",
            CONTENT_TYPE_HEADER_NAME, JSON_RPC_CONTENT_TYPE, CONTENT_LENGTH_HEADER_NAME
        );
        assert_eq!(
            JsonRpcHeaders { content_length: 42 },
            JsonRpcHeaders::parse(header_block.as_bytes()).unwrap()
        )
    }

    #[test_log::test]
    fn parses_header_block_with_many_lines() {
        let mut header_block = (0..20)
            .map(|index| format!("X-Header-{}: value\r\n", index))
            .collect::<String>();
        header_block.push_str("Content-Length: 2\r\n\r\n");

        assert_eq!(
            JsonRpcHeaders { content_length: 2 },
            JsonRpcHeaders::parse(header_block.as_bytes()).unwrap()
        )
    }

    #[test]
    fn reports_header_text_of_malformed_block() {
        let error = JsonRpcHeaders::parse(b"no colon here\r\n\r\n").unwrap_err();
        assert!(matches!(error, FramingError::Malformed { ref header_text, .. } if header_text.contains("no colon here")));
    }

    #[test]
    fn finds_header_end() {
        assert_eq!(None, find_header_end(b"Content-Length: 2\r\n"));
        assert_eq!(Some(21), find_header_end(b"Content-Length: 2\r\n\r\n{}"));
    }
}
