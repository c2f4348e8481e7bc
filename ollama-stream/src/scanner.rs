//! Delimiter scanner over a live byte stream.
//!
//! Splits an [`AsyncRead`] into tokens separated by a caller-chosen byte
//! pattern. Bytes arrive in whatever chunks the transport delivers; the
//! scanner keeps the not-yet-tokenized remainder in a buffer and only
//! suspends when it needs more input.
//!
//! ```text
//! chunk 1: {"response":"He      chunk 2: llo"}\n{"respo ...
//!          └──────── token 1 ────────┘  └── buffered ──
//! ```

use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::StreamError;

/// Default number of bytes reserved for each read.
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// Separator used by the NDJSON protocol.
pub const NDJSON_SEPARATOR: &[u8] = b"\n";

/// Splits a byte stream into separator-delimited tokens.
///
/// Single forward pass: once the reader is exhausted or fails, every
/// further call to [`next_token`](Self::next_token) returns `None`.
pub struct DelimiterScanner<R> {
    reader: R,
    separator: Vec<u8>,
    buf: BytesMut,
    /// Offset below which `buf` is known not to start a separator.
    searched: usize,
    read_capacity: usize,
    finished: bool,
}

impl<R: AsyncRead + Unpin> DelimiterScanner<R> {
    /// Create a scanner splitting `reader` on `separator`.
    ///
    /// Multi-byte separators are matched even when they straddle two reads.
    pub fn new(reader: R, separator: impl Into<Vec<u8>>) -> Result<Self, StreamError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(StreamError::EmptySeparator);
        }
        Ok(Self::from_parts(reader, separator))
    }

    /// Create a scanner splitting `reader` on `\n`.
    pub fn ndjson(reader: R) -> Self {
        Self::from_parts(reader, NDJSON_SEPARATOR.to_vec())
    }

    fn from_parts(reader: R, separator: Vec<u8>) -> Self {
        Self {
            reader,
            separator,
            buf: BytesMut::new(),
            searched: 0,
            read_capacity: DEFAULT_READ_CAPACITY,
            finished: false,
        }
    }

    /// Override the number of bytes reserved per read.
    #[must_use]
    pub fn with_read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity.max(1);
        self
    }

    /// The separator this scanner splits on.
    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    /// Produce the next token.
    ///
    /// Returns the bytes before the next separator, or the final
    /// unterminated bytes once the reader reports end-of-stream. An I/O
    /// error is returned once and ends the sequence.
    pub async fn next_token(&mut self) -> Option<Result<Bytes, StreamError>> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(pos) = self.find_separator() {
                let token = self.buf.split_to(pos).freeze();
                self.buf.advance(self.separator.len());
                self.searched = 0;
                return Some(Ok(token));
            }

            self.buf.reserve(self.read_capacity);
            match self.reader.read_buf(&mut self.buf).await {
                Ok(0) => {
                    self.finished = true;
                    if self.buf.is_empty() {
                        return None;
                    }
                    self.searched = 0;
                    return Some(Ok(self.buf.split().freeze()));
                }
                Ok(n) => {
                    tracing::trace!(bytes = n, buffered = self.buf.len(), "read chunk");
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(StreamError::Transport(e)));
                }
            }
        }
    }

    /// Turn the scanner into a [`Stream`] of tokens.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<Bytes, StreamError>> {
        async_stream::stream! {
            while let Some(token) = self.next_token().await {
                yield token;
            }
        }
    }

    fn find_separator(&mut self) -> Option<usize> {
        let sep_len = self.separator.len();
        let start = self.searched;
        let found = self.buf[start..]
            .windows(sep_len)
            .position(|window| window == self.separator.as_slice())
            .map(|i| start + i);

        if found.is_none() {
            // The last `sep_len - 1` bytes may be the head of a separator
            // whose tail has not arrived yet.
            self.searched = (self.buf.len() + 1).saturating_sub(sep_len);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::io::StreamReader;

    fn chunked(chunks: &[&str]) -> impl AsyncRead + Unpin {
        let items: Vec<std::io::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        StreamReader::new(futures::stream::iter(items))
    }

    async fn collect<R: AsyncRead + Unpin>(mut scanner: DelimiterScanner<R>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(token) = scanner.next_token().await {
            let token = token.expect("no io error");
            out.push(String::from_utf8(token.to_vec()).expect("utf8"));
        }
        out
    }

    #[tokio::test]
    async fn splits_newline_delimited_lines() {
        let scanner = DelimiterScanner::ndjson(chunked(&["line1\nline2\nline3\n"]));
        assert_eq!(scanner.separator(), NDJSON_SEPARATOR);
        assert_eq!(collect(scanner).await, vec!["line1", "line2", "line3"]);
    }

    #[tokio::test]
    async fn emits_final_unterminated_token() {
        let scanner = DelimiterScanner::ndjson(chunked(&["a\nb\nlast"]));
        assert_eq!(collect(scanner).await, vec!["a", "b", "last"]);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let scanner = DelimiterScanner::ndjson(chunked(&[]));
        assert!(collect(scanner).await.is_empty());
    }

    #[tokio::test]
    async fn consecutive_separators_yield_empty_tokens() {
        let scanner = DelimiterScanner::ndjson(chunked(&["a\n\nb\n"]));
        assert_eq!(collect(scanner).await, vec!["a", "", "b"]);
    }

    #[tokio::test]
    async fn custom_multibyte_separator() {
        let scanner = DelimiterScanner::new(chunked(&["a||b||c"]), "||").expect("valid");
        assert_eq!(scanner.separator(), b"||");
        assert_eq!(collect(scanner).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn separator_straddling_chunks_is_detected() {
        let scanner =
            DelimiterScanner::new(chunked(&["alpha|", "|beta<", "SEP", ">gamma"]), "||")
                .expect("valid");
        assert_eq!(collect(scanner).await, vec!["alpha", "beta<SEP>gamma"]);

        let scanner =
            DelimiterScanner::new(chunked(&["one<S", "E", "P>two<SE", "P>"]), "<SEP>")
                .expect("valid");
        assert_eq!(collect(scanner).await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn partial_separator_prefix_does_not_split() {
        let scanner = DelimiterScanner::new(chunked(&["x<SE", "Q>y"]), "<SEP>").expect("valid");
        assert_eq!(collect(scanner).await, vec!["x<SEQ>y"]);
    }

    #[tokio::test]
    async fn tiny_read_capacity_still_tokenizes() {
        let scanner = DelimiterScanner::ndjson(chunked(&["{\"a\":1}\n{\"b\":2}\n"]))
            .with_read_capacity(1);
        assert_eq!(collect(scanner).await, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[tokio::test]
    async fn empty_separator_is_rejected() {
        let result = DelimiterScanner::new(chunked(&["abc"]), "");
        assert!(matches!(result, Err(StreamError::EmptySeparator)));
    }

    #[tokio::test]
    async fn io_error_surfaces_once_then_stops() {
        let items: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"ok\npartial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"never\n")),
        ];
        let mut scanner = DelimiterScanner::ndjson(StreamReader::new(futures::stream::iter(items)));

        let first = scanner.next_token().await.expect("token").expect("ok");
        assert_eq!(&first[..], b"ok");

        let second = scanner.next_token().await.expect("error item");
        assert!(matches!(second, Err(StreamError::Transport(_))));

        assert!(scanner.next_token().await.is_none());
        assert!(scanner.next_token().await.is_none());
    }

    #[tokio::test]
    async fn into_stream_yields_same_tokens() {
        let scanner = DelimiterScanner::ndjson(chunked(&["x\n", "y", "\nz"]));
        let tokens: Vec<Bytes> = scanner
            .into_stream()
            .map(|t| t.expect("ok"))
            .collect()
            .await;
        assert_eq!(tokens, vec![Bytes::from("x"), Bytes::from("y"), Bytes::from("z")]);
    }
}
