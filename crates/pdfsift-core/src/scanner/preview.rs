//! Head and tail previews of a stream.

/// The first and last bytes of a stream, ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPreview<'a> {
    /// Title, e.g. `BEGIN FIRST AND LAST 5 BYTES OF 20 BYTE STREAM`
    pub title: String,
    /// Total length of the stream
    pub stream_length: usize,
    /// Leading bytes; the whole stream when `tail` is `None`
    pub head: &'a [u8],
    /// Trailing bytes
    pub tail: Option<&'a [u8]>,
    /// Number of bytes between `head` and `tail`
    pub skipped: usize,
}

impl<'a> StreamPreview<'a> {
    /// Builds a preview of `num_bytes` from each end of `bytes`.
    ///
    /// Streams shorter than `2 * num_bytes` are shown whole, once.
    pub fn new(bytes: &'a [u8], num_bytes: usize, title_suffix: Option<&str>) -> Self {
        let stream_length = bytes.len();
        let whole = stream_length < num_bytes.saturating_mul(2);

        let mut title = if whole {
            format!("ALL {} BYTES IN STREAM", stream_length)
        } else {
            format!(
                "FIRST AND LAST {} BYTES OF {} BYTE STREAM",
                num_bytes, stream_length
            )
        };
        if let Some(suffix) = title_suffix {
            title.push_str(suffix);
        }
        let title = format!("BEGIN {}", title).to_uppercase();

        if whole {
            Self {
                title,
                stream_length,
                head: bytes,
                tail: None,
                skipped: 0,
            }
        } else {
            Self {
                title,
                stream_length,
                head: &bytes[..num_bytes],
                tail: Some(&bytes[stream_length - num_bytes..]),
                skipped: stream_length - num_bytes * 2,
            }
        }
    }

    /// True if the whole stream is in `head`
    pub fn is_whole(&self) -> bool {
        self.tail.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_stream_is_shown_once() {
        let data = b"abcdef";
        let preview = StreamPreview::new(data, 5, None);
        assert!(preview.is_whole());
        assert_eq!(preview.head, &data[..]);
        assert_eq!(preview.skipped, 0);
        assert_eq!(preview.title, "BEGIN ALL 6 BYTES IN STREAM");
    }

    #[test]
    fn test_long_stream_is_split() {
        let data: Vec<u8> = (0..20).collect();
        let preview = StreamPreview::new(&data, 5, Some(" (font)"));
        assert_eq!(preview.head, &data[..5]);
        assert_eq!(preview.tail, Some(&data[15..]));
        assert_eq!(preview.skipped, 10);
        assert_eq!(
            preview.title,
            "BEGIN FIRST AND LAST 5 BYTES OF 20 BYTE STREAM (FONT)"
        );
    }

    #[test]
    fn test_exactly_twice_num_bytes_skips_nothing() {
        let data = b"0123456789";
        let preview = StreamPreview::new(data, 5, None);
        assert_eq!(preview.tail, Some(&b"56789"[..]));
        assert_eq!(preview.skipped, 0);
    }
}
