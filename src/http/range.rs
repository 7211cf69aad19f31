//! Single byte-range requests (RFC 7233)

/// Outcome of evaluating a `Range` header against a body length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable Range header, send the whole body
    Full,
    /// Inclusive byte span to send with 206
    Partial { start: usize, end: usize },
    /// Syntactically valid but outside the body, send 416
    Unsatisfiable,
}

impl ByteRange {
    /// Evaluate a Range header.
    ///
    /// Supports `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
    /// Other units, multiple ranges and malformed values are ignored.
    ///
    /// ```
    /// use filebox::http::range::ByteRange;
    ///
    /// assert_eq!(
    ///     ByteRange::resolve(Some("bytes=1-3"), 5),
    ///     ByteRange::Partial { start: 1, end: 3 }
    /// );
    /// assert_eq!(ByteRange::resolve(None, 5), ByteRange::Full);
    /// ```
    pub fn resolve(header: Option<&str>, len: usize) -> Self {
        let Some(range_set) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return Self::Full;
        };
        if range_set.contains(',') {
            return Self::Full;
        }
        let Some((first, last)) = range_set.split_once('-') else {
            return Self::Full;
        };
        let (first, last) = (first.trim(), last.trim());

        if first.is_empty() {
            return Self::suffix(last, len);
        }

        let Ok(start) = first.parse::<usize>() else {
            return Self::Full;
        };
        let end = if last.is_empty() {
            None
        } else {
            match last.parse::<usize>() {
                Ok(end) => Some(end),
                Err(_) => return Self::Full,
            }
        };

        if let Some(end) = end {
            if end < start {
                return Self::Full;
            }
        }
        if start >= len {
            return Self::Unsatisfiable;
        }

        let last_byte = len - 1;
        Self::Partial {
            start,
            end: end.map_or(last_byte, |e| e.min(last_byte)),
        }
    }

    fn suffix(count: &str, len: usize) -> Self {
        let Ok(count) = count.parse::<usize>() else {
            return Self::Full;
        };
        if count == 0 || len == 0 {
            return Self::Unsatisfiable;
        }
        Self::Partial {
            start: len.saturating_sub(count),
            end: len - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_and_open_ranges() {
        assert_eq!(
            ByteRange::resolve(Some("bytes=0-9"), 100),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=50-"), 100),
            ByteRange::Partial { start: 50, end: 99 }
        );
        // end is clamped to the body
        assert_eq!(
            ByteRange::resolve(Some("bytes=90-500"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            ByteRange::resolve(Some("bytes=-20"), 100),
            ByteRange::Partial { start: 80, end: 99 }
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=-500"), 100),
            ByteRange::Partial { start: 0, end: 99 }
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=-0"), 100),
            ByteRange::Unsatisfiable
        );
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(
            ByteRange::resolve(Some("bytes=200-"), 100),
            ByteRange::Unsatisfiable
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=0-"), 0),
            ByteRange::Unsatisfiable
        );
        assert_eq!(
            ByteRange::resolve(Some("bytes=-5"), 0),
            ByteRange::Unsatisfiable
        );
    }

    #[test]
    fn test_ignored_headers() {
        for header in ["items=0-1", "bytes=a-b", "bytes=0-9,20-29", "bytes=9-3", "bytes=5"] {
            assert_eq!(
                ByteRange::resolve(Some(header), 100),
                ByteRange::Full,
                "{header}"
            );
        }
    }
}
