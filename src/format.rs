//! Record rendering.
//!
//! Every chunk read from the input becomes one record:
//!
//! ```text
//! 05-01-2024 07:08:09 worker first line
//! ```
//!
//! In [`FormatMode::Deluxe`] continuation lines are indented by the width of
//! the `"<timestamp> <tag> "` prefix:
//!
//! ```text
//! 05-01-2024 07:08:09 worker first line
//!                            second line
//! ```
//!
//! Nothing here performs I/O.

use {
    crate::config::FormatMode,
    chrono::{DateTime, FixedOffset},
};

/// Upper bound of a rendered [`FormatMode::Default`] record, newline included.
pub const RENDER_BUFFER_SIZE: usize = 8192;

/// `DD-MM-YYYY HH:MM:SS`
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Width of a timestamp rendered with [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_LEN: usize = 19;

/// Format a point in time for a record prefix.
pub fn timestamp(now: &DateTime<FixedOffset>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// `"<timestamp> <tag> "`
pub fn prefix(timestamp: &str, tag: &str) -> String {
    format!("{timestamp} {tag} ")
}

/// Length of the prefix for `tag` with a [`TIMESTAMP_LEN`] wide timestamp.
pub fn prefix_len(tag: &str) -> usize {
    TIMESTAMP_LEN + 1 + tag.len() + 1
}

fn ends_with_newline(chunk: &[u8]) -> bool {
    chunk.last() == Some(&b'\n')
}

/// Render `chunk` as one record stamped with `timestamp` and `tag`.
pub fn render(mode: FormatMode, timestamp: &str, tag: &str, chunk: &[u8]) -> Vec<u8> {
    render_with_prefix(mode, prefix(timestamp, tag).as_bytes(), chunk)
}

/// Render `chunk` behind an already built prefix.
pub fn render_with_prefix(mode: FormatMode, prefix: &[u8], chunk: &[u8]) -> Vec<u8> {
    match mode {
        FormatMode::Default => render_default(prefix, chunk),
        FormatMode::Deluxe => render_deluxe(prefix, chunk),
    }
}

/// Exact length [`render_with_prefix`] produces for a prefix of `prefix_len` bytes.
pub fn rendered_len(mode: FormatMode, prefix_len: usize, chunk: &[u8]) -> usize {
    match mode {
        FormatMode::Default => default_len(prefix_len, chunk),
        FormatMode::Deluxe => deluxe_len(prefix_len, chunk),
    }
}

/// Length of a default record, clamped to [`RENDER_BUFFER_SIZE`].
pub fn default_len(prefix_len: usize, chunk: &[u8]) -> usize {
    let closing = usize::from(!ends_with_newline(chunk));
    (prefix_len + chunk.len() + closing).min(RENDER_BUFFER_SIZE)
}

/// A record that would not fit in [`RENDER_BUFFER_SIZE`] is cut short, keeping
/// the final byte for the newline.
fn render_default(prefix: &[u8], chunk: &[u8]) -> Vec<u8> {
    let len = default_len(prefix.len(), chunk);
    let mut out = Vec::with_capacity(len);
    let full = prefix.len() + chunk.len() + usize::from(!ends_with_newline(chunk));
    if full <= RENDER_BUFFER_SIZE {
        out.extend_from_slice(prefix);
        out.extend_from_slice(chunk);
        if !ends_with_newline(chunk) {
            out.push(b'\n');
        }
    } else {
        out.extend(prefix.iter().chain(chunk).take(len - 1));
        out.push(b'\n');
    }
    debug_assert_eq!(out.len(), len);
    out
}

/// Measuring pass of the deluxe layout.
///
/// Every newline except a final one is followed by `prefix_len` spaces, and a
/// newline is added when the chunk does not end with one. An empty chunk has
/// no last byte, so nothing is added after the prefix.
pub fn deluxe_len(prefix_len: usize, chunk: &[u8]) -> usize {
    let (internal, closing) = match chunk.split_last() {
        Some((&last, body)) => (
            body.iter().filter(|&&b| b == b'\n').count(),
            usize::from(last != b'\n'),
        ),
        None => (0, 0),
    };
    prefix_len + chunk.len() + internal * prefix_len + closing
}

/// Copying pass of the deluxe layout, into a buffer sized by [`deluxe_len`].
fn render_deluxe(prefix: &[u8], chunk: &[u8]) -> Vec<u8> {
    let len = deluxe_len(prefix.len(), chunk);
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(prefix);
    let mut lines = chunk.split_inclusive(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        out.extend_from_slice(line);
        if lines.peek().is_some() {
            out.resize(out.len() + prefix.len(), b' ');
        }
    }
    if chunk.last().is_some_and(|&b| b != b'\n') {
        out.push(b'\n');
    }
    debug_assert_eq!(out.len(), len);
    out
}

/// Longest leading part of `chunk` whose record fits in `room` bytes.
///
/// Returns 0 when not even one payload byte fits.
pub fn fitting_len(mode: FormatMode, prefix_len: usize, chunk: &[u8], room: usize) -> usize {
    let fits = |n: usize| rendered_len(mode, prefix_len, &chunk[..n]) <= room;
    if fits(chunk.len()) {
        return chunk.len();
    }
    // Rendered length never shrinks as the slice grows, so bisect.
    // `hi` never fits; `lo` is 0 or fits.
    let (mut lo, mut hi) = (0, chunk.len());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Where to cut `chunk` when its record does not fit in `room` bytes.
///
/// Cuts after the last newline inside the fitting part when there is one, so
/// lines are not broken across files; otherwise at [`fitting_len`].
pub fn split_point(mode: FormatMode, prefix_len: usize, chunk: &[u8], room: usize) -> usize {
    let fit = fitting_len(mode, prefix_len, chunk, room);
    match chunk[..fit].iter().rposition(|&b| b == b'\n') {
        Some(newline) => newline + 1,
        None => fit,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone as _};

    const TS: &str = "05-01-2024 07:08:09";

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 1, 5, 7, 8, 9).unwrap();
        let ts = timestamp(&now);
        assert_eq!(ts, TS);
        assert_eq!(ts.len(), TIMESTAMP_LEN);
    }

    #[test]
    fn test_prefix_len_matches_prefix() {
        for tag in ["", "T", "worker-7"] {
            assert_eq!(prefix(TS, tag).len(), prefix_len(tag));
        }
    }

    #[test]
    fn test_default_appends_newline() {
        let out = render(FormatMode::Default, TS, "T", b"hello");
        assert_eq!(text(out), format!("{TS} T hello\n"));
    }

    #[test]
    fn test_default_keeps_existing_newline() {
        let out = render(FormatMode::Default, TS, "T", b"hello\n");
        assert_eq!(text(out), format!("{TS} T hello\n"));
    }

    #[test]
    fn test_default_lone_newline_not_doubled() {
        let out = render(FormatMode::Default, TS, "T", b"\n");
        assert_eq!(text(out), format!("{TS} T \n"));
    }

    #[test]
    fn test_default_empty_tag_keeps_both_separators() {
        let out = render(FormatMode::Default, TS, "", b"hello");
        assert_eq!(text(out), format!("{TS}  hello\n"));
    }

    #[test]
    fn test_default_leaves_internal_newlines_alone() {
        let out = render(FormatMode::Default, TS, "T", b"a\nb");
        assert_eq!(text(out), format!("{TS} T a\nb\n"));
    }

    #[test]
    fn test_default_truncates_to_buffer_size() {
        let chunk = vec![b'x'; RENDER_BUFFER_SIZE + 100];
        let out = render(FormatMode::Default, TS, "T", &chunk);
        assert_eq!(out.len(), RENDER_BUFFER_SIZE);
        assert_eq!(out.last(), Some(&b'\n'));
        assert!(out.starts_with(format!("{TS} T xxx").as_bytes()));
        assert_eq!(default_len(prefix_len("T"), &chunk), RENDER_BUFFER_SIZE);
    }

    #[test]
    fn test_default_exactly_at_buffer_size_is_untouched() {
        let p = prefix(TS, "T");
        let chunk = vec![b'y'; RENDER_BUFFER_SIZE - p.len() - 1];
        let out = render(FormatMode::Default, TS, "T", &chunk);
        assert_eq!(out.len(), RENDER_BUFFER_SIZE);
        assert_eq!(&out[p.len()..out.len() - 1], &chunk[..]);
    }

    #[test]
    fn test_deluxe_length_example() {
        // prefix of 20 bytes, "a\nb": 20 + 3 + 20 + 1
        assert_eq!(deluxe_len(20, b"a\nb"), 44);
        let prefix = [b'p'; 20];
        let out = render_with_prefix(FormatMode::Deluxe, &prefix, b"a\nb");
        assert_eq!(out.len(), 44);
    }

    #[test]
    fn test_deluxe_indents_continuation_lines() {
        let out = text(render(FormatMode::Deluxe, TS, "T", b"first\nsecond\nthird"));
        let pad = " ".repeat(prefix_len("T"));
        assert_eq!(out, format!("{TS} T first\n{pad}second\n{pad}third\n"));
    }

    #[test]
    fn test_deluxe_trailing_newline_not_indented_or_doubled() {
        let out = text(render(FormatMode::Deluxe, TS, "T", b"a\nb\n"));
        let pad = " ".repeat(prefix_len("T"));
        assert_eq!(out, format!("{TS} T a\n{pad}b\n"));
    }

    #[test]
    fn test_deluxe_consecutive_newlines() {
        let out = text(render(FormatMode::Deluxe, TS, "", b"\n\nx"));
        let pad = " ".repeat(prefix_len(""));
        assert_eq!(out, format!("{TS}  \n{pad}\n{pad}x\n"));
    }

    #[test]
    fn test_deluxe_empty_payload_has_no_newline() {
        let out = render(FormatMode::Deluxe, TS, "T", b"");
        assert_eq!(text(out), format!("{TS} T "));
        assert_eq!(deluxe_len(prefix_len("T"), b""), prefix_len("T"));
    }

    #[test]
    fn test_deluxe_measure_matches_render() {
        let payloads: [&[u8]; 8] = [
            b"",
            b"\n",
            b"\n\n",
            b"plain",
            b"line\n",
            b"a\nb\nc",
            b"\nleading",
            b"x\n\n\ny\n",
        ];
        for payload in payloads {
            for tag in ["", "tag"] {
                let p = prefix(TS, tag);
                let out = render_with_prefix(FormatMode::Deluxe, p.as_bytes(), payload);
                assert_eq!(out.len(), deluxe_len(p.len(), payload), "payload {payload:?}");
                assert_eq!(
                    out.len(),
                    rendered_len(FormatMode::Deluxe, p.len(), payload)
                );
            }
        }
    }

    #[test]
    fn test_fitting_len_whole_chunk() {
        let p = prefix_len("T");
        assert_eq!(fitting_len(FormatMode::Default, p, b"hello", 1000), 5);
        assert_eq!(fitting_len(FormatMode::Deluxe, p, b"a\nb", 1000), 3);
    }

    #[test]
    fn test_fitting_len_default_cut() {
        let p = prefix_len("T");
        // room for the prefix, three payload bytes and the newline
        let n = fitting_len(FormatMode::Default, p, b"abcdef", p + 4);
        assert_eq!(n, 3);
        assert!(rendered_len(FormatMode::Default, p, b"abc") <= p + 4);
    }

    #[test]
    fn test_fitting_len_deluxe_cut_before_reindent() {
        let p = prefix_len("T");
        // "ab\n" fits in p + 3; "ab\nc" would need p + 4 + p + 1.
        let room = p + 3 + p;
        let n = fitting_len(FormatMode::Deluxe, p, b"ab\ncd", room);
        assert_eq!(n, 3);
        assert!(rendered_len(FormatMode::Deluxe, p, b"ab\nc") > room);
    }

    #[test]
    fn test_fitting_len_nothing_fits() {
        let p = prefix_len("T");
        assert_eq!(fitting_len(FormatMode::Default, p, b"abc", p), 0);
        assert_eq!(fitting_len(FormatMode::Deluxe, p, b"abc", p + 1), 0);
    }

    #[test]
    fn test_fitting_len_one_byte_at_minimum_room() {
        let p = prefix_len("T");
        assert_eq!(fitting_len(FormatMode::Default, p, b"abc", p + 2), 1);
        assert_eq!(fitting_len(FormatMode::Deluxe, p, b"\n\nx", p + 2), 1);
    }

    #[test]
    fn test_split_point_prefers_line_boundary() {
        let p = prefix_len("T");
        let chunk = b"one\ntwo\nthree";
        // "one\ntwo\nth" plus the closing newline
        let room = p + 11;
        assert_eq!(fitting_len(FormatMode::Default, p, chunk, room), 10);
        assert_eq!(split_point(FormatMode::Default, p, chunk, room), 8);
        assert_eq!(split_point(FormatMode::Default, p, b"abcdef", p + 4), 3);
    }

    #[test]
    fn test_split_point_deluxe() {
        let p = prefix_len("D");
        let chunk = b"line one\nline two\nline three\nline four";
        // fits three lines and two bytes of the fourth
        let room = p + 29 + 2 * p + 2 + p + 1;
        assert_eq!(fitting_len(FormatMode::Deluxe, p, chunk, room), 31);
        assert_eq!(split_point(FormatMode::Deluxe, p, chunk, room), 29);
    }
}
