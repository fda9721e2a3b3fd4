//! Helpers for the registered raw-byte formats.
//!
//! The "HTML Format" record starts with a plain-text header such as
//!
//! ```text
//! Version:0.9
//! StartHTML:0000000105
//! EndHTML:0000000213
//! StartFragment:0000000141
//! EndFragment:0000000177
//! SourceURL:https://example.com/
//! ```
//!
//! where `StartHTML`/`EndHTML` are byte offsets into the whole record.

const START_HTML_KEY: &[u8] = b"StartHTML:";
const END_HTML_KEY: &[u8] = b"EndHTML:";

/// Drops the NUL padding clipboard buffers are commonly allocated with.
pub fn trim_trailing_nuls(mut bytes: Vec<u8>) -> Vec<u8> {
    let content_len = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |last| last + 1);
    bytes.truncate(content_len);
    bytes
}

/// Returns the `StartHTML..EndHTML` span of an HTML clipboard record, or the
/// whole input when the header is missing, malformed or out of bounds.
pub fn html_fragment(bytes: &[u8]) -> &[u8] {
    let start = find_offset(bytes, START_HTML_KEY);
    let end = find_offset(bytes, END_HTML_KEY);

    match (start, end) {
        (Some(start), Some(end)) if start < end && end <= bytes.len() => &bytes[start..end],
        _ => bytes,
    }
}

fn find_offset(bytes: &[u8], key: &[u8]) -> Option<usize> {
    let key_at = bytes
        .windows(key.len())
        .position(|window| window == key)?;

    let mut rest = &bytes[key_at + key.len()..];
    while let [b' ', tail @ ..] = rest {
        rest = tail;
    }

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    rest[..digits].iter().try_fold(0_usize, |acc, digit| {
        acc.checked_mul(10)?
            .checked_add(usize::from(digit - b'0'))
    })
}
