//! Byte-budget normalization of field values
//!
//! Pure functions, no I/O. A value is cut to its budget without splitting a
//! UTF-8 sequence, then right-padded with ASCII spaces.

/// Longest prefix of `value` that fits in `budget` bytes and ends on a
/// character boundary.
pub fn truncate_utf8(value: &str, budget: usize) -> &str {
    if value.len() <= budget {
        return value;
    }
    let mut cut = budget;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    &value[..cut]
}

/// Bytes `c` occupies inside a JSON string literal as written by serde_json.
pub fn escaped_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\u{08}' | '\u{0c}' | '\n' | '\r' | '\t' => 2,
        c if (c as u32) < 0x20 => 6,
        c => c.len_utf8(),
    }
}

/// Fit `value` to exactly `budget` bytes of escaped JSON string content.
///
/// For values without escapable characters this is `truncate_utf8` plus
/// space padding. Characters JSON escapes count by their escaped width so
/// the written slot never exceeds the schema's record length.
pub fn normalize_value(value: &str, budget: usize) -> String {
    let truncated = truncate_utf8(value, budget);

    let mut used = 0;
    let mut end = 0;
    for (i, c) in truncated.char_indices() {
        let width = escaped_len(c);
        if used + width > budget {
            break;
        }
        used += width;
        end = i + c.len_utf8();
    }

    let mut out = String::with_capacity(end + (budget - used));
    out.push_str(&truncated[..end]);
    out.extend(std::iter::repeat(' ').take(budget - used));
    out
}
