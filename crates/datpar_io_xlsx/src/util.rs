//! Stateless helper utilities shared by the parser, planner and writer.

use std::sync::LazyLock;

use regex::Regex;

use crate::conf::TUP_HEADER_WIDTH_BY_CODE;
use crate::spec::ConvertError;

static RE_CHANNEL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ch\d+\s*").expect("valid channel tag pattern"));
static RE_MEASURE_POINT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MP\s*\d+").expect("valid measure point pattern"));

////////////////////////////////////////////////////////////////////////////////
// #region TextDecoding

/// Decode UTF-8 permissively, dropping invalid byte sequences.
///
/// Returns the decoded text and the number of dropped bytes.
pub fn decode_text_lossy(bytes: &[u8]) -> (String, usize) {
    let mut c_text = String::with_capacity(bytes.len());
    let mut n_bytes_dropped = 0usize;
    for chunk in bytes.utf8_chunks() {
        c_text.push_str(chunk.valid());
        n_bytes_dropped += chunk.invalid().len();
    }
    (c_text, n_bytes_dropped)
}

fn is_line_break(chr: char) -> bool {
    matches!(
        chr,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Split text on any line break, trim each line and drop empty lines.
pub fn split_non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_line_break)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Trim `field` and keep at most `n_len_max` characters.
pub fn truncate_field(field: &str, n_len_max: usize) -> String {
    field.trim().chars().take(n_len_max).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderLabels

/// Strip channel (`Ch12 `) and measure point (`MP 03`) tags from a label.
///
/// Removal repeats until the text is stable, so the result is a fixed point.
pub fn clean_header_name(raw_text: &str) -> String {
    let mut c_text = raw_text.to_string();
    loop {
        let c_stripped = RE_CHANNEL_TAG.replace_all(&c_text, "");
        let c_stripped = RE_MEASURE_POINT_TAG.replace_all(&c_stripped, "");
        let c_next = c_stripped.trim().to_string();
        if c_next == c_text {
            return c_next;
        }
        c_text = c_next;
    }
}

/// Derive the header label from the last field of a parameter row.
pub fn derive_header_label(last_field: &str) -> String {
    let c_text = last_field.trim();
    let c_label = match c_text.rsplit_once('|') {
        Some((_, c_tail)) => c_tail.trim(),
        None => c_text,
    };
    clean_header_name(c_label)
}

/// Uppercased first character of the first field; `None` when blank.
pub fn derive_code_letter(first_field: &str) -> Option<String> {
    let chr = first_field.trim().chars().next()?;
    Some(chr.to_uppercase().collect())
}

/// Look up the header width for a code letter.
pub fn derive_header_width(code_letter: &str, n_line: usize) -> Result<usize, ConvertError> {
    TUP_HEADER_WIDTH_BY_CODE
        .iter()
        .find(|(c_code, _)| *c_code == code_letter)
        .map(|(_, n_width)| *n_width)
        .ok_or_else(|| ConvertError::UnrecognizedCode {
            code: code_letter.to_string(),
            n_line,
        })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Convert a 0-based row index into the xlsx row type.
pub fn cast_row_num(value: usize) -> Result<u32, ConvertError> {
    u32::try_from(value).map_err(|_| ConvertError::Xlsx(format!("row index overflow: {value}")))
}

/// Convert a 0-based column index into the xlsx column type.
pub fn cast_col_num(value: usize) -> Result<u16, ConvertError> {
    u16::try_from(value)
        .map_err(|_| ConvertError::Xlsx(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
