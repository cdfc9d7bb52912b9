//! Shared conversion specification models, reports and errors.

use std::collections::BTreeMap;
use std::fmt;

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use thiserror::Error;

use crate::conf::{
    C_COLOR_COOLING_FILL, C_COLOR_HEADER_FILL, N_COLS_HEADER_PLACEHOLDER,
    N_LINES_DELIMITER_SAMPLE, TUP_DAT_DELIMITER_CANDIDATES, derive_default_header_format,
};
use crate::util::{derive_code_letter, derive_header_label};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification overlaid onto header cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ParameterTable

/// One record of the parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecParameterRecord {
    /// 1-based record index in file order.
    pub n_line: usize,
    /// Trimmed and truncated fields, padded to table width.
    pub fields: Vec<String>,
    /// Uppercased first character of the first field; `None` when blank.
    pub code_letter: Option<String>,
    /// Cleaned header label taken from the last field.
    pub label: String,
}

impl SpecParameterRecord {
    /// Build a record and derive its code letter and label from `fields`.
    pub fn from_fields(n_line: usize, fields: Vec<String>) -> Self {
        let code_letter = fields.first().and_then(|c_field| derive_code_letter(c_field));
        let label = derive_header_label(fields.last().map(String::as_str).unwrap_or(""));
        Self {
            n_line,
            fields,
            code_letter,
            label,
        }
    }
}

/// Rectangular parameter table with synthetic `Col_1..` column names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecParameterTable {
    /// Column names.
    pub columns: Vec<String>,
    /// Records in file order.
    pub records: Vec<SpecParameterRecord>,
}

impl SpecParameterTable {
    /// Rectangularize raw rows: pad with empty strings up to the widest row.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let Some(n_width) = rows.iter().map(Vec::len).max() else {
            return Self::default();
        };

        let columns = (1..=n_width).map(|n_idx| format!("Col_{n_idx}")).collect();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(n_idx_row, mut l_fields)| {
                l_fields.resize(n_width, String::new());
                SpecParameterRecord::from_fields(n_idx_row + 1, l_fields)
            })
            .collect();

        Self { columns, records }
    }

    /// Number of records.
    pub fn height(&self) -> usize {
        self.records.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert into a string-typed dataframe for sheet output.
    pub fn to_dataframe(&self) -> Result<DataFrame, ConvertError> {
        if self.columns.is_empty() {
            return Ok(DataFrame::empty());
        }

        let l_cols = self
            .columns
            .iter()
            .enumerate()
            .map(|(n_idx_col, c_name)| {
                let l_values: Vec<&str> = self
                    .records
                    .iter()
                    .map(|record| record.fields[n_idx_col].as_str())
                    .collect();
                Column::from(Series::new(c_name.as_str().into(), l_values))
            })
            .collect::<Vec<_>>();

        DataFrame::new(l_cols).map_err(|err| ConvertError::Table(err.to_string()))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderSpecification

/// One header placement instruction on row 1 of the data sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderPlacement {
    /// 1-based first column.
    pub col_start: usize,
    /// Number of columns reserved (>= 1).
    pub width: usize,
    /// Display label.
    pub label: String,
    /// Replace the merged range with the fixed cooling sub-headers.
    pub if_cooling_expansion: bool,
}

impl SpecHeaderPlacement {
    /// 1-based last column (inclusive).
    pub fn col_end(&self) -> usize {
        self.col_start + self.width - 1
    }
}

/// One row-1 cell of the header model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHeaderCell {
    /// Cell text; `None` for a blank cell.
    pub text: Option<String>,
    /// Format patch applied over the base header format.
    pub fmt: SpecCellFormat,
}

/// Merged row-1 range (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecHeaderMerge {
    /// Start column (inclusive).
    pub col_start: usize,
    /// End column (inclusive).
    pub col_end: usize,
}

impl SpecHeaderMerge {
    /// Whether two ranges share at least one column.
    pub fn overlaps(&self, other: &SpecHeaderMerge) -> bool {
        self.col_start <= other.col_end && other.col_start <= self.col_end
    }

    /// Whether `col` lies inside the range.
    pub fn contains(&self, col: usize) -> bool {
        self.col_start <= col && col <= self.col_end
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConvertOptions

/// Column separator used by the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDatDelimiter {
    /// `,`
    Comma,
    /// `\t`
    Tab,
    /// `;`
    Semicolon,
    /// One or more whitespace characters.
    Whitespace,
}

impl EnumDatDelimiter {
    /// Single-byte separator for the `csv` reader; `None` for whitespace runs.
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Self::Comma => Some(b','),
            Self::Tab => Some(b'\t'),
            Self::Semicolon => Some(b';'),
            Self::Whitespace => None,
        }
    }

    /// Split one line into raw fields (quote-unaware).
    pub fn split_line<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Self::Comma => line.split(',').collect(),
            Self::Tab => line.split('\t').collect(),
            Self::Semicolon => line.split(';').collect(),
            Self::Whitespace => line.split_whitespace().collect(),
        }
    }
}

impl fmt::Display for EnumDatDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::Comma => "comma",
            Self::Tab => "tab",
            Self::Semicolon => "semicolon",
            Self::Whitespace => "whitespace",
        };
        write!(f, "{c_name}")
    }
}

/// Options controlling one DAT/PAR conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvertOptions {
    /// Placeholder header width (`Time` + `Col2..ColN`).
    pub n_cols_header_placeholder: usize,
    /// Keep only the first N parameter lines when set.
    pub n_rows_par_max: Option<usize>,
    /// Blank rows above the parameter table on `PAR_Data`.
    pub n_rows_par_offset: usize,
    /// Fill the `Time` header cell with the header highlight.
    pub if_style_time_header: bool,
    /// Base format of every header cell.
    pub fmt_header: SpecCellFormat,
    /// Fill of merged header ranges.
    pub color_header_fill: String,
    /// Fill of expanded cooling-status cells.
    pub color_cooling_fill: String,
    /// Delimiter candidates in priority order.
    pub dat_delimiters: Vec<EnumDatDelimiter>,
    /// Non-empty data lines sampled by delimiter detection.
    pub n_lines_delimiter_sample: usize,
}

impl Default for SpecConvertOptions {
    fn default() -> Self {
        Self {
            n_cols_header_placeholder: N_COLS_HEADER_PLACEHOLDER,
            n_rows_par_max: None,
            n_rows_par_offset: 0,
            if_style_time_header: false,
            fmt_header: derive_default_header_format(),
            color_header_fill: C_COLOR_HEADER_FILL.to_string(),
            color_cooling_fill: C_COLOR_COOLING_FILL.to_string(),
            dat_delimiters: TUP_DAT_DELIMITER_CANDIDATES.to_vec(),
            n_lines_delimiter_sample: N_LINES_DELIMITER_SAMPLE,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Per-conversion report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecConvertReport {
    /// Parameter records read.
    pub n_rows_par: usize,
    /// Parameter table width.
    pub n_cols_par: usize,
    /// Data rows written.
    pub n_rows_dat: usize,
    /// Data columns written.
    pub n_cols_dat: usize,
    /// Rendered header width (furthest styled column).
    pub n_cols_header: usize,
    /// Detected data delimiter; `None` for an empty data file.
    pub delimiter: Option<EnumDatDelimiter>,
    /// Header placements applied, in order.
    pub placements: Vec<SpecHeaderPlacement>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecConvertReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_par".to_string(), self.n_rows_par as u64);
        dict_counts.insert("cnt_cols_par".to_string(), self.n_cols_par as u64);
        dict_counts.insert("cnt_rows_dat".to_string(), self.n_rows_dat as u64);
        dict_counts.insert("cnt_cols_dat".to_string(), self.n_cols_dat as u64);
        dict_counts.insert("cnt_cols_header".to_string(), self.n_cols_header as u64);
        dict_counts.insert("cnt_placements".to_string(), self.placements.len() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let c_delimiter = self
            .delimiter
            .map_or_else(|| "none".to_string(), |val| val.to_string());
        format!(
            "{prefix} par={}x{} dat={}x{} delimiter={c_delimiter} placements={} header_cols={} warnings={}",
            self.n_rows_par,
            self.n_cols_par,
            self.n_rows_dat,
            self.n_cols_dat,
            self.placements.len(),
            self.n_cols_header,
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CONVERT]"))
    }
}

/// Finished workbook bytes plus the conversion report.
#[derive(Debug, Clone)]
pub struct SpecConvertOutput {
    /// Serialized xlsx workbook.
    pub bytes: Vec<u8>,
    /// Conversion report.
    pub report: SpecConvertReport,
}

/// Conversion error kinds.
///
/// `Decode`, `EmptyInput` and `UnrecognizedCode` are recovered where they
/// occur; the remaining kinds abort the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Input bytes were not valid UTF-8; invalid sequences were dropped.
    #[error("{source_name} file is not valid UTF-8: dropped {n_bytes_dropped} invalid byte(s)")]
    Decode {
        /// Input label (`DAT` / `PAR`).
        source_name: String,
        /// Number of dropped bytes.
        n_bytes_dropped: usize,
    },
    /// Input yielded no non-empty lines.
    #[error("Error reading {source_name} file: no non-empty lines")]
    EmptyInput {
        /// Input label (`DAT` / `PAR`).
        source_name: String,
    },
    /// Parameter code letter has no header width.
    #[error("Unrecognized code letter {code:?} on parameter line {n_line}")]
    UnrecognizedCode {
        /// Uppercased code letter.
        code: String,
        /// 1-based record index.
        n_line: usize,
    },
    /// Header merge/styling failure.
    #[error("Header render failed: {0}")]
    Render(String),
    /// Table construction failure.
    #[error("Table build failed: {0}")]
    Table(String),
    /// Workbook write failure.
    #[error("xlsx write error: {0}")]
    Xlsx(String),
}

impl ConvertError {
    /// Message shown by the host's error display.
    pub fn format_user_message(&self) -> String {
        format!("Processing Error:\n{self}")
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
