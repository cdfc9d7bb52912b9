//! Conversion constants and default preset factories.

use crate::spec::{EnumDatDelimiter, SpecCellFormat, SpecConvertOptions};

/// Data sheet name.
pub const C_SHEET_NAME_DAT: &str = "DAT_Data";
/// Parameter sheet name.
pub const C_SHEET_NAME_PAR: &str = "PAR_Data";
/// Label of the first data column.
pub const C_HEADER_TIME: &str = "Time";

/// Maximum characters kept per parameter field.
pub const N_LEN_PAR_FIELD_MAX: usize = 20;
/// Parameter lines kept by the windowed preset.
pub const N_ROWS_PAR_WINDOW: usize = 11;
/// Row margin above the parameter table in the windowed preset.
pub const N_ROWS_PAR_OFFSET_WINDOW: usize = 2;
/// Total placeholder header columns (`Time` + `Col2`..`Col100`).
pub const N_COLS_HEADER_PLACEHOLDER: usize = 100;
/// First column available to header placements (1-based).
pub const N_COL_HEADER_START: usize = 2;
/// Non-empty data lines sampled by delimiter detection.
pub const N_LINES_DELIMITER_SAMPLE: usize = 20;

/// Default header highlight fill.
pub const C_COLOR_HEADER_FILL: &str = "#FFFF00";
/// Default fill of expanded cooling-status cells.
pub const C_COLOR_COOLING_FILL: &str = "#00B0F0";

/// Label that triggers the cooling-status expansion (case-insensitive).
pub const C_LABEL_COOLING_STATUS: &str = "cooling status";

/// Header width by parameter code letter.
pub const TUP_HEADER_WIDTH_BY_CODE: [(&str, usize); 6] = [
    ("F", 16),
    ("B", 8),
    ("W", 1),
    ("U", 1),
    ("P", 1),
    ("N", 1),
];

/// Sub-headers written in place of a cooling-status placement.
pub const TUP_COOLING_HEADERS: [&str; 16] = [
    "High Ambient/Idle/DB Notch Solenoid Control",
    "Low Ambient/Low HP Solenoid Control",
    "Low Ambient/Medium HP Solenoid Control",
    "Low Ambient/High HP Solenoid Control",
    "High Ambient/Idle/DB Notch Fan Control",
    "Low Ambient/Low HP Fan Control",
    "Low Ambient/Medium HP Fan Control",
    "Low Ambient/High HP Fan Control",
    "HIGH AMBIENT/HIGH NOTCH SOLENOID CONTROL",
    "HIGH AMBIENT/LOW NOTCH SOLENOID CONTROL",
    "LOW AMBIENT/HIGH NOTCH SOLENOID CONTROL",
    "LOW AMBIENT/LOW NOTCH SOLENOID CONTROL",
    "HIGH AMBIENT/HIGH NOTCH FAN CONTROL",
    "HIGH AMBIENT/LOW NOTCH FAN CONTROL",
    "LOW AMBIENT/HIGH NOTCH FAN CONTROL",
    "LOW AMBIENT/LOW NOTCH FAN CONTROL",
];

/// Delimiter candidates tried by data-file detection, in priority order.
pub const TUP_DAT_DELIMITER_CANDIDATES: [EnumDatDelimiter; 4] = [
    EnumDatDelimiter::Comma,
    EnumDatDelimiter::Tab,
    EnumDatDelimiter::Semicolon,
    EnumDatDelimiter::Whitespace,
];

/// Base header cell format (bold, thin border, centered).
pub fn derive_default_header_format() -> SpecCellFormat {
    SpecCellFormat {
        bold: Some(true),
        border: Some(1),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    }
}

/// Build default conversion options: full parameter table, plain `Time` header.
pub fn derive_default_convert_options() -> SpecConvertOptions {
    SpecConvertOptions::default()
}

/// Build windowed conversion options.
///
/// Keeps only the first [`N_ROWS_PAR_WINDOW`] parameter lines, writes the
/// parameter table [`N_ROWS_PAR_OFFSET_WINDOW`] rows down and highlights the
/// `Time` header.
pub fn derive_windowed_convert_options() -> SpecConvertOptions {
    SpecConvertOptions {
        n_rows_par_max: Some(N_ROWS_PAR_WINDOW),
        n_rows_par_offset: N_ROWS_PAR_OFFSET_WINDOW,
        if_style_time_header: true,
        ..SpecConvertOptions::default()
    }
}
