//! `datpar_io_xlsx` v1:
//! DAT/PAR measurement files to a two-sheet XLSX workbook.
//!
//! Modules follow the conversion pipeline:
//! - `conf`   : constants, code-width table and option presets
//! - `spec`   : specs/models/options, report and errors
//! - `util`   : pure text helpers (decode, label cleaning, widths)
//! - `par`    : parameter file parser
//! - `header` : header planner
//! - `render` : in-memory row-1 header renderer
//! - `dat`    : data file reader
//! - `writer` : workbook assembly and serialization
pub mod conf;
pub mod dat;
pub mod header;
pub mod par;
pub mod render;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_DAT, C_SHEET_NAME_PAR, TUP_COOLING_HEADERS, TUP_HEADER_WIDTH_BY_CODE,
    derive_default_convert_options, derive_windowed_convert_options,
};
pub use dat::{detect_dat_delimiter, read_dat_table};
pub use header::{calculate_header_span_end, plan_header_placements};
pub use par::read_par_table;
pub use render::{SpecHeaderRow, render_header_row};
pub use spec::{
    ConvertError, EnumDatDelimiter, SpecCellFormat, SpecConvertOptions, SpecConvertOutput,
    SpecConvertReport, SpecHeaderPlacement, SpecParameterRecord, SpecParameterTable,
};
pub use util::{clean_header_name, derive_header_width};
pub use writer::convert_dat_par_to_xlsx;
