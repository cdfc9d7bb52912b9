//! Workbook writer: assembles `DAT_Data` and `PAR_Data` and serializes them.

use log::{info, warn};
use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{C_SHEET_NAME_DAT, C_SHEET_NAME_PAR};
use crate::dat::read_dat_table;
use crate::header::{calculate_header_span_end, plan_header_placements};
use crate::par::read_par_table;
use crate::render::{SpecHeaderRow, render_header_row};
use crate::spec::{
    ConvertError, EnumCellValue, SpecCellFormat, SpecConvertOptions, SpecConvertOutput,
    SpecConvertReport, SpecHeaderPlacement,
};
use crate::util::{cast_col_num, cast_row_num};

/// Convert raw DAT and PAR bytes into one xlsx workbook.
///
/// Pipeline: parse the parameter table, plan and render the data header,
/// read the data table, then write `DAT_Data` (styled header + body) and
/// `PAR_Data` (raw parameter table). Recoverable input problems end up in the
/// report warnings; any other failure aborts without partial output.
pub fn convert_dat_par_to_xlsx(
    v_dat: &[u8],
    v_par: &[u8],
    options: &SpecConvertOptions,
) -> Result<SpecConvertOutput, ConvertError> {
    let mut report = SpecConvertReport::default();

    let table_par = read_par_table(v_par, options.n_rows_par_max, &mut report);
    let l_placements = plan_header_placements(&table_par);
    check_header_overflow(&l_placements, options, &mut report);
    let header_row = render_header_row(&l_placements, options)?;

    let df_dat = read_dat_table(v_dat, options, &mut report)?;
    let df_par = table_par.to_dataframe()?;

    let mut workbook = Workbook::new();

    let worksheet_dat = workbook.add_worksheet();
    worksheet_dat.set_name(C_SHEET_NAME_DAT)?;
    write_header_row(worksheet_dat, &header_row, &options.fmt_header)?;
    write_dataframe_body(worksheet_dat, &df_dat, 1)?;

    let worksheet_par = workbook.add_worksheet();
    worksheet_par.set_name(C_SHEET_NAME_PAR)?;
    write_dataframe_with_header(
        worksheet_par,
        &df_par,
        options.n_rows_par_offset,
        &derive_rust_xlsx_format(&options.fmt_header),
    )?;

    let bytes = workbook.save_to_buffer()?;

    report.n_cols_header = header_row.n_cols_max();
    report.placements = l_placements;
    info!("{report}");
    Ok(SpecConvertOutput { bytes, report })
}

/// Record a warning when placements reserve columns past the header width.
pub fn check_header_overflow(
    placements: &[SpecHeaderPlacement],
    options: &SpecConvertOptions,
    report: &mut SpecConvertReport,
) {
    let n_col_end = calculate_header_span_end(placements);
    if n_col_end <= options.n_cols_header_placeholder {
        return;
    }
    let c_msg = format!(
        "Header overflow: placements end at column {n_col_end}, beyond the {}-column data header.",
        options.n_cols_header_placeholder
    );
    warn!("{c_msg}");
    report.warn(c_msg);
}

/// Flush the rendered header model into row 1 of `worksheet`.
///
/// Ranges of two or more cells are written as merges; single-cell ranges and
/// free cells are written one by one. Merge tails are skipped.
pub fn write_header_row(
    worksheet: &mut Worksheet,
    header_row: &SpecHeaderRow,
    fmt_base: &SpecCellFormat,
) -> Result<(), ConvertError> {
    for (n_col, cell) in header_row.cells() {
        if header_row.is_merged_tail(n_col) {
            continue;
        }
        let fmt_cell = derive_rust_xlsx_format(&fmt_base.merge(&cell.fmt));
        let n_col_end = header_row
            .merges()
            .iter()
            .find(|merge| merge.col_start == n_col)
            .map_or(n_col, |merge| merge.col_end);

        if n_col_end > n_col {
            worksheet.merge_range(
                0,
                cast_col_num(n_col - 1)?,
                0,
                cast_col_num(n_col_end - 1)?,
                cell.text.as_deref().unwrap_or(""),
                &fmt_cell,
            )?;
            continue;
        }

        match cell.text.as_deref() {
            Some(c_text) => {
                worksheet.write_string_with_format(0, cast_col_num(n_col - 1)?, c_text, &fmt_cell)?;
            }
            None => {
                worksheet.write_blank(0, cast_col_num(n_col - 1)?, &fmt_cell)?;
            }
        }
    }
    Ok(())
}

/// Write the column names at `row_offset` and the rows below them.
pub fn write_dataframe_with_header(
    worksheet: &mut Worksheet,
    df: &DataFrame,
    row_offset: usize,
    fmt_header: &Format,
) -> Result<(), ConvertError> {
    if df.width() == 0 {
        return Ok(());
    }
    for (n_idx_col, c_name) in df.get_column_names_str().into_iter().enumerate() {
        worksheet.write_string_with_format(
            cast_row_num(row_offset)?,
            cast_col_num(n_idx_col)?,
            c_name,
            fmt_header,
        )?;
    }
    write_dataframe_body(worksheet, df, row_offset + 1)
}

/// Write every dataframe row starting at 0-based `row_start`, column A.
///
/// Missing values are left unwritten.
pub fn write_dataframe_body(
    worksheet: &mut Worksheet,
    df: &DataFrame,
    row_start: usize,
) -> Result<(), ConvertError> {
    let l_cols = df.get_columns();
    for n_row in 0..df.height() {
        let n_row_sheet = cast_row_num(row_start + n_row)?;
        for (n_idx_col, col) in l_cols.iter().enumerate() {
            let value = derive_cell_value_from_any_value(col.get(n_row).map_err(|err| {
                ConvertError::Table(format!("Failed to access cell value: {err}"))
            })?);
            write_cell(worksheet, n_row_sheet, cast_col_num(n_idx_col)?, &value)?;
        }
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &EnumCellValue,
) -> Result<(), ConvertError> {
    match value {
        EnumCellValue::None => {}
        EnumCellValue::String(val) => {
            worksheet.write_string(row, col, val)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number(row, col, *val)?;
        }
    }
    Ok(())
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) if val.is_empty() => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) if val.is_empty() => EnumCellValue::None,
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => derive_finite_number(val as f64),
        AnyValue::Float64(val) => derive_finite_number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn derive_finite_number(val: f64) -> EnumCellValue {
    if val.is_finite() {
        EnumCellValue::Number(val)
    } else {
        EnumCellValue::None
    }
}

/// Translate a format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::derive_windowed_convert_options;

    #[test]
    fn test_convert_produces_zip_workbook_and_report() {
        let output = convert_dat_par_to_xlsx(
            b"0.0,1,2\n0.1,3,4\n",
            b"H|Header\nF|Ch1 MP01 Engine Speed\nB|Ch2 Boost\n",
            &SpecConvertOptions::default(),
        )
        .expect("convert");

        assert_eq!(&output.bytes[..2], b"PK");
        let report = &output.report;
        assert_eq!(report.placements.len(), 2);
        assert_eq!(report.placements[1].col_start, 18);
        assert_eq!((report.n_rows_dat, report.n_cols_dat), (2, 3));
        assert_eq!((report.n_rows_par, report.n_cols_par), (3, 2));
        assert_eq!(report.n_cols_header, 100);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_convert_warns_on_header_overflow() {
        let c_par = (0..7).map(|_| "F|Block").collect::<Vec<_>>().join("\n");
        let output = convert_dat_par_to_xlsx(b"", c_par.as_bytes(), &SpecConvertOptions::default())
            .expect("convert");

        // Seven 16-wide blocks end at column 113.
        assert_eq!(output.report.n_cols_header, 113);
        assert_eq!(output.report.warnings.len(), 1);
        assert!(output.report.warnings[0].contains("column 113"));
    }

    #[test]
    fn test_convert_with_empty_par_keeps_placeholder_header() {
        let output = convert_dat_par_to_xlsx(b"1,2\n", b"", &derive_windowed_convert_options())
            .expect("convert");
        assert!(output.report.placements.is_empty());
        assert_eq!(
            output.report.warnings,
            vec!["Error reading PAR file: no non-empty lines".to_string()]
        );
    }

    #[test]
    fn test_derive_cell_value_from_any_value_maps_missing_and_numbers() {
        assert_eq!(
            derive_cell_value_from_any_value(AnyValue::Null),
            EnumCellValue::None
        );
        assert_eq!(
            derive_cell_value_from_any_value(AnyValue::String("")),
            EnumCellValue::None
        );
        assert_eq!(
            derive_cell_value_from_any_value(AnyValue::Int64(7)),
            EnumCellValue::Number(7.0)
        );
        assert_eq!(
            derive_cell_value_from_any_value(AnyValue::Float64(f64::NAN)),
            EnumCellValue::None
        );
    }

    #[test]
    fn test_check_header_overflow_within_limit_is_silent() {
        let mut report = SpecConvertReport::default();
        let l_placements = vec![SpecHeaderPlacement {
            col_start: 2,
            width: 99,
            label: "Wide".to_string(),
            if_cooling_expansion: false,
        }];
        check_header_overflow(&l_placements, &SpecConvertOptions::default(), &mut report);
        assert!(report.warnings.is_empty());
    }
}
