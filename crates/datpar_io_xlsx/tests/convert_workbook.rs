use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use datpar_io_xlsx::{
    C_SHEET_NAME_DAT, C_SHEET_NAME_PAR, ConvertError, EnumDatDelimiter, SpecConvertOptions,
    TUP_COOLING_HEADERS, convert_dat_par_to_xlsx, derive_windowed_convert_options,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open_workbook(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes)).expect("open workbook")
}

fn read_sheet(workbook: &mut Xlsx<Cursor<Vec<u8>>>, name: &str) -> Range<Data> {
    workbook.worksheet_range(name).expect("worksheet range")
}

fn text_at(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match range.get_value((row, col)) {
        Some(Data::String(val)) => Some(val.clone()),
        _ => None,
    }
}

fn number_at(range: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match range.get_value((row, col)) {
        Some(Data::Float(val)) => Some(*val),
        Some(Data::Int(val)) => Some(*val as f64),
        _ => None,
    }
}

#[test]
fn convert_writes_styled_header_data_and_parameter_sheet() {
    init_logger();
    let v_dat = b"12:00:00\t1500\t0.5\n12:00:01\t1510\t0.6\n";
    let v_par = b"H|Run 42\nF|Ch1 MP01 RPM\nF|Cooling Status\nB|Ch2 Boost\n";

    let output =
        convert_dat_par_to_xlsx(v_dat, v_par, &SpecConvertOptions::default()).expect("convert");
    assert_eq!(output.report.delimiter, Some(EnumDatDelimiter::Tab));
    assert_eq!(output.report.placements.len(), 3);

    let mut workbook = open_workbook(output.bytes);
    assert_eq!(
        workbook.sheet_names(),
        vec![C_SHEET_NAME_DAT.to_string(), C_SHEET_NAME_PAR.to_string()]
    );

    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    assert_eq!(text_at(&range_dat, 0, 0).as_deref(), Some("Time"));
    assert_eq!(text_at(&range_dat, 0, 1).as_deref(), Some("RPM"));
    assert_eq!(text_at(&range_dat, 0, 2), None);
    for (n_offset, c_label) in TUP_COOLING_HEADERS.iter().enumerate() {
        assert_eq!(
            text_at(&range_dat, 0, 17 + n_offset as u32).as_deref(),
            Some(*c_label)
        );
    }
    assert_eq!(text_at(&range_dat, 0, 33).as_deref(), Some("Boost"));
    assert_eq!(text_at(&range_dat, 0, 41).as_deref(), Some("Col42"));
    assert_eq!(text_at(&range_dat, 0, 99).as_deref(), Some("Col100"));

    let l_merges: Vec<((u32, u32), (u32, u32))> = workbook
        .worksheet_merge_cells(C_SHEET_NAME_DAT)
        .expect("merged regions")
        .expect("read merged regions")
        .into_iter()
        .map(|dims| (dims.start, dims.end))
        .collect();
    // RPM spans B1:Q1 and Boost spans AH1:AO1; the cooling block is unmerged.
    assert_eq!(l_merges.len(), 2);
    assert!(l_merges.contains(&((0, 1), (0, 16))));
    assert!(l_merges.contains(&((0, 33), (0, 40))));

    assert_eq!(text_at(&range_dat, 1, 0).as_deref(), Some("12:00:00"));
    assert_eq!(number_at(&range_dat, 1, 1), Some(1500.0));
    assert_eq!(number_at(&range_dat, 2, 2), Some(0.6));

    let range_par = read_sheet(&mut workbook, C_SHEET_NAME_PAR);
    assert_eq!(text_at(&range_par, 0, 0).as_deref(), Some("Col_1"));
    assert_eq!(text_at(&range_par, 0, 1).as_deref(), Some("Col_2"));
    assert_eq!(text_at(&range_par, 1, 1).as_deref(), Some("Run 42"));
    assert_eq!(text_at(&range_par, 4, 0).as_deref(), Some("B"));
}

#[test]
fn convert_empty_dat_keeps_header_row_only() {
    init_logger();
    let output = convert_dat_par_to_xlsx(b"", b"F|Speed\n", &SpecConvertOptions::default())
        .expect("convert");
    assert_eq!(output.report.delimiter, None);
    assert_eq!(output.report.n_rows_dat, 0);

    let mut workbook = open_workbook(output.bytes);
    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    assert_eq!(range_dat.end().map(|(n_row, _)| n_row), Some(0));
    assert_eq!(text_at(&range_dat, 0, 1).as_deref(), Some("Speed"));
}

#[test]
fn convert_without_channel_lines_keeps_placeholder_names() {
    init_logger();
    let output = convert_dat_par_to_xlsx(
        b"1,2,3\n4,5\n",
        b"H|Header only\n#|note\n",
        &SpecConvertOptions::default(),
    )
    .expect("convert");
    assert!(output.report.placements.is_empty());

    let mut workbook = open_workbook(output.bytes);
    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    assert_eq!(text_at(&range_dat, 0, 0).as_deref(), Some("Time"));
    assert_eq!(text_at(&range_dat, 0, 1).as_deref(), Some("Col2"));
    assert_eq!(text_at(&range_dat, 0, 99).as_deref(), Some("Col100"));
    // Ragged row: the missing third value stays blank.
    assert_eq!(number_at(&range_dat, 2, 1), Some(5.0));
    assert_eq!(number_at(&range_dat, 2, 2), None);
}

#[test]
fn convert_windowed_preset_offsets_and_limits_parameter_sheet() {
    init_logger();
    let c_par = (1..=15)
        .map(|n_idx| format!("N|Signal {n_idx}"))
        .collect::<Vec<_>>()
        .join("\n");
    let output = convert_dat_par_to_xlsx(
        b"0.0 1\n0.1 2\n",
        c_par.as_bytes(),
        &derive_windowed_convert_options(),
    )
    .expect("convert");
    assert_eq!(output.report.n_rows_par, 11);
    assert_eq!(output.report.placements.len(), 11);

    let mut workbook = open_workbook(output.bytes);
    let range_par = read_sheet(&mut workbook, C_SHEET_NAME_PAR);
    assert_eq!(text_at(&range_par, 0, 0), None);
    assert_eq!(text_at(&range_par, 2, 0).as_deref(), Some("Col_1"));
    assert_eq!(text_at(&range_par, 3, 1).as_deref(), Some("Signal 1"));
    assert_eq!(text_at(&range_par, 13, 1).as_deref(), Some("Signal 11"));
    assert_eq!(text_at(&range_par, 14, 1), None);

    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    assert_eq!(text_at(&range_dat, 0, 0).as_deref(), Some("Time"));
    assert_eq!(text_at(&range_dat, 0, 11).as_deref(), Some("Signal 11"));
    assert_eq!(text_at(&range_dat, 0, 12).as_deref(), Some("Col13"));
}

#[test]
fn convert_records_decode_warnings_and_continues() {
    init_logger();
    let output = convert_dat_par_to_xlsx(
        b"1,2\n3,\xfe4\n",
        b"F|Sp\xffeed\n",
        &SpecConvertOptions::default(),
    )
    .expect("convert");
    assert_eq!(output.report.warnings.len(), 2);
    assert_eq!(output.report.placements[0].label, "Speed");

    let mut workbook = open_workbook(output.bytes);
    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    assert_eq!(number_at(&range_dat, 2, 1), Some(4.0));
}

#[test]
fn convert_reports_processing_error_when_header_exceeds_sheet_width() {
    init_logger();
    let c_par = (0..1100).map(|_| "F|Wide").collect::<Vec<_>>().join("\n");
    let err = convert_dat_par_to_xlsx(b"1\n", c_par.as_bytes(), &SpecConvertOptions::default())
        .expect_err("header wider than a worksheet must fail");

    assert!(matches!(err, ConvertError::Xlsx(_)));
    assert!(
        err.format_user_message()
            .starts_with("Processing Error:\nxlsx write error:")
    );
}

#[test]
fn convert_width_one_cooling_status_writes_sixteen_labels() {
    init_logger();
    let output = convert_dat_par_to_xlsx(b"", b"W|Cooling Status\n", &SpecConvertOptions::default())
        .expect("convert");
    assert_eq!(output.report.placements[0].width, 1);
    assert!(output.report.placements[0].if_cooling_expansion);

    let mut workbook = open_workbook(output.bytes);
    let range_dat = read_sheet(&mut workbook, C_SHEET_NAME_DAT);
    let l_labels: Vec<String> = (1..17)
        .map(|n_col| text_at(&range_dat, 0, n_col).unwrap_or_default())
        .collect();
    assert_eq!(l_labels, TUP_COOLING_HEADERS.to_vec());
    assert_eq!(text_at(&range_dat, 0, 17).as_deref(), Some("Col18"));
}
