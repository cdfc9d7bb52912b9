//! Parameter file parser: pipe-delimited lines to a rectangular record table.

use log::{debug, warn};

use crate::conf::N_LEN_PAR_FIELD_MAX;
use crate::spec::{ConvertError, SpecConvertReport, SpecParameterTable};
use crate::util::{decode_text_lossy, split_non_empty_lines, truncate_field};

const C_SOURCE_NAME: &str = "PAR";

/// Parse raw parameter bytes into a rectangular table.
///
/// Never fails: undecodable bytes are dropped and an input without non-empty
/// lines yields an empty table. Both cases are recorded in `report`.
/// `n_rows_par_max` keeps only the first N lines before padding.
pub fn read_par_table(
    v_par: &[u8],
    n_rows_par_max: Option<usize>,
    report: &mut SpecConvertReport,
) -> SpecParameterTable {
    let (c_text, n_bytes_dropped) = decode_text_lossy(v_par);
    if n_bytes_dropped > 0 {
        let err = ConvertError::Decode {
            source_name: C_SOURCE_NAME.to_string(),
            n_bytes_dropped,
        };
        warn!("{err}");
        report.warn(err.to_string());
    }

    let l_rows: Vec<Vec<String>> = split_non_empty_lines(&c_text)
        .take(n_rows_par_max.unwrap_or(usize::MAX))
        .map(split_par_line)
        .collect();

    if l_rows.is_empty() {
        let err = ConvertError::EmptyInput {
            source_name: C_SOURCE_NAME.to_string(),
        };
        warn!("{err}");
        report.warn(err.to_string());
        return SpecParameterTable::default();
    }

    let table = SpecParameterTable::from_rows(l_rows);
    debug!(
        "parameter table: {} rows x {} cols",
        table.height(),
        table.width()
    );
    report.n_rows_par = table.height();
    report.n_cols_par = table.width();
    table
}

fn split_par_line(line: &str) -> Vec<String> {
    line.split('|')
        .map(|c_field| truncate_field(c_field, N_LEN_PAR_FIELD_MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_par_table_rectangularizes_variable_rows() {
        let mut report = SpecConvertReport::default();
        let table = read_par_table(
            b"F|Ch1 MP01 Engine Speed\nB | a | Oil Temp\n\n   \nW\n",
            None,
            &mut report,
        );

        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 3);
        assert_eq!(table.columns, vec!["Col_1", "Col_2", "Col_3"]);
        assert_eq!(
            table.records[0].fields,
            vec!["F", "Ch1 MP01 Engine Spee", ""]
        );
        assert_eq!(table.records[1].fields, vec!["B", "a", "Oil Temp"]);
        assert_eq!(table.records[2].fields, vec!["W", "", ""]);
        assert_eq!((report.n_rows_par, report.n_cols_par), (3, 3));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_read_par_table_truncates_fields_to_twenty_chars() {
        let mut report = SpecConvertReport::default();
        let table = read_par_table(
            b"N|abcdefghijklmnopqrstuvwxyz",
            None,
            &mut report,
        );
        assert_eq!(table.records[0].fields[1], "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_read_par_table_empty_input_returns_empty_table() {
        let mut report = SpecConvertReport::default();
        let table = read_par_table(b"\n \r\n\t\n", None, &mut report);

        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
        assert_eq!(
            report.warnings,
            vec!["Error reading PAR file: no non-empty lines".to_string()]
        );
    }

    #[test]
    fn test_read_par_table_windowing_keeps_first_lines() {
        let mut report = SpecConvertReport::default();
        let c_text = (1..=15)
            .map(|n_idx| format!("N|Signal {n_idx}"))
            .collect::<Vec<_>>()
            .join("\n");
        let table = read_par_table(c_text.as_bytes(), Some(11), &mut report);

        assert_eq!(table.height(), 11);
        assert_eq!(table.records[10].label, "Signal 11");
    }

    #[test]
    fn test_read_par_table_records_decode_warning() {
        let mut report = SpecConvertReport::default();
        let table = read_par_table(b"F|Sp\xffeed", None, &mut report);

        assert_eq!(table.records[0].label, "Speed");
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("dropped 1 invalid byte"));
    }
}
