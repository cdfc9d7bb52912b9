//! Data file reader: delimiter detection and headerless time-series table.

use csv::ReaderBuilder;
use log::{debug, info, warn};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use crate::conf::C_HEADER_TIME;
use crate::spec::{ConvertError, EnumDatDelimiter, SpecConvertOptions, SpecConvertReport};
use crate::util::{decode_text_lossy, split_non_empty_lines};

const C_SOURCE_NAME: &str = "DAT";

////////////////////////////////////////////////////////////////////////////////
// #region DelimiterDetection

/// Pick the data delimiter from `candidates` using the first `n_lines_sample`
/// non-empty lines.
///
/// The first candidate splitting every sampled line into the same field count
/// (greater than one) wins. Otherwise the candidate with the most fields on the
/// first line wins, ties broken by candidate order. Returns `None` when the
/// text has no non-empty line or `candidates` is empty.
pub fn detect_dat_delimiter(
    text: &str,
    candidates: &[EnumDatDelimiter],
    n_lines_sample: usize,
) -> Option<EnumDatDelimiter> {
    let l_lines: Vec<&str> = split_non_empty_lines(text)
        .take(usize::max(1, n_lines_sample))
        .collect();
    let c_line_first = *l_lines.first()?;

    for delimiter in candidates {
        let mut iter_counts = l_lines.iter().map(|line| delimiter.split_line(line).len());
        let Some(n_fields_first) = iter_counts.next() else {
            continue;
        };
        if n_fields_first > 1 && iter_counts.all(|n_fields| n_fields == n_fields_first) {
            return Some(*delimiter);
        }
    }

    let mut delimiter_best = *candidates.first()?;
    let mut n_fields_best = 0usize;
    for delimiter in candidates {
        let n_fields = delimiter.split_line(c_line_first).len();
        if n_fields > n_fields_best {
            delimiter_best = *delimiter;
            n_fields_best = n_fields;
        }
    }
    Some(delimiter_best)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowParsing

/// Split data text into raw rows with `delimiter`; blank lines are skipped.
pub fn read_dat_rows(
    text: &str,
    delimiter: EnumDatDelimiter,
) -> Result<Vec<Vec<String>>, ConvertError> {
    let Some(n_byte_delimiter) = delimiter.as_byte() else {
        return Ok(split_non_empty_lines(text)
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect());
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(n_byte_delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut l_rows = Vec::new();
    for (n_idx_record, res_record) in reader.records().enumerate() {
        let record = res_record.map_err(|err| {
            ConvertError::Table(format!(
                "Failed to parse DAT record {}: {err}",
                n_idx_record + 1
            ))
        })?;
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        l_rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(l_rows)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableBuild

/// Column names for a data table of `n_width` columns: `Time`, `Col2`, ...
pub fn derive_dat_column_names(n_width: usize) -> Vec<String> {
    (1..=n_width)
        .map(|n_col| {
            if n_col == 1 {
                C_HEADER_TIME.to_string()
            } else {
                format!("Col{n_col}")
            }
        })
        .collect()
}

/// Build a typed dataframe from raw rows.
///
/// Short rows are padded with missing values and empty strings are missing.
/// Each column becomes integer when every present value parses as an integer,
/// float when every present value parses as a number, and text otherwise.
pub fn build_dat_dataframe(rows: &[Vec<String>]) -> Result<DataFrame, ConvertError> {
    let n_width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if n_width == 0 {
        return Ok(DataFrame::empty());
    }

    let l_cols = derive_dat_column_names(n_width)
        .into_iter()
        .enumerate()
        .map(|(n_idx_col, c_name)| {
            let l_values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| {
                    row.get(n_idx_col)
                        .map(String::as_str)
                        .filter(|val| !val.trim().is_empty())
                })
                .collect();
            derive_typed_column(&c_name, &l_values)
        })
        .collect::<Vec<_>>();

    DataFrame::new(l_cols).map_err(|err| ConvertError::Table(err.to_string()))
}

fn derive_typed_column(name: &str, values: &[Option<&str>]) -> Column {
    let l_ints: Option<Vec<Option<i64>>> = values
        .iter()
        .map(|val| match val {
            Some(c_val) => c_val.trim().parse::<i64>().ok().map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(l_ints) = l_ints {
        return Column::from(Series::new(name.into(), l_ints));
    }

    let l_floats: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|val| match val {
            Some(c_val) => c_val.trim().parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(l_floats) = l_floats {
        return Column::from(Series::new(name.into(), l_floats));
    }

    let l_texts: Vec<Option<String>> = values
        .iter()
        .map(|val| val.map(str::to_string))
        .collect();
    Column::from(Series::new(name.into(), l_texts))
}

/// Decode, detect the delimiter and build the data table.
///
/// An input without non-empty lines yields an empty dataframe.
pub fn read_dat_table(
    v_dat: &[u8],
    options: &SpecConvertOptions,
    report: &mut SpecConvertReport,
) -> Result<DataFrame, ConvertError> {
    let (c_text, n_bytes_dropped) = decode_text_lossy(v_dat);
    if n_bytes_dropped > 0 {
        let err = ConvertError::Decode {
            source_name: C_SOURCE_NAME.to_string(),
            n_bytes_dropped,
        };
        warn!("{err}");
        report.warn(err.to_string());
    }

    let Some(delimiter) = detect_dat_delimiter(
        &c_text,
        &options.dat_delimiters,
        options.n_lines_delimiter_sample,
    ) else {
        info!("DAT input is empty; data sheet keeps its header row only");
        return Ok(DataFrame::empty());
    };
    debug!("DAT delimiter detected: {delimiter}");

    let l_rows = read_dat_rows(&c_text, delimiter)?;
    let df_dat = build_dat_dataframe(&l_rows)?;
    report.delimiter = Some(delimiter);
    report.n_rows_dat = df_dat.height();
    report.n_cols_dat = df_dat.width();
    Ok(df_dat)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
