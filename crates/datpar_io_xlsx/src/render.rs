//! Workbook renderer: applies header placements to an in-memory row-1 model.
//!
//! The model mirrors what a spreadsheet editor does to row 1 (merge, unmerge,
//! write, restyle) so the cooling-status expansion can undo a merge before the
//! row is flushed once to the write-only xlsx worksheet.

use std::collections::BTreeMap;

use log::debug;

use crate::conf::{C_HEADER_TIME, TUP_COOLING_HEADERS};
use crate::spec::{
    ConvertError, SpecCellFormat, SpecConvertOptions, SpecHeaderCell, SpecHeaderMerge,
    SpecHeaderPlacement,
};

////////////////////////////////////////////////////////////////////////////////
// #region HeaderRowModel

/// Row 1 of the data sheet: cells by 1-based column plus merged ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHeaderRow {
    cells: BTreeMap<usize, SpecHeaderCell>,
    merges: Vec<SpecHeaderMerge>,
}

impl SpecHeaderRow {
    /// Placeholder header: `Time`, then `Col2`..`ColN`.
    pub fn from_placeholder(n_cols: usize) -> Self {
        let mut cells = BTreeMap::new();
        for n_col in 1..=n_cols {
            let c_text = if n_col == 1 {
                C_HEADER_TIME.to_string()
            } else {
                format!("Col{n_col}")
            };
            cells.insert(
                n_col,
                SpecHeaderCell {
                    text: Some(c_text),
                    fmt: SpecCellFormat::default(),
                },
            );
        }
        Self {
            cells,
            merges: Vec::new(),
        }
    }

    /// Cell at 1-based `col`, if it was ever touched.
    pub fn cell(&self, col: usize) -> Option<&SpecHeaderCell> {
        self.cells.get(&col)
    }

    /// Text at 1-based `col`.
    pub fn text(&self, col: usize) -> Option<&str> {
        self.cells.get(&col).and_then(|cell| cell.text.as_deref())
    }

    /// All cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &SpecHeaderCell)> {
        self.cells.iter().map(|(n_col, cell)| (*n_col, cell))
    }

    /// Current merged ranges, in merge order.
    pub fn merges(&self) -> &[SpecHeaderMerge] {
        &self.merges
    }

    /// Furthest column holding a cell or covered by a merge.
    pub fn n_cols_max(&self) -> usize {
        let n_col_cells = self.cells.keys().next_back().copied().unwrap_or(0);
        let n_col_merges = self
            .merges
            .iter()
            .map(|merge| merge.col_end)
            .max()
            .unwrap_or(0);
        usize::max(n_col_cells, n_col_merges)
    }

    /// Whether `col` is covered by a merge but is not its anchor.
    pub fn is_merged_tail(&self, col: usize) -> bool {
        self.merges
            .iter()
            .any(|merge| merge.contains(col) && merge.col_start != col)
    }

    /// Merge `[col_start, col_end]`, clearing every non-anchor cell.
    pub fn merge_cells(&mut self, col_start: usize, col_end: usize) -> Result<(), ConvertError> {
        validate_col_range(col_start, col_end)?;
        let merge_new = SpecHeaderMerge { col_start, col_end };
        if let Some(merge_existing) = self.merges.iter().find(|val| val.overlaps(&merge_new)) {
            return Err(ConvertError::Render(format!(
                "merge range {col_start}..={col_end} overlaps existing range {}..={}",
                merge_existing.col_start, merge_existing.col_end
            )));
        }

        for n_col in (col_start + 1)..=col_end {
            self.cells.insert(n_col, SpecHeaderCell::default());
        }
        self.cells.entry(col_start).or_default();
        self.merges.push(merge_new);
        Ok(())
    }

    /// Remove the merge covering exactly `[col_start, col_end]`.
    pub fn unmerge_cells(&mut self, col_start: usize, col_end: usize) -> Result<(), ConvertError> {
        let Some(n_idx) = self
            .merges
            .iter()
            .position(|merge| merge.col_start == col_start && merge.col_end == col_end)
        else {
            return Err(ConvertError::Render(format!(
                "no merged range {col_start}..={col_end} to unmerge"
            )));
        };
        self.merges.remove(n_idx);
        Ok(())
    }

    /// Write text into `col` and overlay `fmt_patch` onto its format.
    pub fn write_cell(
        &mut self,
        col: usize,
        text: &str,
        fmt_patch: &SpecCellFormat,
    ) -> Result<(), ConvertError> {
        validate_col_range(col, col)?;
        if self.is_merged_tail(col) {
            return Err(ConvertError::Render(format!(
                "cell at column {col} is inside a merged range and is read-only"
            )));
        }
        let cell = self.cells.entry(col).or_default();
        cell.text = Some(text.to_string());
        cell.fmt = cell.fmt.merge(fmt_patch);
        Ok(())
    }

    /// Overlay `fmt_patch` onto the format of `col`, keeping its text.
    pub fn format_cell(&mut self, col: usize, fmt_patch: &SpecCellFormat) {
        let cell = self.cells.entry(col).or_default();
        cell.fmt = cell.fmt.merge(fmt_patch);
    }
}

fn validate_col_range(col_start: usize, col_end: usize) -> Result<(), ConvertError> {
    if col_start == 0 {
        return Err(ConvertError::Render(
            "header columns are 1-based; got column 0".to_string(),
        ));
    }
    if col_end < col_start {
        return Err(ConvertError::Render(format!(
            "invalid header range {col_start}..={col_end}"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Rendering

/// Render placements onto the placeholder header row.
///
/// Each placement is merged, labeled and highlighted; a cooling-status
/// placement is unmerged again and replaced by the sixteen fixed sub-headers
/// starting at its first column, whatever its width. Finally every row-1 cell
/// is centered with wrap enabled.
pub fn render_header_row(
    placements: &[SpecHeaderPlacement],
    options: &SpecConvertOptions,
) -> Result<SpecHeaderRow, ConvertError> {
    let mut header_row = SpecHeaderRow::from_placeholder(options.n_cols_header_placeholder);
    let fmt_header_fill = derive_fill_format(&options.color_header_fill);
    let fmt_cooling_fill = derive_fill_format(&options.color_cooling_fill);

    if options.if_style_time_header {
        header_row.write_cell(1, C_HEADER_TIME, &fmt_header_fill)?;
    }

    for placement in placements {
        apply_header_placement(&mut header_row, placement, &fmt_header_fill)?;
        if placement.if_cooling_expansion {
            expand_cooling_status(&mut header_row, placement, &fmt_cooling_fill)?;
        }
    }

    apply_wrap_text_first_row(&mut header_row);
    Ok(header_row)
}

/// Merge the placement span and write its highlighted label into the anchor.
pub fn apply_header_placement(
    header_row: &mut SpecHeaderRow,
    placement: &SpecHeaderPlacement,
    fmt_fill: &SpecCellFormat,
) -> Result<(), ConvertError> {
    if placement.width == 0 {
        return Err(ConvertError::Render(format!(
            "placement {:?} at column {} has zero width",
            placement.label, placement.col_start
        )));
    }
    header_row.merge_cells(placement.col_start, placement.col_end())?;
    header_row.write_cell(placement.col_start, &placement.label, fmt_fill)
}

/// Unmerge the placement span and write the cooling sub-headers.
///
/// Always writes sixteen cells from `col_start`; a narrower placement spills
/// into the following columns.
pub fn expand_cooling_status(
    header_row: &mut SpecHeaderRow,
    placement: &SpecHeaderPlacement,
    fmt_fill: &SpecCellFormat,
) -> Result<(), ConvertError> {
    if placement.width != TUP_COOLING_HEADERS.len() {
        debug!(
            "cooling status at column {} reserves {} column(s) but expands to {}",
            placement.col_start,
            placement.width,
            TUP_COOLING_HEADERS.len()
        );
    }

    header_row.unmerge_cells(placement.col_start, placement.col_end())?;
    for (n_offset, c_label) in TUP_COOLING_HEADERS.iter().enumerate() {
        header_row.write_cell(placement.col_start + n_offset, c_label, fmt_fill)?;
    }
    Ok(())
}

/// Center and wrap every row-1 cell up to the furthest used column.
pub fn apply_wrap_text_first_row(header_row: &mut SpecHeaderRow) {
    let fmt_wrap = derive_centered_format().with_(SpecCellFormat {
        text_wrap: Some(true),
        ..Default::default()
    });
    for n_col in 1..=header_row.n_cols_max() {
        header_row.format_cell(n_col, &fmt_wrap);
    }
}

fn derive_centered_format() -> SpecCellFormat {
    SpecCellFormat {
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    }
}

fn derive_fill_format(color: &str) -> SpecCellFormat {
    derive_centered_format().with_(SpecCellFormat {
        bg_color: Some(color.to_string()),
        ..Default::default()
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
