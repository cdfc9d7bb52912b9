//! Header planner: parameter records to contiguous header placements.

use log::debug;

use crate::conf::{C_LABEL_COOLING_STATUS, N_COL_HEADER_START};
use crate::spec::{SpecHeaderPlacement, SpecParameterTable};
use crate::util::derive_header_width;

/// Plan row-1 header placements from parameter records.
///
/// One left-to-right sweep with a single column cursor starting at column 2.
/// Records with a blank first field or an unknown code letter are skipped and
/// leave the cursor unchanged. Placements are contiguous and never overlap.
pub fn plan_header_placements(table: &SpecParameterTable) -> Vec<SpecHeaderPlacement> {
    let mut l_placements = Vec::new();
    let mut n_col_next_start = N_COL_HEADER_START;

    for record in &table.records {
        let Some(code_letter) = record.code_letter.as_deref() else {
            continue;
        };

        let n_width = match derive_header_width(code_letter, record.n_line) {
            Ok(n_width) => n_width,
            Err(err) => {
                debug!("skipping non-channel parameter line: {err}");
                continue;
            }
        };

        l_placements.push(SpecHeaderPlacement {
            col_start: n_col_next_start,
            width: n_width,
            label: record.label.clone(),
            if_cooling_expansion: record.label.to_lowercase() == C_LABEL_COOLING_STATUS,
        });
        n_col_next_start += n_width;
    }

    l_placements
}

/// Furthest column reserved by `placements` (1 when there are none).
pub fn calculate_header_span_end(placements: &[SpecHeaderPlacement]) -> usize {
    placements
        .last()
        .map_or(N_COL_HEADER_START - 1, SpecHeaderPlacement::col_end)
}
