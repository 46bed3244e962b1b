//! Column autofit: per-cell width estimation, per-column aggregation, clamp
//! and commit into the column width store.

use std::collections::BTreeMap;

use crate::conf::{C_BOOLEAN_FALSE, C_BOOLEAN_TRUE, C_NUM_FORMAT_DATETIME_DEFAULT};
use crate::numfmt::{
    NumFormatRenderer, is_datetime_pattern, is_general_pattern, render_general_number,
};
use crate::spec::{
    EnumAutofitStatus, EnumCellContent, EnumColumnRangeInput, SpecAutofitPolicy,
    SpecAutofitReport, SpecCell, SpecCellStore, SpecColumnRange, SpecColumnWidthStore,
};
use crate::util::{derive_column_name, parse_column_range};

/// Estimate displayed width, in characters, of one cell.
///
/// Formulas and blanks never constrain the column.
pub fn estimate_width_len(cell: &SpecCell, renderer: &dyn NumFormatRenderer) -> usize {
    match &cell.content {
        EnumCellContent::Empty => 0,
        EnumCellContent::Text(text) => text.chars().count(),
        EnumCellContent::RichText(runs) => runs.iter().map(|run| run.text.chars().count()).sum(),
        EnumCellContent::Boolean(true) => C_BOOLEAN_TRUE.len(),
        EnumCellContent::Boolean(false) => C_BOOLEAN_FALSE.len(),
        EnumCellContent::Number(value) => estimate_number_width(*value, &cell.num_format, renderer),
        EnumCellContent::DateTime(serial) => {
            let c_pattern = if is_general_pattern(&cell.num_format) {
                C_NUM_FORMAT_DATETIME_DEFAULT
            } else {
                cell.num_format.as_str()
            };
            estimate_number_width(*serial, c_pattern, renderer)
        }
        EnumCellContent::Formula(_) => 0,
    }
}

fn estimate_number_width(value: f64, pattern: &str, renderer: &dyn NumFormatRenderer) -> usize {
    if is_general_pattern(pattern) {
        render_general_number(value).chars().count()
    } else if is_datetime_pattern(pattern) {
        renderer.estimate_datetime_width(pattern)
    } else {
        renderer.render_number(value, pattern).chars().count()
    }
}

/// Maximum estimated width per populated column of `range`.
///
/// Returns the per-column maxima and the number of cells inspected. Columns
/// without cells are absent from the map.
pub fn derive_column_widths(
    cells: &SpecCellStore,
    range: SpecColumnRange,
    renderer: &dyn NumFormatRenderer,
) -> (BTreeMap<usize, usize>, usize) {
    let mut dict_width_by_col: BTreeMap<usize, usize> = BTreeMap::new();
    let mut n_cnt_scanned = 0usize;

    for (n_idx_col, cell) in cells.iter_in_columns(range) {
        n_cnt_scanned += 1;
        let n_width = estimate_width_len(cell, renderer);
        let n_width_max = dict_width_by_col.entry(n_idx_col).or_insert(0);
        *n_width_max = usize::max(*n_width_max, n_width);
    }

    (dict_width_by_col, n_cnt_scanned)
}

/// Resolve the effective width ceiling.
///
/// `None` means the policy upper bound; a supplied ceiling must lie in
/// `(0, upper_bound]`.
pub fn validate_width_ceiling(
    width_max: Option<f64>,
    policy: &SpecAutofitPolicy,
) -> Result<f64, EnumAutofitStatus> {
    match width_max {
        None => Ok(policy.width_upper_bound),
        Some(n_width) if n_width > 0.0 && n_width <= policy.width_upper_bound => Ok(n_width),
        Some(_) => Err(EnumAutofitStatus::InvalidWidthCeiling),
    }
}

/// Run autofit over `range` and commit widths into `widths`.
///
/// Checks run in order: retention mode, ceiling, range. Any failure returns
/// before `widths` is touched. Columns whose widest cell estimates to 0 get
/// no entry; every other column in range is overwritten with
/// `min(max_width + padding, ceiling)`.
pub fn autofit_columns(
    cells: &SpecCellStore,
    widths: &mut SpecColumnWidthStore,
    range: &EnumColumnRangeInput,
    width_max: Option<f64>,
    policy: &SpecAutofitPolicy,
    renderer: &dyn NumFormatRenderer,
) -> Result<SpecAutofitReport, EnumAutofitStatus> {
    if !cells.if_retain_cells() {
        log::warn!("autofit skipped for {range:?}: worksheet does not retain cells");
        return Err(EnumAutofitStatus::UnsupportedInRetentionlessMode);
    }

    let n_width_ceiling = validate_width_ceiling(width_max, policy).inspect_err(|_| {
        log::warn!("autofit rejected max width {width_max:?}");
    })?;

    let Some(range_cols) = parse_column_range(range) else {
        log::warn!("autofit rejected column range {range:?}");
        return Err(EnumAutofitStatus::InvalidColumnRange);
    };

    let (dict_width_by_col, n_cnt_scanned) = derive_column_widths(cells, range_cols, renderer);

    let mut report = SpecAutofitReport {
        range: Some(range_cols),
        cnt_cells_scanned: n_cnt_scanned,
        widths_committed: Vec::with_capacity(dict_width_by_col.len()),
    };
    for (n_idx_col, n_width_raw) in dict_width_by_col {
        if n_width_raw == 0 {
            continue;
        }
        let n_width_final = f64::min(n_width_raw as f64 + policy.width_padding, n_width_ceiling);
        widths.set(n_idx_col, n_width_final);
        report.widths_committed.push((n_idx_col, n_width_final));
        log::debug!(
            "autofit column {}: raw={n_width_raw} committed={n_width_final}",
            derive_column_name(n_idx_col)
        );
    }

    Ok(report)
}
