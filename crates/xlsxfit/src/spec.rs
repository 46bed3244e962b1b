//! Shared XLSX specification models.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::conf::{C_NUM_FORMAT_GENERAL, N_WIDTH_AUTOFIT_PADDING, N_WIDTH_AUTOFIT_UPPER_BOUND};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Format carrying only a number format code.
    pub fn from_num_format(num_format: impl Into<String>) -> SpecCellFormat {
        SpecCellFormat {
            num_format: Some(num_format.into()),
            ..Default::default()
        }
    }

    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    /// Number format code, `General` when unset.
    pub fn num_format_or_general(&self) -> &str {
        self.num_format.as_deref().unwrap_or(C_NUM_FORMAT_GENERAL)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellContentSpecification

/// One formatted run of a rich string.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTextRun {
    /// Run text.
    pub text: String,
    /// Run-level font format; cell format applies when `None`.
    pub format: Option<SpecCellFormat>,
}

impl SpecTextRun {
    /// Unformatted run.
    pub fn plain(text: impl Into<String>) -> SpecTextRun {
        SpecTextRun {
            text: text.into(),
            format: None,
        }
    }
}

/// Content retained for one written cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellContent {
    /// Blank cell (format only).
    Empty,
    /// Plain string.
    Text(String),
    /// Multi-run string.
    RichText(Vec<SpecTextRun>),
    /// Finite number.
    Number(f64),
    /// Boolean.
    Boolean(bool),
    /// Excel serial date/time.
    DateTime(f64),
    /// Formula source text; result is unknown.
    Formula(String),
}

/// Retained cell: content plus its number format pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell {
    /// Cell content.
    pub content: EnumCellContent,
    /// Number format code (`General` by default).
    pub num_format: String,
}

impl SpecCell {
    /// Cell with the `General` number format.
    pub fn new(content: EnumCellContent) -> SpecCell {
        SpecCell {
            content,
            num_format: C_NUM_FORMAT_GENERAL.to_string(),
        }
    }

    /// Cell with an explicit number format.
    pub fn with_num_format(content: EnumCellContent, num_format: impl Into<String>) -> SpecCell {
        SpecCell {
            content,
            num_format: num_format.into(),
        }
    }
}

/// Written cells kept queryable per column, then per row.
///
/// A store created without retention drops every insert: the worksheet
/// streams such cells straight to the serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCellStore {
    if_retain_cells: bool,
    dict_cells_by_col: BTreeMap<usize, BTreeMap<usize, SpecCell>>,
}

impl Default for SpecCellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecCellStore {
    /// Store that keeps written cells.
    pub fn new() -> Self {
        Self {
            if_retain_cells: true,
            dict_cells_by_col: BTreeMap::new(),
        }
    }

    /// Store that discards written cells.
    pub fn new_retentionless() -> Self {
        Self {
            if_retain_cells: false,
            dict_cells_by_col: BTreeMap::new(),
        }
    }

    pub fn if_retain_cells(&self) -> bool {
        self.if_retain_cells
    }

    /// Insert or replace the cell at `(row, col)`.
    pub fn insert(&mut self, row: usize, col: usize, cell: SpecCell) {
        if !self.if_retain_cells {
            return;
        }
        self.dict_cells_by_col
            .entry(col)
            .or_default()
            .insert(row, cell);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&SpecCell> {
        self.dict_cells_by_col.get(&col)?.get(&row)
    }

    /// Populated cells of columns `first..=last` as `(col, cell)`, column-major.
    pub fn iter_in_columns(
        &self,
        range: SpecColumnRange,
    ) -> impl Iterator<Item = (usize, &SpecCell)> + '_ {
        self.dict_cells_by_col
            .range(range.columns())
            .flat_map(|(col, dict_rows)| dict_rows.values().map(move |cell| (*col, cell)))
    }

    /// Number of retained cells.
    pub fn len(&self) -> usize {
        self.dict_cells_by_col.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AutofitSpecification

/// Column range as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumColumnRangeInput {
    /// Letter form: `A:C`, `A`, `$A:$C`, `A1:C10`.
    Symbolic(String),
    /// Zero-based `(first, last)`, inclusive.
    Numeric(i64, i64),
    /// Caller value of a shape that names no range; kept for logging.
    Unsupported(String),
}

impl From<&str> for EnumColumnRangeInput {
    fn from(value: &str) -> Self {
        EnumColumnRangeInput::Symbolic(value.to_string())
    }
}

impl From<String> for EnumColumnRangeInput {
    fn from(value: String) -> Self {
        EnumColumnRangeInput::Symbolic(value)
    }
}

impl From<(i64, i64)> for EnumColumnRangeInput {
    fn from(value: (i64, i64)) -> Self {
        EnumColumnRangeInput::Numeric(value.0, value.1)
    }
}

/// Validated inclusive column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecColumnRange {
    /// First column index (inclusive).
    pub first: usize,
    /// Last column index (inclusive).
    pub last: usize,
}

impl SpecColumnRange {
    /// Column indices covered, in order.
    pub fn columns(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Outcome of an autofit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumAutofitStatus {
    /// Widths committed (possibly none).
    Success,
    /// Worksheet does not retain written cells.
    UnsupportedInRetentionlessMode,
    /// Ceiling outside `(0, upper_bound]`.
    InvalidWidthCeiling,
    /// Range malformed, reversed, negative or beyond the last column.
    InvalidColumnRange,
}

impl EnumAutofitStatus {
    /// Numeric status code.
    pub fn code(&self) -> i32 {
        match self {
            EnumAutofitStatus::Success => 0,
            EnumAutofitStatus::UnsupportedInRetentionlessMode => -1,
            EnumAutofitStatus::InvalidWidthCeiling => -2,
            EnumAutofitStatus::InvalidColumnRange => -3,
        }
    }
}

impl fmt::Display for EnumAutofitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_msg = match self {
            EnumAutofitStatus::Success => "success",
            EnumAutofitStatus::UnsupportedInRetentionlessMode => {
                "autofit is unsupported in constant memory mode"
            }
            EnumAutofitStatus::InvalidWidthCeiling => "max width is out of bounds",
            EnumAutofitStatus::InvalidColumnRange => "column range is invalid",
        };
        write!(f, "{c_msg} ({})", self.code())
    }
}

/// Constants governing autofit clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecAutofitPolicy {
    /// Width added to the raw content width.
    pub width_padding: f64,
    /// Largest accepted ceiling and default clamp.
    pub width_upper_bound: f64,
}

impl Default for SpecAutofitPolicy {
    fn default() -> Self {
        Self {
            width_padding: N_WIDTH_AUTOFIT_PADDING,
            width_upper_bound: N_WIDTH_AUTOFIT_UPPER_BOUND,
        }
    }
}

/// Per-call autofit report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecAutofitReport {
    /// Range the call covered.
    pub range: Option<SpecColumnRange>,
    /// Populated cells inspected.
    pub cnt_cells_scanned: usize,
    /// Committed `(column, width)` pairs in column order.
    pub widths_committed: Vec<(usize, f64)>,
}

/// Sparse column width map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecColumnWidthStore {
    dict_widths: BTreeMap<usize, f64>,
}

impl SpecColumnWidthStore {
    /// Width reported for columns without an entry.
    pub const WIDTH_DEFAULT: f64 = 0.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Width of `col`, or [`Self::WIDTH_DEFAULT`] when absent.
    pub fn width(&self, col: usize) -> f64 {
        self.dict_widths
            .get(&col)
            .copied()
            .unwrap_or(Self::WIDTH_DEFAULT)
    }

    /// Whether `col` carries an explicit width.
    pub fn contains(&self, col: usize) -> bool {
        self.dict_widths.contains_key(&col)
    }

    /// Set the width of `col`, replacing any prior value.
    pub fn set(&mut self, col: usize, width: f64) {
        self.dict_widths.insert(col, width);
    }

    pub fn len(&self) -> usize {
        self.dict_widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict_widths.is_empty()
    }

    /// Entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.dict_widths.iter().map(|(col, width)| (*col, *width))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Replacement text for values Excel cannot store as numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_store_defaults_missing_columns_to_zero() {
        let mut store = SpecColumnWidthStore::new();
        store.set(3, 12.5);

        assert_eq!(store.width(3), 12.5);
        assert_eq!(store.width(0), 0.0);
        assert!(!store.contains(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_autofit_status_codes() {
        assert_eq!(EnumAutofitStatus::Success.code(), 0);
        assert_eq!(EnumAutofitStatus::UnsupportedInRetentionlessMode.code(), -1);
        assert_eq!(EnumAutofitStatus::InvalidWidthCeiling.code(), -2);
        assert_eq!(EnumAutofitStatus::InvalidColumnRange.code(), -3);
        assert_eq!(
            EnumAutofitStatus::InvalidColumnRange.to_string(),
            "column range is invalid (-3)"
        );
    }

    #[test]
    fn test_merge_prefers_right_side_values() {
        let fmt_base = SpecCellFormat {
            bold: Some(true),
            num_format: Some("0.00".to_string()),
            ..Default::default()
        };
        let fmt_merged = fmt_base.with_(SpecCellFormat::from_num_format("0%"));

        assert_eq!(fmt_merged.bold, Some(true));
        assert_eq!(fmt_merged.num_format_or_general(), "0%");
        assert_eq!(SpecCellFormat::default().num_format_or_general(), "General");
    }
}
