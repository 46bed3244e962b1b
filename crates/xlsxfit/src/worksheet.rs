//! Worksheet handle: serializes cells through `rust_xlsxwriter`, retains them
//! for autofit, and owns the column width store.

use std::collections::BTreeMap;
use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, XlsxError};

use crate::autofit::autofit_columns;
use crate::conf::{
    C_NUM_FORMAT_DATETIME_DEFAULT, N_WIDTH_COLUMN_MAX, derive_default_autofit_policy,
    derive_default_value_policy, derive_default_xlsx_formats,
};
use crate::numfmt::{ExcelPatternRenderer, NumFormatRenderer};
use crate::spec::{
    EnumAutofitStatus, EnumCellContent, EnumColumnRangeInput, SpecAutofitPolicy,
    SpecAutofitReport, SpecCell, SpecCellFormat, SpecCellStore, SpecColumnWidthStore,
    SpecTextRun, SpecXlsxValuePolicy,
};
use crate::util::{
    cast_col_num, cast_row_num, convert_nan_inf_to_str, parse_cell_reference,
    validate_cell_position,
};

/// One worksheet of an [`crate::XlsxWriter`].
///
/// Constant memory mode only stops the autofit cell store from retaining
/// cells; autofit then reports
/// [`EnumAutofitStatus::UnsupportedInRetentionlessMode`]. The underlying
/// `rust_xlsxwriter` sheet still buffers its cells until the workbook is saved.
pub struct Worksheet {
    name: String,
    inner: rust_xlsxwriter::Worksheet,
    cells: SpecCellStore,
    widths: SpecColumnWidthStore,
    dict_formats: BTreeMap<String, SpecCellFormat>,
    policy_autofit: SpecAutofitPolicy,
    value_policy: SpecXlsxValuePolicy,
    if_sealed: bool,
}

impl Worksheet {
    /// Worksheet that retains written cells.
    pub fn new(name: &str) -> Result<Self, String> {
        Self::with_cell_store(name, SpecCellStore::new())
    }

    /// Worksheet whose cells are not retained for autofit.
    ///
    /// This is a retention flag: the serialized sheet is still built in memory.
    pub fn new_with_constant_memory(name: &str) -> Result<Self, String> {
        Self::with_cell_store(name, SpecCellStore::new_retentionless())
    }

    fn with_cell_store(name: &str, cells: SpecCellStore) -> Result<Self, String> {
        let mut inner = rust_xlsxwriter::Worksheet::new();
        inner.set_name(name).map_err(derive_xlsx_error_text)?;
        Ok(Self {
            name: name.to_string(),
            inner,
            cells,
            widths: SpecColumnWidthStore::new(),
            dict_formats: derive_default_xlsx_formats(),
            policy_autofit: derive_default_autofit_policy(),
            value_policy: derive_default_value_policy(),
            if_sealed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn if_constant_memory(&self) -> bool {
        !self.cells.if_retain_cells()
    }

    /// Retained cells (always empty in constant memory mode).
    pub fn cells(&self) -> &SpecCellStore {
        &self.cells
    }

    pub fn set_autofit_policy(&mut self, policy: SpecAutofitPolicy) {
        self.policy_autofit = policy;
    }

    pub fn set_value_policy(&mut self, value_policy: SpecXlsxValuePolicy) {
        self.value_policy = value_policy;
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region CellWrites

    /// Write any content; text starting with `=` is written as a formula.
    pub fn write(
        &mut self,
        row: usize,
        col: usize,
        content: EnumCellContent,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        match content {
            EnumCellContent::Text(text) if text.starts_with('=') => {
                self.write_formula(row, col, &text, format)
            }
            EnumCellContent::Number(value) => self.write_number(row, col, value, format),
            EnumCellContent::DateTime(serial) => self.write_datetime(row, col, serial, format),
            content => self.write_cell(row, col, content, self.derive_format_spec(format)),
        }
    }

    /// Write any content at an `A1`-style reference.
    pub fn write_at(
        &mut self,
        reference: &str,
        content: EnumCellContent,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        let (n_row, n_col) = parse_cell_reference(reference)?;
        self.write(n_row, n_col, content, format)
    }

    pub fn write_string(
        &mut self,
        row: usize,
        col: usize,
        text: &str,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        self.write_cell(
            row,
            col,
            EnumCellContent::Text(text.to_string()),
            self.derive_format_spec(format),
        )
    }

    /// Write a number; NaN and infinities are written as policy text.
    pub fn write_number(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        let content = if value.is_finite() {
            EnumCellContent::Number(value)
        } else {
            let c_text = convert_nan_inf_to_str(value, &self.value_policy)?;
            log::warn!("non-finite number at ({row}, {col}) written as text {c_text:?}");
            EnumCellContent::Text(c_text)
        };
        self.write_cell(row, col, content, self.derive_format_spec(format))
    }

    pub fn write_boolean(
        &mut self,
        row: usize,
        col: usize,
        value: bool,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        self.write_cell(
            row,
            col,
            EnumCellContent::Boolean(value),
            self.derive_format_spec(format),
        )
    }

    /// Write an Excel serial date/time.
    ///
    /// A format without a number format gets the default date/time pattern.
    pub fn write_datetime(
        &mut self,
        row: usize,
        col: usize,
        serial: f64,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        if !serial.is_finite() || serial < 0.0 {
            return Err(format!("Invalid date/time serial: {serial}"));
        }
        let fmt_spec = match format {
            Some(fmt) if fmt.num_format.is_some() => fmt.clone(),
            Some(fmt) => self.derive_preset("datetime").merge(fmt).with_(
                SpecCellFormat::from_num_format(C_NUM_FORMAT_DATETIME_DEFAULT),
            ),
            None => self.derive_preset("datetime"),
        };
        self.write_cell(row, col, EnumCellContent::DateTime(serial), fmt_spec)
    }

    /// Write a formula. Its result is unknown here, so it never drives autofit.
    pub fn write_formula(
        &mut self,
        row: usize,
        col: usize,
        formula: &str,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        self.write_cell(
            row,
            col,
            EnumCellContent::Formula(formula.to_string()),
            self.derive_format_spec(format),
        )
    }

    pub fn write_blank(
        &mut self,
        row: usize,
        col: usize,
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        self.write_cell(row, col, EnumCellContent::Empty, self.derive_format_spec(format))
    }

    /// Write a multi-run string. Runs without a format use the cell format.
    pub fn write_rich_text(
        &mut self,
        row: usize,
        col: usize,
        runs: &[SpecTextRun],
        format: Option<&SpecCellFormat>,
    ) -> Result<(), String> {
        self.write_cell(
            row,
            col,
            EnumCellContent::RichText(runs.to_vec()),
            self.derive_format_spec(format),
        )
    }

    fn write_cell(
        &mut self,
        row: usize,
        col: usize,
        content: EnumCellContent,
        fmt_spec: SpecCellFormat,
    ) -> Result<(), String> {
        if self.if_sealed {
            return Err("Cannot write after close().".to_string());
        }
        validate_cell_position(row, col)?;
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(col)?;
        let format = derive_rust_xlsx_format(&fmt_spec);

        match &content {
            EnumCellContent::Empty => {
                self.inner
                    .write_blank(n_row, n_col, &format)
                    .map_err(derive_xlsx_error_text)?;
            }
            EnumCellContent::Text(text) => {
                self.inner
                    .write_string_with_format(n_row, n_col, text, &format)
                    .map_err(derive_xlsx_error_text)?;
            }
            EnumCellContent::RichText(runs) => {
                let l_fmt_runs: Vec<(Format, &str)> = runs
                    .iter()
                    .filter(|run| !run.text.is_empty())
                    .map(|run| {
                        let fmt_run = run.format.as_ref().unwrap_or(&fmt_spec);
                        (derive_rust_xlsx_format(fmt_run), run.text.as_str())
                    })
                    .collect();
                if l_fmt_runs.is_empty() {
                    self.inner
                        .write_blank(n_row, n_col, &format)
                        .map_err(derive_xlsx_error_text)?;
                } else {
                    let l_segments: Vec<(&Format, &str)> = l_fmt_runs
                        .iter()
                        .map(|(fmt_run, text)| (fmt_run, *text))
                        .collect();
                    self.inner
                        .write_rich_string_with_format(n_row, n_col, &l_segments, &format)
                        .map_err(derive_xlsx_error_text)?;
                }
            }
            EnumCellContent::Number(value) | EnumCellContent::DateTime(value) => {
                self.inner
                    .write_number_with_format(n_row, n_col, *value, &format)
                    .map_err(derive_xlsx_error_text)?;
            }
            EnumCellContent::Boolean(value) => {
                self.inner
                    .write_boolean_with_format(n_row, n_col, *value, &format)
                    .map_err(derive_xlsx_error_text)?;
            }
            EnumCellContent::Formula(formula) => {
                self.inner
                    .write_formula_with_format(n_row, n_col, formula.as_str(), &format)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        self.cells.insert(
            row,
            col,
            SpecCell::with_num_format(content, fmt_spec.num_format_or_general()),
        );
        Ok(())
    }

    fn derive_preset(&self, name: &str) -> SpecCellFormat {
        self.dict_formats.get(name).cloned().unwrap_or_default()
    }

    /// Caller format layered over the `text` preset.
    fn derive_format_spec(&self, format: Option<&SpecCellFormat>) -> SpecCellFormat {
        let fmt_base = self.derive_preset("text");
        match format {
            Some(fmt) => fmt_base.merge(fmt),
            None => fmt_base,
        }
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region DataFrameWrites

    /// Write a header row of column names at `(row, col)`, then every value.
    ///
    /// Nulls are skipped; booleans and numerics keep their type, everything
    /// else is written as its display text.
    pub fn write_dataframe(
        &mut self,
        df: &DataFrame,
        row: usize,
        col: usize,
    ) -> Result<(), String> {
        let fmt_header = self.derive_preset("header");
        for (n_idx_col, c_colname) in df.get_column_names_str().into_iter().enumerate() {
            self.write_cell(
                row,
                col + n_idx_col,
                EnumCellContent::Text(c_colname.to_string()),
                fmt_header.clone(),
            )?;
        }

        for (n_idx_col, column) in df.get_columns().iter().enumerate() {
            for n_idx_row in 0..df.height() {
                let value = column
                    .get(n_idx_row)
                    .map_err(|err| format!("Failed to access cell value: {err}"))?;
                let Some(content) = derive_cell_content_from_any_value(value) else {
                    continue;
                };
                self.write(row + 1 + n_idx_row, col + n_idx_col, content, None)?;
            }
        }

        log::debug!(
            "sheet {:?}: wrote dataframe {}x{} at ({row}, {col})",
            self.name,
            df.height(),
            df.width()
        );
        Ok(())
    }

    /// Write a DataFrame from a Polars IPC payload.
    pub fn write_dataframe_from_ipc_bytes(
        &mut self,
        v_ipc_df: &[u8],
        row: usize,
        col: usize,
    ) -> Result<(), String> {
        let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
        self.write_dataframe(&df, row, col)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region ColumnWidths

    /// Set a column width explicitly, replacing any autofit result.
    pub fn set_column_width(&mut self, col: usize, width: f64) -> Result<(), String> {
        validate_cell_position(0, col)?;
        if !width.is_finite() || !(0.0..=N_WIDTH_COLUMN_MAX).contains(&width) {
            return Err(format!(
                "Column width must be within [0, {N_WIDTH_COLUMN_MAX}], got {width}."
            ));
        }
        self.widths.set(col, width);
        Ok(())
    }

    /// Width of `col`, `0` when never set.
    pub fn column_width(&self, col: usize) -> f64 {
        self.widths.width(col)
    }

    pub fn col_widths(&self) -> &SpecColumnWidthStore {
        &self.widths
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Autofit

    /// Autofit columns of `range`, returning the status code (`0` on success).
    pub fn autofit_columns(
        &mut self,
        range: impl Into<EnumColumnRangeInput>,
        width_max: Option<f64>,
    ) -> i32 {
        match self.try_autofit_columns(range, width_max) {
            Ok(_) => EnumAutofitStatus::Success.code(),
            Err(status) => status.code(),
        }
    }

    pub fn try_autofit_columns(
        &mut self,
        range: impl Into<EnumColumnRangeInput>,
        width_max: Option<f64>,
    ) -> Result<SpecAutofitReport, EnumAutofitStatus> {
        self.autofit_columns_with_renderer(range, width_max, &ExcelPatternRenderer)
    }

    /// Autofit with a caller-supplied number-format renderer.
    pub fn autofit_columns_with_renderer(
        &mut self,
        range: impl Into<EnumColumnRangeInput>,
        width_max: Option<f64>,
        renderer: &dyn NumFormatRenderer,
    ) -> Result<SpecAutofitReport, EnumAutofitStatus> {
        autofit_columns(
            &self.cells,
            &mut self.widths,
            &range.into(),
            width_max,
            &self.policy_autofit,
            renderer,
        )
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////

    pub(crate) fn if_sealed(&self) -> bool {
        self.if_sealed
    }

    /// Apply stored widths and hand the serialized sheet over.
    ///
    /// The handle keeps its stores readable but rejects further writes.
    pub(crate) fn seal(&mut self) -> Result<rust_xlsxwriter::Worksheet, String> {
        if self.if_sealed {
            return Err(format!("Worksheet {:?} is already closed.", self.name));
        }
        for (n_idx_col, n_width) in self.widths.iter() {
            self.inner
                .set_column_width(cast_col_num(n_idx_col)?, n_width)
                .map_err(derive_xlsx_error_text)?;
        }
        self.if_sealed = true;
        Ok(std::mem::replace(
            &mut self.inner,
            rust_xlsxwriter::Worksheet::new(),
        ))
    }
}

fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, String> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| format!("Failed to read IPC DataFrame bytes: {err}"))
}

fn derive_cell_content_from_any_value(value: AnyValue<'_>) -> Option<EnumCellContent> {
    let content = match value {
        AnyValue::Null => return None,
        AnyValue::String(val) => EnumCellContent::Text(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellContent::Text(val.to_string()),
        AnyValue::Boolean(val) => EnumCellContent::Boolean(val),
        AnyValue::UInt8(val) => EnumCellContent::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellContent::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellContent::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellContent::Number(val as f64),
        AnyValue::Int8(val) => EnumCellContent::Number(val as f64),
        AnyValue::Int16(val) => EnumCellContent::Number(val as f64),
        AnyValue::Int32(val) => EnumCellContent::Number(val as f64),
        AnyValue::Int64(val) => EnumCellContent::Number(val as f64),
        AnyValue::Int128(val) => EnumCellContent::Number(val as f64),
        AnyValue::Float32(val) => EnumCellContent::Number(val as f64),
        AnyValue::Float64(val) => EnumCellContent::Number(val),
        _ => EnumCellContent::Text(value.to_string()),
    };
    Some(content)
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
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

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
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
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

pub(crate) fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use polars::df;
    use polars::prelude::{IpcWriter, SerWriter};
    use pretty_assertions::assert_eq;

    use super::*;

    fn new_sheet() -> Worksheet {
        Worksheet::new("Sheet1").expect("valid sheet name")
    }

    fn fmt(num_format: &str) -> SpecCellFormat {
        SpecCellFormat::from_num_format(num_format)
    }

    #[test]
    fn test_constant_memory_sheet_rejects_autofit() {
        let mut sheet = Worksheet::new_with_constant_memory("Sheet1").expect("valid sheet name");
        sheet
            .write_string(0, 0, "some text", None)
            .expect("write succeeds");

        assert!(sheet.if_constant_memory());
        assert!(sheet.cells().is_empty());
        assert_eq!(sheet.autofit_columns("A:A", None), -1);
        assert!(sheet.col_widths().is_empty());
    }

    #[test]
    fn test_width_ceiling_bounds() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "100", None).expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:A", Some(0.0)), -2);
        assert_eq!(sheet.autofit_columns("A:A", Some(250.1)), -2);
        assert_eq!(sheet.autofit_columns("A:A", Some(-1.0)), -2);
        assert!(sheet.col_widths().is_empty());
        assert_eq!(sheet.autofit_columns("A:A", Some(250.0)), 0);
    }

    #[test]
    fn test_column_range_bounds() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "100", None).expect("write succeeds");

        assert_eq!(sheet.autofit_columns((1, 16_385), None), -3);
        assert_eq!(sheet.autofit_columns("C:A", None), -3);
        assert_eq!(sheet.autofit_columns("not a range", None), -3);
        assert_eq!(sheet.autofit_columns((0, 16_383), None), 0);
    }

    #[test]
    fn test_autofit_string_and_general_numbers() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "100", None).expect("write succeeds");
        sheet.write_number(0, 1, 1000.0, None).expect("write succeeds");
        sheet.write_number(0, 2, 1e12, None).expect("write succeeds");
        sheet
            .write_number(0, 3, 1.234567e12, None)
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:D", None), 0);
        assert_eq!(sheet.column_width(0), 3.17);
        assert_eq!(sheet.column_width(1), 4.17);
        assert_eq!(sheet.column_width(2), 5.17);
        assert_eq!(sheet.column_width(3), 11.17);
    }

    #[test]
    fn test_autofit_booleans() {
        let mut sheet = new_sheet();
        sheet.write_boolean(0, 0, true, None).expect("write succeeds");
        sheet.write_boolean(0, 1, false, None).expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:B", None), 0);
        assert_eq!(sheet.column_width(0), 4.17);
        assert_eq!(sheet.column_width(1), 5.17);
    }

    #[test]
    fn test_autofit_multicolumn_skips_empty_column() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "hello", None).expect("write succeeds");
        sheet.write_boolean(1, 1, true, None).expect("write succeeds");

        let report = sheet
            .try_autofit_columns("A:C", None)
            .expect("autofit succeeds");

        assert_eq!(report.widths_committed, vec![(0, 5.17), (1, 4.17)]);
        assert!(!sheet.col_widths().contains(2));
        assert_eq!(sheet.column_width(2), 0.0);
    }

    #[test]
    fn test_autofit_datetime_pattern() {
        let mut sheet = new_sheet();
        sheet
            .write_datetime(0, 0, 45_000.5, Some(&fmt("mmm d yyyy hh:mm AM/PM")))
            .expect("write succeeds");
        sheet.write_datetime(0, 1, 45_000.5, None).expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:B", None), 0);
        assert_eq!(sheet.column_width(0), 22.17);
        assert_eq!(sheet.column_width(1), 19.17);
        assert_eq!(
            sheet.cells().get(0, 1).map(|cell| cell.num_format.as_str()),
            Some(C_NUM_FORMAT_DATETIME_DEFAULT)
        );
    }

    #[test]
    fn test_autofit_formula_leaves_no_entry() {
        let mut sheet = new_sheet();
        sheet
            .write(0, 0, EnumCellContent::Text("=1+2".to_string()), None)
            .expect("write succeeds");

        assert!(matches!(
            sheet.cells().get(0, 0).map(|cell| &cell.content),
            Some(EnumCellContent::Formula(_))
        ));
        assert_eq!(sheet.autofit_columns("A:A", None), 0);
        assert!(sheet.col_widths().is_empty());
    }

    #[test]
    fn test_autofit_clamps_long_text_to_ceiling() {
        let mut sheet = new_sheet();
        sheet
            .write_string(0, 0, &"x".repeat(300), None)
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:A", Some(100.0)), 0);
        assert_eq!(sheet.column_width(0), 100.0);
        assert_eq!(sheet.autofit_columns("A:A", None), 0);
        assert_eq!(sheet.column_width(0), 250.0);
    }

    #[test]
    fn test_autofit_custom_number_format() {
        let mut sheet = new_sheet();
        sheet
            .write_number(0, 0, 1234.5, Some(&fmt("#,##0.00")))
            .expect("write succeeds");
        sheet
            .write_number(0, 1, 0.25, Some(&fmt("0%")))
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:B", None), 0);
        assert_eq!(sheet.column_width(0), 8.17);
        assert_eq!(sheet.column_width(1), 3.17);
    }

    #[test]
    fn test_autofit_text_format_and_numeric_datetime_format() {
        let mut sheet = new_sheet();
        sheet
            .write_number(0, 0, 123_456.0, Some(&fmt("@")))
            .expect("write succeeds");
        sheet
            .write_datetime(0, 1, 45_000.0, Some(&fmt("#,##0")))
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:B", None), 0);
        assert_eq!(sheet.column_width(0), 6.17);
        assert_eq!(sheet.column_width(1), 6.17);
    }

    #[test]
    fn test_sheet_autofit_policy_overrides_padding_and_upper_bound() {
        let mut sheet = new_sheet();
        sheet.set_autofit_policy(SpecAutofitPolicy {
            width_padding: 1.0,
            width_upper_bound: 50.0,
        });
        sheet.write_string(0, 0, "abc", None).expect("write succeeds");
        sheet
            .write_string(0, 1, &"x".repeat(80), None)
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:B", Some(60.0)), -2);
        assert!(sheet.col_widths().is_empty());
        assert_eq!(sheet.autofit_columns("A:B", None), 0);
        assert_eq!(sheet.column_width(0), 4.0);
        assert_eq!(sheet.column_width(1), 50.0);
    }

    #[test]
    fn test_sheet_value_policy_sets_non_finite_text() {
        let mut sheet = new_sheet();
        sheet.set_value_policy(SpecXlsxValuePolicy {
            nan_str: "not a number".to_string(),
            ..Default::default()
        });
        sheet.write_number(0, 0, f64::NAN, None).expect("write succeeds");
        sheet
            .write_number(1, 0, f64::INFINITY, None)
            .expect("write succeeds");

        assert_eq!(
            sheet.cells().get(0, 0).map(|cell| &cell.content),
            Some(&EnumCellContent::Text("not a number".to_string()))
        );
        assert_eq!(
            sheet.cells().get(1, 0).map(|cell| &cell.content),
            Some(&EnumCellContent::Text("Inf".to_string()))
        );
        assert_eq!(sheet.autofit_columns("A:A", None), 0);
        assert_eq!(sheet.column_width(0), 12.17);
    }

    #[test]
    fn test_write_format_is_layered_over_text_preset() {
        let sheet = new_sheet();

        let fmt_default = sheet.derive_format_spec(None);
        let fmt_custom = sheet.derive_format_spec(Some(&SpecCellFormat {
            font_size: Some(14),
            num_format: Some("0.00".to_string()),
            ..Default::default()
        }));

        assert_eq!(fmt_default.font_name.as_deref(), Some("Calibri"));
        assert_eq!(fmt_default.num_format_or_general(), "General");
        assert_eq!(fmt_custom.font_name.as_deref(), Some("Calibri"));
        assert_eq!(fmt_custom.font_size, Some(14));
        assert_eq!(fmt_custom.num_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_autofit_is_idempotent_and_overrides_manual_width() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "abc", None).expect("write succeeds");
        sheet.set_column_width(0, 40.0).expect("valid width");

        assert_eq!(sheet.autofit_columns("A", None), 0);
        let widths_first = sheet.col_widths().clone();
        assert_eq!(sheet.autofit_columns("A", None), 0);

        assert_eq!(sheet.column_width(0), 3.17);
        assert_eq!(sheet.col_widths(), &widths_first);
    }

    #[test]
    fn test_rich_text_counts_all_runs() {
        let mut sheet = new_sheet();
        let fmt_bold = SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        };
        sheet
            .write_rich_text(
                0,
                0,
                &[
                    SpecTextRun {
                        text: "bold".to_string(),
                        format: Some(fmt_bold),
                    },
                    SpecTextRun::plain(" and plain"),
                ],
                None,
            )
            .expect("write succeeds");

        assert_eq!(sheet.autofit_columns("A:A", None), 0);
        assert_eq!(sheet.column_width(0), 14.17);
    }

    #[test]
    fn test_non_finite_numbers_are_written_as_text() {
        let mut sheet = new_sheet();
        sheet.write_number(0, 0, f64::NAN, None).expect("write succeeds");
        sheet
            .write_number(1, 0, f64::NEG_INFINITY, None)
            .expect("write succeeds");

        assert_eq!(
            sheet.cells().get(1, 0).map(|cell| &cell.content),
            Some(&EnumCellContent::Text("-Inf".to_string()))
        );
        assert_eq!(sheet.autofit_columns("A:A", None), 0);
        assert_eq!(sheet.column_width(0), 4.17);
    }

    #[test]
    fn test_write_rejects_out_of_bounds_positions() {
        let mut sheet = new_sheet();

        assert!(sheet.write_string(1_048_576, 0, "x", None).is_err());
        assert!(sheet.write_string(0, 16_384, "x", None).is_err());
        assert!(sheet.write_datetime(0, 0, -1.0, None).is_err());
        assert!(sheet.set_column_width(0, 300.0).is_err());
        assert!(sheet.set_column_width(16_384, 10.0).is_err());
        assert!(sheet.cells().is_empty());
    }

    #[test]
    fn test_write_at_resolves_reference() {
        let mut sheet = new_sheet();
        sheet
            .write_at("C5", EnumCellContent::Number(42.0), None)
            .expect("write succeeds");

        assert_eq!(
            sheet.cells().get(4, 2).map(|cell| &cell.content),
            Some(&EnumCellContent::Number(42.0))
        );
        assert!(sheet.write_at("5C", EnumCellContent::Empty, None).is_err());
    }

    #[test]
    fn test_write_dataframe_then_autofit() {
        let df = df!(
            "name" => ["a", "longer name"],
            "value" => [1.5, 1000.0],
            "flag" => [true, false],
        )
        .expect("valid dataframe");
        let mut sheet = new_sheet();
        sheet.write_dataframe(&df, 0, 0).expect("write succeeds");

        assert_eq!(sheet.cells().len(), 9);
        assert_eq!(sheet.autofit_columns("A:C", None), 0);
        assert_eq!(sheet.column_width(0), 11.17);
        assert_eq!(sheet.column_width(1), 5.17);
        assert_eq!(sheet.column_width(2), 5.17);
    }

    #[test]
    fn test_write_dataframe_from_ipc_bytes() {
        let mut df = df!("amount" => [12_345.0, -7.25]).expect("valid dataframe");
        let mut v_ipc_df = Vec::new();
        IpcWriter::new(&mut v_ipc_df)
            .finish(&mut df)
            .expect("ipc serialization succeeds");

        let mut sheet = new_sheet();
        sheet
            .write_dataframe_from_ipc_bytes(&v_ipc_df, 2, 1)
            .expect("write succeeds");

        assert_eq!(
            sheet.cells().get(3, 1).map(|cell| &cell.content),
            Some(&EnumCellContent::Number(12_345.0))
        );
        assert!(sheet.write_dataframe_from_ipc_bytes(b"not ipc", 0, 0).is_err());
    }

    #[test]
    fn test_seal_rejects_later_writes() {
        let mut sheet = new_sheet();
        sheet.write_string(0, 0, "abc", None).expect("write succeeds");
        sheet.autofit_columns("A:A", None);

        sheet.seal().expect("seal succeeds");

        assert!(sheet.write_string(1, 0, "late", None).is_err());
        assert!(sheet.seal().is_err());
        assert_eq!(sheet.column_width(0), 3.17);
    }
}
