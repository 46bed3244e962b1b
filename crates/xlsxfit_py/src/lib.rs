use std::path::PathBuf;

use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyString, PyTuple};
use xlsxfit::spec::{EnumAutofitStatus, EnumCellContent, EnumColumnRangeInput, SpecTextRun};
use xlsxfit::util::parse_cell_reference;
use xlsxfit::{SpecCellFormat, Worksheet, XlsxWriter as RsXlsxWriter};

const C_BRIDGE_CONTRACT_VERSION: &str = "xlsxfit.writer.v1";

#[pyclass(name = "XlsxWriter")]
struct PyXlsxWriter {
    #[pyo3(get)]
    file_out: String,
    inner: RsXlsxWriter,
}

#[pymethods]
impl PyXlsxWriter {
    #[new]
    fn new(file_out: String) -> Self {
        let inner = RsXlsxWriter::new(PathBuf::from(&file_out));
        Self { file_out, inner }
    }

    fn __enter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc=None, _tb=None))]
    fn __exit__(
        &mut self,
        _exc_type: Option<&Bound<'_, PyAny>>,
        _exc: Option<&Bound<'_, PyAny>>,
        _tb: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        self.close()
    }

    fn close(&mut self) -> PyResult<()> {
        self.inner.close().map_err(PyRuntimeError::new_err)
    }

    /// Add a worksheet and return its index.
    #[pyo3(signature = (name = None, constant_memory = false))]
    fn add_worksheet(&mut self, name: Option<&str>, constant_memory: bool) -> PyResult<usize> {
        let result = if constant_memory {
            self.inner.add_worksheet_with_constant_memory(name)
        } else {
            self.inner.add_worksheet(name)
        };
        result.map_err(PyValueError::new_err)
    }

    fn sheet_name(&self, sheet: usize) -> PyResult<String> {
        let worksheet = self
            .inner
            .worksheet(sheet)
            .ok_or_else(|| derive_sheet_index_error(sheet))?;
        Ok(worksheet.name().to_string())
    }

    /// Write a Python value; `str` starting with `=` is a formula, `None` a blank.
    #[pyo3(signature = (sheet, cell, value, fmt = None, num_format = None))]
    fn write(
        &mut self,
        sheet: usize,
        cell: &Bound<'_, PyAny>,
        value: &Bound<'_, PyAny>,
        fmt: Option<&Bound<'_, PyAny>>,
        num_format: Option<String>,
    ) -> PyResult<()> {
        let (n_row, n_col) = parse_cell_arg(cell)?;
        let content = derive_cell_content_from_py(value)?;
        let cfg_fmt = derive_cell_format(fmt, num_format)?;
        self.derive_worksheet_mut(sheet)?
            .write(n_row, n_col, content, cfg_fmt.as_ref())
            .map_err(PyValueError::new_err)
    }

    /// Write an Excel serial date/time.
    #[pyo3(signature = (sheet, cell, serial, fmt = None, num_format = None))]
    fn write_datetime(
        &mut self,
        sheet: usize,
        cell: &Bound<'_, PyAny>,
        serial: f64,
        fmt: Option<&Bound<'_, PyAny>>,
        num_format: Option<String>,
    ) -> PyResult<()> {
        let (n_row, n_col) = parse_cell_arg(cell)?;
        let cfg_fmt = derive_cell_format(fmt, num_format)?;
        self.derive_worksheet_mut(sheet)?
            .write_datetime(n_row, n_col, serial, cfg_fmt.as_ref())
            .map_err(PyValueError::new_err)
    }

    /// Write a rich string from `str` or `(str, fmt)` runs.
    #[pyo3(signature = (sheet, cell, runs, fmt = None))]
    fn write_rich_text(
        &mut self,
        sheet: usize,
        cell: &Bound<'_, PyAny>,
        runs: Vec<Bound<'_, PyAny>>,
        fmt: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        let (n_row, n_col) = parse_cell_arg(cell)?;
        let l_runs = runs
            .iter()
            .map(parse_text_run)
            .collect::<PyResult<Vec<SpecTextRun>>>()?;
        let cfg_fmt = parse_spec_cell_format(fmt)?;
        self.derive_worksheet_mut(sheet)?
            .write_rich_text(n_row, n_col, &l_runs, cfg_fmt.as_ref())
            .map_err(PyValueError::new_err)
    }

    /// Write a DataFrame serialized as Polars IPC bytes.
    #[pyo3(signature = (sheet, v_ipc_df, row = 0, col = 0))]
    fn write_dataframe_from_ipc_bytes(
        &mut self,
        sheet: usize,
        v_ipc_df: &[u8],
        row: usize,
        col: usize,
    ) -> PyResult<()> {
        self.derive_worksheet_mut(sheet)?
            .write_dataframe_from_ipc_bytes(v_ipc_df, row, col)
            .map_err(PyValueError::new_err)
    }

    fn set_column_width(&mut self, sheet: usize, col: usize, width: f64) -> PyResult<()> {
        self.derive_worksheet_mut(sheet)?
            .set_column_width(col, width)
            .map_err(PyValueError::new_err)
    }

    fn column_width(&self, sheet: usize, col: usize) -> PyResult<f64> {
        let worksheet = self
            .inner
            .worksheet(sheet)
            .ok_or_else(|| derive_sheet_index_error(sheet))?;
        Ok(worksheet.column_width(col))
    }

    /// Autofit columns; returns `0`, `-1`, `-2` or `-3` and never raises for
    /// bad `columns` or `max_width` values.
    #[pyo3(signature = (sheet, columns, max_width = None))]
    fn autofit_columns(
        &mut self,
        sheet: usize,
        columns: &Bound<'_, PyAny>,
        max_width: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<i32> {
        let range = parse_column_range_arg(columns);
        let width_max = parse_max_width_arg(max_width);
        Ok(self
            .derive_worksheet_mut(sheet)?
            .autofit_columns(range, width_max))
    }
}

impl PyXlsxWriter {
    fn derive_worksheet_mut(&mut self, sheet: usize) -> PyResult<&mut Worksheet> {
        self.inner
            .worksheet_mut(sheet)
            .ok_or_else(|| derive_sheet_index_error(sheet))
    }
}

fn derive_sheet_index_error(sheet: usize) -> PyErr {
    PyIndexError::new_err(format!("No worksheet at index {sheet}."))
}

/// Accept `"B3"` or a zero-based `(row, col)` tuple.
fn parse_cell_arg(cell: &Bound<'_, PyAny>) -> PyResult<(usize, usize)> {
    if let Ok(c_reference) = cell.extract::<String>() {
        return parse_cell_reference(&c_reference).map_err(PyValueError::new_err);
    }
    if let Ok(tup_cell) = cell.extract::<(usize, usize)>() {
        return Ok(tup_cell);
    }
    Err(PyValueError::new_err(
        "Cell must be an A1 reference or a (row, col) tuple.",
    ))
}

/// Accept `"A:C"` or an inclusive `(first, last)` tuple; anything else is
/// passed on as unsupported so the kernel reports it after its other checks.
fn parse_column_range_arg(columns: &Bound<'_, PyAny>) -> EnumColumnRangeInput {
    if let Ok(c_range) = columns.extract::<String>() {
        return EnumColumnRangeInput::Symbolic(c_range);
    }
    if let Ok((n_first, n_last)) = columns.extract::<(i64, i64)>() {
        return EnumColumnRangeInput::Numeric(n_first, n_last);
    }
    let c_repr = columns
        .repr()
        .map(|val| val.to_string())
        .unwrap_or_else(|_| "<unprintable>".to_string());
    EnumColumnRangeInput::Unsupported(c_repr)
}

/// `None` means no ceiling; a value that is not a number becomes NaN, which
/// the ceiling check rejects.
fn parse_max_width_arg(max_width: Option<&Bound<'_, PyAny>>) -> Option<f64> {
    let max_width = max_width?;
    if max_width.is_none() {
        return None;
    }
    if max_width.is_instance_of::<PyBool>() {
        return Some(f64::NAN);
    }
    Some(max_width.extract::<f64>().unwrap_or(f64::NAN))
}

fn derive_cell_content_from_py(value: &Bound<'_, PyAny>) -> PyResult<EnumCellContent> {
    if value.is_none() {
        return Ok(EnumCellContent::Empty);
    }
    if let Ok(val) = value.downcast::<PyBool>() {
        return Ok(EnumCellContent::Boolean(val.is_true()));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(EnumCellContent::Text(value.extract::<String>()?));
    }
    if let Ok(val) = value.extract::<f64>() {
        return Ok(EnumCellContent::Number(val));
    }
    Ok(EnumCellContent::Text(value.str()?.to_string()))
}

fn parse_text_run(run: &Bound<'_, PyAny>) -> PyResult<SpecTextRun> {
    if let Ok(c_text) = run.extract::<String>() {
        return Ok(SpecTextRun::plain(c_text));
    }
    let tup_run = run
        .downcast::<PyTuple>()
        .map_err(|_| PyValueError::new_err("Rich text runs must be str or (str, fmt)."))?;
    if tup_run.len() != 2 {
        return Err(PyValueError::new_err(
            "Rich text runs must be str or (str, fmt).",
        ));
    }
    Ok(SpecTextRun {
        text: tup_run.get_item(0)?.extract::<String>()?,
        format: parse_spec_cell_format(Some(&tup_run.get_item(1)?))?,
    })
}

/// Format object (if any) overlaid with an explicit `num_format`.
fn derive_cell_format(
    fmt: Option<&Bound<'_, PyAny>>,
    num_format: Option<String>,
) -> PyResult<Option<SpecCellFormat>> {
    let cfg_fmt = parse_spec_cell_format(fmt)?;
    Ok(match (cfg_fmt, num_format) {
        (Some(cfg_fmt), Some(c_num_format)) => {
            Some(cfg_fmt.with_(SpecCellFormat::from_num_format(c_num_format)))
        }
        (None, Some(c_num_format)) => Some(SpecCellFormat::from_num_format(c_num_format)),
        (cfg_fmt, None) => cfg_fmt,
    })
}

fn parse_spec_cell_format(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Option<SpecCellFormat>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    Ok(Some(SpecCellFormat {
        font_name: extract_optional_attr::<String>(obj, "font_name")?,
        font_size: extract_optional_attr::<i64>(obj, "font_size")?,
        bold: extract_optional_attr::<bool>(obj, "bold")?,
        italic: extract_optional_attr::<bool>(obj, "italic")?,
        align: extract_optional_attr::<String>(obj, "align")?,
        valign: extract_optional_attr::<String>(obj, "valign")?,
        border: extract_optional_attr::<i64>(obj, "border")?,
        text_wrap: extract_optional_attr::<bool>(obj, "text_wrap")?,
        num_format: extract_optional_attr::<String>(obj, "num_format")?,
        bg_color: extract_optional_attr::<String>(obj, "bg_color")?,
        font_color: extract_optional_attr::<String>(obj, "font_color")?,
    }))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

#[pymodule]
fn _xlsxfit_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyXlsxWriter>()?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("AUTOFIT_SUCCESS", EnumAutofitStatus::Success.code())?;
    module.add(
        "AUTOFIT_UNSUPPORTED_CONSTANT_MEMORY",
        EnumAutofitStatus::UnsupportedInRetentionlessMode.code(),
    )?;
    module.add(
        "AUTOFIT_INVALID_MAX_WIDTH",
        EnumAutofitStatus::InvalidWidthCeiling.code(),
    )?;
    module.add(
        "AUTOFIT_INVALID_COLUMN_RANGE",
        EnumAutofitStatus::InvalidColumnRange.code(),
    )?;
    Ok(())
}
