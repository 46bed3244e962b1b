//! `xlsxfit` v1:
//! XLSX worksheet writer with content-driven column autofit.
//!
//! Module layout:
//! - `conf`      : constants and default presets
//! - `spec`      : specs/models/status codes
//! - `util`      : pure helper functions (references, ranges, sheet names)
//! - `numfmt`    : number-format rendering used for width estimation
//! - `autofit`   : width estimation, per-column aggregation, clamp/commit
//! - `worksheet` : cell writes, retained cells, column widths
//! - `writer`    : workbook writer kernel
pub mod autofit;
pub mod conf;
pub mod numfmt;
pub mod spec;
pub mod util;
pub mod worksheet;
pub mod writer;

pub use autofit::{
    autofit_columns, derive_column_widths, estimate_width_len, validate_width_ceiling,
};
pub use conf::{
    N_COL_IDX_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_AUTOFIT_PADDING, N_WIDTH_AUTOFIT_UPPER_BOUND, TUP_EXCEL_ILLEGAL,
};
pub use numfmt::{ExcelPatternRenderer, NumFormatRenderer};
pub use spec::{
    EnumAutofitStatus, EnumCellContent, EnumColumnRangeInput, SpecAutofitPolicy,
    SpecAutofitReport, SpecCell, SpecCellFormat, SpecCellStore, SpecColumnRange,
    SpecColumnWidthStore, SpecTextRun, SpecXlsxValuePolicy,
};
pub use util::{
    convert_nan_inf_to_str, derive_column_name, parse_cell_reference, parse_column_name,
    parse_column_range, sanitize_sheet_name,
};
pub use worksheet::Worksheet;
pub use writer::XlsxWriter;
