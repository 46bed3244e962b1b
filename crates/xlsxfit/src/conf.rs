//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecAutofitPolicy, SpecCellFormat, SpecXlsxValuePolicy};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Largest zero-based column index (`XFD`).
pub const N_COL_IDX_MAX: usize = N_NCOLS_EXCEL_MAX - 1;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Approximate cell inner margin added to every autofit width.
pub const N_WIDTH_AUTOFIT_PADDING: f64 = 0.17;
/// Absolute upper bound for an autofit width, in character units.
pub const N_WIDTH_AUTOFIT_UPPER_BOUND: f64 = 250.0;

/// Largest column width Excel accepts, in character units.
pub const N_WIDTH_COLUMN_MAX: f64 = 255.0;

/// Characters available to the General number format in a standard column.
pub const N_LEN_GENERAL_NUMBER_MAX: usize = 11;

/// Number format code for unformatted cells.
pub const C_NUM_FORMAT_GENERAL: &str = "General";
/// Number format applied to date/time cells written without a format.
pub const C_NUM_FORMAT_DATETIME_DEFAULT: &str = "yyyy-mm-dd hh:mm:ss";

/// Canonical literal text of a boolean `TRUE`.
pub const C_BOOLEAN_TRUE: &str = "TRUE";
/// Canonical literal text of a boolean `FALSE`.
pub const C_BOOLEAN_FALSE: &str = "FALSE";

/// Build default named format presets.
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "header".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "datetime".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_DATETIME_DEFAULT.to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Build default autofit policy.
pub fn derive_default_autofit_policy() -> SpecAutofitPolicy {
    SpecAutofitPolicy::default()
}

/// Build default value policy.
pub fn derive_default_value_policy() -> SpecXlsxValuePolicy {
    SpecXlsxValuePolicy::default()
}
