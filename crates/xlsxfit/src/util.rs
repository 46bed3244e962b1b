//! Stateless helper utilities shared by the worksheet and writer.

use crate::conf::{
    N_COL_IDX_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumColumnRangeInput, SpecColumnRange, SpecXlsxValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnReference

/// Convert column letters (`A`, `xfd`) to a zero-based index.
///
/// Returns `None` for empty or non-alphabetic input. The result is not checked
/// against the Excel column limit.
pub fn parse_column_name(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }

    let mut n_idx_col = 0usize;
    for chr in name.chars() {
        if !chr.is_ascii_alphabetic() {
            return None;
        }
        let n_digit = (chr.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n_idx_col = n_idx_col.checked_mul(26)?.checked_add(n_digit)?;
    }

    Some(n_idx_col - 1)
}

/// Convert a zero-based column index to letters (`0` -> `A`).
pub fn derive_column_name(col: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = col + 1;
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Split an optional-`$` reference part into column letters and row digits.
fn split_reference_part(part: &str) -> Option<(&str, &str)> {
    let c_part = part.trim().trim_start_matches('$');
    let n_idx_digit = c_part
        .find(|chr: char| chr == '$' || chr.is_ascii_digit())
        .unwrap_or(c_part.len());
    let (c_letters, c_rest) = c_part.split_at(n_idx_digit);
    let c_digits = c_rest.trim_start_matches('$');
    if !c_digits.chars().all(|chr| chr.is_ascii_digit()) {
        return None;
    }
    Some((c_letters, c_digits))
}

/// Parse an `A1` reference into zero-based `(row, col)`.
pub fn parse_cell_reference(reference: &str) -> Result<(usize, usize), String> {
    let (c_letters, c_digits) = split_reference_part(reference)
        .ok_or_else(|| format!("Invalid cell reference: {reference:?}"))?;
    let n_col = parse_column_name(c_letters)
        .ok_or_else(|| format!("Invalid cell reference: {reference:?}"))?;
    let n_row_1based = c_digits
        .parse::<usize>()
        .map_err(|_| format!("Invalid cell reference: {reference:?}"))?;
    if n_row_1based == 0 {
        return Err(format!("Invalid cell reference: {reference:?}"));
    }
    validate_cell_position(n_row_1based - 1, n_col)?;
    Ok((n_row_1based - 1, n_col))
}

/// Resolve and validate a caller-supplied column range.
///
/// Returns `None` when the input is malformed, reversed, negative, or reaches
/// past the last Excel column.
pub fn parse_column_range(range: &EnumColumnRangeInput) -> Option<SpecColumnRange> {
    let (n_first, n_last) = match range {
        EnumColumnRangeInput::Numeric(first, last) => {
            if *first < 0 || *last < 0 {
                return None;
            }
            (
                usize::try_from(*first).ok()?,
                usize::try_from(*last).ok()?,
            )
        }
        EnumColumnRangeInput::Unsupported(_) => return None,
        EnumColumnRangeInput::Symbolic(text) => {
            let (c_start, c_end) = text.split_once(':').unwrap_or((text, text));
            let (c_letters_start, _) = split_reference_part(c_start)?;
            let (c_letters_end, _) = split_reference_part(c_end)?;
            (
                parse_column_name(c_letters_start)?,
                parse_column_name(c_letters_end)?,
            )
        }
    };

    if n_first > n_last || n_last > N_COL_IDX_MAX {
        return None;
    }

    Some(SpecColumnRange {
        first: n_first,
        last: n_last,
    })
}

/// Check a zero-based cell position against the Excel sheet limits.
pub fn validate_cell_position(row: usize, col: usize) -> Result<(), String> {
    if row >= N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Row index {row} exceeds Excel limit ({N_NROWS_EXCEL_MAX} rows)."
        ));
    }
    if col >= N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Column index {col} exceeds Excel limit ({N_NCOLS_EXCEL_MAX} columns)."
        ));
    }
    Ok(())
}

pub fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

pub fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, idx: usize) -> String {
    let c_sheet_name_suffix = format!("__{idx}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(range: impl Into<EnumColumnRangeInput>) -> Option<(usize, usize)> {
        parse_column_range(&range.into()).map(|r| (r.first, r.last))
    }

    #[test]
    fn test_parse_column_name_handles_multi_letter_columns() {
        assert_eq!(parse_column_name("A"), Some(0));
        assert_eq!(parse_column_name("z"), Some(25));
        assert_eq!(parse_column_name("AA"), Some(26));
        assert_eq!(parse_column_name("XFD"), Some(N_COL_IDX_MAX));
        assert_eq!(parse_column_name(""), None);
        assert_eq!(parse_column_name("A1"), None);
    }

    #[test]
    fn test_derive_column_name_inverts_parse() {
        for n_col in [0, 25, 26, 701, 702, N_COL_IDX_MAX] {
            assert_eq!(parse_column_name(&derive_column_name(n_col)), Some(n_col));
        }
        assert_eq!(derive_column_name(27), "AB");
    }

    #[test]
    fn test_parse_column_range_symbolic_forms() {
        assert_eq!(parse("A:A"), Some((0, 0)));
        assert_eq!(parse("A:C"), Some((0, 2)));
        assert_eq!(parse("b"), Some((1, 1)));
        assert_eq!(parse("$A:$C"), Some((0, 2)));
        assert_eq!(parse("A1:C10"), Some((0, 2)));
        assert_eq!(parse("XFD:XFD"), Some((N_COL_IDX_MAX, N_COL_IDX_MAX)));
    }

    #[test]
    fn test_parse_column_range_rejects_invalid_input() {
        assert_eq!(parse("C:A"), None);
        assert_eq!(parse("A:XFE"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("1:2"), None);
        assert_eq!(parse("A-C"), None);
        assert_eq!(parse((-1, 2)), None);
        assert_eq!(parse((3, 1)), None);
        assert_eq!(parse((1, N_NCOLS_EXCEL_MAX as i64 + 1)), None);
        assert_eq!(
            parse(EnumColumnRangeInput::Unsupported("[0, 2]".to_string())),
            None
        );
        assert_eq!(parse((0, N_COL_IDX_MAX as i64)), Some((0, N_COL_IDX_MAX)));
    }

    #[test]
    fn test_parse_cell_reference() {
        assert_eq!(parse_cell_reference("A1"), Ok((0, 0)));
        assert_eq!(parse_cell_reference("$C$10"), Ok((9, 2)));
        assert!(parse_cell_reference("A0").is_err());
        assert!(parse_cell_reference("10").is_err());
        assert!(parse_cell_reference("XFE1").is_err());
    }

    #[test]
    fn test_sanitize_and_suffix_sheet_names() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        let c_name = create_sheet_identifier(&"x".repeat(40), 2);
        assert_eq!(c_name.chars().count(), N_LEN_EXCEL_SHEET_NAME_MAX);
        assert!(c_name.ends_with("__2"));
    }
}
