//! Number format rendering used for width estimation.
//!
//! Covers the Excel `General` rendering rule, pattern-directed rendering of
//! numeric format codes (`0.00`, `#,##0`, `0%`, `0.00E+00`, `# ?/?`, multi
//! section codes) and token widths of date/time codes. Conditions in section
//! brackets (`[>100]`) and locale-specific separators are not interpreted.

use crate::conf::N_LEN_GENERAL_NUMBER_MAX;

/// Pattern-directed rendering collaborator consumed by autofit.
pub trait NumFormatRenderer {
    /// Render a finite number with a non-general numeric format code.
    fn render_number(&self, value: f64, pattern: &str) -> String;

    /// Estimated character width of any value rendered with a date/time code.
    fn estimate_datetime_width(&self, pattern: &str) -> usize;
}

/// Built-in renderer following Excel format code rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelPatternRenderer;

impl NumFormatRenderer for ExcelPatternRenderer {
    fn render_number(&self, value: f64, pattern: &str) -> String {
        render_number_pattern(value, pattern)
    }

    fn estimate_datetime_width(&self, pattern: &str) -> usize {
        estimate_datetime_pattern_width(pattern)
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region PatternClassification

/// Whether `pattern` selects the General format.
pub fn is_general_pattern(pattern: &str) -> bool {
    let c_pattern = pattern.trim();
    c_pattern.is_empty() || c_pattern.eq_ignore_ascii_case("general")
}

/// Whether the first section of `pattern` contains date/time tokens.
pub fn is_datetime_pattern(pattern: &str) -> bool {
    let Some(c_section) = split_sections(pattern).into_iter().next() else {
        return false;
    };
    if is_general_pattern(c_section) {
        return false;
    }

    let l_chars: Vec<char> = c_section.chars().collect();
    let mut n_idx = 0;
    while n_idx < l_chars.len() {
        let chr = l_chars[n_idx];
        match chr {
            '"' => n_idx = skip_quoted(&l_chars, n_idx),
            '\\' | '_' | '*' => n_idx += 2,
            '[' => {
                let (c_inner, n_idx_next) = read_bracket(&l_chars, n_idx);
                if is_elapsed_token(&c_inner) {
                    return true;
                }
                n_idx = n_idx_next;
            }
            _ => {
                if matches!(chr.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's')
                    || match_meridiem(&l_chars, n_idx).is_some()
                {
                    return true;
                }
                n_idx += 1;
            }
        }
    }
    false
}

/// Split a format code into `;`-separated sections, ignoring quoted/escaped `;`.
pub fn split_sections(pattern: &str) -> Vec<&str> {
    let mut l_sections = Vec::new();
    let mut if_in_quotes = false;
    let mut if_escape = false;
    let mut n_idx_start = 0;

    for (n_idx, chr) in pattern.char_indices() {
        if if_escape {
            if_escape = false;
            continue;
        }
        if if_in_quotes {
            if chr == '"' {
                if_in_quotes = false;
            }
            continue;
        }
        match chr {
            '"' => if_in_quotes = true,
            '\\' => if_escape = true,
            ';' => {
                l_sections.push(&pattern[n_idx_start..n_idx]);
                n_idx_start = n_idx + 1;
            }
            _ => {}
        }
    }
    l_sections.push(&pattern[n_idx_start..]);
    l_sections
}

fn skip_quoted(chars: &[char], idx_quote: usize) -> usize {
    let mut n_idx = idx_quote + 1;
    while n_idx < chars.len() && chars[n_idx] != '"' {
        n_idx += 1;
    }
    n_idx + 1
}

/// Return bracket content and index after the closing `]`.
fn read_bracket(chars: &[char], idx_open: usize) -> (String, usize) {
    let mut c_inner = String::new();
    let mut n_idx = idx_open + 1;
    while n_idx < chars.len() && chars[n_idx] != ']' {
        c_inner.push(chars[n_idx]);
        n_idx += 1;
    }
    (c_inner, n_idx + 1)
}

fn is_elapsed_token(inner: &str) -> bool {
    let c_inner = inner.to_ascii_lowercase();
    !c_inner.is_empty()
        && (c_inner.chars().all(|chr| chr == 'h')
            || c_inner.chars().all(|chr| chr == 'm')
            || c_inner.chars().all(|chr| chr == 's'))
}

/// Length of an `AM/PM` or `A/P` token starting at `idx`.
fn match_meridiem(chars: &[char], idx: usize) -> Option<usize> {
    for c_token in ["am/pm", "a/p"] {
        let n_len = c_token.len();
        if idx + n_len > chars.len() {
            continue;
        }
        let c_candidate: String = chars[idx..idx + n_len].iter().collect();
        if c_candidate.eq_ignore_ascii_case(c_token) {
            return Some(n_len);
        }
    }
    None
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GeneralNumber

/// Render `value` the way Excel's General format shows it in a standard column.
///
/// Up to 11 characters including the sign. Fixed notation is kept when it fits
/// and shows at least as many significant digits as scientific notation;
/// otherwise scientific notation with a two-digit minimum exponent is used.
pub fn render_general_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let c_sign = if value < 0.0 { "-" } else { "" };
    let n_len_avail = N_LEN_GENERAL_NUMBER_MAX - c_sign.len();
    let n_abs = value.abs();

    let c_scientific = render_general_scientific(n_abs, n_len_avail);
    let c_body = match render_general_fixed(n_abs, n_len_avail) {
        Some(c_fixed)
            if count_significant_digits(&c_fixed) >= count_significant_digits(&c_scientific) =>
        {
            c_fixed
        }
        _ => c_scientific,
    };

    format!("{c_sign}{c_body}")
}

fn derive_decimal_exponent(n_abs: f64) -> i32 {
    let c_sci = format!("{n_abs:e}");
    c_sci
        .split_once('e')
        .and_then(|(_, c_exp)| c_exp.parse::<i32>().ok())
        .unwrap_or(0)
}

fn render_general_fixed(n_abs: f64, n_len_avail: usize) -> Option<String> {
    let n_exp = derive_decimal_exponent(n_abs);
    let n_len_int = if n_exp >= 0 { n_exp as usize + 1 } else { 1 };
    if n_len_int > n_len_avail {
        return None;
    }

    let n_decimals = n_len_avail.saturating_sub(n_len_int + 1);
    let c_fixed = trim_fraction_zeros(format!("{n_abs:.n_decimals$}"));
    if c_fixed.len() > n_len_avail || c_fixed == "0" {
        return None;
    }
    Some(c_fixed)
}

fn render_general_scientific(n_abs: f64, n_len_avail: usize) -> String {
    let n_exp = derive_decimal_exponent(n_abs);
    let n_len_exp = if n_exp.abs() >= 100 { 5 } else { 4 };
    let n_decimals = n_len_avail.saturating_sub(n_len_exp + 2);

    let c_raw = format!("{n_abs:.n_decimals$e}");
    let (c_mantissa, n_exp_rounded) = match c_raw.split_once('e') {
        Some((c_mantissa, c_exp)) => (
            c_mantissa.to_string(),
            c_exp.parse::<i32>().unwrap_or(n_exp),
        ),
        None => (c_raw.clone(), n_exp),
    };

    format!(
        "{}{}",
        trim_fraction_zeros(c_mantissa),
        format_exponent(n_exp_rounded, 2, true)
    )
}

fn format_exponent(exp: i32, n_digits_min: usize, if_sign_always: bool) -> String {
    let c_sign = if exp < 0 {
        "-"
    } else if if_sign_always {
        "+"
    } else {
        ""
    };
    format!("E{c_sign}{:0n_digits_min$}", exp.unsigned_abs())
}

fn trim_fraction_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn count_significant_digits(text: &str) -> usize {
    let c_mantissa = text.split(['E', 'e']).next().unwrap_or("");
    c_mantissa
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|chr| *chr == '0')
        .count()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NumericPattern

/// Render a finite number with a numeric format code.
///
/// Section choice: one section applies to all values (negatives get a
/// leading `-`); two sections split non-negative/negative; three or more
/// split positive/negative/zero. Sections after the first render `|value|`.
pub fn render_number_pattern(value: f64, pattern: &str) -> String {
    if is_general_pattern(pattern) {
        return render_general_number(value);
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let l_sections = split_sections(pattern);
    let (c_section, if_auto_sign) = match l_sections.len() {
        1 => (l_sections[0], true),
        2 => {
            if value < 0.0 {
                (l_sections[1], false)
            } else {
                (l_sections[0], false)
            }
        }
        _ => {
            if value > 0.0 {
                (l_sections[0], false)
            } else if value < 0.0 {
                (l_sections[1], false)
            } else {
                (l_sections[2], false)
            }
        }
    };

    let c_body = render_number_section(value.abs(), c_section);
    if value < 0.0 && if_auto_sign && c_body.chars().any(|chr| chr.is_ascii_digit() && chr != '0')
    {
        format!("-{c_body}")
    } else {
        c_body
    }
}

fn render_number_section(n_abs: f64, section: &str) -> String {
    if is_general_pattern(section) {
        return render_general_number(n_abs);
    }

    let Some((n_idx_start, n_idx_end)) = find_placeholder_span(section) else {
        return render_text_section(n_abs, section);
    };

    // Trailing scale commas belong to the number part (`#,##0,,`), and so does
    // a literal fraction denominator (`?/8`).
    let mut n_idx_end = n_idx_end;
    while section[n_idx_end..].starts_with(',') {
        n_idx_end += 1;
    }
    if section[n_idx_end..].starts_with('/') {
        n_idx_end += 1;
        while section[n_idx_end..]
            .starts_with(|chr: char| chr.is_ascii_digit() || chr == '?' || chr == '#')
        {
            n_idx_end += 1;
        }
    }

    let c_prefix = render_literal_segment(&section[..n_idx_start]);
    let c_number_raw = &section[n_idx_start..n_idx_end];
    let c_suffix = render_literal_segment(&section[n_idx_end..]);

    let n_cnt_percent = count_outside_quotes(section, '%');
    let n_value = n_abs * 100f64.powi(n_cnt_percent as i32);

    let c_number = if let Some(pattern_sci) = ScientificPattern::parse(c_number_raw) {
        pattern_sci.render(n_value)
    } else if let Some(pattern_frac) = FractionPattern::parse(c_number_raw) {
        pattern_frac.render(n_value)
    } else {
        FixedPattern::parse(c_number_raw).render(n_value)
    };

    format!("{c_prefix}{c_number}{c_suffix}")
}

/// Byte span from the first to the end of the last `0`/`#`/`?` placeholder.
fn find_placeholder_span(section: &str) -> Option<(usize, usize)> {
    let mut if_in_quotes = false;
    let mut if_skip_next = false;
    let mut if_in_bracket = false;
    let mut n_idx_first = None;
    let mut n_idx_last = None;

    for (n_idx, chr) in section.char_indices() {
        if if_skip_next {
            if_skip_next = false;
            continue;
        }
        if if_in_quotes {
            if chr == '"' {
                if_in_quotes = false;
            }
            continue;
        }
        if if_in_bracket {
            if chr == ']' {
                if_in_bracket = false;
            }
            continue;
        }
        match chr {
            '"' => if_in_quotes = true,
            '[' => if_in_bracket = true,
            '\\' | '_' | '*' => if_skip_next = true,
            '0' | '#' | '?' => {
                n_idx_first.get_or_insert(n_idx);
                n_idx_last = Some(n_idx + 1);
            }
            _ => {}
        }
    }

    n_idx_first.zip(n_idx_last)
}

/// Section without digit placeholders; each `@` shows the General rendering.
fn render_text_section(n_abs: f64, section: &str) -> String {
    let mut c_out = String::new();
    let mut n_idx_prev = 0usize;
    for n_idx in find_outside_quotes(section, '@') {
        c_out.push_str(&render_literal_segment(&section[n_idx_prev..n_idx]));
        c_out.push_str(&render_general_number(n_abs));
        n_idx_prev = n_idx + 1;
    }
    c_out.push_str(&render_literal_segment(&section[n_idx_prev..]));
    c_out
}

fn count_outside_quotes(section: &str, needle: char) -> usize {
    find_outside_quotes(section, needle).len()
}

/// Byte offsets of `needle` outside quotes and escapes.
fn find_outside_quotes(section: &str, needle: char) -> Vec<usize> {
    let mut if_in_quotes = false;
    let mut if_skip_next = false;
    let mut l_idx = Vec::new();
    for (n_idx, chr) in section.char_indices() {
        if if_skip_next {
            if_skip_next = false;
            continue;
        }
        if if_in_quotes {
            if chr == '"' {
                if_in_quotes = false;
            }
            continue;
        }
        match chr {
            '"' => if_in_quotes = true,
            '\\' | '_' | '*' => if_skip_next = true,
            _ if chr == needle => l_idx.push(n_idx),
            _ => {}
        }
    }
    l_idx
}

/// Render the literal parts of a section: quotes, escapes, padding and fill.
fn render_literal_segment(segment: &str) -> String {
    let mut c_out = String::new();
    let mut l_chars = segment.chars();

    while let Some(chr) = l_chars.next() {
        match chr {
            '"' => {
                for chr_quoted in l_chars.by_ref() {
                    if chr_quoted == '"' {
                        break;
                    }
                    c_out.push(chr_quoted);
                }
            }
            '\\' => {
                if let Some(chr_next) = l_chars.next() {
                    c_out.push(chr_next);
                }
            }
            '_' => {
                l_chars.next();
                c_out.push(' ');
            }
            '*' => {
                l_chars.next();
            }
            '[' => {
                let c_inner: String = l_chars.by_ref().take_while(|chr| *chr != ']').collect();
                if let Some(c_symbol) = derive_currency_symbol(&c_inner) {
                    c_out.push_str(c_symbol);
                }
            }
            '@' => {}
            _ => c_out.push(chr),
        }
    }

    c_out
}

/// Currency symbol of a `[$€-407]` bracket token.
fn derive_currency_symbol(inner: &str) -> Option<&str> {
    let c_rest = inner.strip_prefix('$')?;
    let c_symbol = c_rest.split('-').next().unwrap_or("");
    if c_symbol.is_empty() {
        None
    } else {
        Some(c_symbol)
    }
}

#[derive(Debug, Clone, Default)]
struct FixedPattern {
    n_int_zero: usize,
    n_int_min: usize,
    n_frac_zero: usize,
    n_frac_min: usize,
    n_frac_max: usize,
    n_scale_commas: usize,
    if_grouping: bool,
    if_decimal_point: bool,
}

impl FixedPattern {
    fn parse(number_raw: &str) -> FixedPattern {
        let c_trimmed = number_raw.trim_end_matches(',');
        let n_scale_commas = number_raw.len() - c_trimmed.len();

        let (c_int, c_frac, if_decimal_point) = match c_trimmed.split_once('.') {
            Some((c_int, c_frac)) => (c_int, c_frac, true),
            None => (c_trimmed, "", false),
        };

        FixedPattern {
            n_int_zero: c_int.chars().filter(|chr| *chr == '0').count(),
            n_int_min: c_int.chars().filter(|chr| matches!(chr, '0' | '?')).count(),
            n_frac_zero: c_frac.chars().filter(|chr| *chr == '0').count(),
            n_frac_min: c_frac.chars().filter(|chr| matches!(chr, '0' | '?')).count(),
            n_frac_max: c_frac
                .chars()
                .filter(|chr| matches!(chr, '0' | '#' | '?'))
                .count(),
            n_scale_commas,
            if_grouping: c_int.contains(','),
            if_decimal_point,
        }
    }

    fn render(&self, value: f64) -> String {
        let n_value = value / 1000f64.powi(self.n_scale_commas as i32);
        let n_frac_max = self.n_frac_max;
        let c_raw = format!("{n_value:.n_frac_max$}");
        let (c_int_raw, c_frac_raw) = c_raw.split_once('.').unwrap_or((c_raw.as_str(), ""));

        let mut c_int = if c_int_raw == "0" && self.n_int_zero == 0 {
            String::new()
        } else {
            c_int_raw.to_string()
        };
        while c_int.len() < self.n_int_zero {
            c_int.insert(0, '0');
        }
        if self.if_grouping && !c_int.is_empty() {
            c_int = group_thousands(&c_int);
        }
        while c_int.len() < self.n_int_min {
            c_int.insert(0, ' ');
        }

        let mut c_frac = c_frac_raw.to_string();
        while c_frac.len() > self.n_frac_zero && c_frac.ends_with('0') {
            c_frac.pop();
        }
        while c_frac.len() < self.n_frac_min {
            c_frac.push(' ');
        }

        let mut c_out = c_int;
        if self.if_decimal_point {
            c_out.push('.');
        }
        c_out.push_str(&c_frac);
        c_out
    }
}

fn group_thousands(int_part: &str) -> String {
    let n_len = int_part.len();
    let mut c_out = String::with_capacity(n_len + n_len / 3);
    for (n_idx, chr) in int_part.chars().enumerate() {
        let n_pos_from_end = n_len - n_idx;
        c_out.push(chr);
        if n_pos_from_end > 1 && n_pos_from_end % 3 == 1 {
            c_out.push(',');
        }
    }
    c_out
}

#[derive(Debug, Clone)]
struct ScientificPattern {
    mantissa: FixedPattern,
    n_exp_digits: usize,
    if_sign_always: bool,
}

impl ScientificPattern {
    fn parse(number_raw: &str) -> Option<ScientificPattern> {
        let n_idx_e = number_raw.find(['E', 'e'])?;
        let c_exp = &number_raw[n_idx_e + 1..];
        let if_sign_always = c_exp.starts_with('+');
        let n_exp_digits = c_exp
            .chars()
            .filter(|chr| matches!(chr, '0' | '#' | '?'))
            .count();
        if n_exp_digits == 0 {
            return None;
        }

        Some(ScientificPattern {
            mantissa: FixedPattern::parse(&number_raw[..n_idx_e]),
            n_exp_digits,
            if_sign_always,
        })
    }

    fn render(&self, value: f64) -> String {
        let n_frac_max = self.mantissa.n_frac_max;
        let c_raw = format!("{value:.n_frac_max$e}");
        let (n_mantissa, n_exp) = match c_raw.split_once('e') {
            Some((c_mantissa, c_exp)) => (
                c_mantissa.parse::<f64>().unwrap_or(0.0),
                c_exp.parse::<i32>().unwrap_or(0),
            ),
            None => (0.0, 0),
        };

        format!(
            "{}{}",
            self.mantissa.render(n_mantissa),
            format_exponent(n_exp, self.n_exp_digits, self.if_sign_always)
        )
    }
}

/// Denominator digits searched for `?/??`-style fractions.
const N_FRACTION_DEN_DIGITS_MAX: usize = 4;

#[derive(Debug, Clone)]
struct FractionPattern {
    whole: Option<FixedPattern>,
    n_num_width: usize,
    n_den_width: usize,
    n_den_fixed: Option<u64>,
}

impl FractionPattern {
    fn parse(number_raw: &str) -> Option<FractionPattern> {
        let (c_left, c_den) = number_raw.split_once('/')?;
        let (c_whole, c_num) = match c_left.trim_end().rsplit_once(' ') {
            Some((c_whole, c_num)) => (Some(c_whole.trim()), c_num),
            None => (None, c_left),
        };

        let n_den_fixed = c_den.trim().parse::<u64>().ok().filter(|n_den| *n_den > 0);
        Some(FractionPattern {
            whole: c_whole.filter(|c| !c.is_empty()).map(FixedPattern::parse),
            n_num_width: c_num.trim().chars().count(),
            n_den_width: c_den.trim().chars().count(),
            n_den_fixed,
        })
    }

    fn render(&self, value: f64) -> String {
        let (mut n_whole, n_frac) = if self.whole.is_some() {
            (value.trunc(), value.fract())
        } else {
            (0.0, value)
        };

        let (mut n_num, n_den) = match self.n_den_fixed {
            Some(n_den) => ((n_frac * n_den as f64).round() as u64, n_den),
            None => derive_best_fraction(
                n_frac,
                10u64.pow(self.n_den_width.min(N_FRACTION_DEN_DIGITS_MAX) as u32) - 1,
            ),
        };
        if self.whole.is_some() && n_num == n_den {
            n_whole += 1.0;
            n_num = 0;
        }

        let mut c_out = String::new();
        if let Some(pattern_whole) = &self.whole
            && (n_whole > 0.0 || n_num == 0)
        {
            c_out.push_str(&pattern_whole.render(n_whole));
        }
        if n_num > 0 || self.whole.is_none() {
            if !c_out.is_empty() {
                c_out.push(' ');
            }
            let n_num_width = self.n_num_width;
            let n_den_width = self.n_den_width;
            c_out.push_str(&format!("{n_num:>n_num_width$}/{n_den:<n_den_width$}"));
        }
        c_out
    }
}

/// Closest `num/den` to `value` with `den <= den_max`.
fn derive_best_fraction(value: f64, den_max: u64) -> (u64, u64) {
    let mut tup_best = (value.round() as u64, 1u64);
    let mut n_err_best = (value - tup_best.0 as f64).abs();
    for n_den in 2..=den_max.max(1) {
        let n_num = (value * n_den as f64).round();
        let n_err = (value - n_num / n_den as f64).abs();
        if n_err < n_err_best {
            n_err_best = n_err;
            tup_best = (n_num as u64, n_den);
        }
    }
    tup_best
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DateTimePattern

/// Estimated width of a value rendered with a date/time format code.
///
/// Tokens count at their conventional display width: month and weekday
/// names at 3 (abbreviated) or 9 (full), four-digit years at 4, numeric
/// tokens at their written length, meridiem markers at their written length.
/// Only the first section is inspected.
pub fn estimate_datetime_pattern_width(pattern: &str) -> usize {
    let Some(c_section) = split_sections(pattern).into_iter().next() else {
        return 0;
    };

    let l_chars: Vec<char> = c_section.chars().collect();
    let mut n_width = 0;
    let mut n_idx = 0;

    while n_idx < l_chars.len() {
        let chr = l_chars[n_idx];
        match chr {
            '"' => {
                let n_idx_next = skip_quoted(&l_chars, n_idx);
                n_width += n_idx_next.min(l_chars.len()).saturating_sub(n_idx + 2);
                n_idx = n_idx_next;
                continue;
            }
            '\\' | '_' => {
                n_width += 1;
                n_idx += 2;
                continue;
            }
            '*' => {
                n_idx += 2;
                continue;
            }
            '[' => {
                let (c_inner, n_idx_next) = read_bracket(&l_chars, n_idx);
                if is_elapsed_token(&c_inner) {
                    n_width += c_inner.chars().count();
                }
                n_idx = n_idx_next;
                continue;
            }
            _ => {}
        }

        if let Some(n_len) = match_meridiem(&l_chars, n_idx) {
            n_width += n_len;
            n_idx += n_len;
            continue;
        }

        let chr_lower = chr.to_ascii_lowercase();
        if matches!(chr_lower, 'y' | 'm' | 'd' | 'h' | 's') {
            let n_run = l_chars[n_idx..]
                .iter()
                .take_while(|chr_run| chr_run.to_ascii_lowercase() == chr_lower)
                .count();
            n_width += match (chr_lower, n_run) {
                ('y', n) if n >= 3 => 4,
                ('y', _) => 2,
                ('m', n) if n >= 5 => 1,
                ('m', 4) => 9,
                ('d', n) if n >= 4 => 9,
                ('m', 3) | ('d', 3) => 3,
                (_, n) => n,
            };
            n_idx += n_run;
            continue;
        }

        n_width += 1;
        n_idx += 1;
    }

    n_width
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_number_keeps_short_values_fixed() {
        assert_eq!(render_general_number(0.0), "0");
        assert_eq!(render_general_number(1000.0), "1000");
        assert_eq!(render_general_number(-1000.0), "-1000");
        assert_eq!(render_general_number(0.5), "0.5");
        assert_eq!(render_general_number(0.1 + 0.2), "0.3");
        assert_eq!(render_general_number(0.0001), "0.0001");
        assert_eq!(render_general_number(10_000_000_000.0), "10000000000");
        assert_eq!(render_general_number(123_456.789_012), "123456.789");
    }

    #[test]
    fn test_general_number_switches_to_scientific() {
        assert_eq!(render_general_number(1e12), "1E+12");
        assert_eq!(render_general_number(1.234567e12), "1.23457E+12");
        assert_eq!(render_general_number(100_000_000_000.0), "1E+11");
        assert_eq!(render_general_number(-12_345_678_901.0), "-1.2346E+10");
        assert_eq!(render_general_number(1e-10), "1E-10");
        assert_eq!(render_general_number(0.000_012_345_678), "1.23457E-05");
        assert_eq!(render_general_number(1.5e200), "1.5E+200");
    }

    #[test]
    fn test_general_number_fits_standard_column() {
        for n_value in [
            1.0 / 3.0,
            -2.0 / 3.0,
            99_999_999_999.7,
            6.02214076e23,
            -1.602e-19,
            123_456_789.123,
        ] {
            let c_rendered = render_general_number(n_value);
            assert!(
                c_rendered.len() <= N_LEN_GENERAL_NUMBER_MAX,
                "{n_value} rendered as {c_rendered}"
            );
        }
    }

    #[test]
    fn test_render_fixed_patterns() {
        assert_eq!(render_number_pattern(1234.5, "0.00"), "1234.50");
        assert_eq!(render_number_pattern(1234.5, "#,##0.00"), "1,234.50");
        assert_eq!(render_number_pattern(1234567.0, "#,##0"), "1,234,567");
        assert_eq!(render_number_pattern(0.25, "0%"), "25%");
        assert_eq!(render_number_pattern(0.5, "#.##"), ".5");
        assert_eq!(render_number_pattern(-3.0, "0"), "-3");
        assert_eq!(render_number_pattern(1_500_000.0, "#,##0.0,,\"M\""), "1.5M");
        assert_eq!(render_number_pattern(42.0, "\"$\"#,##0"), "$42");
        assert_eq!(render_number_pattern(42.0, "[$€-407]0"), "€42");
    }

    #[test]
    fn test_render_multi_section_patterns() {
        let c_pattern = "#,##0.00;(#,##0.00);\"zero\"";
        assert_eq!(render_number_pattern(12.0, c_pattern), "12.00");
        assert_eq!(render_number_pattern(-12.0, c_pattern), "(12.00)");
        assert_eq!(render_number_pattern(0.0, c_pattern), "zero");
        assert_eq!(render_number_pattern(-5.0, "0;[Red]0"), "5");
    }

    #[test]
    fn test_render_text_placeholder_shows_number() {
        assert_eq!(render_number_pattern(123456.0, "@"), "123456");
        assert_eq!(render_number_pattern(-2.5, "@"), "-2.5");
        assert_eq!(render_number_pattern(7.0, "\"No. \"@"), "No. 7");
        assert_eq!(render_number_pattern(7.0, "\"@\""), "@");
    }

    #[test]
    fn test_render_scientific_and_fraction_patterns() {
        assert_eq!(render_number_pattern(12345.0, "0.00E+00"), "1.23E+04");
        assert_eq!(render_number_pattern(0.00012, "0.0E+0"), "1.2E-4");
        assert_eq!(render_number_pattern(1.5, "# ?/?"), "1 1/2");
        assert_eq!(render_number_pattern(0.75, "?/8"), "6/8");
    }

    #[test]
    fn test_datetime_pattern_detection() {
        assert!(is_datetime_pattern("mmm d yyyy hh:mm AM/PM"));
        assert!(is_datetime_pattern("[h]:mm"));
        assert!(is_datetime_pattern("yyyy-mm-dd"));
        assert!(!is_datetime_pattern("General"));
        assert!(!is_datetime_pattern("0.00E+00"));
        assert!(!is_datetime_pattern("0 \"days\""));
        assert!(!is_datetime_pattern("[Red]#,##0"));
    }

    #[test]
    fn test_datetime_pattern_width() {
        assert_eq!(estimate_datetime_pattern_width("mmm d yyyy hh:mm AM/PM"), 22);
        assert_eq!(estimate_datetime_pattern_width("yyyy-mm-dd hh:mm:ss"), 19);
        assert_eq!(estimate_datetime_pattern_width("dddd, mmmm dd, yyyy"), 29);
        assert_eq!(estimate_datetime_pattern_width("d/m/yy"), 6);
        assert_eq!(estimate_datetime_pattern_width("[h]:mm:ss"), 7);
        assert_eq!(estimate_datetime_pattern_width("h:mm A/P"), 8);
        assert_eq!(estimate_datetime_pattern_width("yyyy\"年\"m\"月\""), 7);
    }
}
