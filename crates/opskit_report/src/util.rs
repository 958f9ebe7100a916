//! Stateless text and date helpers.

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::conf::{C_FMT_DATE, N_SECS_OFFSET_SAO_PAULO_WEST};
use crate::error::ReportError;

////////////////////////////////////////////////////////////////////////////////
// #region Text

/// Title case: the first letter of every alphabetic run upper-cased, the rest lower-cased.
///
/// `"not EXECUTED"` -> `"Not Executed"`, `"a-validar"` -> `"A-Validar"`, `"1st"` -> `"1St"`.
pub fn to_title_case(value: &str) -> String {
    let mut c_out = String::with_capacity(value.len());
    let mut if_prev_cased = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if if_prev_cased {
                c_out.extend(ch.to_lowercase());
            } else {
                c_out.extend(ch.to_uppercase());
            }
            if_prev_cased = true;
        } else {
            c_out.push(ch);
            if_prev_cased = false;
        }
    }
    c_out
}

/// `true` when `haystack` contains `needle`, ignoring case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Flatten line breaks to spaces and cut to `n_len_max` characters (ending with `...`).
pub fn truncate_text(value: &str, n_len_max: usize) -> String {
    let c_flat = value.replace("\r\n", " ").replace('\n', " ");
    if c_flat.chars().count() <= n_len_max {
        return c_flat;
    }
    let mut c_out: String = c_flat.chars().take(n_len_max.saturating_sub(3)).collect();
    c_out.push_str("...");
    c_out
}

/// Keep only the ASCII digits of a CHG number; `None` when nothing is left.
pub fn clean_digits(value: &str) -> Option<String> {
    let c_digits: String = value.chars().filter(char::is_ascii_digit).collect();
    (!c_digits.is_empty()).then_some(c_digits)
}

/// Join texts for diagnostics.
pub fn join_texts<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|c_value| c_value.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Clock

/// Wall-clock time in `America/Sao_Paulo`.
pub fn derive_now_local() -> NaiveDateTime {
    let now = Utc::now();
    FixedOffset::west_opt(N_SECS_OFFSET_SAO_PAULO_WEST)
        .map(|tz| now.with_timezone(&tz).naive_local())
        .unwrap_or_else(|| now.naive_utc())
}

/// Today's date in `America/Sao_Paulo`.
pub fn derive_today_local() -> NaiveDate {
    derive_now_local().date()
}

/// Parse a caller-supplied `DD/MM/YYYY` date.
pub fn parse_date_ddmmyyyy(value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value.trim(), C_FMT_DATE).map_err(|_| ReportError::InvalidDate {
        value: value.to_string(),
    })
}

/// Report date given as `DD/MM/YYYY` or `YYYY-MM-DD`.
pub fn parse_report_date(value: &str) -> Result<NaiveDate, ReportError> {
    let c_value = value.trim();
    parse_date_ddmmyyyy(c_value).or_else(|err| {
        NaiveDate::parse_from_str(c_value, "%Y-%m-%d").map_err(|_| err)
    })
}

/// Optional report date; `None` and blank text both mean "today" (returned as `None`).
pub fn resolve_reference_date(value: Option<&str>) -> Result<Option<NaiveDate>, ReportError> {
    match value {
        Some(c_value) if !c_value.trim().is_empty() => parse_report_date(c_value).map(Some),
        _ => Ok(None),
    }
}

/// `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(C_FMT_DATE).to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetDates

const TUP_FMT_SHEET_DATETIME: [&str; 7] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TUP_FMT_SHEET_DATE: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Largest serial Excel can display (31/12/9999).
const N_EXCEL_SERIAL_MAX: f64 = 2_958_465.0;

/// Parse a planned date cell: Excel serial number or date(-time) text.
pub fn parse_sheet_datetime(value: &str) -> Option<NaiveDateTime> {
    let c_value = value.trim();
    if c_value.is_empty() {
        return None;
    }
    if let Ok(n_serial) = c_value.parse::<f64>() {
        return convert_excel_serial(n_serial);
    }
    for c_fmt in TUP_FMT_SHEET_DATETIME {
        if let Ok(dt) = NaiveDateTime::parse_from_str(c_value, c_fmt) {
            return Some(dt);
        }
    }
    TUP_FMT_SHEET_DATE
        .iter()
        .find_map(|c_fmt| NaiveDate::parse_from_str(c_value, c_fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Excel 1900 date system serial (days since 30/12/1899, fraction = time of day).
pub fn convert_excel_serial(n_serial: f64) -> Option<NaiveDateTime> {
    if !n_serial.is_finite() || !(0.0..=N_EXCEL_SERIAL_MAX + 1.0).contains(&n_serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let n_millis = (n_serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(n_millis))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_title_case_matches_word_capitalization() {
        assert_eq!(to_title_case("not EXECUTED"), "Not Executed");
        assert_eq!(to_title_case("a validar"), "A Validar");
        assert_eq!(to_title_case("PASSED"), "Passed");
        assert_eq!(to_title_case("a-validar"), "A-Validar");
        assert_eq!(to_title_case("1st run"), "1St Run");
        assert_eq!(to_title_case("ção"), "Ção");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn test_truncate_text_flattens_and_cuts() {
        assert_eq!(truncate_text("linha 1\r\nlinha 2", 70), "linha 1 linha 2");
        let c_long = "x".repeat(80);
        let c_cut = truncate_text(&c_long, 70);
        assert_eq!(c_cut.chars().count(), 70);
        assert!(c_cut.ends_with("..."));
        assert_eq!(truncate_text(&"é".repeat(70), 70), "é".repeat(70));
    }

    #[test]
    fn test_clean_digits() {
        assert_eq!(clean_digits("CHG0012345 "), Some("0012345".to_string()));
        assert_eq!(clean_digits("n/a"), None);
    }

    #[test]
    fn test_parse_date_ddmmyyyy() {
        assert_eq!(
            parse_date_ddmmyyyy(" 05/03/2025 ").expect("date"),
            NaiveDate::from_ymd_opt(2025, 3, 5).expect("ymd")
        );
        assert!(matches!(
            parse_date_ddmmyyyy("2025-03-05"),
            Err(ReportError::InvalidDate { .. })
        ));
        assert!(parse_date_ddmmyyyy("31/02/2025").is_err());
    }

    #[test]
    fn test_parse_report_date_accepts_iso() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 5).expect("ymd");
        assert_eq!(parse_report_date("2025-03-05").expect("iso"), expected);
        assert_eq!(parse_report_date("05/03/2025").expect("br"), expected);
        assert!(parse_report_date("março").is_err());
        assert_eq!(resolve_reference_date(Some(" ")).expect("blank"), None);
        assert_eq!(resolve_reference_date(Some("2025-03-05")).expect("iso"), Some(expected));
    }

    #[test]
    fn test_parse_sheet_datetime_accepts_serials_and_text() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 20)
            .and_then(|d| d.and_hms_opt(18, 0, 0))
            .expect("datetime");
        assert_eq!(parse_sheet_datetime("45432.75"), Some(expected));
        assert_eq!(parse_sheet_datetime("20/05/2024 18:00"), Some(expected));
        assert_eq!(parse_sheet_datetime("2024-05-20 18:00:00"), Some(expected));
        assert_eq!(
            parse_sheet_datetime("20/05/2024"),
            expected.date().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_sheet_datetime("amanhã"), None);
        assert_eq!(parse_sheet_datetime(""), None);
    }
}
