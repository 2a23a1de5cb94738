//! Input masks and display formatting.
//!
//! Every mask is recomputed from the digits of the whole raw value on each
//! keystroke. Feeding a mask its own output yields the same output, so the
//! front end can re-apply it to whatever the input box currently holds.

use chrono::NaiveDate;

/// CPF length in digits.
pub const CPF_DIGITS: usize = 11;
/// Maximum SUS card length in digits.
pub const SUS_CARD_DIGITS: usize = 15;

const ISO_DATE: &str = "%Y-%m-%d";
const DISPLAY_DATE: &str = "%d/%m/%Y";

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mask a CPF as `###.###.###-##`, progressively.
///
/// Separators are only inserted once a digit follows them, and digits past
/// the eleventh are dropped.
pub fn format_cpf(value: &str) -> String {
    let mut out = String::with_capacity(CPF_DIGITS + 3);
    for (i, digit) in digits_only(value).chars().take(CPF_DIGITS).enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(digit);
    }
    out
}

/// Mask a phone number as `(##) #####-####`.
///
/// The area code is parenthesised once two digits are present; the hyphen
/// goes before the last four digits once the local part is longer than four.
pub fn format_phone(value: &str) -> String {
    let digits = digits_only(value);
    if digits.len() < 2 {
        return digits;
    }

    let (area, local) = digits.split_at(2);
    let mut out = format!("({})", area);
    if local.is_empty() {
        return out;
    }

    out.push(' ');
    if local.len() > 4 {
        let (head, tail) = local.split_at(local.len() - 4);
        out.push_str(head);
        out.push('-');
        out.push_str(tail);
    } else {
        out.push_str(local);
    }
    out
}

/// SUS card: digits only, at most fifteen.
pub fn format_sus_card(value: &str) -> String {
    digits_only(value).chars().take(SUS_CARD_DIGITS).collect()
}

/// CRM license number: digits only, no grouping.
pub fn format_crm(value: &str) -> String {
    digits_only(value)
}

/// Parse an ISO calendar date, tolerating a trailing time component
/// (`2024-01-10T08:00:00Z`, `2024-01-10 08:00`).
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, ISO_DATE) {
        return Some(date);
    }
    let (day, time) = (value.get(..10)?, value.get(10..)?);
    if !time.starts_with(|c| c == 'T' || c == ' ') {
        return None;
    }
    NaiveDate::parse_from_str(day, ISO_DATE).ok()
}

/// Render an ISO date string as `DD/MM/YYYY`.
///
/// Blank input renders blank; anything unparseable is shown as-is.
pub fn format_date_display(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match parse_iso_date(value) {
        Some(date) => display_date(date),
        None => value.to_string(),
    }
}

/// Render a date as `DD/MM/YYYY`.
pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE).to_string()
}
