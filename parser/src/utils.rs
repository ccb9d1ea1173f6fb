use crate::error::ParseError;
use crate::model::{Currency, Minor};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    // слова, числа (с возможным суффиксом 1st/2nd/3rd/4th) и числовые даты через / - .
    Regex::new(r"(?i)\d{1,4}[/.-]\d{1,2}[/.-]\d{1,4}|\d+(?:st|nd|rd|th)?|[a-z]+").unwrap()
});

pub(crate) fn parse_currency(raw: &str) -> Currency {
    let s = raw.trim();
    let lower = s.to_lowercase();

    match lower.as_str() {
        "gbp" | "£" | "pound sterling" => Currency::GBP,
        "eur" | "€" | "euro" => Currency::EUR,
        "usd" | "$" | "us dollar" => Currency::USD,

        // Всё остальное - как есть:
        _ => Currency::Other(s.to_string()),
    }
}

/// Декодирует сырое поле как UTF-8
pub(crate) fn decode(field: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(field)
        .map_err(|_| ParseError::Decode(String::from_utf8_lossy(field).into_owned()))
}

/// Нормализует сумму из выписки: обрезает пробелы, "CR" в конце превращает в минус
///
/// `"  12.50CR"` -> `"-12.50"`, `" 7.99"` -> `"7.99"`
pub fn fix_price(raw: &str) -> String {
    let s = raw.trim();
    match s.strip_suffix("CR") {
        Some(body) => format!("-{body}"),
        None => s.to_string(),
    }
}

/// Парсит сумму со знаком в пенсы
///
/// Допускает разделители тысяч (`1,234.56`) и пробелы.
pub(crate) fn parse_amount(raw: &str) -> Result<Minor, ParseError> {
    let mut cleaned = raw.trim().replace([' ', '£'], "");

    if cleaned.contains(',') {
        if cleaned.contains('.') {
            cleaned = cleaned.replace(',', "");
        } else {
            cleaned = cleaned.replace(',', ".");
        }
    }

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if unsigned.is_empty() {
        return Err(ParseError::InvalidAmount(format!("empty amount: '{raw}'")));
    }

    let mut split = unsigned.split('.');
    // unsigned точно не пусто, так что первая часть есть всегда
    let int_part = split.next().unwrap_or("");
    let dec_part = split.next().unwrap_or("");
    if split.next().is_some() {
        return Err(ParseError::InvalidAmount(format!("too many dots in amount: {cleaned}")));
    }

    let int_part: Minor = if int_part.is_empty() { 0 } else { int_part.parse()? };

    let dec_part: Minor = match dec_part.len() {
        0 => 0,
        1 => dec_part.parse::<Minor>()? * 10,
        2 => dec_part.parse()?,
        _ => {
            return Err(ParseError::InvalidAmount(format!(
                "too many fractional digits in amount: {cleaned}"
            )));
        }
    };

    let minor = int_part
        .checked_mul(100)
        .and_then(|v| v.checked_add(dec_part))
        .ok_or_else(|| ParseError::InvalidAmount(format!("amount out of range: {cleaned}")))?;
    Ok(if negative { -minor } else { minor })
}

fn month_from_name(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    let month = match lower.get(0..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    // "Decembers" и прочий мусор не принимаем: либо сокращение, либо полное имя
    const FULL: [&str; 12] = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];
    let full = FULL[month as usize - 1];
    if lower.len() == 3 || lower == full || (lower == "sept") {
        Some(month)
    } else {
        None
    }
}

fn parse_numeric_date(token: &str, raw: &str) -> Result<NaiveDate, ParseError> {
    let parts: Vec<&str> = token.split(['/', '.', '-']).collect();
    let bad = || ParseError::InvalidDate(raw.to_string());
    let nums: Vec<i32> = parts
        .iter()
        .map(|p| p.parse::<i32>().map_err(|_| bad()))
        .collect::<Result<_, _>>()?;

    // ISO yyyy-mm-dd, иначе day-first dd/mm/yyyy
    let (y, m, d) = if parts[0].len() == 4 {
        (nums[0], nums[1], nums[2])
    } else {
        let year = if parts[2].len() == 2 { 2000 + nums[2] } else { nums[2] };
        (year, nums[1], nums[0])
    };

    NaiveDate::from_ymd_opt(y, m as u32, d as u32).ok_or_else(bad)
}

/// Свободный парсер дат
///
/// Принимает "15 January 2023", "DECEMBER 30 2022", "30 Dec 2022",
/// "1st March 2023", "15 Jan 23", "15/01/2023" (день первым) и "2023-01-15".
pub fn parse_date_liberally(raw: &str) -> Result<NaiveDate, ParseError> {
    let bad = || ParseError::InvalidDate(raw.to_string());

    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;

    for m in DATE_TOKEN_RE.find_iter(raw) {
        let token = m.as_str();

        if token.contains(['/', '.', '-']) {
            return parse_numeric_date(token, raw);
        }

        if token.starts_with(|c: char| c.is_ascii_digit()) {
            let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            if digits.len() == 4 {
                if year.replace(digits.parse()?).is_some() {
                    return Err(bad());
                }
            } else if day.is_some() && month.is_some() && year.is_none() && digits.len() == 2 {
                // "15 Jan 23": двузначный год после дня и месяца
                year = Some(2000 + digits.parse::<i32>()?);
            } else if day.is_none() {
                day = Some(digits.parse()?);
            } else {
                return Err(bad());
            }
        } else if let Some(mm) = month_from_name(token) {
            if month.replace(mm).is_some() {
                return Err(bad());
            }
        } else if !token.eq_ignore_ascii_case("of") {
            return Err(bad());
        }
    }

    match (year, month, day) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(bad),
        _ => Err(bad()),
    }
}
