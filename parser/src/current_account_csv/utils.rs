use crate::error::ParseError;
use crate::model::{Minor, Transaction};
use crate::utils::parse_amount;
use csv::StringRecord;

/// Сумма со знаком из пары колонок дебет/кредит
///
/// Дебет - списание (минус), кредит - зачисление (плюс).
/// Заполнена должна быть ровно одна колонка.
pub(crate) fn parse_signed_amount(
    debit: Option<&str>,
    credit: Option<&str>,
) -> Result<Minor, ParseError> {
    fn is_empty(val: Option<&str>) -> bool {
        val.is_none_or(|s| s.trim().is_empty())
    }

    match (debit, credit) {
        (Some(d), c) if !d.trim().is_empty() && is_empty(c) => Ok(-parse_amount(d)?),
        (d, Some(c)) if !c.trim().is_empty() && is_empty(d) => parse_amount(c),
        _ => Err(ParseError::AmountSideConflict),
    }
}

/// Ищет индекс колонки с точно таким заголовком
///
/// Возвращает первый найденный, если не находит - возвращает ошибку
pub(crate) fn find_col(row: &StringRecord, needle: &str) -> Result<usize, ParseError> {
    row.iter()
        .position(|field| field.trim().trim_start_matches('\u{feff}') == needle)
        .ok_or_else(|| ParseError::Header(
            format!("column '{needle}' not found")
        ))
}

/// Выгрузка идёт от новых операций к старым
pub(crate) fn is_descending(entries: &[Transaction]) -> bool {
    match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => first.date > last.date,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_is_negative_credit_is_positive() {
        assert_eq!(parse_signed_amount(Some("23.40"), None).unwrap(), -2340);
        assert_eq!(parse_signed_amount(Some(""), Some("10.00")).unwrap(), 1000);
    }

    #[test]
    fn exactly_one_side_required() {
        assert!(matches!(
            parse_signed_amount(None, None),
            Err(ParseError::AmountSideConflict)
        ));
        assert!(matches!(
            parse_signed_amount(Some("1.00"), Some("2.00")),
            Err(ParseError::AmountSideConflict)
        ));
    }

    #[test]
    fn finds_exact_header() {
        let row = StringRecord::from(vec!["\u{feff}Transaction Date", "Balance"]);
        assert_eq!(find_col(&row, "Transaction Date").unwrap(), 0);
        assert_eq!(find_col(&row, "Balance").unwrap(), 1);
        assert!(find_col(&row, "Debit Amount").is_err());
    }
}
