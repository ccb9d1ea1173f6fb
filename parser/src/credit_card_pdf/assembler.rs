use super::Row;
use super::layout::ColumnSet;
use crate::categorizer::Categorizer;
use crate::error::ParseError;
use crate::model::{Amount, Currency, Flag, MetaValue, Metadata, Posting, Transaction};
use crate::utils::{decode, parse_amount, parse_date_liberally};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Всё, что нужно для построения записей, кроме самих колонок
pub struct AssemblyContext<'a> {
    /// счёт кредитки, на который идут проводки
    pub account: &'a str,
    pub currency: &'a Currency,
    pub flag: Flag,
    pub categorizer: &'a dyn Categorizer,
    /// имя исходного файла для метаданных
    pub filename: &'a str,
}

/// Год транзакции: год конца периода, а для январской выписки
/// декабрьские транзакции относятся к предыдущему году.
pub fn resolve_year(period_end: NaiveDate, raw_date: &str) -> i32 {
    if period_end.month() == 1 && raw_date.contains("DECEMBER") {
        period_end.year() - 1
    } else {
        period_end.year()
    }
}

fn build_transaction(
    row: &Row<'_>,
    lineno: usize,
    period_end: NaiveDate,
    ctx: &AssemblyContext<'_>,
) -> Result<Transaction, ParseError> {
    // колонка описаний идёт в payee, колонка получателей - в narration;
    // так исторически сопоставлены роли, менять только сверившись с выписками
    let payee = decode(row.description)?.to_string();
    let narration = decode(row.payee)?.to_string();

    let raw_date = decode(row.date)?;
    let year = resolve_year(period_end, raw_date);
    let date = parse_date_liberally(&format!("{raw_date} {year}"))?;

    let mut meta = Metadata::new();
    meta.insert("filename".into(), MetaValue::Text(ctx.filename.to_string()));
    meta.insert("lineno".into(), MetaValue::Number(lineno as i64));
    if let Some(card) = row.card {
        meta.insert("card".into(), MetaValue::Text(decode(card)?.to_string()));
    }

    let amount = Amount::new(parse_amount(row.amount)?, ctx.currency.clone());

    let txn = Transaction::new(meta, date, ctx.flag, Some(payee), narration);
    let mut txn = ctx.categorizer.categorize(txn);
    txn.postings
        .push(Posting::new(ctx.account.to_string(), Some(-amount)));
    Ok(txn)
}

/// Собирает записи из колонок.
///
/// Сумма в выписке - с точки зрения держателя карты, проводка - с точки
/// зрения счёта-обязательства, поэтому знак инвертируется.
pub fn assemble(
    columns: &ColumnSet,
    period_end: NaiveDate,
    ctx: &AssemblyContext<'_>,
) -> Result<Vec<Transaction>, ParseError> {
    let mut entries = Vec::with_capacity(columns.len());
    for (idx, row) in columns.rows().enumerate() {
        debug!(?row, "assembling transaction");
        entries.push(build_transaction(&row, idx + 1, period_end, ctx)?);
    }
    Ok(entries)
}
