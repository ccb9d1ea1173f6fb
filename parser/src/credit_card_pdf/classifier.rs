//! Распознавание выписки: та ли это кредитка и тот ли счёт.

use crate::error::ParseError;
use crate::extract::{Document, Page};
use crate::utils::{decode, parse_date_liberally};
use chrono::NaiveDate;
use tracing::debug;

/// Поле, за которым идёт строка с датой выписки
const STATEMENT_TITLE: &[u8] = b"Your credit card statement";

/// Символы строки-заголовка, где напечатан хвост номера счёта
const SUFFIX_CHARS: std::ops::Range<usize> = 15..20;

/// Продукт карты: от него зависит, где на первой странице искать номер счёта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductVariant {
    /// Avios Rewards / Cashback
    RewardsOrCashback,
    /// Duo Avios
    Duo,
}

impl ProductVariant {
    /// Порядок проверки важен: Rewards/Cashback проверяются первыми
    const ALL: [ProductVariant; 2] = [ProductVariant::RewardsOrCashback, ProductVariant::Duo];

    fn product_names(self) -> &'static [&'static [u8]] {
        const REWARDS: &[&[u8]] = &[b"Lloyds Bank Avios Rewards", b"Lloyds Bank Cashback"];
        const DUO: &[&[u8]] = &[b"Lloyds Bank Duo Avios"];
        match self {
            ProductVariant::RewardsOrCashback => REWARDS,
            ProductVariant::Duo => DUO,
        }
    }

    /// Метка рядом с номером счёта и смещение строки-заголовка от неё
    fn header_anchor(self) -> (&'static [u8], usize) {
        const INTEREST: &[u8] = b"Next month's estimated interest";
        const CARD_NUMBER: &[u8] = b"Mastercard [M] Card Number";
        match self {
            ProductVariant::RewardsOrCashback => (INTEREST, 2),
            // у Duo значения идут сразу за названием поля
            ProductVariant::Duo => (CARD_NUMBER, 1),
        }
    }

    pub fn detect(page: &Page) -> Option<Self> {
        Self::ALL.into_iter().find(|v| {
            v.product_names()
                .iter()
                .any(|name| page.iter().any(|f| f.as_slice() == *name))
        })
    }

    fn header_line(self, page: &Page) -> Option<&[u8]> {
        let (anchor, offset) = self.header_anchor();
        let idx = page.iter().position(|f| f.as_slice() == anchor)?;
        page.get(idx + offset).map(Vec::as_slice)
    }
}

/// Что удалось узнать о выписке
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementIdentity {
    pub variant: ProductVariant,
    pub account_suffix: String,
    /// конец периода выписки
    pub period_end: NaiveDate,
}

/// Результат распознавания.
///
/// [`Classification::Undetermined`] отличается от [`Classification::Rejected`]:
/// поле не удалось декодировать, и сказать "не наша" с уверенностью нельзя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accepted(StatementIdentity),
    Rejected,
    Undetermined(String),
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted(_))
    }

    pub fn period_end(&self) -> Option<NaiveDate> {
        match self {
            Classification::Accepted(id) => Some(id.period_end),
            _ => None,
        }
    }
}

/// Дата выписки из строки после "Your credit card statement"
///
/// `Ok(None)` - метки нет или дата не разбирается, это не наша выписка.
pub fn statement_date(page: &Page) -> Result<Option<NaiveDate>, ParseError> {
    let Some(idx) = page.iter().position(|f| f.as_slice() == STATEMENT_TITLE) else {
        return Ok(None);
    };
    let Some(date_line) = page.get(idx + 1) else {
        return Ok(None);
    };
    let date_line = decode(date_line)?;
    match parse_date_liberally(date_line) {
        Ok(date) => Ok(Some(date)),
        Err(e) => {
            debug!("statement date line not parsable: {e}");
            Ok(None)
        }
    }
}

/// Конец периода выписки, если документ на неё похож
pub fn file_date(doc: &Document) -> Option<NaiveDate> {
    statement_date(doc.page(0)?).ok().flatten()
}

/// Проверяет, что документ - выписка по кредитке со счётом, оканчивающимся на `account_suffix`
pub fn classify(doc: &Document, account_suffix: &str) -> Classification {
    let Some(summary) = doc.page(0) else {
        return Classification::Rejected;
    };

    let period_end = match statement_date(summary) {
        Ok(Some(date)) => date,
        Ok(None) => return Classification::Rejected,
        Err(e) => return Classification::Undetermined(e.to_string()),
    };

    let Some(variant) = ProductVariant::detect(summary) else {
        debug!("no known card product on summary page");
        return Classification::Rejected;
    };

    let Some(header) = variant.header_line(summary) else {
        debug!(?variant, "account header line not found");
        return Classification::Rejected;
    };

    let header = match decode(header) {
        Ok(h) => h,
        Err(e) => return Classification::Undetermined(e.to_string()),
    };

    let suffix: String = header
        .chars()
        .skip(SUFFIX_CHARS.start)
        .take(SUFFIX_CHARS.len())
        .collect();

    if suffix == account_suffix {
        Classification::Accepted(StatementIdentity {
            variant,
            account_suffix: suffix,
            period_end,
        })
    } else {
        debug!(found = %suffix, expected = account_suffix, "account suffix does not match");
        Classification::Rejected
    }
}
