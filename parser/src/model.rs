use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Денежная сумма в минимальных единицах ("пенсах"), signed
pub type Minor = i64;

/// Структура с поддерживаемыми валютами
///
/// Важно:
/// Для [`Currency::Other`] код валюты выводится как есть, без проверки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Currency {
    /// Фунт стерлингов
    GBP,
    /// Евро
    EUR,
    /// Американский доллар
    USD,

    /// Неподдерживаемая валюта
    ///
    /// Содержится как строка
    Other(String),
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::Other(s) => s,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Сумма с валютой
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// сумма в пенсах
    pub minor: Minor,
    pub currency: Currency,
}

impl Amount {
    pub fn new(minor: Minor, currency: Currency) -> Self {
        Amount { minor, currency }
    }
}

impl std::ops::Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount::new(-self.minor, self.currency)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

/// Флаг состояния транзакции
///
/// Новые записи получают [`Flag::Warning`] ("ждёт проверки"),
/// категоризатор переводит опознанные в [`Flag::Okay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Flag {
    #[serde(rename = "*")]
    Okay,
    #[default]
    #[serde(rename = "!")]
    Warning,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Okay => write!(f, "*"),
            Flag::Warning => write!(f, "!"),
        }
    }
}

/// Значение метаданных
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            MetaValue::Number(n) => write!(f, "{n}"),
        }
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// Проводка: счёт и сумма
///
/// Сумма может отсутствовать у балансирующей проводки, добавленной категоризатором.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub units: Option<Amount>,
}

impl Posting {
    pub fn new(account: String, units: Option<Amount>) -> Self {
        Posting { account, units }
    }
}

/// Центральная структура библиотеки, содержащая одну транзакцию.
///
/// Создаётся импортёрами, после создания меняется только категоризатором
/// (флаг, теги, метаданные, балансирующие проводки).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// метаданные (источник, номер строки, карта)
    pub meta: Metadata,
    /// дата транзакции
    pub date: NaiveDate,
    pub flag: Flag,
    /// получатель
    pub payee: Option<String>,
    /// текстовое описание
    pub narration: String,
    pub tags: BTreeSet<String>,
    pub links: BTreeSet<String>,
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Go to [`Transaction`]
    pub fn new(
        meta: Metadata,
        date: NaiveDate,
        flag: Flag,
        payee: Option<String>,
        narration: String,
    ) -> Self {
        Transaction {
            meta,
            date,
            flag,
            payee,
            narration,
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
            postings: Vec::new(),
        }
    }

    /// Сумма первой проводки с суммой, если есть
    pub fn amount(&self) -> Option<&Amount> {
        self.postings.iter().find_map(|p| p.units.as_ref())
    }
}
