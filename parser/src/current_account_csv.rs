mod utils;

use std::io::{BufRead, Read};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use lazy_regex::regex_is_match;
use tracing::debug;
use crate::categorizer::{Categorizer, Identity};
use crate::error::ParseError;
use crate::model::{Amount, Currency, Flag, MetaValue, Metadata, Posting, Transaction};
use utils::*;

/// Индексы нужных колонок поимённо
///
/// Вспомогательная структура для хранения, в каких столбцах csv содержатся данные для нужного поля
struct TableLayout {
    date_col: usize,
    type_col: usize,
    description_col: usize,
    debit_col: usize,
    credit_col: usize,
    balance_col: usize,
}

impl TableLayout {
    /// По заголовкам определяет индексы необходимых колонок
    fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        Ok(TableLayout {
            date_col: find_col(headers, "Transaction Date")?,
            type_col: find_col(headers, "Transaction Type")?,
            description_col: find_col(headers, "Transaction Description")?,
            debit_col: find_col(headers, "Debit Amount")?,
            credit_col: find_col(headers, "Credit Amount")?,
            balance_col: find_col(headers, "Balance")?,
        })
    }
}

/// Операция из CSV-выгрузки текущего счёта
#[derive(Debug, Default)]
pub struct CsvRecord {
    /// номер строки в файле (с заголовком), для метаданных
    line: u64,
    date: String,
    transaction_type: String,
    description: String,
    debit_amount: Option<String>,
    credit_amount: Option<String>,
    balance: Option<String>,
}

impl CsvRecord {
    /// Распаковывает колонки из записи csv-файла в структуру
    fn from_string_record(row: &StringRecord, layout: &TableLayout) -> Result<Self, ParseError> {
        let get = |idx: usize, name: &'static str| -> Result<String, ParseError> {
            row.get(idx)
                .map(|s| s.trim().to_string())
                .ok_or(ParseError::MissingField(name))
        };
        let get_opt = |idx: usize| -> Option<String> {
            row.get(idx)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(CsvRecord {
            line: row.position().map(|p| p.line()).unwrap_or_default(),
            date: get(layout.date_col, "Transaction Date")?,
            transaction_type: get(layout.type_col, "Transaction Type")?,
            description: get(layout.description_col, "Transaction Description")?,
            debit_amount: get_opt(layout.debit_col),
            credit_amount: get_opt(layout.credit_col),
            balance: get_opt(layout.balance_col),
        })
    }

    fn into_transaction(
        self,
        importer: &CurrentAccountImporter,
        filename: &str,
    ) -> Result<Transaction, ParseError> {
        let date = NaiveDate::parse_from_str(&self.date, "%d/%m/%Y")
            .map_err(|_| ParseError::InvalidDate(self.date.clone()))?;
        let amount = parse_signed_amount(
            self.debit_amount.as_deref(),
            self.credit_amount.as_deref(),
        )?;

        let mut meta = Metadata::new();
        meta.insert("filename".into(), MetaValue::Text(filename.to_string()));
        meta.insert("lineno".into(), MetaValue::Number(self.line as i64));
        if let Some(balance) = self.balance {
            meta.insert("balance".into(), MetaValue::Text(balance));
        }

        let mut txn = Transaction::new(meta, date, importer.flag, None, self.description);
        if !self.transaction_type.is_empty() {
            txn.tags.insert(self.transaction_type);
        }
        txn.postings.push(Posting::new(
            importer.account.clone(),
            Some(Amount::new(amount, importer.currency.clone())),
        ));

        Ok(importer.categorizer.categorize(txn))
    }
}

/// Импортёр CSV-выгрузки текущего счёта Lloyds.
///
/// Колонки: дата, тип операции (идёт в тег), описание (в narration),
/// дебет, кредит, остаток (в метаданные).
pub struct CurrentAccountImporter {
    pub account: String,
    pub currency: Currency,
    pub flag: Flag,
    categorizer: Box<dyn Categorizer>,
}

impl CurrentAccountImporter {
    pub fn new(account: impl Into<String>) -> Self {
        CurrentAccountImporter {
            account: account.into(),
            currency: Currency::GBP,
            flag: Flag::Warning,
            categorizer: Box::new(Identity),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_categorizer(mut self, categorizer: impl Categorizer + 'static) -> Self {
        self.categorizer = Box::new(categorizer);
        self
    }

    /// Узнаёт выгрузку по строке заголовков
    pub fn identify<R: BufRead>(&self, mut reader: R) -> Result<bool, ParseError> {
        let mut first = String::new();
        reader.read_line(&mut first)?;
        let first = first.trim_start_matches('\u{feff}');
        Ok(regex_is_match!(
            r"^Transaction Date,Transaction Type,Sort Code,Account Number,Transaction Description,Debit Amount,Credit Amount,Balance",
            first
        ))
    }

    /// Имя, под которым выгрузку стоит сохранить в архиве
    pub fn file_name(&self) -> &'static str {
        "statement.csv"
    }

    /// Дата последней транзакции
    pub fn file_date(&self, entries: &[Transaction]) -> Option<NaiveDate> {
        entries.iter().map(|t| t.date).max()
    }

    /// Читает транзакции; выгрузка идёт от новых к старым, результат - от старых к новым
    pub fn extract<R: Read>(&self, reader: R, filename: &str) -> Result<Vec<Transaction>, ParseError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let layout = TableLayout::from_headers(&headers)?;

        let mut entries = Vec::new();
        for result in rdr.records() {
            let row = result?;

            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let rec = CsvRecord::from_string_record(&row, &layout)?;
            entries.push(rec.into_transaction(self, filename)?);
        }

        if is_descending(&entries) {
            debug!("csv rows are newest first, reversing");
            entries.reverse();
        }

        Ok(entries)
    }
}
