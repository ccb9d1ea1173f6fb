pub mod assembler;
pub mod classifier;
pub mod layout;

use crate::categorizer::{Categorizer, Identity};
use crate::config::ImporterConfig;
use crate::error::ParseError;
use crate::extract::{Document, Extractor, is_pre_extracted, source_name};
use crate::model::{Currency, Flag, Transaction};
use assembler::{AssemblyContext, assemble};
use chrono::NaiveDate;
use classifier::Classification;
use std::path::Path;
use tracing::{debug, info, warn};

/// Одна строка таблицы транзакций, поля как их выдал экстрактор
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub date: &'a [u8],
    pub posting_date: &'a [u8],
    pub description: &'a [u8],
    pub payee: &'a [u8],
    /// сумма после [`crate::utils::fix_price`]
    pub amount: &'a str,
    pub card: Option<&'a [u8]>,
}

/// Импортёр ежемесячных PDF-выписок по кредитке Lloyds.
///
/// Транзакции создаются с флагом [`Flag::Warning`] ("ждёт проверки"),
/// категоризатор переводит опознанные в [`Flag::Okay`].
///
/// Пример использования:
/// ```no_run
/// use lloyds_parser::{CreditCardImporter, Extractor};
/// use std::path::Path;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let importer = CreditCardImporter::new("Liabilities:Lloyds:Card", "12345");
/// let doc = Extractor::default().load(Path::new("statement.pdf"))?;
/// if importer.identify(&doc).is_accepted() {
///     let entries = importer.extract(&doc, "statement.pdf")?;
///     println!("{} transactions", entries.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct CreditCardImporter {
    /// счёт для проводок
    pub account: String,
    /// последние 5 цифр номера счёта
    pub account_suffix: String,
    pub currency: Currency,
    pub flag: Flag,
    categorizer: Box<dyn Categorizer>,
}

impl CreditCardImporter {
    pub fn new(account: impl Into<String>, account_suffix: impl Into<String>) -> Self {
        CreditCardImporter {
            account: account.into(),
            account_suffix: account_suffix.into(),
            currency: Currency::GBP,
            flag: Flag::Warning,
            categorizer: Box::new(Identity),
        }
    }

    /// Импортёр по настройкам из конфигурации, с категоризатором из её правил
    pub fn from_config(config: &ImporterConfig) -> Result<Self, ParseError> {
        Ok(CreditCardImporter::new(&config.account, &config.account_suffix)
            .with_currency(config.currency())
            .with_flag(config.flag)
            .with_categorizer(config.categorizer()?))
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

    /// Наша ли это выписка
    pub fn identify(&self, doc: &Document) -> Classification {
        classifier::classify(doc, &self.account_suffix)
    }

    /// Конец периода выписки
    pub fn file_date(&self, doc: &Document) -> Option<NaiveDate> {
        classifier::file_date(doc)
    }

    /// Имя, под которым выписку стоит сохранить в архиве
    pub fn file_name(&self, path: &Path) -> String {
        let extension = if is_pre_extracted(path) { "txt" } else { "pdf" };
        format!("card-{}-statement.{extension}", self.account_suffix)
    }

    /// Достаёт транзакции из документа.
    ///
    /// Нераспознанная раскладка страницы транзакций даёт пустой список, не ошибку.
    pub fn extract(&self, doc: &Document, filename: &str) -> Result<Vec<Transaction>, ParseError> {
        let Some(period_end) = self.file_date(doc) else {
            debug!(filename, "no statement date, nothing to extract");
            return Ok(Vec::new());
        };

        let Some(columns) = layout::resolve_document(doc) else {
            return Ok(Vec::new());
        };

        let ctx = AssemblyContext {
            account: &self.account,
            currency: &self.currency,
            flag: self.flag,
            categorizer: self.categorizer.as_ref(),
            filename,
        };
        assemble(&columns, period_end, &ctx)
    }

    /// Полный цикл для одного файла: извлечь текст, распознать, собрать транзакции.
    ///
    /// Сбой внешнего инструмента означает "страниц нет" - пустой список.
    /// Неопределённое распознавание возвращается ошибкой, чтобы вызывающий
    /// мог отличить его от "не наша выписка".
    pub fn import_path(&self, path: &Path, extractor: &Extractor) -> Result<Vec<Transaction>, ParseError> {
        let doc = match extractor.load(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), "text extraction failed: {e}");
                return Ok(Vec::new());
            }
        };

        match self.identify(&doc) {
            Classification::Accepted(id) => {
                info!(path = %path.display(), variant = ?id.variant, period_end = %id.period_end, "importing credit card statement");
                self.extract(&doc, &source_name(path))
            }
            Classification::Rejected => {
                debug!(path = %path.display(), "not a matching credit card statement");
                Ok(Vec::new())
            }
            Classification::Undetermined(reason) => Err(ParseError::Undetermined(format!(
                "{}: {reason}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_keeps_input_kind() {
        let importer = CreditCardImporter::new("Liabilities:Card", "12345");
        assert_eq!(
            importer.file_name(Path::new("/tmp/download.txt")),
            "card-12345-statement.txt"
        );
        assert_eq!(
            importer.file_name(Path::new("/tmp/Statement_2023.PDF")),
            "card-12345-statement.pdf"
        );
    }

    #[test]
    fn extract_without_statement_date_is_empty() {
        let importer = CreditCardImporter::new("Liabilities:Card", "12345");
        let doc = Document::from_text(b"nothing\nhere\x0cpage two\x0cDescription");
        assert!(importer.extract(&doc, "x.txt").unwrap().is_empty());
    }
}
