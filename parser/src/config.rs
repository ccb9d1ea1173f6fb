use crate::categorizer::{RuleCategorizer, RuleConfig};
use crate::error::ParseError;
use crate::extract::Extractor;
use crate::model::{Currency, Flag};
use crate::utils::parse_currency;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

fn default_currency() -> String {
    "GBP".to_string()
}

/// Настройки импортёров.
///
/// Пример файла:
/// ```toml
/// account = "Liabilities:Lloyds:CreditCard"
/// account_suffix = "12345"
/// csv_account = "Assets:Lloyds:Current"
///
/// [extractor]
/// timeout_secs = 30
///
/// [[rules]]
/// pattern = "^TESCO"
/// account = "Expenses:Groceries"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ImporterConfig {
    /// счёт кредитки для проводок
    pub account: String,
    /// последние 5 цифр номера счёта, по ним узнаётся своя выписка
    pub account_suffix: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// флаг новых записей
    #[serde(default)]
    pub flag: Flag,
    /// счёт для CSV-выгрузки текущего счёта
    pub csv_account: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub extractor: Extractor,
}

impl ImporterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ParseError> {
        let config: ImporterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ParseError> {
        if self.account.trim().is_empty() {
            return Err(ParseError::Config("account must not be empty".into()));
        }
        if self.account_suffix.is_empty() {
            return Err(ParseError::Config("account_suffix must not be empty".into()));
        }
        if self.account_suffix.chars().count() != 5 {
            warn!(suffix = %self.account_suffix, "account_suffix is not 5 characters, statements will never match");
        }
        Ok(())
    }

    pub fn currency(&self) -> Currency {
        parse_currency(&self.currency)
    }

    /// Категоризатор из правил конфигурации (пустой, если правил нет)
    pub fn categorizer(&self) -> Result<RuleCategorizer, ParseError> {
        RuleCategorizer::from_rules(&self.rules)
    }
}
