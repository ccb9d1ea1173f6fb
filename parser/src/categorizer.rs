//! Категоризация транзакций.
//!
//! Импортёр не знает, как категоризировать, он только вызывает переданную
//! функцию на каждой записи. По умолчанию - [`Identity`], запись не меняется.

use crate::error::ParseError;
use crate::model::{Flag, Posting, Transaction};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::trace;

/// Преобразование записи после её создания
pub trait Categorizer {
    fn categorize(&self, txn: Transaction) -> Transaction;
}

impl<F> Categorizer for F
where
    F: Fn(Transaction) -> Transaction,
{
    fn categorize(&self, txn: Transaction) -> Transaction {
        self(txn)
    }
}

/// Ничего не делает
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Categorizer for Identity {
    fn categorize(&self, txn: Transaction) -> Transaction {
        txn
    }
}

/// Правило из конфигурации
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// регулярное выражение, без учёта регистра, по payee или narration
    pub pattern: String,
    /// встречный счёт для балансирующей проводки
    pub account: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    account: Option<String>,
    tag: Option<String>,
}

impl Rule {
    fn matches(&self, txn: &Transaction) -> bool {
        txn.payee.as_deref().is_some_and(|p| self.pattern.is_match(p))
            || self.pattern.is_match(&txn.narration)
    }
}

/// Категоризатор по списку правил: срабатывает первое подошедшее.
///
/// Опознанная запись получает флаг [`Flag::Okay`], тег правила и,
/// если у правила есть счёт, проводку на него без суммы.
#[derive(Debug, Default)]
pub struct RuleCategorizer {
    rules: Vec<Rule>,
}

impl RuleCategorizer {
    pub fn from_rules(rules: &[RuleConfig]) -> Result<Self, ParseError> {
        let rules = rules
            .iter()
            .map(|r| -> Result<Rule, ParseError> {
                Ok(Rule {
                    pattern: RegexBuilder::new(&r.pattern).case_insensitive(true).build()?,
                    account: r.account.clone(),
                    tag: r.tag.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleCategorizer { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Categorizer for RuleCategorizer {
    fn categorize(&self, mut txn: Transaction) -> Transaction {
        let Some(rule) = self.rules.iter().find(|r| r.matches(&txn)) else {
            return txn;
        };
        trace!(pattern = rule.pattern.as_str(), narration = %txn.narration, "rule matched");

        txn.flag = Flag::Okay;
        if let Some(tag) = &rule.tag {
            txn.tags.insert(tag.clone());
        }
        if let Some(account) = &rule.account {
            txn.postings.push(Posting::new(account.clone(), None));
        }
        txn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use chrono::NaiveDate;

    fn txn(payee: &str, narration: &str) -> Transaction {
        Transaction::new(
            Metadata::new(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            Flag::Warning,
            Some(payee.to_string()),
            narration.to_string(),
        )
    }

    fn rule(pattern: &str, account: Option<&str>, tag: Option<&str>) -> RuleConfig {
        RuleConfig {
            pattern: pattern.into(),
            account: account.map(Into::into),
            tag: tag.map(Into::into),
        }
    }

    #[test]
    fn identity_leaves_record_alone() {
        let t = txn("TESCO", "LONDON");
        assert_eq!(Identity.categorize(t.clone()), t);
    }

    #[test]
    fn first_matching_rule_wins() {
        let cat = RuleCategorizer::from_rules(&[
            rule("^tesco", Some("Expenses:Groceries"), Some("food")),
            rule("tesco", Some("Expenses:Other"), None),
        ])
        .unwrap();

        let t = cat.categorize(txn("TESCO STORES 2231", "LONDON"));
        assert_eq!(t.flag, Flag::Okay);
        assert!(t.tags.contains("food"));
        assert_eq!(t.postings, vec![Posting::new("Expenses:Groceries".into(), None)]);
    }

    #[test]
    fn matches_narration_too() {
        let cat = RuleCategorizer::from_rules(&[rule("amsterdam", None, Some("travel"))]).unwrap();
        let t = cat.categorize(txn("NETFLIX.COM", "AMSTERDAM"));
        assert_eq!(t.flag, Flag::Okay);
        assert!(t.postings.is_empty());
    }

    #[test]
    fn unmatched_record_keeps_pending_flag() {
        let cat = RuleCategorizer::from_rules(&[rule("netflix", None, None)]).unwrap();
        let t = cat.categorize(txn("TESCO", "LONDON"));
        assert_eq!(t.flag, Flag::Warning);
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let err = RuleCategorizer::from_rules(&[rule("(", None, None)]).unwrap_err();
        assert!(matches!(err, ParseError::Config(_)));
    }
}
