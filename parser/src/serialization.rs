use std::io::Write;
use crate::error::ParseError;
use crate::model::{Posting, Transaction};

/// Метаданные, которые beancount не печатает (служебные, источник записи)
const HIDDEN_META: [&str; 2] = ["filename", "lineno"];

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn write_posting<W: Write>(writer: &mut W, posting: &Posting) -> Result<(), ParseError> {
    match &posting.units {
        Some(units) => writeln!(writer, "  {:<50} {}", posting.account, units)?,
        None => writeln!(writer, "  {}", posting.account)?,
    }
    Ok(())
}

impl Transaction {
    /// Записывает транзакцию в синтаксисе beancount
    pub fn write_beancount<W: Write>(&self, writer: &mut W) -> Result<(), ParseError> {
        write!(writer, "{} {}", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            write!(writer, " {}", quote(payee))?;
        }
        write!(writer, " {}", quote(&self.narration))?;
        for tag in &self.tags {
            write!(writer, " #{tag}")?;
        }
        for link in &self.links {
            write!(writer, " ^{link}")?;
        }
        writeln!(writer)?;

        for (key, value) in &self.meta {
            if HIDDEN_META.contains(&key.as_str()) {
                continue;
            }
            writeln!(writer, "  {key}: {value}")?;
        }

        for posting in &self.postings {
            write_posting(writer, posting)?;
        }
        Ok(())
    }
}

/// Записывает список транзакций, разделяя их пустой строкой
pub fn write_beancount<W: Write>(entries: &[Transaction], mut writer: W) -> Result<(), ParseError> {
    for (idx, txn) in entries.iter().enumerate() {
        if idx > 0 {
            writeln!(writer)?;
        }
        txn.write_beancount(&mut writer)?;
    }
    writer.flush()?;
    Ok(())
}
