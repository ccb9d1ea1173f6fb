use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

/// Ошибки при парсинге данных
#[derive(Debug, Error)]
pub enum ParseError {
    // обёртки

    /// обёртка csv::Error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// обёртка std::io::Error
    #[error("io error: {0}")]
    Io(#[from] IoError),
    /// обёртка std::num::ParseIntError
    #[error("number parse error: {0}")]
    Int(#[from] std::num::ParseIntError),

    // логические ошибки

    /// поле не является корректным UTF-8
    #[error("field is not valid utf-8: {0}")]
    Decode(String),
    /// ошибка при парсинге даты
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// ошибка при парсинге денежной суммы
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// ошибка при проверке двойной записи: и дебет, и кредит, или ни одного
    #[error("both debit and credit amount present or both empty")]
    AmountSideConflict,
    /// ошибка парсинга заголовка (csv)
    #[error("invalid header: {0}")]
    Header(String),
    /// ошибка отсутствия обязательного поля
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// не удалось понять, наша ли это выписка
    #[error("could not determine statement type: {0}")]
    Undetermined(String),
    /// ошибка в файле конфигурации
    #[error("config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ParseError {
    fn from(e: toml::de::Error) -> Self {
        ParseError::Config(e.to_string())
    }
}

impl From<regex::Error> for ParseError {
    fn from(e: regex::Error) -> Self {
        ParseError::Config(format!("bad rule pattern: {e}"))
    }
}

/// Ошибки внешних инструментов извлечения текста (`file`, `pdf2txt.py`)
///
/// Для импортёров любая из них означает "страниц нет": файл пропускается,
/// пакетная обработка продолжается.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// не удалось запустить процесс
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: IoError,
    },
    /// процесс завершился с ненулевым кодом
    #[error("{program} exited with status {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// процесс не уложился в таймаут и был убит
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },
    /// `file` не распознал PDF
    #[error("not a PDF document: {}", path.display())]
    NotPdf { path: PathBuf },
    /// ошибка чтения файла
    #[error("io error: {0}")]
    Io(#[from] IoError),
}
