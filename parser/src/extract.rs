//! Извлечение текстовых полей из PDF-выписки.
//!
//! Сам PDF не парсится: `pdf2txt.py` печатает текстовые фрагменты в порядке
//! их появления в документе, страницы разделены `\f`, поля - `\n`.
//! Для разработки можно заранее сохранить этот вывод в `.txt` и подавать его.

use crate::error::ExtractError;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Одно текстовое поле, как его выдал экстрактор (сырые байты)
pub type Field = Vec<u8>;

/// Страница: поля в порядке вывода экстрактора
pub type Page = Vec<Field>;

/// Результат извлечения одного файла.
///
/// Передаётся явно между классификатором и разбором раскладки, так что
/// внешний инструмент вызывается не больше одного раза на файл.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Режет вывод экстрактора на страницы (`\f`) и поля (`\n`)
    pub fn from_text(text: &[u8]) -> Self {
        let pages = text
            .split(|b| *b == b'\x0c')
            .map(|page| page.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect())
            .collect();
        Document { pages }
    }

    pub fn page(&self, idx: usize) -> Option<&Page> {
        self.pages.get(idx)
    }
}

fn default_pdf2txt() -> String {
    "pdf2txt.py".to_string()
}

fn default_file_cmd() -> String {
    "file".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Настройки внешних инструментов
#[derive(Debug, Clone, Deserialize)]
pub struct Extractor {
    /// программа, печатающая текстовые поля PDF
    #[serde(default = "default_pdf2txt")]
    pub pdf2txt: String,
    /// программа определения типа файла
    #[serde(default = "default_file_cmd")]
    pub file_cmd: String,
    /// таймаут на каждый вызов, в секундах
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor {
            pdf2txt: default_pdf2txt(),
            file_cmd: default_file_cmd(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Extractor {
    /// Загружает документ: `.txt` читается как готовый вывод экстрактора,
    /// всё остальное проверяется через `file` и прогоняется через `pdf2txt`.
    pub fn load(&self, path: &Path) -> Result<Document, ExtractError> {
        if is_pre_extracted(path) {
            debug!(path = %path.display(), "reading pre-extracted text");
            let text = std::fs::read(path)?;
            return Ok(Document::from_text(&text));
        }

        let check_type = self.run(&self.file_cmd, path)?;
        if !check_type
            .windows(b"PDF document".len())
            .any(|w| w == b"PDF document")
        {
            return Err(ExtractError::NotPdf { path: path.to_path_buf() });
        }

        let text = self.run(&self.pdf2txt, path)?;
        Ok(Document::from_text(&text))
    }

    /// Запускает программу с путём в аргументах и возвращает её stdout
    ///
    /// Процесс убивается, если не завершился за `timeout_secs`.
    fn run(&self, program: &str, path: &Path) -> Result<Vec<u8>, ExtractError> {
        debug!(program, path = %path.display(), "running external tool");

        let mut child = Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExtractError::Spawn { program: program.to_string(), source })?;

        // пайпы читаем в отдельных потоках, чтобы ребёнок не встал на полном буфере
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + Duration::from_secs(self.timeout_secs);
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(program, secs = self.timeout_secs, "external tool timed out, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExtractError::Timeout {
                    program: program.to_string(),
                    secs: self.timeout_secs,
                });
            }
            thread::sleep(Duration::from_millis(20));
        };

        let out = stdout.join().unwrap_or_default();

        if !status.success() {
            let stderr = stderr.join().unwrap_or_default();
            return Err(ExtractError::Failed {
                program: program.to_string(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(out)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// `.txt` означает заранее извлечённый текст
pub fn is_pre_extracted(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Имя файла для метаданных записи
pub(crate) fn source_name(path: &Path) -> String {
    path.display().to_string()
}
