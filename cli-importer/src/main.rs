use clap::{Parser, ValueEnum};
use lloyds_parser::{
    CreditCardImporter, CurrentAccountImporter, ImporterConfig, ParseError, Transaction,
    serialization::write_beancount,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lloyds-import",
    version,
    about = "Extracts transactions from Lloyds statements and prints them as beancount entries.",
    long_about = None,
)]
struct Args {
    /// Файл настроек (TOML)
    #[arg(long)]
    config: PathBuf,

    /// Тип входных файлов; по умолчанию определяется по расширению
    #[arg(long, value_enum, default_value_t = Kind::Auto)]
    kind: Kind,

    /// Входные файлы: PDF, вывод pdf2txt (.txt) или CSV
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// Поддерживаемые виды выписок
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Auto,
    Card,
    Csv,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("{failed} file(s) failed");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}

fn kind_of(path: &Path, requested: Kind) -> Kind {
    match requested {
        Kind::Auto => {
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv { Kind::Csv } else { Kind::Card }
        }
        other => other,
    }
}

fn import_csv(
    path: &Path,
    config: &ImporterConfig,
) -> Result<Vec<Transaction>, ParseError> {
    let Some(account) = &config.csv_account else {
        return Err(ParseError::Config("csv_account is not set".into()));
    };
    let importer = CurrentAccountImporter::new(account)
        .with_currency(config.currency())
        .with_flag(config.flag)
        .with_categorizer(config.categorizer()?);

    if !importer.identify(BufReader::new(File::open(path)?))? {
        info!(path = %path.display(), "not a current account export, skipping");
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    importer.extract(reader, &path.display().to_string())
}

fn run() -> Result<usize, ParseError> {
    let args = Args::parse();
    let config = ImporterConfig::load(&args.config)?;
    let card = CreditCardImporter::from_config(&config)?;

    let mut entries = Vec::new();
    let mut failed = 0;

    // один сломанный файл не должен останавливать остальные
    for path in &args.inputs {
        let result = match kind_of(path, args.kind) {
            Kind::Csv => import_csv(path, &config),
            _ => card.import_path(path, &config.extractor),
        };

        match result {
            Ok(found) => {
                info!(path = %path.display(), count = found.len(), "imported");
                entries.extend(found);
            }
            Err(err) => {
                error!(path = %path.display(), "import failed: {err}");
                failed += 1;
            }
        }
    }

    entries.sort_by_key(|t| t.date);

    let stdout = io::stdout();
    let handle = stdout.lock();
    write_beancount(&entries, handle)?;

    Ok(failed)
}
