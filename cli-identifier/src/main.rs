use clap::Parser;
use lloyds_parser::{Classification, CreditCardImporter, ImporterConfig, ParseError};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lloyds-identify",
    version,
    about = "Reports which files are Lloyds credit card statements, their period end and archive name.",
    long_about = None,
)]
struct Args {
    /// Файл настроек (TOML)
    #[arg(long, conflicts_with = "suffix")]
    config: Option<PathBuf>,

    /// Последние 5 цифр номера счёта, если файла настроек нет
    #[arg(long, required_unless_present = "config")]
    suffix: Option<String>,

    /// Входные файлы: PDF или вывод pdf2txt (.txt)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ParseError> {
    let args = Args::parse();

    let (importer, extractor) = match (&args.config, &args.suffix) {
        (Some(path), _) => {
            let config = ImporterConfig::load(path)?;
            (CreditCardImporter::from_config(&config)?, config.extractor)
        }
        (None, Some(suffix)) => (
            CreditCardImporter::new("Liabilities:CreditCard", suffix.as_str()),
            Default::default(),
        ),
        (None, None) => return Err(ParseError::MissingField("suffix")),
    };

    for path in &args.inputs {
        let doc = match extractor.load(path) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %path.display(), "text extraction failed: {err}");
                println!("{}\tunreadable", path.display());
                continue;
            }
        };

        match importer.identify(&doc) {
            Classification::Accepted(id) => println!(
                "{}\tmatch\t{:?}\t{}\t{}",
                path.display(),
                id.variant,
                id.period_end,
                importer.file_name(path),
            ),
            Classification::Rejected => println!("{}\tno", path.display()),
            Classification::Undetermined(reason) => {
                println!("{}\tundetermined\t{reason}", path.display())
            }
        }
    }

    Ok(())
}
