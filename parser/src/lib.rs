pub mod categorizer;
pub mod config;
pub mod credit_card_pdf;
pub mod current_account_csv;
pub mod error;
pub mod extract;
pub mod model;
pub mod serialization;

mod utils;

pub use crate::categorizer::{Categorizer, Identity, RuleCategorizer};
pub use crate::config::ImporterConfig;
pub use crate::credit_card_pdf::CreditCardImporter;
pub use crate::credit_card_pdf::classifier::Classification;
pub use crate::credit_card_pdf::layout::{ColumnSet, resolve_columns};
pub use crate::current_account_csv::CurrentAccountImporter;
pub use crate::error::{ExtractError, ParseError};
pub use crate::extract::{Document, Extractor};
pub use crate::model::{Amount, Currency, Flag, MetaValue, Posting, Transaction};
pub use crate::utils::{fix_price, parse_date_liberally};
