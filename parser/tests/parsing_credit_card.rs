use chrono::NaiveDate;
use lloyds_parser::categorizer::RuleConfig;
use lloyds_parser::credit_card_pdf::classifier::ProductVariant;
use lloyds_parser::credit_card_pdf::layout::{LayoutPath, resolve_document};
use lloyds_parser::{
    Amount, Classification, CreditCardImporter, Currency, Document, Extractor, Flag, MetaValue,
    ParseError, RuleCategorizer, Transaction,
};
use std::path::PathBuf;

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn load_fixture(rel: &str) -> Document {
    let path = fixture_path(rel);
    let text = std::fs::read(&path)
        .unwrap_or_else(|e| panic!("failed to open card fixture {path:?}: {e}"));
    Document::from_text(&text)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn gbp(minor: i64) -> Amount {
    Amount::new(minor, Currency::GBP)
}

fn card_meta(txn: &Transaction) -> Option<&str> {
    match txn.meta.get("card") {
        Some(MetaValue::Text(card)) => Some(card),
        _ => None,
    }
}

const ACCOUNT: &str = "Liabilities:Lloyds:CreditCard";

#[test]
fn rewards_statement_is_accepted() {
    let doc = load_fixture("card/rewards_merged_header.txt");
    let importer = CreditCardImporter::new(ACCOUNT, "56789");

    match importer.identify(&doc) {
        Classification::Accepted(id) => {
            assert_eq!(id.variant, ProductVariant::RewardsOrCashback);
            assert_eq!(id.account_suffix, "56789");
            assert_eq!(id.period_end, date(2023, 1, 15));
        }
        other => panic!("expected accepted, got {other:?}"),
    }
    assert_eq!(importer.file_date(&doc), Some(date(2023, 1, 15)));
}

#[test]
fn statement_for_another_account_is_rejected() {
    let doc = load_fixture("card/rewards_merged_header.txt");
    let importer = CreditCardImporter::new(ACCOUNT, "00000");
    assert_eq!(importer.identify(&doc), Classification::Rejected);
}

#[test]
fn unrelated_document_is_rejected() {
    let doc = load_fixture("card/unrelated.txt");
    let importer = CreditCardImporter::new(ACCOUNT, "56789");
    assert_eq!(importer.identify(&doc), Classification::Rejected);
    assert_eq!(importer.file_date(&doc), None);
}

#[test]
fn merged_header_statement_extracts_card_transactions() {
    let doc = load_fixture("card/rewards_merged_header.txt");
    assert_eq!(resolve_document(&doc).map(|c| c.path), Some(LayoutPath::MergedHeader));

    let importer = CreditCardImporter::new(ACCOUNT, "56789");
    let entries = importer.extract(&doc, "statement.txt").expect("extract failed");

    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    // январская выписка: декабрьская операция уходит в прошлый год
    assert_eq!(first.date, date(2022, 12, 30));
    assert_eq!(first.payee.as_deref(), Some("NETFLIX.COM"));
    assert_eq!(first.narration, "AMSTERDAM");
    assert_eq!(first.flag, Flag::Warning);
    assert_eq!(card_meta(first), Some("A"));
    assert_eq!(first.meta.get("lineno"), Some(&MetaValue::Number(1)));
    assert_eq!(
        first.meta.get("filename"),
        Some(&MetaValue::Text("statement.txt".into()))
    );
    assert_eq!(first.postings.len(), 1);
    assert_eq!(first.postings[0].account, ACCOUNT);
    assert_eq!(first.amount(), Some(&gbp(-999)));

    let second = &entries[1];
    assert_eq!(second.date, date(2023, 1, 2));
    assert_eq!(second.payee.as_deref(), Some("SAINSBURYS"));
    assert_eq!(second.narration, "LEEDS");
    assert_eq!(card_meta(second), Some("M"));
    assert_eq!(second.amount(), Some(&gbp(-5410)));
}

#[test]
fn categorizer_sees_every_transaction() {
    let doc = load_fixture("card/rewards_merged_header.txt");
    let rules = RuleCategorizer::from_rules(&[RuleConfig {
        pattern: "netflix".into(),
        account: Some("Expenses:Streaming".into()),
        tag: Some("subscriptions".into()),
    }])
    .unwrap();
    let importer = CreditCardImporter::new(ACCOUNT, "56789").with_categorizer(rules);

    let entries = importer.extract(&doc, "statement.txt").unwrap();

    let netflix = &entries[0];
    assert_eq!(netflix.flag, Flag::Okay);
    assert!(netflix.tags.contains("subscriptions"));
    let accounts: Vec<&str> = netflix.postings.iter().map(|p| p.account.as_str()).collect();
    assert_eq!(accounts, ["Expenses:Streaming", ACCOUNT]);
    assert_eq!(netflix.amount(), Some(&gbp(-999)));

    let other = &entries[1];
    assert_eq!(other.flag, Flag::Warning);
    assert!(other.tags.is_empty());
    assert_eq!(other.postings.len(), 1);
}

#[test]
fn amount_after_balance_statement_without_cards() {
    let doc = load_fixture("card/cashback_amount_after_balance.txt");
    assert_eq!(
        resolve_document(&doc).map(|c| c.path),
        Some(LayoutPath::AmountAfterBalance)
    );

    let importer = CreditCardImporter::new(ACCOUNT, "12345");
    assert!(importer.identify(&doc).is_accepted());

    let entries = importer.extract(&doc, "cashback.txt").unwrap();
    let summary: Vec<(NaiveDate, &str, &str, Option<&Amount>)> = entries
        .iter()
        .map(|t| (t.date, t.payee.as_deref().unwrap(), t.narration.as_str(), t.amount()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (date(2023, 1, 12), "TESCO STORES 2231", "LONDON", Some(&gbp(-2340))),
            // возврат (CR) уменьшает долг по карте
            (date(2023, 2, 3), "AMAZON.CO.UK", "READING", Some(&gbp(10000))),
        ]
    );
    assert!(entries.iter().all(|t| !t.meta.contains_key("card")));
}

#[test]
fn duo_statement_skips_country_codes() {
    let doc = load_fixture("card/duo_country_codes.txt");
    assert_eq!(
        resolve_document(&doc).map(|c| c.path),
        Some(LayoutPath::MergedHeaderCountryCodes)
    );

    let importer = CreditCardImporter::new(ACCOUNT, "54321");
    match importer.identify(&doc) {
        Classification::Accepted(id) => {
            assert_eq!(id.variant, ProductVariant::Duo);
            assert_eq!(id.period_end, date(2023, 2, 28));
        }
        other => panic!("expected accepted, got {other:?}"),
    }

    let entries = importer.extract(&doc, "duo.txt").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].date, date(2023, 1, 30));
    assert_eq!(entries[0].payee.as_deref(), Some("BOOKING.COM"));
    assert_eq!(entries[0].amount(), Some(&gbp(-8500)));
    assert_eq!(entries[1].date, date(2023, 2, 2));
    assert_eq!(entries[1].narration, "BERLIN");
    assert_eq!(entries[1].amount(), Some(&gbp(1250)));
}

#[test]
fn unrecognised_layout_gives_no_transactions() {
    let doc = load_fixture("card/rewards_missing_anchor.txt");
    let importer = CreditCardImporter::new(ACCOUNT, "56789");

    // выписка своя, но таблицу разобрать нельзя
    assert!(importer.identify(&doc).is_accepted());
    assert_eq!(resolve_document(&doc), None);
    assert!(importer.extract(&doc, "statement.txt").unwrap().is_empty());
}

#[test]
fn import_path_runs_the_whole_pipeline_on_text() {
    let importer = CreditCardImporter::new(ACCOUNT, "56789").with_currency(Currency::EUR);
    let path = fixture_path("card/rewards_merged_header.txt");

    let entries = importer.import_path(&path, &Extractor::default()).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].meta.get("filename"),
        Some(&MetaValue::Text(path.display().to_string()))
    );
    assert_eq!(entries[0].amount(), Some(&Amount::new(-999, Currency::EUR)));
}

#[test]
fn import_path_ignores_foreign_statements() {
    let importer = CreditCardImporter::new(ACCOUNT, "99999");
    let path = fixture_path("card/cashback_amount_after_balance.txt");
    assert!(importer.import_path(&path, &Extractor::default()).unwrap().is_empty());
}

#[test]
fn import_path_reports_undecodable_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(
        &path,
        b"Lloyds Bank Cashback\nYour credit card statement\n14 February 2023\n\
          Next month's estimated interest\nx\nAccount number \xff\xfe345\x0cterms\x0c",
    )
    .unwrap();

    let importer = CreditCardImporter::new(ACCOUNT, "12345");
    let err = importer.import_path(&path, &Extractor::default()).unwrap_err();
    assert!(matches!(err, ParseError::Undetermined(_)), "got {err:?}");
}

#[test]
fn import_path_reports_oversized_amount() {
    let text = std::fs::read_to_string(fixture_path("card/rewards_merged_header.txt")).unwrap();
    let text = text.replace("\n 9.99\n", "\n  999999999999999999\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.txt");
    std::fs::write(&path, text).unwrap();

    let importer = CreditCardImporter::new(ACCOUNT, "56789");
    let err = importer.import_path(&path, &Extractor::default()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidAmount(_)), "got {err:?}");
}

#[test]
fn missing_file_gives_empty_result() {
    let importer = CreditCardImporter::new(ACCOUNT, "12345");
    let path = fixture_path("card/does_not_exist.txt");
    assert!(importer.import_path(&path, &Extractor::default()).unwrap().is_empty());
}
