//! Восстановление колонок таблицы транзакций по позициям меток.
//!
//! `pdf2txt.py` не сохраняет таблицу: колонки выходят друг за другом, а их
//! начало известно только относительно меток "Description", "Amount £" и
//! "New balance". Все смещения подобраны по реальным выпискам и собраны
//! в таблицы ниже; новая раскладка добавляется новой таблицей.

use super::Row;
use crate::extract::{Document, Field, Page};
use crate::utils::{decode, fix_price};
use tracing::{debug, warn};

/// Индекс страницы с транзакциями (0 - сводка, 1 - тарифы)
pub const TRANSACTIONS_PAGE: usize = 2;

pub const DESCRIPTION_LABEL: &[u8] = b"Description";
pub const AMOUNT_LABEL: &[u8] = "Amount £".as_bytes();
pub const NEW_BALANCE_LABEL: &[u8] = b"New balance";

/// Полей заголовка между "Description" и "New balance", не считая строк транзакций
const HEADER_FIELDS: usize = 3;

/// Маркеры платёжной сети, по которым узнаётся колонка карт
const CARD_MARKERS: [&[u8]; 2] = [b"A", b"M"];

/// Позиция колонки относительно "New balance": `nb + per_txn * n + base`
#[derive(Debug, Clone, Copy)]
struct Span {
    per_txn: usize,
    base: usize,
}

impl Span {
    const fn new(per_txn: usize, base: usize) -> Self {
        Span { per_txn, base }
    }

    fn start(self, new_balance: usize, n: usize) -> usize {
        new_balance + self.per_txn * n + self.base
    }
}

/// Где искать суммы
#[derive(Debug, Clone, Copy)]
enum AmountRun {
    /// сразу под меткой "Amount £", через `offset` полей
    AfterLabel { offset: usize },
    /// после колонок описаний, относительно "New balance";
    /// между ними могут быть вкраплены коды стран
    AfterBalance(Span),
}

/// Смещения одной ветки раскладки
#[derive(Debug)]
struct LayoutOffsets {
    /// начало колонки дат относительно "Description"
    dates_after_description: usize,
    /// на сколько уменьшить число транзакций (лишние поля заголовка)
    count_adjust: usize,
    amounts: AmountRun,
}

/// "Amount £" стоит в шапке под "Description", перед "New balance"
const MERGED_HEADER: LayoutOffsets = LayoutOffsets {
    dates_after_description: 4,
    count_adjust: 2,
    amounts: AmountRun::AfterBalance(Span::new(3, 7)),
};

/// "Amount £" идёт после "New balance", суммы лежат прямо под меткой
const AMOUNT_AFTER_BALANCE: LayoutOffsets = LayoutOffsets {
    dates_after_description: 2,
    count_adjust: 0,
    amounts: AmountRun::AfterLabel { offset: 4 },
};

/// Колонки описаний, получателей и карт
#[derive(Debug)]
struct TextColumns {
    cards: Option<Span>,
    descriptions: Span,
    payees: Span,
}

const WITH_CARDS: TextColumns = TextColumns {
    cards: Some(Span::new(1, 2)),
    descriptions: Span::new(2, 4),
    payees: Span::new(3, 4),
};

const WITHOUT_CARDS: TextColumns = TextColumns {
    cards: None,
    descriptions: Span::new(1, 4),
    payees: Span::new(2, 4),
};

const POSTING_DATES: Span = Span::new(0, 2);
const CARD_MARKER: Span = Span::new(1, 5);

/// Какой веткой разобрана страница
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPath {
    /// "Amount £" после "New balance", суммы под меткой
    AmountAfterBalance,
    /// шапка с "Amount £", суммы идут подряд
    MergedHeader,
    /// шапка с "Amount £", перед суммами вкраплены коды стран
    MergedHeaderCountryCodes,
}

/// Колонки таблицы транзакций, все одинаковой длины
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    pub path: LayoutPath,
    pub dates: Vec<Field>,
    pub posting_dates: Vec<Field>,
    pub descriptions: Vec<Field>,
    pub payees: Vec<Field>,
    /// суммы после [`fix_price`]
    pub amounts: Vec<String>,
    pub cards: Vec<Option<Field>>,
}

impl ColumnSet {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn has_cards(&self) -> bool {
        self.cards.iter().any(Option::is_some)
    }

    /// Строки транзакций в порядке колонок
    ///
    /// Колонки собранного вручную набора могут быть разной длины:
    /// строк столько, сколько в самой короткой.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.dates
            .iter()
            .zip(&self.posting_dates)
            .zip(&self.descriptions)
            .zip(&self.payees)
            .zip(&self.amounts)
            .zip(&self.cards)
            .map(|(((((date, posting_date), description), payee), amount), card)| Row {
                date,
                posting_date,
                description,
                payee,
                amount,
                card: card.as_deref(),
            })
    }
}

fn find(page: &[Field], label: &[u8]) -> Option<usize> {
    let pos = page.iter().position(|f| f.as_slice() == label);
    if pos.is_none() {
        debug!(label = %String::from_utf8_lossy(label), "anchor label not found");
    }
    pos
}

/// `n` полей начиная с `start`; `None`, если страница короче
fn take(page: &[Field], start: usize, n: usize) -> Option<Vec<Field>> {
    let column = page.get(start..start.checked_add(n)?).map(<[Field]>::to_vec);
    if column.is_none() {
        debug!(start, n, len = page.len(), "column runs past the end of the page");
    }
    column
}

/// Суммы в ветке с кодами стран.
///
/// Коды (ISO 3166, три буквы) есть не у всех транзакций, и к какой строке
/// относится код, понять нельзя, поэтому пропускаем их все: суммы начинаются
/// после поля с двумя ведущими пробелами.
fn amounts_after_country_codes(page: &[Field], start: usize, n: usize) -> Option<Vec<Field>> {
    let marker = start + page.get(start..)?.iter().position(|f| f.starts_with(b"  "))?;
    let amounts: Vec<Field> = page[marker + 1..]
        .iter()
        .filter(|f| !f.is_empty())
        .take(n)
        .cloned()
        .collect();
    (amounts.len() == n).then_some(amounts)
}

/// Разбирает страницу транзакций на колонки.
///
/// `None` означает, что раскладка не распознана: выписка даст ноль транзакций.
/// Это не ошибка, смещения эмпирические и новые раскладки ожидаемы.
pub fn resolve_columns(page: &Page) -> Option<ColumnSet> {
    let desc_idx = find(page, DESCRIPTION_LABEL)?;
    let amt_idx = find(page, AMOUNT_LABEL)?;
    let nb_idx = find(page, NEW_BALANCE_LABEL)?;

    let n = nb_idx.checked_sub(desc_idx + HEADER_FIELDS)?;

    let offsets = if amt_idx < nb_idx { &MERGED_HEADER } else { &AMOUNT_AFTER_BALANCE };
    let n = n.checked_sub(offsets.count_adjust)?;

    let dates = take(page, desc_idx + offsets.dates_after_description, n)?;

    let (raw_amounts, path) = match offsets.amounts {
        AmountRun::AfterLabel { offset } => {
            (take(page, amt_idx + offset, n)?, LayoutPath::AmountAfterBalance)
        }
        AmountRun::AfterBalance(span) => {
            let start = span.start(nb_idx, n);
            if page.get(start)?.starts_with(b" ") {
                (take(page, start, n)?, LayoutPath::MergedHeader)
            } else {
                let amounts = amounts_after_country_codes(page, start, n)?;
                (amounts, LayoutPath::MergedHeaderCountryCodes)
            }
        }
    };

    let amounts = match raw_amounts
        .iter()
        .map(|f| decode(f).map(fix_price))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(amounts) => amounts,
        Err(e) => {
            warn!("undecodable amount on transactions page: {e}");
            return None;
        }
    };

    let posting_dates = take(page, POSTING_DATES.start(nb_idx, n), n)?;

    let marker = page.get(CARD_MARKER.start(nb_idx, n))?;
    let columns = if CARD_MARKERS.contains(&marker.as_slice()) {
        &WITH_CARDS
    } else {
        &WITHOUT_CARDS
    };

    let descriptions = take(page, columns.descriptions.start(nb_idx, n), n)?;
    let payees = take(page, columns.payees.start(nb_idx, n), n)?;
    let cards = match columns.cards {
        Some(span) => take(page, span.start(nb_idx, n), n)?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; n],
    };

    let set = ColumnSet { path, dates, posting_dates, descriptions, payees, amounts, cards };
    debug!(path = ?set.path, n, cards = set.has_cards(), "resolved transaction columns");
    Some(set)
}

/// То же для документа целиком: берёт страницу транзакций
pub fn resolve_document(doc: &Document) -> Option<ColumnSet> {
    let Some(page) = doc.page(TRANSACTIONS_PAGE) else {
        warn!(pages = doc.pages.len(), "document has no transactions page");
        return None;
    };
    let set = resolve_columns(page);
    if set.is_none() {
        warn!("transactions page layout not recognised, no transactions extracted");
    }
    set
}
