//! Filter/sort pipeline and stats properties
//!
//! Properties are checked over seeded pseudo-random transaction lists, plus
//! the fixed three-transaction dashboard scenarios.
//!
//! Run with: cargo test --test pipeline_tests

use rust_decimal::Decimal;

use vaultline_core::domain::{Transaction, TransactionStats, TransactionType};
use vaultline_core::pipeline::{
    self, SortDirection, SortField, SortState, TransactionFilter,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Deterministic LCG so failures reproduce
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn tx(id: &str, date: &str, kind: TransactionType, amount: i64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: date.to_string(),
        amount: Decimal::from(amount),
        kind,
        description: format!("tx {}", id),
        category: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

/// Random list; small value ranges so duplicate keys are common
fn random_list(rng: &mut SimpleRng) -> Vec<Transaction> {
    let len = rng.below(25) as usize;
    (0..len)
        .map(|i| {
            let kind = if rng.below(2) == 0 {
                TransactionType::Credit
            } else {
                TransactionType::Debit
            };
            let date = match rng.below(10) {
                0 => "not-a-date".to_string(),
                1 => format!("2024-03-{:02}T{:02}:30:00Z", 1 + rng.below(5), rng.below(24)),
                _ => format!("2024-03-{:02}", 1 + rng.below(5)),
            };
            let amount = rng.below(8) as i64 * 25 - 50;
            tx(&i.to_string(), &date, kind, amount)
        })
        .collect()
}

/// List with pairwise distinct keys for every sort field it is used with
fn distinct_list(rng: &mut SimpleRng) -> Vec<Transaction> {
    let len = 1 + rng.below(20) as usize;
    let mut days: Vec<u64> = (1..=28).collect();
    // Fisher-Yates on day numbers so dates and amounts are both unique
    for i in (1..days.len()).rev() {
        let j = rng.below(i as u64 + 1) as usize;
        days.swap(i, j);
    }
    (0..len)
        .map(|i| {
            let day = days[i];
            let kind = if rng.below(2) == 0 {
                TransactionType::Credit
            } else {
                TransactionType::Debit
            };
            tx(&i.to_string(), &format!("2024-02-{:02}", day), kind, (day as i64) * 7 - 60)
        })
        .collect()
}

fn ids(rows: &[&Transaction]) -> Vec<String> {
    rows.iter().map(|t| t.id.clone()).collect()
}

fn scenario() -> Vec<Transaction> {
    vec![
        tx("1", "2024-01-01", TransactionType::Credit, 100),
        tx("2", "2024-01-02", TransactionType::Debit, 50),
        tx("3", "2024-01-03", TransactionType::Credit, 75),
    ]
}

const FIELDS: [SortField; 3] = [SortField::Date, SortField::Amount, SortField::Type];
const FILTERS: [TransactionFilter; 3] = [
    TransactionFilter::All,
    TransactionFilter::Credit,
    TransactionFilter::Debit,
];

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_filter_keeps_exactly_matching_in_order() {
    for seed in 0..200 {
        let list = random_list(&mut SimpleRng::new(seed));
        for f in FILTERS {
            let expected: Vec<String> = list
                .iter()
                .filter(|t| match f {
                    TransactionFilter::All => true,
                    TransactionFilter::Credit => t.kind == TransactionType::Credit,
                    TransactionFilter::Debit => t.kind == TransactionType::Debit,
                })
                .map(|t| t.id.clone())
                .collect();
            assert_eq!(ids(&pipeline::filter(&list, f)), expected, "seed {}", seed);
        }
    }
}

#[test]
fn test_sort_is_idempotent() {
    for seed in 0..200 {
        let list = random_list(&mut SimpleRng::new(seed));
        for field in FIELDS {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let sort = SortState::new(field, direction);
                let once: Vec<Transaction> = pipeline::apply(&list, TransactionFilter::All, sort)
                    .into_iter()
                    .cloned()
                    .collect();
                let twice = pipeline::apply(&once, TransactionFilter::All, sort);
                assert_eq!(
                    ids(&twice),
                    once.iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
                    "seed {} {:?}",
                    seed,
                    sort
                );
            }
        }
    }
}

#[test]
fn test_asc_reversed_equals_desc_without_duplicate_keys() {
    for seed in 0..200 {
        let list = distinct_list(&mut SimpleRng::new(seed));
        for field in [SortField::Date, SortField::Amount] {
            let mut asc = ids(&pipeline::apply(
                &list,
                TransactionFilter::All,
                SortState::new(field, SortDirection::Asc),
            ));
            let desc = ids(&pipeline::apply(
                &list,
                TransactionFilter::All,
                SortState::new(field, SortDirection::Desc),
            ));
            asc.reverse();
            assert_eq!(asc, desc, "seed {} {:?}", seed, field);
        }
    }
}

#[test]
fn test_ties_keep_relative_order_in_both_directions() {
    let list = vec![
        tx("a", "2024-01-01", TransactionType::Debit, 10),
        tx("b", "2024-01-02", TransactionType::Debit, 10),
        tx("c", "2024-01-03", TransactionType::Credit, 5),
    ];
    let asc = pipeline::apply(
        &list,
        TransactionFilter::All,
        SortState::new(SortField::Amount, SortDirection::Asc),
    );
    let desc = pipeline::apply(
        &list,
        TransactionFilter::All,
        SortState::new(SortField::Amount, SortDirection::Desc),
    );
    assert_eq!(ids(&asc), vec!["c", "a", "b"]);
    assert_eq!(ids(&desc), vec!["a", "b", "c"]);
}

#[test]
fn test_source_is_not_mutated() {
    let list = scenario();
    let before = list.clone();
    let _ = pipeline::apply(
        &list,
        TransactionFilter::Debit,
        SortState::new(SortField::Amount, SortDirection::Desc),
    );
    assert_eq!(list, before);
}

#[test]
fn test_toggle_properties() {
    for start_field in FIELDS {
        for start_dir in [SortDirection::Asc, SortDirection::Desc] {
            let start = SortState::new(start_field, start_dir);

            let mut twice = start;
            twice.toggle(start_field);
            twice.toggle(start_field);
            assert_eq!(twice, start);

            for other in FIELDS.into_iter().filter(|f| *f != start_field) {
                let mut switched = start;
                switched.toggle(other);
                assert_eq!(switched, SortState::new(other, SortDirection::Asc));
            }
        }
    }
}

#[test]
fn test_stats_identity() {
    for seed in 0..200 {
        let list = random_list(&mut SimpleRng::new(seed));
        let stats = TransactionStats::from_transactions(&list);

        let income: Decimal = list
            .iter()
            .filter(|t| t.kind == TransactionType::Credit)
            .map(|t| t.amount)
            .sum();
        let expenses: Decimal = list
            .iter()
            .filter(|t| t.kind == TransactionType::Debit)
            .map(|t| t.amount)
            .sum();

        assert_eq!(stats.total_income, income);
        assert_eq!(stats.total_expenses, expenses);
        assert_eq!(stats.total_income - stats.total_expenses, stats.net_balance);
        assert!(stats.is_consistent());
    }
}

// ============================================================================
// Dashboard scenarios
// ============================================================================

#[test]
fn test_scenario_credit_filter() {
    let list = scenario();
    let rows = pipeline::apply(&list, TransactionFilter::Credit, SortState::new(SortField::Date, SortDirection::Asc));
    assert_eq!(ids(&rows), vec!["1", "3"]);

    let unsorted = pipeline::filter(&list, TransactionFilter::Credit);
    assert_eq!(ids(&unsorted), vec!["1", "3"]);
}

#[test]
fn test_scenario_amount_sort_then_toggle() {
    let list = scenario();
    let mut sort = SortState::default();
    sort.toggle(SortField::Amount);

    let amounts: Vec<Decimal> = pipeline::apply(&list, TransactionFilter::All, sort)
        .iter()
        .map(|t| t.amount)
        .collect();
    assert_eq!(amounts, vec![Decimal::from(50), Decimal::from(75), Decimal::from(100)]);

    sort.toggle(SortField::Amount);
    let amounts: Vec<Decimal> = pipeline::apply(&list, TransactionFilter::All, sort)
        .iter()
        .map(|t| t.amount)
        .collect();
    assert_eq!(amounts, vec![Decimal::from(100), Decimal::from(75), Decimal::from(50)]);
}

#[test]
fn test_scenario_default_is_newest_first() {
    let list = scenario();
    let rows = pipeline::apply(&list, TransactionFilter::All, SortState::default());
    assert_eq!(ids(&rows), vec!["3", "2", "1"]);
}
