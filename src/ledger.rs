// 📒 Ledger Store - the canonical expense collection and filter selection
//
// Records are kept newest-first. Every mutator validates before touching
// state, so a failed call leaves the ledger exactly as it was. Derived views
// (filtered list, total, stats) are recomputed on every call.

use crate::category::{Category, Filter};
use crate::error::LedgerResult;
use crate::expense::{parse_amount, parse_description, Expense, ExpenseId, ExpenseUpdate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Default page size for `query`
pub const DEFAULT_LIMIT: usize = 100;
/// Largest page `query` will return
pub const MAX_LIMIT: usize = 1000;

// ============================================================================
// DERIVED VIEW TYPES
// ============================================================================

/// Total and count over the filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub total: f64,
    pub count: usize,
    pub percentage: f64,
}

/// Breakdown of the whole ledger by category, largest total first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_amount: f64,
    pub total_expenses: usize,
    pub categories: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Amount,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sorted, paginated listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    pub filter: Filter,
    pub sort_by: SortBy,
    pub order: SortOrder,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        ExpenseQuery {
            filter: Filter::All,
            sort_by: SortBy::Date,
            order: SortOrder::Desc,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

// ============================================================================
// LEDGER STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    /// Newest-first
    records: Vec<Expense>,
    active_filter: Filter,
}

impl LedgerStore {
    /// Empty ledger with the "All" filter
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Validate form input and prepend a new expense.
    ///
    /// Empty amount or description yields `MissingField`; a description over
    /// MAX_DESCRIPTION_LEN characters yields `TooLong`; amount text that is
    /// not a finite number above zero yields `InvalidAmount`.
    pub fn add_expense(
        &mut self,
        amount_input: &str,
        description_input: &str,
        category: Category,
    ) -> LedgerResult<&Expense> {
        let validated = parse_description(description_input)
            .and_then(|description| parse_amount(amount_input).map(|amount| (amount, description)));

        let (amount, description) = match validated {
            Ok(values) => values,
            Err(e) => {
                debug!(error = %e, "rejected expense input");
                return Err(e);
            }
        };

        let expense = Expense::new(amount, description, category);
        debug!(id = %expense.id, amount, category = %category, "expense added");
        self.records.insert(0, expense);
        Ok(&self.records[0])
    }

    /// Remove the record with `id`. Missing ids are ignored.
    ///
    /// The caller is responsible for asking the user first.
    pub fn delete_expense(&mut self, id: ExpenseId) -> bool {
        match self.records.iter().position(|e| e.id == id) {
            Some(index) => {
                let removed = self.records.remove(index);
                debug!(id = %removed.id, amount = removed.amount, "expense deleted");
                true
            }
            None => false,
        }
    }

    /// Edit an existing record in place. Returns `Ok(None)` for unknown ids.
    ///
    /// All supplied fields are validated before any of them is applied.
    pub fn update_expense(
        &mut self,
        id: ExpenseId,
        update: ExpenseUpdate,
    ) -> LedgerResult<Option<&Expense>> {
        let Some(index) = self.records.iter().position(|e| e.id == id) else {
            return Ok(None);
        };

        // Description before amount, matching add_expense
        let description = update
            .description
            .as_deref()
            .map(parse_description)
            .transpose()?;
        let amount = update.amount.as_deref().map(parse_amount).transpose()?;

        let expense = &mut self.records[index];
        if let Some(amount) = amount {
            expense.amount = amount;
        }
        if let Some(description) = description {
            expense.description = description;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        debug!(id = %expense.id, "expense updated");

        Ok(Some(&self.records[index]))
    }

    /// Delete every record inside `scope`, returning how many went
    pub fn clear(&mut self, scope: Filter) -> usize {
        let before = self.records.len();
        self.records.retain(|e| !scope.matches(e.category));
        let removed = before - self.records.len();
        debug!(scope = %scope, removed, "ledger cleared");
        removed
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if self.active_filter != filter {
            debug!(from = %self.active_filter, to = %filter, "filter changed");
        }
        self.active_filter = filter;
    }

    /// Set the filter from text. Unknown values are ignored and `false` is
    /// returned; the filter only ever holds "All" or a real category.
    pub fn set_filter_str(&mut self, value: &str) -> bool {
        match value.parse::<Filter>() {
            Ok(filter) => {
                self.set_filter(filter);
                true
            }
            Err(_) => {
                debug!(value, "ignored unknown filter");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn active_filter(&self) -> Filter {
        self.active_filter
    }

    /// Every record, newest-first, regardless of filter
    pub fn records(&self) -> &[Expense] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.records.iter().find(|e| e.id == id)
    }

    /// Records matching the active filter, newest-first
    pub fn filtered_records(&self) -> Vec<&Expense> {
        self.records_in(self.active_filter).collect()
    }

    /// Sum of amounts over the filtered view; 0 when nothing matches
    pub fn total(&self) -> f64 {
        self.records_in(self.active_filter).map(|e| e.amount).sum()
    }

    pub fn summary(&self) -> Summary {
        self.summary_for(self.active_filter)
    }

    /// Total and count for an explicit filter, ignoring the active one
    pub fn summary_for(&self, filter: Filter) -> Summary {
        let (total, count) = self
            .records_in(filter)
            .fold((0.0, 0), |(total, count), e| (total + e.amount, count + 1));
        Summary {
            total,
            count,
            filter,
        }
    }

    /// Per-category breakdown over every record
    pub fn category_stats(&self) -> Stats {
        let mut by_category: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
        for e in &self.records {
            let entry = by_category.entry(e.category).or_insert((0.0, 0));
            entry.0 += e.amount;
            entry.1 += 1;
        }

        let total_amount: f64 = self.records.iter().map(|e| e.amount).sum();

        let mut categories: Vec<CategoryStats> = by_category
            .into_iter()
            .map(|(category, (total, count))| {
                let percentage = if total_amount > 0.0 {
                    (total / total_amount * 100.0 * 100.0).round() / 100.0
                } else {
                    0.0
                };
                CategoryStats {
                    category,
                    total,
                    count,
                    percentage,
                }
            })
            .collect();

        categories.sort_by(|a, b| b.total.total_cmp(&a.total));

        Stats {
            total_amount,
            total_expenses: self.records.len(),
            categories,
        }
    }

    /// Sorted and paginated listing. `limit` is clamped to 1..=MAX_LIMIT.
    pub fn query(&self, query: &ExpenseQuery) -> Vec<Expense> {
        // Position in `records` is the recency tiebreak (lower is newer)
        let mut rows: Vec<(usize, &Expense)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, e)| query.filter.matches(e.category))
            .collect();

        rows.sort_by(|(pa, a), (pb, b)| {
            let primary = match query.sort_by {
                SortBy::Date => b.created_at.cmp(&a.created_at).then(pa.cmp(pb)),
                SortBy::Amount => b.amount.total_cmp(&a.amount),
                SortBy::Category => b.category.as_str().cmp(a.category.as_str()),
            };
            let ordered = match query.order {
                SortOrder::Desc => primary,
                SortOrder::Asc => primary.reverse(),
            };
            if ordered == Ordering::Equal {
                pa.cmp(pb)
            } else {
                ordered
            }
        });

        let limit = query.limit.clamp(1, MAX_LIMIT);
        rows.into_iter()
            .skip(query.offset)
            .take(limit)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn records_in(&self, filter: Filter) -> impl Iterator<Item = &Expense> + '_ {
        self.records.iter().filter(move |e| filter.matches(e.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::expense::MAX_DESCRIPTION_LEN;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ids(records: &[&Expense]) -> Vec<ExpenseId> {
        records.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_add_prepends_and_preserves_values() {
        let mut store = LedgerStore::new();
        store.add_expense("5", "Coffee", Category::Food).unwrap();
        let id = store.add_expense(" 12.50 ", "  Lunch  ", Category::Food).unwrap().id;

        let records = store.filtered_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].amount, 12.5);
        assert_eq!(records[0].description, "Lunch");
        assert_eq!(records[0].category, Category::Food);
        assert_eq!(records[1].description, "Coffee");
    }

    #[test]
    fn test_newest_is_always_first() {
        let mut store = LedgerStore::new();
        for i in 1..=5 {
            let id = store
                .add_expense(&i.to_string(), &format!("item {}", i), Category::Other)
                .unwrap()
                .id;
            assert_eq!(store.filtered_records()[0].id, id);
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_invalid_input_mutates_nothing() {
        let mut store = LedgerStore::new();
        store.add_expense("3", "Bus", Category::Transportation).unwrap();

        assert_eq!(
            store.add_expense("10", "   ", Category::Food).unwrap_err(),
            LedgerError::missing("description")
        );
        assert_eq!(
            store.add_expense("", "Lunch", Category::Food).unwrap_err(),
            LedgerError::missing("amount")
        );
        assert_eq!(
            store.add_expense("abc", "Lunch", Category::Food).unwrap_err(),
            LedgerError::invalid_amount("abc")
        );
        assert!(matches!(
            store.add_expense("-4", "Lunch", Category::Food),
            Err(LedgerError::InvalidAmount { .. })
        ));

        assert_eq!(store.len(), 1);
        assert!(approx(store.total(), 3.0));
    }

    #[test]
    fn test_delete_preserves_order_and_is_idempotent() {
        let mut store = LedgerStore::new();
        let a = store.add_expense("1", "a", Category::Food).unwrap().id;
        let b = store.add_expense("2", "b", Category::Bills).unwrap().id;
        let c = store.add_expense("4", "c", Category::Health).unwrap().id;
        let total_before = store.total();

        assert!(store.delete_expense(b));
        assert_eq!(ids(&store.filtered_records()), vec![c, a]);
        assert!(approx(store.total(), total_before - 2.0));

        assert!(!store.delete_expense(b));
        assert_eq!(ids(&store.filtered_records()), vec![c, a]);
    }

    #[test]
    fn test_lunch_and_taxi_scenario() {
        let mut store = LedgerStore::new();
        let lunch = store.add_expense("12.50", "Lunch", Category::Food).unwrap().id;
        store.add_expense("40.00", "Taxi", Category::Transportation).unwrap();

        store.set_filter(Filter::Category(Category::Food));
        assert_eq!(ids(&store.filtered_records()), vec![lunch]);
        assert!(approx(store.total(), 12.50));

        store.set_filter(Filter::All);
        assert!(approx(store.total(), 52.50));
    }

    #[test]
    fn test_total_matches_filtered_sum() {
        let mut store = LedgerStore::new();
        assert_eq!(store.total(), 0.0);

        store.add_expense("10", "a", Category::Food).unwrap();
        store.add_expense("2.25", "b", Category::Food).unwrap();
        store.add_expense("7", "c", Category::Shopping).unwrap();

        for filter in Filter::choices() {
            store.set_filter(filter);
            let expected: f64 = store
                .records()
                .iter()
                .filter(|e| filter.matches(e.category))
                .map(|e| e.amount)
                .sum();
            assert!(approx(store.total(), expected), "filter {}", filter);
        }

        store.set_filter(Filter::Category(Category::Health));
        assert!(store.filtered_records().is_empty());
        assert_eq!(store.total(), 0.0);
    }

    #[test]
    fn test_set_filter_str_rejects_unknown() {
        let mut store = LedgerStore::new();
        assert!(store.set_filter_str("Bills"));
        assert_eq!(store.active_filter(), Filter::Category(Category::Bills));

        assert!(!store.set_filter_str("Groceries"));
        assert_eq!(store.active_filter(), Filter::Category(Category::Bills));

        assert!(store.set_filter_str("all"));
        assert_eq!(store.active_filter(), Filter::All);
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut store = LedgerStore::new();
        let id = store.add_expense("8", "Cinema", Category::Entertainment).unwrap().id;
        let created_at = store.get(id).unwrap().created_at;

        let err = store
            .update_expense(
                id,
                ExpenseUpdate {
                    amount: Some("oops".into()),
                    description: Some("Movie night".into()),
                    category: Some(Category::Other),
                },
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::invalid_amount("oops"));
        assert_eq!(store.get(id).unwrap().description, "Cinema");

        let updated = store
            .update_expense(
                id,
                ExpenseUpdate {
                    amount: Some("9.5".into()),
                    description: Some(" Movie night ".into()),
                    category: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.amount, 9.5);
        assert_eq!(updated.description, "Movie night");
        assert_eq!(updated.category, Category::Entertainment);
        assert_eq!(updated.created_at, created_at);

        assert_eq!(
            store.update_expense(ExpenseId::new(), ExpenseUpdate::default()),
            Ok(None)
        );
    }

    #[test]
    fn test_update_keeps_position() {
        let mut store = LedgerStore::new();
        let a = store.add_expense("1", "a", Category::Food).unwrap().id;
        let b = store.add_expense("2", "b", Category::Food).unwrap().id;
        store
            .update_expense(
                a,
                ExpenseUpdate {
                    category: Some(Category::Bills),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(ids(&store.filtered_records()), vec![b, a]);
    }

    #[test]
    fn test_description_length_limit_on_add() {
        let mut store = LedgerStore::new();
        let at_limit = "d".repeat(MAX_DESCRIPTION_LEN);
        store.add_expense("1", &at_limit, Category::Other).unwrap();

        let err = store
            .add_expense("1", &"d".repeat(MAX_DESCRIPTION_LEN + 1), Category::Other)
            .unwrap_err();
        assert_eq!(err, LedgerError::too_long("description", MAX_DESCRIPTION_LEN));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].description, at_limit);
    }

    #[test]
    fn test_description_length_limit_on_update() {
        let mut store = LedgerStore::new();
        let id = store.add_expense("2", "Gym", Category::Health).unwrap().id;

        let err = store
            .update_expense(
                id,
                ExpenseUpdate {
                    amount: Some("3".into()),
                    description: Some("d".repeat(MAX_DESCRIPTION_LEN + 1)),
                    category: None,
                },
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::too_long("description", MAX_DESCRIPTION_LEN));
        assert_eq!(store.get(id).unwrap().description, "Gym");
        assert_eq!(store.get(id).unwrap().amount, 2.0);

        let at_limit = "d".repeat(MAX_DESCRIPTION_LEN);
        let updated = store
            .update_expense(
                id,
                ExpenseUpdate {
                    description: Some(at_limit.clone()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, at_limit);
    }

    #[test]
    fn test_add_and_update_report_the_same_error() {
        let mut store = LedgerStore::new();
        let id = store.add_expense("1", "a", Category::Food).unwrap().id;

        let on_add = store.add_expense("abc", "  ", Category::Food).unwrap_err();
        let on_update = store
            .update_expense(
                id,
                ExpenseUpdate {
                    amount: Some("abc".into()),
                    description: Some("  ".into()),
                    category: None,
                },
            )
            .unwrap_err();
        assert_eq!(on_add, LedgerError::missing("description"));
        assert_eq!(on_update, on_add);
    }

    #[test]
    fn test_clear_by_scope() {
        let mut store = LedgerStore::new();
        store.add_expense("1", "a", Category::Food).unwrap();
        let keep = store.add_expense("2", "b", Category::Bills).unwrap().id;
        store.add_expense("3", "c", Category::Food).unwrap();

        assert_eq!(store.clear(Filter::Category(Category::Food)), 2);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].id, keep);

        assert_eq!(store.clear(Filter::Category(Category::Health)), 0);
        assert_eq!(store.clear(Filter::All), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_summary_counts_filtered_view() {
        let mut store = LedgerStore::new();
        store.add_expense("1.5", "a", Category::Food).unwrap();
        store.add_expense("2", "b", Category::Shopping).unwrap();
        store.set_filter(Filter::Category(Category::Food));

        let summary = store.summary();
        assert_eq!(summary.count, 1);
        assert!(approx(summary.total, 1.5));
        assert_eq!(summary.filter, Filter::Category(Category::Food));

        let all = store.summary_for(Filter::All);
        assert_eq!(all.count, 2);
        assert!(approx(all.total, 3.5));
    }

    #[test]
    fn test_category_stats_sorted_with_percentages() {
        let mut store = LedgerStore::new();
        assert_eq!(store.category_stats().categories.len(), 0);

        store.add_expense("10", "a", Category::Food).unwrap();
        store.add_expense("20", "b", Category::Bills).unwrap();
        store.add_expense("5", "c", Category::Food).unwrap();
        store.set_filter(Filter::Category(Category::Health));

        let stats = store.category_stats();
        assert_eq!(stats.total_expenses, 3);
        assert!(approx(stats.total_amount, 35.0));
        assert_eq!(stats.categories.len(), 2);

        assert_eq!(stats.categories[0].category, Category::Bills);
        assert_eq!(stats.categories[0].count, 1);
        assert!(approx(stats.categories[0].percentage, 57.14));

        assert_eq!(stats.categories[1].category, Category::Food);
        assert_eq!(stats.categories[1].count, 2);
        assert!(approx(stats.categories[1].total, 15.0));
        assert!(approx(stats.categories[1].percentage, 42.86));
    }

    #[test]
    fn test_query_sorting_and_paging() {
        let mut store = LedgerStore::new();
        let a = store.add_expense("30", "a", Category::Shopping).unwrap().id;
        let b = store.add_expense("10", "b", Category::Bills).unwrap().id;
        let c = store.add_expense("20", "c", Category::Food).unwrap().id;

        let by = |sort_by, order| {
            store
                .query(&ExpenseQuery {
                    sort_by,
                    order,
                    ..Default::default()
                })
                .iter()
                .map(|e| e.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(by(SortBy::Date, SortOrder::Desc), vec![c, b, a]);
        assert_eq!(by(SortBy::Date, SortOrder::Asc), vec![a, b, c]);
        assert_eq!(by(SortBy::Amount, SortOrder::Desc), vec![a, c, b]);
        assert_eq!(by(SortBy::Amount, SortOrder::Asc), vec![b, c, a]);
        assert_eq!(by(SortBy::Category, SortOrder::Asc), vec![b, c, a]);

        let page = store.query(&ExpenseQuery {
            offset: 1,
            limit: 1,
            ..Default::default()
        });
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, b);

        // limit 0 is clamped up to 1
        let clamped = store.query(&ExpenseQuery {
            limit: 0,
            ..Default::default()
        });
        assert_eq!(clamped.len(), 1);

        let food = store.query(&ExpenseQuery {
            filter: Filter::Category(Category::Food),
            ..Default::default()
        });
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].id, c);
    }
}
