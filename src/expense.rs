// 💸 Expense record
//
// id and created_at are fixed at creation; amount, description and category
// only change through LedgerStore::update_expense.

use crate::category::Category;
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;
use uuid::Uuid;

/// Longest description accepted, in characters after trimming
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Used when a caller-supplied date format cannot be rendered
pub const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable identity of an expense; random so two adds in the same clock tick
/// never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        ExpenseId(Uuid::new_v4())
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ExpenseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(ExpenseId)
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: f64,
    pub description: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Build a record from already validated values
    pub(crate) fn new(amount: f64, description: String, category: Category) -> Self {
        Expense {
            id: ExpenseId::new(),
            amount,
            description,
            category,
            created_at: Utc::now(),
        }
    }

    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }

    /// Creation time in local time, using a chrono format string.
    ///
    /// A format chrono cannot render falls back to FALLBACK_DATE_FORMAT.
    pub fn display_date(&self, format: &str) -> String {
        let local = self.created_at.with_timezone(&Local);
        let mut out = String::new();
        if write!(out, "{}", local.format(format)).is_err() {
            out = local.format(FALLBACK_DATE_FORMAT).to_string();
        }
        out
    }
}

/// Partial edit of an expense. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

// ============================================================================
// INPUT VALIDATION
// ============================================================================

/// Parse amount text into a finite, strictly positive number.
///
/// Empty input is a missing field; anything else that fails is an invalid
/// amount. Parsing is strict, so "12abc" is rejected.
pub fn parse_amount(input: &str) -> LedgerResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::missing("amount"));
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(LedgerError::invalid_amount(trimmed)),
    }
}

/// Trim description text, rejecting an empty result or one longer than
/// MAX_DESCRIPTION_LEN characters
pub fn parse_description(input: &str) -> LedgerResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::missing("description"));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::too_long("description", MAX_DESCRIPTION_LEN));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_decimals() {
        assert_eq!(parse_amount("12.50"), Ok(12.5));
        assert_eq!(parse_amount("  40 "), Ok(40.0));
        assert_eq!(parse_amount("0.01"), Ok(0.01));
    }

    #[test]
    fn test_parse_amount_empty_is_missing_field() {
        assert_eq!(parse_amount(""), Err(LedgerError::missing("amount")));
        assert_eq!(parse_amount("   "), Err(LedgerError::missing("amount")));
    }

    #[test]
    fn test_parse_amount_rejects_non_numbers() {
        for input in ["abc", "12abc", "1,50", "$5"] {
            assert_eq!(
                parse_amount(input),
                Err(LedgerError::invalid_amount(input)),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_non_finite_and_non_positive() {
        assert!(matches!(parse_amount("NaN"), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(parse_amount("inf"), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(parse_amount("1e400"), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(parse_amount("0"), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(parse_amount("-3"), Err(LedgerError::InvalidAmount { .. })));
    }

    #[test]
    fn test_parse_description_trims() {
        assert_eq!(parse_description("  Lunch  "), Ok("Lunch".to_string()));
        assert_eq!(parse_description(" \t "), Err(LedgerError::missing("description")));
    }

    #[test]
    fn test_parse_description_length_counts_chars() {
        let at_limit = "é".repeat(MAX_DESCRIPTION_LEN);
        assert_eq!(parse_description(&format!("  {}  ", at_limit)), Ok(at_limit));
        assert_eq!(
            parse_description(&"x".repeat(MAX_DESCRIPTION_LEN + 1)),
            Err(LedgerError::too_long("description", MAX_DESCRIPTION_LEN))
        );
    }

    #[test]
    fn test_display_date_survives_bad_format() {
        let e = Expense::new(1.0, "a".into(), Category::Food);
        assert_eq!(e.display_date("%Q"), e.display_date(FALLBACK_DATE_FORMAT));
        assert_eq!(e.display_date("%Y").len(), 4);
    }

    #[test]
    fn test_ids_are_unique_within_a_tick() {
        let a = Expense::new(1.0, "a".into(), Category::Food);
        let b = Expense::new(1.0, "a".into(), Category::Food);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_id_round_trips_through_text() {
        let id = ExpenseId::new();
        let parsed: ExpenseId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-an-id".parse::<ExpenseId>().is_err());
    }
}
