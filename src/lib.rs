// Expense Tracker - Core Library
// The ledger and its form; the terminal screen and REST server sit on top

pub mod category;
pub mod config;
pub mod error;
pub mod expense;
pub mod form;
pub mod ledger;
pub mod logging;

// Re-export commonly used types
pub use category::{icon_for, Category, Filter, UnknownCategory, DEFAULT_ICON};
pub use config::{Config, DisplayConfig, LoggingConfig, ServerConfig};
pub use error::{LedgerError, LedgerResult};
pub use expense::{Expense, ExpenseId, ExpenseUpdate, MAX_DESCRIPTION_LEN};
pub use form::{ExpenseForm, FormField};
pub use ledger::{
    CategoryStats, ExpenseQuery, LedgerStore, SortBy, SortOrder, Stats, Summary,
    DEFAULT_LIMIT, MAX_LIMIT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
