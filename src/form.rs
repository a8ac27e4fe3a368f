// 📝 Expense form - input that has not reached the ledger yet
//
// Submitting hands the text to LedgerStore::add_expense. Success resets the
// form; a validation error keeps the input so it can be corrected.

use crate::category::Category;
use crate::error::LedgerResult;
use crate::expense::ExpenseId;
use crate::ledger::LedgerStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Amount,
    Description,
    Category,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Amount => FormField::Description,
            FormField::Description => FormField::Category,
            FormField::Category => FormField::Amount,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            FormField::Amount => FormField::Category,
            FormField::Description => FormField::Amount,
            FormField::Category => FormField::Description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub amount: String,
    pub description: String,
    pub category: Category,
    pub focus: FormField,
}

impl ExpenseForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the pending input to `store`, resetting the form on success
    pub fn submit(&mut self, store: &mut LedgerStore) -> LedgerResult<ExpenseId> {
        let id = store
            .add_expense(&self.amount, &self.description, self.category)?
            .id;
        self.reset();
        Ok(id)
    }

    /// Drop the pending input without touching the ledger
    pub fn cancel(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.amount.is_empty() && self.description.is_empty()
    }

    /// Type a character into the focused text field.
    ///
    /// The amount field only takes characters that can appear in a decimal.
    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormField::Amount => {
                if c.is_ascii_digit() || c == '.' {
                    self.amount.push(c);
                }
            }
            FormField::Description => self.description.push(c),
            FormField::Category => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            FormField::Amount => {
                self.amount.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::Category => {}
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn next_category(&mut self) {
        self.category = self.category.next();
    }

    pub fn previous_category(&mut self) {
        self.category = self.category.previous();
    }
}
