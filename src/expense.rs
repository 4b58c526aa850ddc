// 🧾 Expense Records - Typed rows handed over by the sheet loader
// The core only ever reads these; loaders build them, analysis passes classify them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// One expense row after type coercion.
///
/// `description` and `occurred_at` may be missing: the sheets are edited by
/// hand and the analysis degrades around gaps instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Free-text description as typed in the sheet
    pub description: Option<String>,

    /// Amount paid (always ≥ 0)
    pub amount: f64,

    /// Date of the expense, `None` when the sheet cell could not be parsed
    pub occurred_at: Option<NaiveDate>,

    /// Optional budget category (e.g. "Fundação", "Alvenaria")
    pub category: Option<String>,
}

impl ExpenseRecord {
    /// Create a record with the fields every analysis needs
    pub fn new(description: impl Into<String>, amount: f64, occurred_at: NaiveDate) -> Self {
        ExpenseRecord {
            description: Some(description.into()),
            amount,
            occurred_at: Some(occurred_at),
            category: None,
        }
    }

    /// Builder pattern: add a category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder pattern: drop the date (unparseable sheet cell)
    pub fn without_date(mut self) -> Self {
        self.occurred_at = None;
        self
    }

    pub fn description_str(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

// ============================================================================
// CLASSIFIED EXPENSE
// ============================================================================

/// An expense with its canonical supply item attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedExpense {
    #[serde(flatten)]
    pub record: ExpenseRecord,

    /// Canonical item name produced by the classifier
    pub item: String,
}
