// 💰 Budget Aggregation - Category totals, item totals and budget variance
// Plain sums over loaded records; what the dashboard cards and tables show.

use crate::expense::{ClassifiedExpense, ExpenseRecord};
use crate::normalizer::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category used for rows whose category cell is empty
pub const UNCATEGORIZED: &str = "Sem categoria";

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTotal {
    pub item: String,
    pub count: usize,
    pub total: f64,
}

/// Grouping key and display label for a record's category
fn category_key(category: Option<&str>) -> (String, String) {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => (normalize(c), c.to_string()),
        None => (normalize(UNCATEGORIZED), UNCATEGORIZED.to_string()),
    }
}

/// Spend per category, largest first.
///
/// Categories are grouped accent/case-insensitively; the first spelling seen
/// is used as the label.
pub fn category_totals(records: &[ExpenseRecord]) -> Vec<CategoryTotal> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, CategoryTotal> = HashMap::new();

    for record in records {
        let (key, label) = category_key(record.category.as_deref());
        let entry = totals.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            CategoryTotal {
                category: label,
                count: 0,
                total: 0.0,
            }
        });
        entry.count += 1;
        entry.total += record.amount;
    }

    let mut result: Vec<CategoryTotal> = order
        .into_iter()
        .filter_map(|key| totals.remove(&key))
        .collect();
    result.sort_by(|a, b| b.total.total_cmp(&a.total));
    result
}

/// Spend per canonical item, largest first (ties keep first-seen order)
pub fn item_totals(classified: &[ClassifiedExpense]) -> Vec<ItemTotal> {
    let mut result: Vec<ItemTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for expense in classified {
        let slot = *index.entry(expense.item.as_str()).or_insert_with(|| {
            result.push(ItemTotal {
                item: expense.item.clone(),
                count: 0,
                total: 0.0,
            });
            result.len() - 1
        });
        result[slot].count += 1;
        result[slot].total += expense.record.amount;
    }

    result.sort_by(|a, b| b.total.total_cmp(&a.total));
    result
}

// ============================================================================
// BUDGET VARIANCE
// ============================================================================

/// Planned spend for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub planned: f64,
}

impl BudgetLine {
    pub fn new(category: impl Into<String>, planned: f64) -> Self {
        BudgetLine {
            category: category.into(),
            planned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVariance {
    pub category: String,
    pub planned: f64,
    pub actual: f64,
    /// planned - actual (negative when over budget)
    pub remaining: f64,
    /// actual / planned * 100, 0 when nothing was planned
    pub percent_used: f64,
    pub over_budget: bool,
}

impl BudgetVariance {
    fn compute(category: String, planned: f64, actual: f64) -> Self {
        let percent_used = if planned > 0.0 {
            actual * 100.0 / planned
        } else {
            0.0
        };

        BudgetVariance {
            category,
            planned,
            actual,
            remaining: planned - actual,
            percent_used,
            over_budget: actual > planned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    /// One row per budget line, in budget order
    pub lines: Vec<BudgetVariance>,

    /// Spend in categories with no budget line
    pub unbudgeted: Vec<CategoryTotal>,

    pub total_planned: f64,
    pub total_actual: f64,
}

impl BudgetReport {
    pub fn over_budget(&self) -> impl Iterator<Item = &BudgetVariance> {
        self.lines.iter().filter(|l| l.over_budget)
    }

    pub fn summary(&self) -> String {
        format!(
            "Planned: {:.2}, Spent: {:.2}, Over budget: {} of {} categories, Unbudgeted: {}",
            self.total_planned,
            self.total_actual,
            self.over_budget().count(),
            self.lines.len(),
            self.unbudgeted.len()
        )
    }
}

/// Compare actual spend per category against the plan
pub fn budget_variance(records: &[ExpenseRecord], budget: &[BudgetLine]) -> BudgetReport {
    let totals = category_totals(records);
    let actual_by_key: HashMap<String, f64> = totals
        .iter()
        .map(|total| (category_key(Some(&total.category)).0, total.total))
        .collect();

    let mut budgeted_keys: Vec<String> = Vec::new();
    let lines: Vec<BudgetVariance> = budget
        .iter()
        .map(|line| {
            let (key, _) = category_key(Some(&line.category));
            let actual = actual_by_key.get(&key).copied().unwrap_or(0.0);
            budgeted_keys.push(key);
            BudgetVariance::compute(line.category.clone(), line.planned, actual)
        })
        .collect();

    let unbudgeted: Vec<CategoryTotal> = totals
        .into_iter()
        .filter(|total| !budgeted_keys.contains(&category_key(Some(&total.category)).0))
        .collect();

    BudgetReport {
        total_planned: budget.iter().map(|l| l.planned).sum(),
        total_actual: records.iter().map(|r| r.amount).sum(),
        lines,
        unbudgeted,
    }
}

// ============================================================================
// TESTS
// ============================================================================
