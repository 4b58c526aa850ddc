// 📈 Trend Detector - Price increases between the two latest purchases of an item
// Full recompute on every call: classify, group, sort by date, compare the tail.

use crate::classifier::ItemClassifier;
use crate::expense::ExpenseRecord;
use crate::synonyms::SynonymTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Minimum increase (percent) that raises an alert
    pub threshold_percent: f64,

    /// Keep only the N largest increases
    pub max_results: Option<usize>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            threshold_percent: 5.0,
            max_results: None,
        }
    }
}

// ============================================================================
// ITEM HISTORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Dated amounts of one canonical item, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemHistory {
    pub item: String,
    pub observations: Vec<PricePoint>,
}

impl ItemHistory {
    pub fn latest(&self) -> Option<&PricePoint> {
        self.observations.last()
    }

    /// Compare the last two observations.
    ///
    /// Returns `None` with fewer than two observations, a non-positive previous
    /// amount, a drop or flat price, or an increase below the threshold.
    pub fn price_alert(&self, threshold_percent: f64) -> Option<PriceAlert> {
        let [.., previous, current] = self.observations.as_slice() else {
            return None;
        };

        if previous.amount <= 0.0 || current.amount <= previous.amount {
            return None;
        }

        let percent_increase = (current.amount / previous.amount - 1.0) * 100.0;

        (percent_increase >= threshold_percent).then(|| PriceAlert {
            item: self.item.clone(),
            previous_amount: previous.amount,
            previous_date: previous.date,
            current_amount: current.amount,
            current_date: current.date,
            percent_increase,
        })
    }
}

// ============================================================================
// PRICE ALERT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub item: String,
    pub previous_amount: f64,
    pub previous_date: NaiveDate,
    pub current_amount: f64,
    pub current_date: NaiveDate,
    pub percent_increase: f64,
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Per-item price histories, items sorted by name.
///
/// Records without a date are skipped. Same-day records keep input order.
pub fn item_histories(expenses: &[ExpenseRecord], table: &SynonymTable) -> Vec<ItemHistory> {
    let classifier = ItemClassifier::new(table);
    let mut groups: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    let mut undated = 0usize;

    for record in expenses {
        let Some(date) = record.occurred_at else {
            undated += 1;
            continue;
        };

        groups
            .entry(classifier.classify(record.description_str()))
            .or_default()
            .push(PricePoint {
                date,
                amount: record.amount,
            });
    }

    if undated > 0 {
        debug!(undated, "Skipped expenses without a date");
    }

    groups
        .into_iter()
        .map(|(item, mut observations)| {
            // stable: ties stay in input order
            observations.sort_by_key(|p| p.date);
            ItemHistory { item, observations }
        })
        .collect()
}

/// Items whose latest price rose by at least `threshold_percent`.
///
/// Largest increase first. A negative or NaN threshold is clamped to 0.
/// Never fails: bad rows are skipped and an empty list is a normal answer.
pub fn detect_price_increases(
    expenses: &[ExpenseRecord],
    table: &SynonymTable,
    threshold_percent: f64,
    max_results: Option<usize>,
) -> Vec<PriceAlert> {
    let threshold = clamp_threshold(threshold_percent);
    let histories = item_histories(expenses, table);

    let mut alerts: Vec<PriceAlert> = histories
        .iter()
        .filter_map(|history| history.price_alert(threshold))
        .collect();

    alerts.sort_by(|a, b| {
        b.percent_increase
            .total_cmp(&a.percent_increase)
            .then_with(|| a.item.cmp(&b.item))
    });

    if let Some(limit) = max_results {
        alerts.truncate(limit);
    }

    debug!(
        items = histories.len(),
        alerts = alerts.len(),
        threshold,
        "Price increase pass complete"
    );

    alerts
}

/// [`detect_price_increases`] driven by a [`TrendConfig`]
pub fn detect_with_config(
    expenses: &[ExpenseRecord],
    table: &SynonymTable,
    config: &TrendConfig,
) -> Vec<PriceAlert> {
    detect_price_increases(expenses, table, config.threshold_percent, config.max_results)
}

fn clamp_threshold(threshold_percent: f64) -> f64 {
    if threshold_percent.is_nan() {
        0.0
    } else {
        threshold_percent.max(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
