// Construction Ledger - Core Library
// Supply-item canonicalization, price trends and budget figures for
// construction-project expense sheets. Exposes all modules for the CLI,
// API server, and tests.

pub mod normalizer;
pub mod synonyms;
pub mod expense;
pub mod classifier;
pub mod trend;
pub mod budget;
pub mod loader;
pub mod cache;
pub mod config;

// Re-export commonly used types
pub use normalizer::{normalize, title_case};
pub use synonyms::{SynonymEntry, SynonymTable};
pub use expense::{ClassifiedExpense, ExpenseRecord};
pub use classifier::{
    base_label, classify, classify_all, ItemClassifier, NO_DESCRIPTION,
};
pub use trend::{
    detect_price_increases, detect_with_config, item_histories,
    ItemHistory, PriceAlert, PricePoint, TrendConfig,
};
pub use budget::{
    budget_variance, category_totals, item_totals,
    BudgetLine, BudgetReport, BudgetVariance, CategoryTotal, ItemTotal, UNCATEGORIZED,
};
pub use loader::{load_csv, load_from_reader, parse_amount, parse_date, LoadReport, RejectedRow};
pub use cache::{RecordCache, TtlCache};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
