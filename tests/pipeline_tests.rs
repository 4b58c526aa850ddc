use construction_ledger::*;
use chrono::NaiveDate;
use std::path::PathBuf;

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn load_sample() -> (LoadReport, SynonymTable) {
    let report = load_csv(data_file("sample_obra.csv")).unwrap();
    let table = SynonymTable::from_file(data_file("synonyms.json")).unwrap();
    (report, table)
}

#[test]
fn test_sample_sheet_loads_with_rejections() {
    let (report, _) = load_sample();

    assert_eq!(report.records.len(), 11);
    assert_eq!(report.undated_count(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].line, 13);
    assert!(report.rejected[0].reason.contains("a combinar"));
}

#[test]
fn test_sample_sheet_items() {
    let (report, table) = load_sample();
    let classified = classify_all(&report.records, &table);
    let items: Vec<&str> = classified.iter().map(|c| c.item.as_str()).collect();

    assert_eq!(
        items,
        vec![
            "Cimento",
            "Areia",
            "Vergalhão",
            "Madeira",
            "Cimento",
            "Areia",
            "Vergalhão",
            "Tijolo",
            // substring match: "cal" inside "Calha"
            "Cal",
            "Frete Caçamba",
            "Madeira",
        ]
    );
}

#[test]
fn test_sample_sheet_price_alerts() {
    let (report, table) = load_sample();
    let alerts = detect_price_increases(&report.records, &table, 5.0, None);

    assert_eq!(alerts.len(), 2);

    assert_eq!(alerts[0].item, "Cimento");
    assert_eq!(alerts[0].previous_amount, 30.0);
    assert_eq!(alerts[0].current_amount, 36.0);
    assert_eq!(alerts[0].current_date, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
    assert!((alerts[0].percent_increase - 20.0).abs() < 1e-9);

    assert_eq!(alerts[1].item, "Vergalhão");
    assert!((alerts[1].percent_increase - (55.0 / 48.5 - 1.0) * 100.0).abs() < 1e-9);

    let top = detect_price_increases(&report.records, &table, 5.0, Some(1));
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].item, "Cimento");

    assert!(detect_price_increases(&report.records, &table, 25.0, None).is_empty());
}

#[test]
fn test_sample_sheet_budget() {
    let (report, _) = load_sample();
    let config = AppConfig::from_file(data_file("config.json")).unwrap();
    let budget = budget_variance(&report.records, &config.budget);

    assert_eq!(budget.lines.len(), 3);
    assert_eq!(budget.lines[0].category, "Fundação");
    assert_eq!(budget.lines[0].actual, 896.0);
    assert!(!budget.lines[0].over_budget);

    assert_eq!(budget.lines[1].category, "Estrutura");
    assert_eq!(budget.lines[1].actual, 155.5);
    assert!(budget.lines[1].over_budget);

    let unbudgeted: Vec<&str> = budget.unbudgeted.iter().map(|t| t.category.as_str()).collect();
    assert_eq!(unbudgeted, vec![UNCATEGORIZED, "Cobertura"]);
    assert_eq!(budget.total_actual, 2731.5);
}

#[test]
fn test_cache_serves_snapshot_until_invalidated() {
    let cache = RecordCache::new(std::time::Duration::from_secs(60));
    let path = data_file("sample_obra.csv");
    let key = path.to_string_lossy().to_string();

    let first = cache
        .get_or_load(&key, || Ok(load_csv(&path)?.records))
        .unwrap();
    let second = cache
        .get_or_load(&key, || panic!("should be served from cache"))
        .unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));

    cache.invalidate(&key);
    let third = cache
        .get_or_load(&key, || Ok(load_csv(&path)?.records))
        .unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(first.len(), third.len());
}
