//! Reliability derivation for supplier records.
//!
//! Pure transformation over one [`SupplierRecord`]: parses the opaque Checko
//! registry blob, builds the finance series, evaluates the fact rules and
//! computes the reliability score. No I/O and no caching; callers recompute
//! per record, and a malformed blob degrades to defaults instead of failing.

use crate::models::SupplierRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Accounting line codes inside the blob's `_finances` year map.
const LINE_REVENUE: &str = "2110";
const LINE_NET_PROFIT: &str = "2400";
const LINE_CAPITAL: &str = "1300";

/// Score bounds and per-fact deltas.
const SCORE_MIN: i32 = 0;
const SCORE_MAX: i32 = 600;
const SCORE_BASE: i32 = 300;
const DELTA_POSITIVE: i32 = 40;
const DELTA_ATTENTION: i32 = -20;
const DELTA_NEGATIVE: i32 = -60;

/// Fact-rule thresholds.
const LEGAL_CASES_THRESHOLD: f64 = 30.0;
const INSPECTIONS_THRESHOLD: f64 = 10.0;

/// Status values containing this stem mark a company in liquidation.
const LIQUIDATION_STEM: &str = "ликвид";

/// Category of a derived reliability fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactKind {
    Positive,
    Attention,
    Negative,
}

/// A single human-readable finding about a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityFact {
    pub kind: FactKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One year of financial figures for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancePoint {
    pub year: i32,
    pub revenue: Option<f64>,
    pub profit: Option<f64>,
    pub capital: Option<f64>,
}

/// Activity classification code (OKVED), primary or secondary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCode {
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Full derived view over one supplier record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    pub score: i32,
    pub facts: Vec<ReliabilityFact>,
    pub finance_series: Vec<FinancePoint>,
    pub primary_activity: Option<ActivityCode>,
    pub secondary_activities: Vec<ActivityCode>,
}

/// Derives score, facts, finance series and activity codes from one record.
pub fn derive_reliability(record: &SupplierRecord) -> ReliabilityAssessment {
    let blob = parse_registry_blob(record.checko_data.as_deref());
    let blob = blob.as_ref();

    let series = finance_series(record, blob);
    let facts = reliability_facts(record, blob, &series);
    let score = reliability_score(blob, &facts);
    let (primary_activity, secondary_activities) = activity_codes(blob);

    ReliabilityAssessment {
        score,
        facts,
        finance_series: series,
        primary_activity,
        secondary_activities,
    }
}

/// Parses the serialized registry blob. Malformed JSON counts as absent.
pub fn parse_registry_blob(raw: Option<&str>) -> Option<Value> {
    serde_json::from_str(raw?).ok()
}

/// Builds the per-year finance series from the blob's `_finances` map,
/// falling back to a single point from the record's own top-level figures
/// when the map is empty or absent. Ascending by year, one point per year.
pub fn finance_series(record: &SupplierRecord, blob: Option<&Value>) -> Vec<FinancePoint> {
    let mut by_year: BTreeMap<i32, FinancePoint> = BTreeMap::new();

    if let Some(rows) = blob.and_then(|b| b.get("_finances")).and_then(Value::as_object) {
        for (year_key, row) in rows {
            let Ok(year) = year_key.trim().parse::<i32>() else {
                continue;
            };
            by_year.insert(
                year,
                FinancePoint {
                    year,
                    revenue: line_value(row, LINE_REVENUE),
                    profit: line_value(row, LINE_NET_PROFIT),
                    capital: line_value(row, LINE_CAPITAL),
                },
            );
        }
    }

    if by_year.is_empty() {
        if let Some(year) = record.finance_year {
            by_year.insert(
                year,
                FinancePoint {
                    year,
                    revenue: record.revenue,
                    profit: record.profit,
                    capital: None,
                },
            );
        }
    }

    by_year.into_values().collect()
}

/// Evaluates the fact rules in fixed order. Each rule appends at most one
/// fact; an empty result collapses to a single "insufficient data" fact.
pub fn reliability_facts(
    record: &SupplierRecord,
    blob: Option<&Value>,
    series: &[FinancePoint],
) -> Vec<ReliabilityFact> {
    let mut facts = Vec::new();

    let mut legal_cases =
        coerce_number(blob.and_then(|b| b.get("_legal")).and_then(|l| l.get("total")));
    if legal_cases == 0.0 {
        legal_cases = record.legal_cases_count.unwrap_or(0.0);
    }
    let enforcements = coerce_number(
        blob.and_then(|b| b.get("_enforcements"))
            .and_then(|e| e.get("count")),
    );
    let inspections = coerce_number(
        blob.and_then(|b| b.get("_inspections"))
            .and_then(|i| i.get("total")),
    );
    let status = record
        .company_status
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            coerce_string(blob.and_then(|b| b.get("Статус")).and_then(|s| s.get("Наим")))
        });

    if !status.is_empty() && !status.to_lowercase().contains(LIQUIDATION_STEM) {
        facts.push(ReliabilityFact {
            kind: FactKind::Positive,
            title: format!("Статус компании: {}", status),
            description: None,
        });
    }
    let has_revenue = record.revenue.unwrap_or(0.0) > 0.0
        || series.iter().any(|p| p.revenue.unwrap_or(0.0) > 0.0);
    if has_revenue {
        facts.push(ReliabilityFact {
            kind: FactKind::Positive,
            title: "Есть финансовая отчетность".to_string(),
            description: None,
        });
    }
    if legal_cases > LEGAL_CASES_THRESHOLD {
        facts.push(ReliabilityFact {
            kind: FactKind::Attention,
            title: format!("Судебные дела: {}", format_count(legal_cases)),
            description: None,
        });
    }
    if inspections > INSPECTIONS_THRESHOLD {
        facts.push(ReliabilityFact {
            kind: FactKind::Attention,
            title: format!("Проверки: {}", format_count(inspections)),
            description: None,
        });
    }
    if enforcements > 0.0 {
        facts.push(ReliabilityFact {
            kind: FactKind::Negative,
            title: format!("Исполнительные производства: {}", format_count(enforcements)),
            description: None,
        });
    }

    if facts.is_empty() {
        facts.push(ReliabilityFact {
            kind: FactKind::Attention,
            title: "Недостаточно данных для автоматической оценки".to_string(),
            description: None,
        });
    }

    facts
}

/// Computes the reliability score.
///
/// An explicit positive rating in the blob wins, capped at the score
/// ceiling; otherwise the score starts at the base value and applies a
/// fixed delta per fact, clamped into `[SCORE_MIN, SCORE_MAX]`.
pub fn reliability_score(blob: Option<&Value>, facts: &[ReliabilityFact]) -> i32 {
    let mut rating = coerce_number(blob.and_then(|b| b.get("Рейтинг")));
    if rating <= 0.0 {
        rating = coerce_number(blob.and_then(|b| b.get("rating")));
    }
    if rating > 0.0 {
        return rating.min(SCORE_MAX as f64) as i32;
    }

    let mut score = SCORE_BASE;
    for fact in facts {
        score += match fact.kind {
            FactKind::Positive => DELTA_POSITIVE,
            FactKind::Attention => DELTA_ATTENTION,
            FactKind::Negative => DELTA_NEGATIVE,
        };
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}

/// Extracts the primary and secondary activity codes, tolerating both the
/// single-object and the array shape of the `ОКВЭД` section.
pub fn activity_codes(blob: Option<&Value>) -> (Option<ActivityCode>, Vec<ActivityCode>) {
    let primary = blob.and_then(|b| b.get("ОКВЭД")).and_then(|v| match v {
        Value::Array(items) => items.first().and_then(activity_from),
        Value::Object(_) => activity_from(v),
        _ => None,
    });

    let secondary = blob
        .and_then(|b| b.get("ОКВЭДДоп"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(activity_from).collect())
        .unwrap_or_default();

    (primary, secondary)
}

/// Year-over-year percent change; `None` when either value is missing or
/// the previous value is exactly zero.
pub fn yoy_percent(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (cur, prev) = (current?, previous?);
    if prev == 0.0 {
        return None;
    }
    Some((cur - prev) / prev.abs() * 100.0)
}

/// Renders the year-over-year change with an explicit plus sign, or an
/// em dash placeholder when undefined.
pub fn format_yoy(current: Option<f64>, previous: Option<f64>) -> String {
    match yoy_percent(current, previous) {
        Some(percent) => {
            let sign = if percent > 0.0 { "+" } else { "" };
            format!("{}{:.1}%", sign, percent)
        }
        None => "—".to_string(),
    }
}

fn activity_from(item: &Value) -> Option<ActivityCode> {
    let obj = item.as_object()?;
    let version = coerce_string(obj.get("Версия"));
    Some(ActivityCode {
        code: coerce_string(obj.get("Код")),
        title: coerce_string(obj.get("Наим")),
        version: if version.is_empty() { None } else { Some(version) },
    })
}

/// Accounting line value from one `_finances` row; wrong shapes yield `None`.
fn line_value(row: &Value, line: &str) -> Option<f64> {
    match row.get(line) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric coercion over loosely-typed registry values: JSON numbers pass
/// through, numeric strings parse, everything else counts as 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String coercion over loosely-typed registry values; non-scalar shapes
/// yield an empty string.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Counters come out of `coerce_number` as floats; whole values print
/// without a fractional part.
fn format_count(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with_blob(blob: Value) -> SupplierRecord {
        SupplierRecord {
            checko_data: Some(blob.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn malformed_blob_counts_as_absent() {
        assert!(parse_registry_blob(Some("{not json")).is_none());
        assert!(parse_registry_blob(None).is_none());
        assert!(parse_registry_blob(Some("{\"a\":1}")).is_some());
    }

    #[test]
    fn finance_series_is_sorted_and_unique() {
        let record = record_with_blob(json!({
            "_finances": {
                "2022": {"2110": 500.0, "2400": 50.0},
                "2020": {"2110": 300.0, "2400": 30.0, "1300": 10.0},
                "2021": {"2110": 400.0},
            }
        }));
        let blob = parse_registry_blob(record.checko_data.as_deref());
        let series = finance_series(&record, blob.as_ref());

        let years: Vec<i32> = series.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
        assert_eq!(series[0].capital, Some(10.0));
        assert_eq!(series[1].profit, None);
    }

    #[test]
    fn finance_series_falls_back_to_record_figures() {
        let record = SupplierRecord {
            finance_year: Some(2023),
            revenue: Some(1_000_000.0),
            profit: Some(120_000.0),
            ..Default::default()
        };
        let series = finance_series(&record, None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].year, 2023);
        assert_eq!(series[0].revenue, Some(1_000_000.0));
        assert_eq!(series[0].capital, None);
    }

    #[test]
    fn fallback_point_skipped_without_finance_year() {
        let record = SupplierRecord {
            revenue: Some(500.0),
            ..Default::default()
        };
        assert!(finance_series(&record, None).is_empty());
    }

    #[test]
    fn status_rule_skips_liquidation() {
        let record = SupplierRecord {
            company_status: Some("В стадии ликвидации".to_string()),
            ..Default::default()
        };
        let facts = reliability_facts(&record, None, &[]);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].kind, FactKind::Attention);
        assert_eq!(facts[0].title, "Недостаточно данных для автоматической оценки");
    }

    #[test]
    fn fact_rules_run_in_fixed_order() {
        let record = SupplierRecord {
            company_status: Some("Действует".to_string()),
            revenue: Some(100.0),
            ..Default::default()
        };
        let blob = json!({
            "_legal": {"total": 45},
            "_inspections": {"total": 12},
            "_enforcements": {"count": 3},
        });
        let facts = reliability_facts(&record, Some(&blob), &[]);
        let kinds: Vec<FactKind> = facts.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FactKind::Positive,
                FactKind::Positive,
                FactKind::Attention,
                FactKind::Attention,
                FactKind::Negative,
            ]
        );
        assert_eq!(facts[2].title, "Судебные дела: 45");
        assert_eq!(facts[4].title, "Исполнительные производства: 3");
    }

    #[test]
    fn numeric_strings_coerce_like_the_registry_sends_them() {
        let blob = json!({"_legal": {"total": "45"}});
        let facts = reliability_facts(&SupplierRecord::default(), Some(&blob), &[]);
        assert!(facts.iter().any(|f| f.title == "Судебные дела: 45"));
    }

    #[test]
    fn thresholds_are_strict() {
        let blob = json!({
            "_legal": {"total": 30},
            "_inspections": {"total": 10},
            "_enforcements": {"count": 0},
        });
        let facts = reliability_facts(&SupplierRecord::default(), Some(&blob), &[]);
        // None of the rules fire at the boundary, so only the fallback remains.
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].kind, FactKind::Attention);
    }

    #[test]
    fn score_prefers_explicit_rating_capped_at_ceiling() {
        let blob = json!({"Рейтинг": 550});
        assert_eq!(reliability_score(Some(&blob), &[]), 550);

        let blob = json!({"Рейтинг": 9000});
        assert_eq!(reliability_score(Some(&blob), &[]), 600);

        let blob = json!({"rating": "480"});
        assert_eq!(reliability_score(Some(&blob), &[]), 480);
    }

    #[test]
    fn score_accumulates_deltas_from_base() {
        let facts = vec![
            ReliabilityFact {
                kind: FactKind::Positive,
                title: String::new(),
                description: None,
            },
            ReliabilityFact {
                kind: FactKind::Attention,
                title: String::new(),
                description: None,
            },
            ReliabilityFact {
                kind: FactKind::Negative,
                title: String::new(),
                description: None,
            },
        ];
        assert_eq!(reliability_score(None, &facts), 300 + 40 - 20 - 60);
    }

    #[test]
    fn activity_codes_accept_both_shapes() {
        let object_shape = json!({
            "ОКВЭД": {"Код": "62.01", "Наим": "Разработка программного обеспечения", "Версия": "2"}
        });
        let (primary, secondary) = activity_codes(Some(&object_shape));
        let primary = primary.unwrap();
        assert_eq!(primary.code, "62.01");
        assert_eq!(primary.version.as_deref(), Some("2"));
        assert!(secondary.is_empty());

        let array_shape = json!({
            "ОКВЭД": [{"Код": "46.90", "Наим": "Торговля оптовая"}],
            "ОКВЭДДоп": [
                {"Код": "47.91", "Наим": "Торговля розничная"},
                {"Код": "52.10", "Наим": "Складирование"},
            ]
        });
        let (primary, secondary) = activity_codes(Some(&array_shape));
        assert_eq!(primary.unwrap().code, "46.90");
        assert_eq!(secondary.len(), 2);
        assert_eq!(secondary[1].code, "52.10");
    }

    #[test]
    fn yoy_handles_missing_and_zero_previous() {
        assert_eq!(format_yoy(Some(110.0), Some(100.0)), "+10.0%");
        assert_eq!(format_yoy(Some(90.0), Some(100.0)), "-10.0%");
        assert_eq!(format_yoy(Some(100.0), None), "—");
        assert_eq!(format_yoy(None, Some(100.0)), "—");
        assert_eq!(format_yoy(Some(100.0), Some(0.0)), "—");
        // Negative previous values normalize through the absolute value.
        assert_eq!(format_yoy(Some(-50.0), Some(-100.0)), "+50.0%");
    }

    #[test]
    fn derive_over_malformed_blob_still_yields_bounded_score_and_facts() {
        let record = SupplierRecord {
            checko_data: Some("{broken".to_string()),
            ..Default::default()
        };
        let assessment = derive_reliability(&record);
        assert!((0..=600).contains(&assessment.score));
        assert!(!assessment.facts.is_empty());
        assert!(assessment.finance_series.is_empty());
        assert!(assessment.primary_activity.is_none());
    }
}
