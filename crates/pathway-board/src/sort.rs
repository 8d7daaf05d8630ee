//! Display ordering and narrowing
//!
//! Pure functions of `(snapshot, parameters)`. Nothing here mutates the store
//! or remembers anything between calls.

use chrono::NaiveDate;
use pathway_record::ProgramRecord;
use serde::{Deserialize, Serialize};

/// Urgency key: dated records first, earliest first, undated last
#[inline]
fn urgency(record: &ProgramRecord) -> (bool, Option<NaiveDate>) {
    let deadline = record.deadline();
    (deadline.is_none(), deadline)
}

/// Target collection order: ascending deadline, undated last, stable
#[must_use]
pub fn order_targets(records: &[ProgramRecord]) -> Vec<ProgramRecord> {
    let mut ordered = records.to_vec();
    ordered.sort_by_key(urgency);
    ordered
}

/// Saved collection ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedOrder {
    /// Store order
    #[default]
    AsStored,
    /// Same key as the Target collection
    DeadlineAscending,
    /// Most complete first
    ProgressDescending,
    /// Program name, case-insensitive
    NameAscending,
}

/// Numeric field a range predicate reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    /// Requirement completion percent
    Progress,
    /// Entry of `ReferenceData::metrics`
    Metric(String),
}

impl NumericField {
    fn read(&self, record: &ProgramRecord) -> Option<f64> {
        match self {
            NumericField::Progress => Some(f64::from(record.reference.progress)),
            NumericField::Metric(key) => record.reference.metrics.get(key).copied(),
        }
    }
}

/// Single narrowing predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Case-insensitive substring over name, school and location
    Text(String),
    /// Categorical attribute equals value (case-insensitive)
    Equals {
        /// Attribute key
        key: String,
        /// Expected value
        value: String,
    },
    /// Record carries the requirement tag
    HasTag(String),
    /// Inclusive numeric range; records lacking the field never match
    Range {
        /// Field read
        field: NumericField,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
}

impl Predicate {
    /// Evaluate against a record
    #[must_use]
    pub fn matches(&self, record: &ProgramRecord) -> bool {
        let data = &record.reference;
        match self {
            Predicate::Text(query) => {
                let needle = query.trim().to_lowercase();
                needle.is_empty()
                    || [&data.name, &data.school, &data.location]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            }
            Predicate::Equals { key, value } => data
                .attributes
                .get(key)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            Predicate::HasTag(tag) => data.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            Predicate::Range { field, min, max } => field.read(record).is_some_and(|v| {
                min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi)
            }),
        }
    }
}

/// Composable saved-collection filter; predicates are ANDed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    /// Predicates, all of which must match
    pub predicates: Vec<Predicate>,
    /// Ordering; `None` uses the board default
    pub order: Option<SavedOrder>,
}

impl SavedFilter {
    /// Filter that keeps everything
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With free-text query
    #[inline]
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Text(query.into()));
        self
    }

    /// With categorical equality
    #[inline]
    #[must_use]
    pub fn with_equals(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Equals {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// With required tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.predicates.push(Predicate::HasTag(tag.into()));
        self
    }

    /// With numeric range
    #[inline]
    #[must_use]
    pub fn with_range(mut self, field: NumericField, min: Option<f64>, max: Option<f64>) -> Self {
        self.predicates.push(Predicate::Range { field, min, max });
        self
    }

    /// With ordering
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: SavedOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Check if every predicate matches
    #[inline]
    #[must_use]
    pub fn matches(&self, record: &ProgramRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Check if the filter narrows anything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Narrow and order the Saved collection
#[must_use]
pub fn narrow_saved(
    records: &[ProgramRecord],
    filter: &SavedFilter,
    default_order: SavedOrder,
) -> Vec<ProgramRecord> {
    let mut kept: Vec<ProgramRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();

    match filter.order.unwrap_or(default_order) {
        SavedOrder::AsStored => {}
        SavedOrder::DeadlineAscending => kept.sort_by_key(urgency),
        SavedOrder::ProgressDescending => {
            kept.sort_by(|a, b| b.reference.progress.cmp(&a.reference.progress));
        }
        SavedOrder::NameAscending => {
            kept.sort_by_cached_key(|r| r.reference.name.to_lowercase());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_record::{Membership, ReferenceData};
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(id: &str, data: ReferenceData) -> ProgramRecord {
        ProgramRecord::new(id, Membership::Saved, data)
    }

    fn ids(records: &[ProgramRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn targets_earliest_deadline_first_undated_last() {
        let records = vec![
            rec("p7", ReferenceData::new("C", "S")),
            rec("p5", ReferenceData::new("A", "S").with_deadline(date("2025-03-01"))),
            rec("p6", ReferenceData::new("B", "S").with_deadline(date("2025-01-01"))),
        ];

        assert_eq!(ids(&order_targets(&records)), vec!["p6", "p5", "p7"]);
    }

    #[test]
    fn targets_ties_keep_input_order() {
        let d = date("2025-02-01");
        let records = vec![
            rec("b", ReferenceData::new("B", "S").with_deadline(d)),
            rec("x", ReferenceData::new("X", "S")),
            rec("a", ReferenceData::new("A", "S").with_deadline(d)),
            rec("y", ReferenceData::new("Y", "S")),
        ];

        assert_eq!(ids(&order_targets(&records)), vec!["b", "a", "x", "y"]);
    }

    fn saved_fixture() -> Vec<ProgramRecord> {
        vec![
            rec(
                "pa",
                ReferenceData::new("Physician Assistant MS", "Lakeside University")
                    .with_location("Madison, WI")
                    .with_progress(40)
                    .with_tag("CASPA")
                    .with_attribute("state", "WI")
                    .with_metric("tuition", 42_000.0),
            ),
            rec(
                "pt",
                ReferenceData::new("Doctor of Physical Therapy", "Hill College")
                    .with_location("Austin, TX")
                    .with_progress(75)
                    .with_tag("GRE")
                    .with_attribute("state", "TX")
                    .with_metric("tuition", 61_000.0),
            ),
            rec(
                "ot",
                ReferenceData::new("Occupational Therapy", "Madison Tech")
                    .with_location("Boise, ID")
                    .with_progress(10)
                    .with_attribute("state", "ID"),
            ),
        ]
    }

    #[test]
    fn empty_filter_keeps_store_order() {
        let kept = narrow_saved(&saved_fixture(), &SavedFilter::new(), SavedOrder::AsStored);
        assert_eq!(ids(&kept), vec!["pa", "pt", "ot"]);
    }

    #[test]
    fn text_matches_name_school_or_location() {
        let filter = SavedFilter::new().with_query("madison");
        let kept = narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored);
        assert_eq!(ids(&kept), vec!["pa", "ot"]);
    }

    #[test]
    fn blank_query_matches_everything() {
        let filter = SavedFilter::new().with_query("   ");
        assert_eq!(narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored).len(), 3);
    }

    #[test]
    fn predicates_combine_with_and() {
        let filter = SavedFilter::new()
            .with_query("madison")
            .with_equals("state", "wi");
        let kept = narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored);
        assert_eq!(ids(&kept), vec!["pa"]);
    }

    #[test]
    fn range_excludes_missing_metric() {
        let filter = SavedFilter::new().with_range(
            NumericField::Metric("tuition".to_string()),
            None,
            Some(50_000.0),
        );
        let kept = narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored);
        assert_eq!(ids(&kept), vec!["pa"]);
    }

    #[test]
    fn progress_range_is_inclusive() {
        let filter = SavedFilter::new().with_range(NumericField::Progress, Some(40.0), Some(75.0));
        let kept = narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored);
        assert_eq!(ids(&kept), vec!["pa", "pt"]);
    }

    #[test]
    fn tag_filter() {
        let filter = SavedFilter::new().with_tag("gre");
        assert_eq!(ids(&narrow_saved(&saved_fixture(), &filter, SavedOrder::AsStored)), vec!["pt"]);
    }

    #[test]
    fn explicit_order_overrides_default() {
        let records = saved_fixture();

        let by_progress = SavedFilter::new().with_order(SavedOrder::ProgressDescending);
        assert_eq!(
            ids(&narrow_saved(&records, &by_progress, SavedOrder::AsStored)),
            vec!["pt", "pa", "ot"]
        );

        let by_name = narrow_saved(&records, &SavedFilter::new(), SavedOrder::NameAscending);
        assert_eq!(ids(&by_name), vec!["pt", "ot", "pa"]);
    }

    #[test]
    fn narrowing_does_not_touch_input() {
        let records = saved_fixture();
        let before = records.clone();
        let _ = narrow_saved(&records, &SavedFilter::new().with_query("zzz"), SavedOrder::NameAscending);
        assert_eq!(records, before);
    }
}
