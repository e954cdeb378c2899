//! Derived views over a job-store snapshot (PRD-03).
//!
//! Everything here is a pure function of a snapshot slice: filtering,
//! sorting, percentile ranking, summary statistics, and batch progress.
//! Nothing is cached -- callers recompute from the latest snapshot on
//! every render.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::record::JobRecord;
use crate::status::{JobStatus, REVIEW_THRESHOLD, SHORTLIST_THRESHOLD};
use crate::types::JobId;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Fixed filter tags partitioning jobs by status and score band.
///
/// `All` aside, the tags are exhaustive and disjoint: every job matches
/// exactly one of shortlisted/review/rejected/invalid/pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterTag {
    #[default]
    All,
    /// Processed with `final_score >= 60`.
    Shortlisted,
    /// Processed with `40 <= final_score < 60`.
    Review,
    /// Processed with `final_score < 40`.
    Rejected,
    /// Any terminal failure status.
    Invalid,
    /// Not yet terminal.
    Pending,
}

impl FilterTag {
    /// Whether a record belongs to this filter bucket.
    pub fn matches(self, record: &JobRecord) -> bool {
        let score = record.final_score.unwrap_or(0.0);
        match self {
            FilterTag::All => true,
            FilterTag::Shortlisted => {
                record.status == JobStatus::Processed && score >= SHORTLIST_THRESHOLD
            }
            FilterTag::Review => {
                record.status == JobStatus::Processed
                    && score >= REVIEW_THRESHOLD
                    && score < SHORTLIST_THRESHOLD
            }
            FilterTag::Rejected => {
                record.status == JobStatus::Processed && score < REVIEW_THRESHOLD
            }
            FilterTag::Invalid => record.status.is_failure(),
            FilterTag::Pending => !record.status.is_terminal(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterTag::All => "all",
            FilterTag::Shortlisted => "shortlisted",
            FilterTag::Review => "review",
            FilterTag::Rejected => "rejected",
            FilterTag::Invalid => "invalid",
            FilterTag::Pending => "pending",
        }
    }
}

impl std::str::FromStr for FilterTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FilterTag::All),
            "shortlisted" => Ok(FilterTag::Shortlisted),
            "review" => Ok(FilterTag::Review),
            "rejected" => Ok(FilterTag::Rejected),
            "invalid" => Ok(FilterTag::Invalid),
            "pending" => Ok(FilterTag::Pending),
            other => Err(CoreError::Validation(format!(
                "Unknown filter: '{other}'. Valid filters: all, shortlisted, review, rejected, invalid, pending"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

/// Display ordering for the job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Store insertion order -- no reordering.
    #[default]
    Recent,
    /// Final score descending; absent scores sort as 0.
    ScoreHigh,
    /// Final score ascending; absent scores sort as 0.
    ScoreLow,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Recent => "recent",
            SortOrder::ScoreHigh => "score-high",
            SortOrder::ScoreLow => "score-low",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(SortOrder::Recent),
            "score-high" => Ok(SortOrder::ScoreHigh),
            "score-low" => Ok(SortOrder::ScoreLow),
            other => Err(CoreError::Validation(format!(
                "Unknown sort order: '{other}'. Valid orders: recent, score-high, score-low"
            ))),
        }
    }
}

/// Filter and sort a snapshot for display.
///
/// The snapshot slice is expected in store insertion order; `Recent`
/// keeps it untouched and the score orders use a stable sort, so equal
/// scores keep their insertion order.
pub fn derived_view(records: &[JobRecord], filter: FilterTag, sort: SortOrder) -> Vec<JobRecord> {
    let mut rows: Vec<JobRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();

    let key = |r: &JobRecord| r.final_score.unwrap_or(0.0);
    match sort {
        SortOrder::Recent => {}
        SortOrder::ScoreHigh => {
            rows.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal))
        }
        SortOrder::ScoreLow => {
            rows.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal))
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// Percentile band for a ranked job, mirroring the rank badge colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBand {
    /// Percentile <= 20.
    Top20,
    /// Percentile <= 50.
    Top50,
    Rest,
}

/// Ranking over the `PROCESSED` subset of a snapshot.
///
/// Computed from the full store snapshot, never from a filtered view:
/// rank 3 of 7 means third-best of all processed jobs regardless of the
/// active filter.  Ties take the position of their stable sort index --
/// no rank sharing.
#[derive(Debug, Clone)]
pub struct RankTable {
    positions: HashMap<JobId, usize>,
    processed_total: usize,
}

impl RankTable {
    /// Rank every processed record in the snapshot, best score first.
    pub fn compute(records: &[JobRecord]) -> Self {
        let mut processed: Vec<&JobRecord> = records
            .iter()
            .filter(|r| r.status == JobStatus::Processed)
            .collect();
        processed.sort_by(|a, b| {
            let (a, b) = (a.final_score.unwrap_or(0.0), b.final_score.unwrap_or(0.0));
            b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
        });

        let positions = processed
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i + 1))
            .collect();

        Self {
            positions,
            processed_total: processed.len(),
        }
    }

    /// 1-based rank of a processed job; `None` for unknown or unprocessed ids.
    pub fn rank(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Number of processed jobs the ranks are drawn from.
    pub fn processed_total(&self) -> usize {
        self.processed_total
    }

    /// Percentile position in (0, 100]; lower is better.
    pub fn percentile(&self, id: &str) -> Option<f64> {
        let rank = self.rank(id)?;
        Some(rank as f64 / self.processed_total as f64 * 100.0)
    }

    /// Band the percentile into top-20% / top-50% / rest.
    pub fn band(&self, id: &str) -> Option<RankBand> {
        let pct = self.percentile(id)?;
        Some(if pct <= 20.0 {
            RankBand::Top20
        } else if pct <= 50.0 {
            RankBand::Top50
        } else {
            RankBand::Rest
        })
    }
}

// ---------------------------------------------------------------------------
// Summary stats
// ---------------------------------------------------------------------------

/// Score histogram bucket boundaries, highest band first.
const SCORE_BUCKETS: &[(&str, f64, f64)] = &[
    ("90-100", 90.0, 100.0),
    ("80-89", 80.0, 89.0),
    ("70-79", 70.0, 79.0),
    ("60-69", 60.0, 69.0),
    ("50-59", 50.0, 59.0),
    ("0-49", 0.0, 49.0),
];

/// One bucket of the score-distribution histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub range: &'static str,
    pub count: usize,
}

/// Aggregate statistics over a snapshot, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningStats {
    pub total: usize,
    pub processed: usize,
    pub shortlisted: usize,
    pub review: usize,
    pub rejected: usize,
    pub invalid: usize,
    pub pending: usize,
    /// Mean final score over processed jobs; `None` when none are processed.
    pub average_score: Option<f64>,
    /// Shortlisted share of processed jobs, in percent.
    pub acceptance_rate: Option<f64>,
    /// Processed-score histogram, highest band first.
    pub histogram: Vec<ScoreBucket>,
}

impl ScreeningStats {
    pub fn compute(records: &[JobRecord]) -> Self {
        let count = |tag: FilterTag| records.iter().filter(|r| tag.matches(r)).count();

        let scores: Vec<f64> = records
            .iter()
            .filter(|r| r.status == JobStatus::Processed)
            .map(|r| r.final_score.unwrap_or(0.0))
            .collect();

        let processed = scores.len();
        let average_score =
            (processed > 0).then(|| scores.iter().sum::<f64>() / processed as f64);

        let shortlisted = count(FilterTag::Shortlisted);
        let acceptance_rate =
            (processed > 0).then(|| shortlisted as f64 / processed as f64 * 100.0);

        let histogram = SCORE_BUCKETS
            .iter()
            .map(|&(range, min, max)| ScoreBucket {
                range,
                count: scores.iter().filter(|&&s| s >= min && s <= max).count(),
            })
            .collect();

        Self {
            total: records.len(),
            processed,
            shortlisted,
            review: count(FilterTag::Review),
            rejected: count(FilterTag::Rejected),
            invalid: count(FilterTag::Invalid),
            pending: count(FilterTag::Pending),
            average_score,
            acceptance_rate,
            histogram,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch progress
// ---------------------------------------------------------------------------

/// How much of the current batch has reached a terminal state.
///
/// Always derived from the snapshot it was computed from; submitting more
/// jobs mid-flight changes the denominator on the next call rather than
/// producing a cached, stale percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub settled: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn compute(records: &[JobRecord]) -> Self {
        Self {
            settled: records.iter().filter(|r| r.status.is_terminal()).count(),
            total: records.len(),
        }
    }

    /// Completion in percent; 100 for an empty store.
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.settled as f64 / self.total as f64 * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{JobRecord, JobUpdate};
    use crate::status::{Decision, JobStatus};

    fn processed(id: &str, score: f64) -> JobRecord {
        let mut r = JobRecord::submitted(id, None, "jd-1", chrono::Utc::now());
        r.apply(&JobUpdate::processed(id, score, Decision::for_score(score)));
        r
    }

    fn failed(id: &str) -> JobRecord {
        let mut r = JobRecord::submitted(id, None, "jd-1", chrono::Utc::now());
        r.apply(&JobUpdate::failed(id, JobStatus::Failed, "corrupt file"));
        r
    }

    fn pending(id: &str) -> JobRecord {
        JobRecord::submitted(id, None, "jd-1", chrono::Utc::now())
    }

    fn snapshot() -> Vec<JobRecord> {
        vec![
            processed("RES_A", 75.0),
            processed("RES_B", 45.0),
            processed("RES_C", 20.0),
            failed("RES_D"),
            pending("RES_E"),
        ]
    }

    // -- filters -------------------------------------------------------------

    #[test]
    fn filter_buckets() {
        let snap = snapshot();
        let ids = |tag: FilterTag| -> Vec<String> {
            derived_view(&snap, tag, SortOrder::Recent)
                .iter()
                .map(|r| r.id.clone())
                .collect()
        };

        assert_eq!(ids(FilterTag::Shortlisted), vec!["RES_A"]);
        assert_eq!(ids(FilterTag::Review), vec!["RES_B"]);
        assert_eq!(ids(FilterTag::Rejected), vec!["RES_C"]);
        assert_eq!(ids(FilterTag::Invalid), vec!["RES_D"]);
        assert_eq!(ids(FilterTag::Pending), vec!["RES_E"]);
    }

    #[test]
    fn filter_partitions_are_exhaustive_and_disjoint() {
        let tags = [
            FilterTag::Shortlisted,
            FilterTag::Review,
            FilterTag::Rejected,
            FilterTag::Invalid,
            FilterTag::Pending,
        ];

        // Boundary scores on top of the usual snapshot.
        let mut snap = snapshot();
        snap.push(processed("RES_F", 60.0));
        snap.push(processed("RES_G", 40.0));
        snap.push(processed("RES_H", 0.0));

        for record in &snap {
            let matching = tags.iter().filter(|t| t.matches(record)).count();
            assert_eq!(matching, 1, "record {} must match exactly one tag", record.id);
        }
    }

    // -- sorting -------------------------------------------------------------

    #[test]
    fn recent_preserves_insertion_order() {
        let snap = snapshot();
        let view = derived_view(&snap, FilterTag::All, SortOrder::Recent);
        let ids: Vec<_> = view.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["RES_A", "RES_B", "RES_C", "RES_D", "RES_E"]);
    }

    #[test]
    fn score_sorts_treat_missing_as_zero() {
        let snap = snapshot();
        let high = derived_view(&snap, FilterTag::All, SortOrder::ScoreHigh);
        let ids: Vec<_> = high.iter().map(|r| r.id.as_str()).collect();
        // RES_D and RES_E have no score and sort as 0, after RES_C (20).
        assert_eq!(ids, vec!["RES_A", "RES_B", "RES_C", "RES_D", "RES_E"]);

        let low = derived_view(&snap, FilterTag::All, SortOrder::ScoreLow);
        let ids: Vec<_> = low.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["RES_D", "RES_E", "RES_C", "RES_B", "RES_A"]);
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let snap = vec![
            processed("RES_A", 50.0),
            processed("RES_B", 50.0),
            processed("RES_C", 50.0),
        ];
        let view = derived_view(&snap, FilterTag::All, SortOrder::ScoreHigh);
        let ids: Vec<_> = view.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["RES_A", "RES_B", "RES_C"]);
    }

    // -- ranking -------------------------------------------------------------

    #[test]
    fn ranks_are_a_permutation_over_processed_jobs() {
        let snap = snapshot();
        let table = RankTable::compute(&snap);

        assert_eq!(table.processed_total(), 3);
        assert_eq!(table.rank("RES_A"), Some(1));
        assert_eq!(table.rank("RES_B"), Some(2));
        assert_eq!(table.rank("RES_C"), Some(3));
        assert_eq!(table.rank("RES_D"), None);
        assert_eq!(table.rank("RES_E"), None);
    }

    #[test]
    fn tied_scores_rank_by_insertion_order_without_sharing() {
        let snap = vec![
            processed("RES_A", 50.0),
            processed("RES_B", 80.0),
            processed("RES_C", 50.0),
        ];
        let table = RankTable::compute(&snap);
        assert_eq!(table.rank("RES_B"), Some(1));
        assert_eq!(table.rank("RES_A"), Some(2));
        assert_eq!(table.rank("RES_C"), Some(3));
    }

    #[test]
    fn rank_is_deterministic_on_unchanged_snapshot() {
        let snap = snapshot();
        let a = RankTable::compute(&snap);
        let b = RankTable::compute(&snap);
        for r in &snap {
            assert_eq!(a.rank(&r.id), b.rank(&r.id));
        }
    }

    #[test]
    fn percentile_bands() {
        let snap: Vec<JobRecord> = (0..10)
            .map(|i| processed(&format!("RES_{i}"), 100.0 - i as f64))
            .collect();
        let table = RankTable::compute(&snap);

        assert_eq!(table.band("RES_0"), Some(RankBand::Top20)); // 10th pct
        assert_eq!(table.band("RES_4"), Some(RankBand::Top50)); // 50th pct
        assert_eq!(table.band("RES_9"), Some(RankBand::Rest)); // 100th pct
        assert_eq!(table.band("RES_missing"), None);
    }

    // -- stats ---------------------------------------------------------------

    #[test]
    fn stats_counts_and_rates() {
        let stats = ScreeningStats::compute(&snapshot());

        assert_eq!(stats.total, 5);
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.shortlisted, 1);
        assert_eq!(stats.review, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.pending, 1);

        let avg = stats.average_score.unwrap();
        assert!((avg - (75.0 + 45.0 + 20.0) / 3.0).abs() < 1e-9);
        let rate = stats.acceptance_rate.unwrap();
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn stats_empty_store() {
        let stats = ScreeningStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, None);
        assert_eq!(stats.acceptance_rate, None);
    }

    #[test]
    fn histogram_buckets_scores() {
        let snap = vec![
            processed("RES_A", 95.0),
            processed("RES_B", 92.0),
            processed("RES_C", 61.0),
            processed("RES_D", 10.0),
        ];
        let stats = ScreeningStats::compute(&snap);
        let by_range: HashMap<_, _> = stats
            .histogram
            .iter()
            .map(|b| (b.range, b.count))
            .collect();

        assert_eq!(by_range["90-100"], 2);
        assert_eq!(by_range["60-69"], 1);
        assert_eq!(by_range["0-49"], 1);
        assert_eq!(by_range["80-89"], 0);
    }

    // -- progress ------------------------------------------------------------

    #[test]
    fn progress_counts_terminal_records() {
        let progress = BatchProgress::compute(&snapshot());
        assert_eq!(progress.settled, 4);
        assert_eq!(progress.total, 5);
        assert!((progress.percent() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn progress_empty_store_is_complete() {
        let progress = BatchProgress::compute(&[]);
        assert!((progress.percent() - 100.0).abs() < 1e-9);
    }
}
