//! Behavioral anomaly scoring.
//!
//! Builds a fixed 16-feature vector from an actor's rolling 24h window and
//! scores it with an isolation-forest-equivalent ensemble trained in-process.
//! There is no sklearn here, so the forest is grown directly: each tree
//! partitions a random subsample with random feature/threshold splits, and
//! the anomaly score follows the standard path-length normalization.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::defaults::{
    ANOMALY_CONTAMINATION, BEHAVIOR_WINDOW_HOURS, FEATURE_COUNT, ISOLATION_FOREST_SEED,
    ISOLATION_FOREST_SUBSAMPLE_SIZE, ISOLATION_FOREST_TREES,
};
use crate::types::enums::{Action, Sensitivity};

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "total_events_24h",
    "total_bytes_24h_mb",
    "unique_documents_24h",
    "is_after_hours",
    "is_weekend",
    "hour_of_day",
    "cross_dept_access_count",
    "cross_dept_ratio",
    "download_count",
    "modify_count",
    "view_count",
    "confidential_access_count",
    "internal_access_count",
    "avg_session_duration_secs",
    "unique_ips",
    "unique_devices",
];

/// Fixed-order feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorFeatures {
    pub total_events_24h: f64,
    pub total_bytes_24h_mb: f64,
    pub unique_documents_24h: f64,
    pub is_after_hours: f64,
    pub is_weekend: f64,
    pub hour_of_day: f64,
    pub cross_dept_access_count: f64,
    pub cross_dept_ratio: f64,
    pub download_count: f64,
    pub modify_count: f64,
    pub view_count: f64,
    pub confidential_access_count: f64,
    pub internal_access_count: f64,
    pub avg_session_duration_secs: f64,
    pub unique_ips: f64,
    pub unique_devices: f64,
}

impl BehaviorFeatures {
    pub fn to_vec(self) -> Vec<f64> {
        vec![
            self.total_events_24h,
            self.total_bytes_24h_mb,
            self.unique_documents_24h,
            self.is_after_hours,
            self.is_weekend,
            self.hour_of_day,
            self.cross_dept_access_count,
            self.cross_dept_ratio,
            self.download_count,
            self.modify_count,
            self.view_count,
            self.confidential_access_count,
            self.internal_access_count,
            self.avg_session_duration_secs,
            self.unique_ips,
            self.unique_devices,
        ]
    }
}

/// One event's worth of behavioral signal, kept only long enough to fall out
/// of the 24h window.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub bytes_transferred: u64,
    pub document_id: Option<String>,
    pub is_cross_department: bool,
    pub sensitivity: Option<Sensitivity>,
    pub source_ip: Option<String>,
    pub device_info: Option<String>,
    pub session_id: Option<String>,
}

/// Per-actor rolling history, evicted to the 24h window on every update.
#[derive(Debug, Clone, Default)]
pub struct ActorHistory {
    entries: VecDeque<HistoryEntry>,
}

impl ActorHistory {
    fn evict_before(&mut self, cutoff: DateTime<Utc>) {
        while matches!(self.entries.front(), Some(e) if e.timestamp < cutoff) {
            self.entries.pop_front();
        }
    }

    /// Append a new entry and evict anything older than the window.
    pub fn record(&mut self, entry: HistoryEntry) {
        let cutoff = entry.timestamp - chrono::Duration::hours(BEHAVIOR_WINDOW_HOURS);
        self.entries.push_back(entry);
        self.evict_before(cutoff);
    }

    /// Extract the feature vector for a candidate entry against this
    /// actor's window, including the candidate itself.
    pub fn extract_features(&self, candidate: &HistoryEntry) -> BehaviorFeatures {
        let cutoff = candidate.timestamp - chrono::Duration::hours(BEHAVIOR_WINDOW_HOURS);
        let mut window: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp >= cutoff && e.timestamp <= candidate.timestamp)
            .collect();
        if !window.iter().any(|e| std::ptr::eq(*e, candidate)) {
            window.push(candidate);
        }

        let total_events = window.len() as f64;
        let total_bytes_mb: f64 = window.iter().map(|e| e.bytes_transferred as f64).sum::<f64>() / 1_000_000.0;

        let mut doc_ids = HashSet::new();
        let mut ips = HashSet::new();
        let mut devices = HashSet::new();
        let mut cross_dept = 0.0;
        let mut download = 0.0;
        let mut modify = 0.0;
        let mut view = 0.0;
        let mut confidential = 0.0;
        let mut internal = 0.0;

        let mut session_spans: HashMap<&str, (DateTime<Utc>, DateTime<Utc>)> = HashMap::new();

        for e in &window {
            if let Some(d) = &e.document_id {
                doc_ids.insert(d.clone());
            }
            if let Some(ip) = &e.source_ip {
                ips.insert(ip.clone());
            }
            if let Some(dev) = &e.device_info {
                devices.insert(dev.clone());
            }
            if e.is_cross_department {
                cross_dept += 1.0;
            }
            match e.action {
                Action::Download => download += 1.0,
                Action::Modify => modify += 1.0,
                Action::View => view += 1.0,
                _ => {}
            }
            match e.sensitivity {
                Some(Sensitivity::Confidential) => confidential += 1.0,
                Some(Sensitivity::Internal) => internal += 1.0,
                _ => {}
            }
            if let Some(sid) = &e.session_id {
                session_spans
                    .entry(sid.as_str())
                    .and_modify(|(start, end)| {
                        if e.timestamp < *start {
                            *start = e.timestamp;
                        }
                        if e.timestamp > *end {
                            *end = e.timestamp;
                        }
                    })
                    .or_insert((e.timestamp, e.timestamp));
            }
        }

        let avg_session_duration_secs = if session_spans.is_empty() {
            0.0
        } else {
            let total: f64 = session_spans
                .values()
                .map(|(start, end)| (*end - *start).num_seconds() as f64)
                .sum();
            total / session_spans.len() as f64
        };

        BehaviorFeatures {
            total_events_24h: total_events,
            total_bytes_24h_mb: total_bytes_mb,
            unique_documents_24h: doc_ids.len() as f64,
            is_after_hours: if is_after_hours(candidate.timestamp) { 1.0 } else { 0.0 },
            is_weekend: if is_weekend(candidate.timestamp) { 1.0 } else { 0.0 },
            hour_of_day: hour_of_day(candidate.timestamp),
            cross_dept_access_count: cross_dept,
            cross_dept_ratio: if total_events > 0.0 { cross_dept / total_events } else { 0.0 },
            download_count: download,
            modify_count: modify,
            view_count: view,
            confidential_access_count: confidential,
            internal_access_count: internal,
            avg_session_duration_secs,
            unique_ips: ips.len() as f64,
            unique_devices: devices.len() as f64,
        }
    }
}

fn hour_of_day(ts: DateTime<Utc>) -> f64 {
    ts.format("%H").to_string().parse::<f64>().unwrap_or(0.0)
}

fn is_after_hours(ts: DateTime<Utc>) -> bool {
    let hour = hour_of_day(ts) as i64;
    !(8..=18).contains(&hour)
}

fn is_weekend(ts: DateTime<Utc>) -> bool {
    use chrono::Datelike;
    ts.weekday().num_days_from_monday() >= 5
}

/// A single isolation tree: a random binary partition of a feature-space
/// subsample, used to measure how quickly a point separates from the rest.
struct IsolationTree {
    root: TreeNode,
}

enum TreeNode {
    Leaf { size: usize },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Average path length of an unsuccessful BST search over `n` points —
/// the standard isolation-forest normalization constant.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * (n - 1.0).ln() + 0.5772156649 - 2.0 * (n - 1.0) / n
}

impl IsolationTree {
    fn build(data: &[Vec<f64>], depth: usize, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: Self::build_node(data, depth, max_depth, rng),
        }
    }

    fn build_node(data: &[Vec<f64>], depth: usize, max_depth: usize, rng: &mut StdRng) -> TreeNode {
        if data.len() <= 1 || depth >= max_depth {
            return TreeNode::Leaf { size: data.len() };
        }

        let n_features = data[0].len();
        let feature = rng.gen_range(0..n_features);

        let (min, max) = data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
            (lo.min(row[feature]), hi.max(row[feature]))
        });

        if !(min < max) {
            return TreeNode::Leaf { size: data.len() };
        }

        let threshold = rng.gen_range(min..max);
        let (left_data, right_data): (Vec<Vec<f64>>, Vec<Vec<f64>>) =
            data.iter().cloned().partition(|row| row[feature] < threshold);

        if left_data.is_empty() || right_data.is_empty() {
            return TreeNode::Leaf { size: data.len() };
        }

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(Self::build_node(&left_data, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_node(&right_data, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, point: &[f64]) -> f64 {
        Self::path_length_node(&self.root, point, 0)
    }

    fn path_length_node(node: &TreeNode, point: &[f64], depth: usize) -> f64 {
        match node {
            TreeNode::Leaf { size } => depth as f64 + average_path_length(*size),
            TreeNode::Split { feature, threshold, left, right } => {
                if point[*feature] < *threshold {
                    Self::path_length_node(left, point, depth + 1)
                } else {
                    Self::path_length_node(right, point, depth + 1)
                }
            }
        }
    }
}

/// Isolation-forest-equivalent ensemble. Raw scores fall in
/// roughly `[-0.5, 0.5]`; lower (more negative) means more isolated/anomalous,
/// matching the usual sklearn isolation-forest convention.
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
}

impl IsolationForest {
    /// Fit `n_trees` trees over `data`, each grown from an independent random
    /// subsample of `subsample_size` rows (or all rows, if fewer exist).
    pub fn fit(data: &[Vec<f64>], n_trees: usize, subsample_size: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let effective_subsample = subsample_size.min(data.len().max(1));
        let max_depth = (effective_subsample.max(2) as f64).log2().ceil() as usize;

        let trees = (0..n_trees)
            .map(|_| {
                let sample = if data.len() <= effective_subsample {
                    data.to_vec()
                } else {
                    (0..effective_subsample)
                        .map(|_| data[rng.gen_range(0..data.len())].clone())
                        .collect()
                };
                IsolationTree::build(&sample, 0, max_depth, &mut rng)
            })
            .collect();

        Self {
            trees,
            subsample_size: effective_subsample,
        }
    }

    /// sklearn-consistent raw anomaly score: `0.5 - 2^(-E[h(x)] / c(n))`.
    pub fn raw_score(&self, point: &[f64]) -> f64 {
        let c = average_path_length(self.subsample_size);
        if c <= 0.0 {
            return 0.0;
        }
        let avg_path = self.trees.iter().map(|t| t.path_length(point)).sum::<f64>() / self.trees.len() as f64;
        0.5 - 2f64.powf(-avg_path / c)
    }
}

/// Wraps an [`IsolationForest`] with the per-actor history needed to build
/// feature vectors, plus the raw-score-to-[0,1] normalization.
pub struct BehaviorScorer {
    histories: HashMap<String, ActorHistory>,
    forest: Option<IsolationForest>,
}

impl Default for BehaviorScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorScorer {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
            forest: None,
        }
    }

    /// Train (or retrain) the ensemble over a batch of feature vectors. Until
    /// this has been called at least once, `score` returns 0 (not anomalous)
    /// — there is no held-out training corpus shipped with the service, so
    /// the minimal in-process `fit` exists for bootstrapping and tests.
    pub fn fit(&mut self, training_data: &[BehaviorFeatures]) {
        let rows: Vec<Vec<f64>> = training_data.iter().map(|f| f.to_vec()).collect();
        self.forest = Some(IsolationForest::fit(
            &rows,
            ISOLATION_FOREST_TREES,
            ISOLATION_FOREST_SUBSAMPLE_SIZE,
            ISOLATION_FOREST_SEED,
        ));
    }

    pub fn is_fitted(&self) -> bool {
        self.forest.is_some()
    }

    /// Normalize a raw isolation-forest score into `[0, 1]`
    /// (`(-raw + 0.5) / 1.0`, clipped).
    fn normalize(raw_score: f64) -> f64 {
        ((-raw_score + 0.5) / 1.0).clamp(0.0, 1.0)
    }

    /// Score one candidate event against an actor's rolling window, then
    /// fold the event into the window for next time.
    pub fn score_event(&mut self, actor_id: &str, entry: HistoryEntry) -> (f64, BehaviorFeatures) {
        let history = self.histories.entry(actor_id.to_string()).or_default();
        let features = history.extract_features(&entry);

        let score = match &self.forest {
            Some(forest) => Self::normalize(forest.raw_score(&features.to_vec())),
            None => 0.0,
        };

        history.record(entry);
        (score, features)
    }

    pub fn contamination(&self) -> f64 {
        ANOMALY_CONTAMINATION
    }
}
