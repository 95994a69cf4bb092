//! Paralog clusters and lenient fusion-name matching
//!
//! Fusion callers sometimes report a paralog of the true partner gene. A truth
//! fusion `A--B` that no prediction names directly is re-tested against every
//! combination of paralogs of `A` and of `B`.

use crate::breakpoint::PAIR_SEPARATOR;
use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::metrics::OverlapMetrics;
use crate::table::open_reader;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Groups of mutually interchangeable gene symbols; a gene may sit in several groups
#[derive(Debug, Default, Clone)]
pub struct ParalogClusters {
    clusters: Vec<Vec<String>>,
    membership: FxHashMap<String, Vec<usize>>,
}

impl ParalogClusters {
    /// Build from clusters of gene symbols; symbols are upper-cased
    pub fn from_clusters<I, C, S>(clusters: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paralogs = Self::default();
        for cluster in clusters {
            let genes: Vec<String> = cluster
                .into_iter()
                .map(|gene| gene.as_ref().to_uppercase())
                .collect();
            if genes.is_empty() {
                continue;
            }
            let cluster_id = paralogs.clusters.len();
            for gene in &genes {
                let memberships = paralogs.membership.entry(gene.clone()).or_default();
                if !memberships.contains(&cluster_id) {
                    memberships.push(cluster_id);
                }
            }
            paralogs.clusters.push(genes);
        }
        paralogs
    }

    /// Parse one whitespace-separated cluster per line; blank lines and `#` comments are ignored
    pub fn parse(contents: &str) -> Self {
        Self::from_clusters(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| line.split_whitespace()),
        )
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        Ok(Self::parse(&contents))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let clusters = Self::from_reader(open_reader(path.as_ref())?)?;
        info!(
            "Loaded {} paralog clusters covering {} genes from {}",
            clusters.len(),
            clusters.gene_count(),
            path.as_ref().display()
        );
        Ok(clusters)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn gene_count(&self) -> usize {
        self.membership.len()
    }

    /// The gene followed by every member of every cluster it belongs to, without repeats
    pub fn expand(&self, gene: &str) -> Vec<String> {
        let mut expanded = vec![gene.to_string()];
        if let Some(cluster_ids) = self.membership.get(gene) {
            for &cluster_id in cluster_ids {
                for member in &self.clusters[cluster_id] {
                    if !expanded.contains(member) {
                        expanded.push(member.clone());
                    }
                }
            }
        }
        expanded
    }
}

/// Paralog expansion of fusion names under one key mode
pub struct ParalogResolver<'a> {
    clusters: &'a ParalogClusters,
    config: &'a ComparisonConfig,
}

impl<'a> ParalogResolver<'a> {
    pub fn new(clusters: &'a ParalogClusters, config: &'a ComparisonConfig) -> Self {
        Self { clusters, config }
    }

    /// Every paralog-equivalent name of a two-gene fusion, keyed like the predictions.
    ///
    /// Chained fusions (more than two genes) have no expansion.
    pub fn equivalent_names(&self, gene_pair: &str) -> Vec<String> {
        let genes: Vec<&str> = gene_pair.split(PAIR_SEPARATOR).collect();
        let [left, right] = genes.as_slice() else {
            debug!("Skipping paralog expansion of chained fusion {}", gene_pair);
            return Vec::new();
        };

        let right_paralogs = self.clusters.expand(right);
        let mut names = Vec::new();
        for l in self.clusters.expand(left) {
            for r in &right_paralogs {
                let name = self.config.name_key(&format!("{}{}{}", l, PAIR_SEPARATOR, r));
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Names in `remaining` that are paralog-equivalent to `gene_pair`, sorted.
    pub fn expand_and_match(&self, gene_pair: &str, remaining: &BTreeSet<String>) -> Vec<String> {
        let matches: BTreeSet<String> = self
            .equivalent_names(gene_pair)
            .into_iter()
            .filter(|name| remaining.contains(name))
            .collect();
        if matches.len() > 1 {
            warn!(
                "Multiple paralogs of truth fusion {} match predicted fusions: {}",
                gene_pair,
                matches.iter().cloned().collect::<Vec<_>>().join(";")
            );
        }
        matches.into_iter().collect()
    }
}

/// How a truth or predicted fusion name was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatchType {
    Exact,
    Paralog,
    Unmatched,
}

impl NameMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameMatchType::Exact => "Exact",
            NameMatchType::Paralog => "Paralog",
            NameMatchType::Unmatched => "Unmatched",
        }
    }
}

impl fmt::Display for NameMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub match_type: NameMatchType,
    /// Truth name; `None` for predictions nothing claimed
    pub truth: Option<String>,
    pub predictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameReconciliation {
    pub records: Vec<NameRecord>,
    pub truth_total: usize,
    pub prediction_total: usize,
    /// Predicted names recovered through paralog expansion, summed over truth names
    pub paralog_hits: usize,
}

impl NameReconciliation {
    /// False positives are the predicted names no truth name claimed
    pub fn metrics(&self) -> OverlapMetrics {
        let matched_truth = self
            .records
            .iter()
            .filter(|r| r.truth.is_some() && r.match_type != NameMatchType::Unmatched)
            .count();
        let unclaimed = self.records.iter().filter(|r| r.truth.is_none()).count();
        OverlapMetrics::new(
            matched_truth,
            self.truth_total,
            self.prediction_total - unclaimed,
            self.prediction_total,
        )
    }
}

/// Match truth fusion names to predicted ones, directly and then through paralogs.
pub fn reconcile_names<S: AsRef<str>, P: AsRef<str>>(
    truth: &[S],
    predictions: &[P],
    clusters: Option<&ParalogClusters>,
    config: &ComparisonConfig,
) -> NameReconciliation {
    let truth: BTreeSet<String> = truth.iter().map(|t| config.name_key(t.as_ref())).collect();
    let predictions: BTreeSet<String> = predictions
        .iter()
        .map(|p| config.name_key(p.as_ref()))
        .collect();

    let mut records: Vec<NameRecord> = truth
        .intersection(&predictions)
        .map(|name| NameRecord {
            match_type: NameMatchType::Exact,
            truth: Some(name.clone()),
            predictions: vec![name.clone()],
        })
        .collect();
    let truth_only: Vec<&String> = truth.difference(&predictions).collect();
    let remaining: BTreeSet<String> = predictions.difference(&truth).cloned().collect();

    let mut paralog_hits = 0;
    let mut claimed: FxHashMap<&str, usize> = FxHashMap::default();
    let resolver = clusters.map(|clusters| ParalogResolver::new(clusters, config));

    for name in &truth_only {
        let matches = resolver
            .as_ref()
            .map(|resolver| resolver.expand_and_match(name, &remaining))
            .unwrap_or_default();
        if matches.is_empty() {
            records.push(NameRecord {
                match_type: NameMatchType::Unmatched,
                truth: Some(name.to_string()),
                predictions: Vec::new(),
            });
            continue;
        }
        paralog_hits += matches.len();
        records.push(NameRecord {
            match_type: NameMatchType::Paralog,
            truth: Some(name.to_string()),
            predictions: matches,
        });
    }

    for record in records.iter().filter(|r| r.match_type == NameMatchType::Paralog) {
        for prediction in &record.predictions {
            *claimed.entry(prediction.as_str()).or_default() += 1;
        }
    }
    for (prediction, count) in &claimed {
        if *count > 1 {
            warn!(
                "Predicted fusion {} is a paralog match of {} truth fusions",
                prediction, count
            );
        }
    }

    if let Some(clusters) = clusters {
        if paralog_hits == 0 && !clusters.is_empty() && !truth_only.is_empty() && !remaining.is_empty() {
            warn!("No paralogs found!");
        } else {
            info!("Paralog expansion recovered {} predicted fusions", paralog_hits);
        }
    }

    let unclaimed: Vec<NameRecord> = remaining
        .iter()
        .filter(|name| !claimed.contains_key(name.as_str()))
        .map(|name| NameRecord {
            match_type: NameMatchType::Unmatched,
            truth: None,
            predictions: vec![name.clone()],
        })
        .collect();
    records.extend(unclaimed);

    NameReconciliation {
        records,
        truth_total: truth.len(),
        prediction_total: predictions.len(),
        paralog_hits,
    }
}
