//! Scoring produced outlines against reference outlines.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Document, OutlineEntry};
use crate::text::{normalize, similarity};

/// How produced entries are matched to reference entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Equal normalized text on the same page
    #[default]
    Exact,
    /// Text similarity at or above the threshold on the same page; each
    /// produced entry takes its best-scoring unmatched reference
    Similar(f64),
}

impl MatchPolicy {
    /// Default similarity threshold.
    pub const DEFAULT_SIMILARITY: f64 = 0.7;

    /// Similarity matching with the default threshold.
    pub fn similar() -> Self {
        MatchPolicy::Similar(Self::DEFAULT_SIMILARITY)
    }
}

/// The quality metrics of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when nothing matched
    pub hierarchy_accuracy: Option<f64>,
}

/// Match counts and metrics for one produced/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Matches whose levels agree
    pub level_matches: usize,
    #[serde(flatten)]
    pub scores: Scores,
}

impl EvaluationResult {
    /// Derive metrics from match counts.
    ///
    /// Two empty outlines agree perfectly; otherwise an empty denominator
    /// yields 0.
    pub fn from_counts(
        true_positives: usize,
        false_positives: usize,
        false_negatives: usize,
        level_matches: usize,
    ) -> Self {
        let produced = true_positives + false_positives;
        let reference = true_positives + false_negatives;

        let (precision, recall) = if produced == 0 && reference == 0 {
            (1.0, 1.0)
        } else {
            (ratio(true_positives, produced), ratio(true_positives, reference))
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let hierarchy_accuracy =
            (true_positives > 0).then(|| level_matches as f64 / true_positives as f64);

        Self {
            true_positives,
            false_positives,
            false_negatives,
            level_matches,
            scores: Scores {
                precision,
                recall,
                f1,
                hierarchy_accuracy,
            },
        }
    }

    pub fn precision(&self) -> f64 {
        self.scores.precision
    }

    pub fn recall(&self) -> f64 {
        self.scores.recall
    }

    pub fn f1(&self) -> f64 {
        self.scores.f1
    }

    pub fn hierarchy_accuracy(&self) -> Option<f64> {
        self.scores.hierarchy_accuracy
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Compares outlines under a match policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    policy: MatchPolicy,
}

impl Evaluator {
    /// Create an evaluator.
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Policy in use.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Greedily match produced entries to reference entries, in produced
    /// order.
    pub fn evaluate(&self, produced: &[OutlineEntry], reference: &[OutlineEntry]) -> EvaluationResult {
        let reference_keys: Vec<String> = reference.iter().map(|e| normalize(&e.text)).collect();
        let mut taken = vec![false; reference.len()];
        let mut matched = 0;
        let mut level_matches = 0;

        for entry in produced {
            let key = normalize(&entry.text);
            let found = match self.policy {
                MatchPolicy::Exact => reference.iter().enumerate().position(|(j, r)| {
                    !taken[j] && r.page == entry.page && reference_keys[j] == key
                }),
                MatchPolicy::Similar(threshold) => {
                    let mut best: Option<(usize, f64)> = None;
                    for (j, r) in reference.iter().enumerate() {
                        if taken[j] || r.page != entry.page {
                            continue;
                        }
                        let score = similarity(&entry.text, &r.text);
                        if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                            best = Some((j, score));
                        }
                    }
                    best.map(|(j, _)| j)
                }
            };

            if let Some(j) = found {
                taken[j] = true;
                matched += 1;
                if reference[j].level == entry.level {
                    level_matches += 1;
                }
            }
        }

        EvaluationResult::from_counts(
            matched,
            produced.len() - matched,
            reference.len() - matched,
            level_matches,
        )
    }

    /// Compare two outline documents.
    pub fn evaluate_documents(&self, produced: &Document, reference: &Document) -> EvaluationResult {
        self.evaluate(&produced.outline, &reference.outline)
    }

    /// Compare two outline JSON files.
    pub fn evaluate_files(&self, produced: &Path, reference: &Path) -> Result<EvaluationResult> {
        let produced = read_document(produced)?;
        let reference = read_document(reference)?;
        Ok(self.evaluate_documents(&produced, &reference))
    }

    /// Compare every reference in `reference_dir` with the produced outline
    /// of the same name in `produced_dir`.
    pub fn evaluate_dirs(&self, produced_dir: &Path, reference_dir: &Path) -> Result<BatchEvaluation> {
        let produced = json_files(produced_dir)?;
        let references = json_files(reference_dir)?;

        let mut batch = BatchEvaluation::default();
        for (key, reference_path) in references {
            let Some(produced_path) = produced.get(&key) else {
                log::warn!("No produced outline for {}", reference_path.display());
                batch.missing.push(key);
                continue;
            };
            let result = match self.evaluate_files(produced_path, &reference_path) {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("Skipping {}: {}", key, e);
                    batch.failed.push(FailedEvaluation {
                        name: key,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            batch.files.push(FileEvaluation {
                name: key,
                produced: produced_path.clone(),
                reference: reference_path,
                result,
            });
        }
        Ok(batch)
    }
}

/// Read an outline JSON file.
pub fn read_document(path: &Path) -> Result<Document> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Pairing key of an outline file: the stem without the `e-` reference
/// prefix or `_structure` output suffix.
pub fn pairing_key(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let stem = stem.strip_prefix("e-").unwrap_or(stem);
    let stem = stem.strip_suffix("_structure").unwrap_or(stem);
    Some(stem.to_string())
}

fn json_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }
        if let Some(key) = pairing_key(&path) {
            files.insert(key, path);
        }
    }
    Ok(files)
}

/// Result for one produced/reference pair in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEvaluation {
    /// Pairing key
    pub name: String,
    pub produced: PathBuf,
    pub reference: PathBuf,
    pub result: EvaluationResult,
}

/// A pair that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEvaluation {
    pub name: String,
    pub error: String,
}

/// Results for a directory of references.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchEvaluation {
    /// Evaluated pairs in name order
    pub files: Vec<FileEvaluation>,
    /// References without a produced outline
    pub missing: Vec<String>,
    /// Pairs where either file is unreadable or malformed
    pub failed: Vec<FailedEvaluation>,
}

impl BatchEvaluation {
    /// Mean of each metric over the evaluated files; hierarchy accuracy
    /// averages only files where it is defined.
    pub fn average(&self) -> Option<Scores> {
        if self.files.is_empty() {
            return None;
        }
        let n = self.files.len() as f64;
        let mean = |f: fn(&EvaluationResult) -> f64| {
            self.files.iter().map(|file| f(&file.result)).sum::<f64>() / n
        };

        let defined: Vec<f64> = self
            .files
            .iter()
            .filter_map(|f| f.result.hierarchy_accuracy())
            .collect();
        let hierarchy_accuracy =
            (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64);

        Some(Scores {
            precision: mean(EvaluationResult::precision),
            recall: mean(EvaluationResult::recall),
            f1: mean(EvaluationResult::f1),
            hierarchy_accuracy,
        })
    }
}
