use serde::Serialize;

use crate::table::Dataset;

/// 1-decimal display rounding used on aggregate cards.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.iter().flatten() {
        sum += v;
        count += 1;
    }
    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

/// Cohort-level pre/post means and their spread. `relative_gain` is the
/// class-average gain as a percentage of the pre-test mean.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAnalysis {
    pub avg_pre: Option<f64>,
    pub avg_post: Option<f64>,
    pub difference: Option<f64>,
    pub relative_gain: Option<f64>,
}

pub fn score_analysis(pre: &[Option<f64>], post: &[Option<f64>]) -> ScoreAnalysis {
    let avg_pre = mean(pre);
    let avg_post = mean(post);
    let difference = match (avg_pre, avg_post) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    };
    let relative_gain = match (avg_pre, difference) {
        (Some(a), Some(d)) if a > 0.0 => Some(d / a * 100.0),
        _ => None,
    };
    ScoreAnalysis {
        avg_pre,
        avg_post,
        difference,
        relative_gain,
    }
}

/// Per-row improvement: post - pre, missing when either operand is.
pub fn improvements(pre: &[Option<f64>], post: &[Option<f64>]) -> Vec<Option<f64>> {
    pre.iter()
        .zip(post.iter())
        .map(|(p, q)| match (p, q) {
            (Some(p), Some(q)) => Some(q - p),
            _ => None,
        })
        .collect()
}

/// Mean of per-row improvements. Distinct from `ScoreAnalysis::difference`
/// (difference of column means): rows missing one score shift the two
/// figures apart, and both are displayed.
pub fn mean_improvement(improvements: &[Option<f64>]) -> Option<f64> {
    mean(improvements)
}

/// Single-row insight category. Thresholds are evaluated in strict
/// descending order, inclusive at the lower bound of each band.
pub fn categorize_improvement(pre: Option<f64>, post: Option<f64>) -> &'static str {
    let (Some(pre), Some(post)) = (pre, post) else {
        return "Insufficient Data";
    };
    let improvement = post - pre;
    if improvement >= 50.0 {
        "Excellent Improvement"
    } else if improvement >= 20.0 {
        "Strong Improvement"
    } else if improvement >= 5.0 {
        "Moderate Improvement"
    } else if improvement >= -5.0 {
        "Neutral"
    } else {
        "Needs Improvement"
    }
}

/// Tone bucket the UI maps to insight styling.
pub fn insight_tone(category: &str) -> &'static str {
    if category.contains("Excellent") || category.contains("Strong") {
        "improved"
    } else if category.contains("Moderate") || category.contains("Neutral") {
        "neutral"
    } else {
        "needs-improvement"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Distribution-chart buckets. These thresholds deliberately differ from
/// the per-row insight bands (no Neutral band, Moderate reaches down to 0)
/// and must not be unified with them. Rows without an improvement value are
/// excluded.
pub fn cohort_buckets(improvements: &[Option<f64>]) -> Vec<CohortBucket> {
    let mut excellent = 0usize;
    let mut strong = 0usize;
    let mut moderate = 0usize;
    let mut negative = 0usize;
    for v in improvements.iter().flatten() {
        if *v >= 50.0 {
            excellent += 1;
        } else if *v >= 20.0 {
            strong += 1;
        } else if *v >= 0.0 {
            moderate += 1;
        } else {
            negative += 1;
        }
    }
    vec![
        CohortBucket {
            label: "Excellent (\u{2265}50%)",
            count: excellent,
        },
        CohortBucket {
            label: "Strong (20-49%)",
            count: strong,
        },
        CohortBucket {
            label: "Moderate (0-19%)",
            count: moderate,
        },
        CohortBucket {
            label: "Negative (<0%)",
            count: negative,
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementCounts {
    pub improved: usize,
    pub unchanged: usize,
    pub declined: usize,
}

/// Counts over rows with both scores present.
pub fn improvement_counts(improvements: &[Option<f64>]) -> ImprovementCounts {
    let mut counts = ImprovementCounts {
        improved: 0,
        unchanged: 0,
        declined: 0,
    };
    for v in improvements.iter().flatten() {
        if *v > 0.0 {
            counts.improved += 1;
        } else if *v == 0.0 {
            counts.unchanged += 1;
        } else {
            counts.declined += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub percentile: f64,
    pub rank: usize,
    pub total: usize,
}

/// Percentile and rank of one improvement value within the cohort.
/// The denominator is the FULL row count: rows without an improvement stay
/// in the total but can never count as strictly-less. Ties share a
/// percentile while the rank derivation is not tie-adjusted; both formulas
/// are load-bearing for display parity and stay as-is.
pub fn standing(improvements: &[Option<f64>], target: f64) -> Standing {
    let total = improvements.len();
    let strictly_less = improvements
        .iter()
        .flatten()
        .filter(|v| **v < target)
        .count();
    let percentile = if total > 0 {
        strictly_less as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Standing {
        percentile,
        rank: total - strictly_less,
        total,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Pairwise Pearson correlation over all numeric columns. Rows with any
/// missing value across the selected columns are dropped for the whole
/// matrix (listwise, not column-pairwise). None below two numeric columns
/// or without a complete row.
pub fn correlation_matrix(dataset: &Dataset) -> Option<CorrelationMatrix> {
    let columns = dataset.numeric_columns();
    if columns.len() < 2 {
        return None;
    }

    let series: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| dataset.numeric_values(c).unwrap_or_default())
        .collect();

    let mut complete: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for row in 0..dataset.row_count() {
        let values: Option<Vec<f64>> = series.iter().map(|s| s[row]).collect();
        if let Some(values) = values {
            for (col, v) in values.into_iter().enumerate() {
                complete[col].push(v);
            }
        }
    }
    if complete[0].is_empty() {
        return None;
    }

    let n = columns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = if i == j {
                1.0
            } else {
                pearson(&complete[i], &complete[j])
            };
        }
    }

    Some(CorrelationMatrix { columns, values })
}
