//! Feature importance aggregation and charting
//!
//! Collects per-fold gain importances, averages them across folds and
//! renders the top features as a horizontal bar chart.

use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::TrainerError;
use crate::model::GbdtModel;

/// One feature's gain importance in one fold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoldImportance {
    pub feature: String,
    pub importance: f64,
    pub fold: usize,
}

/// Extract per-feature gain importances from a trained fold model.
pub fn fold_importance(model: &GbdtModel, fold: usize) -> Vec<FoldImportance> {
    model
        .metadata
        .feature_names
        .iter()
        .zip(model.feature_importance_gain())
        .map(|(feature, importance)| FoldImportance {
            feature: feature.clone(),
            importance,
            fold,
        })
        .collect()
}

/// Mean importance per feature across folds, descending, truncated to
/// the `top` highest entries.
pub fn aggregate(records: &[FoldImportance], top: usize) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(&record.feature).or_insert((0.0, 0));
        entry.0 += record.importance;
        entry.1 += 1;
    }

    let mut means: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(feature, (sum, count))| (feature.to_string(), sum / count as f64))
        .collect();

    // BTreeMap iteration gives a stable order among equal means
    means.sort_by(|a, b| b.1.total_cmp(&a.1));
    means.truncate(top);
    means
}

/// Render aggregated importances as a horizontal bar chart PNG.
pub fn render_chart<P: AsRef<Path>>(
    entries: &[(String, f64)],
    path: P,
) -> Result<(), TrainerError> {
    if entries.is_empty() {
        return Err(TrainerError::Chart("no importance entries".to_string()));
    }

    let max_importance = entries
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0f64, f64::max)
        .max(1.0);

    let height = (entries.len() as u32 * 28 + 120).max(240);
    let root = BitMapBackend::new(path.as_ref(), (1024, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| TrainerError::Chart(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Feature importance (mean gain)", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(160)
        .build_cartesian_2d(0.0..max_importance * 1.05, 0..entries.len())
        .map_err(|e| TrainerError::Chart(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(entries.len())
        .y_label_formatter(&|idx: &usize| {
            entries
                .len()
                .checked_sub(idx + 1)
                .and_then(|i| entries.get(i))
                .map(|(name, _)| name.clone())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| TrainerError::Chart(e.to_string()))?;

    // Highest importance at the top
    chart
        .draw_series(entries.iter().enumerate().map(|(i, (_, value))| {
            let y = entries.len() - 1 - i;
            Rectangle::new([(0.0, y), (*value, y + 1)], BLUE.mix(0.6).filled())
        }))
        .map_err(|e| TrainerError::Chart(e.to_string()))?;

    root.present()
        .map_err(|e| TrainerError::Chart(e.to_string()))?;
    Ok(())
}

/// Write aggregated importances as a two-column CSV.
pub fn write_csv<P: AsRef<Path>>(
    entries: &[(String, f64)],
    path: P,
) -> Result<(), TrainerError> {
    let mut out = String::from("feature,importance\n");
    for (feature, importance) in entries {
        out.push_str(&format!("{feature},{importance}\n"));
    }
    std::fs::write(path.as_ref(), out)?;
    Ok(())
}
