//! In-memory training dataset
//!
//! Row-major f64 feature matrix plus a target vector, either handed over
//! from the tabular layer or loaded from a plain numeric CSV.

use std::path::Path;

use crate::errors::TrainerError;

/// Training dataset with named feature columns.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn new(
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        targets: Vec<f64>,
    ) -> Result<Self, TrainerError> {
        if features.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".to_string()));
        }
        if features.len() != targets.len() {
            return Err(TrainerError::Dataset(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let width = feature_names.len();
        if let Some(row) = features.iter().position(|r| r.len() != width) {
            return Err(TrainerError::Dataset(format!(
                "row {}: expected {} features, got {}",
                row + 1,
                width,
                features[row].len()
            )));
        }

        Ok(Self {
            feature_names,
            features,
            targets,
        })
    }

    /// Load from a numeric CSV with a header row; the last column is the
    /// target. Blank lines and `#` comments are skipped.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut lines = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let header = lines
            .next()
            .ok_or_else(|| TrainerError::Dataset("dataset is empty".to_string()))?;
        let mut names: Vec<String> = header.split(',').map(|s| s.trim().to_string()).collect();
        if names.len() < 2 {
            return Err(TrainerError::Dataset(
                "expected at least one feature column and a target".to_string(),
            ));
        }
        names.pop(); // target column
        let feature_count = names.len();

        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (line_idx, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() != feature_count + 1 {
                return Err(TrainerError::Dataset(format!(
                    "line {}: expected {} columns, got {}",
                    line_idx + 2,
                    feature_count + 1,
                    parts.len()
                )));
            }

            let mut row = Vec::with_capacity(feature_count);
            for (col, part) in parts.iter().take(feature_count).enumerate() {
                let value = part.parse::<f64>().map_err(|_| {
                    TrainerError::Dataset(format!(
                        "line {}, column {}: invalid number '{}'",
                        line_idx + 2,
                        col + 1,
                        part
                    ))
                })?;
                row.push(value);
            }

            let target = parts[feature_count].parse::<f64>().map_err(|_| {
                TrainerError::Dataset(format!("line {}: invalid target", line_idx + 2))
            })?;

            features.push(row);
            targets.push(target);
        }

        Self::new(names, features, targets)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Row subset in the given index order (for fold splits).
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Per-feature (min, max) for validation logging.
    pub fn feature_stats(&self) -> Vec<(f64, f64)> {
        let mut stats = vec![(f64::INFINITY, f64::NEG_INFINITY); self.feature_count()];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "kyaku_su,inhabitants,target")?;
        writeln!(file, "100,2000,1.5")?;
        writeln!(file, "150,2500,2.0")?;
        writeln!(file, "200,3000,3.25")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_csv() -> anyhow::Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.feature_count(), 2);
        assert_eq!(dataset.feature_names, vec!["kyaku_su", "inhabitants"]);
        assert_eq!(dataset.features[0], vec![100.0, 2000.0]);
        assert_eq!(dataset.targets[2], 3.25);

        Ok(())
    }

    #[test]
    fn test_ragged_row_is_an_error() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "a,b,target")?;
        writeln!(file, "1,2,3")?;
        writeln!(file, "1,2")?;
        file.flush()?;

        assert!(Dataset::from_csv(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_select_preserves_order() -> anyhow::Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        let subset = dataset.select(&[2, 0]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.targets, vec![3.25, 1.5]);
        assert_eq!(subset.features[0], vec![200.0, 3000.0]);

        Ok(())
    }

    #[test]
    fn test_feature_stats() -> anyhow::Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        let stats = dataset.feature_stats();
        assert_eq!(stats, vec![(100.0, 200.0), (2000.0, 3000.0)]);

        Ok(())
    }
}
