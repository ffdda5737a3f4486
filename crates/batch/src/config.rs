//! Named, compiled-in job configurations.
//!
//! Each configuration bundles the file-location descriptors and column-role
//! lists one batch step needs. A process selects one by name at startup;
//! the mapping is immutable for the process lifetime.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use nippan_tabular::{ColumnType, DatSpec, FileSpec};

use crate::errors::BatchError;

/// Static settings for one batch step.
#[derive(Clone, Debug)]
pub struct JobConfig {
    pub job_name: String,
    pub step_name: String,
    pub log_dir: String,

    // Input extracts
    pub input_sales: FileSpec,
    pub input_kyaku: FileSpec,
    pub input_gis: FileSpec,
    pub input_mise: DatSpec,

    // Intermediate and output locations
    pub feature_table: FileSpec,
    pub slice_dir: String,
    pub model_dir: String,

    // Column roles
    pub feature_cols: Vec<String>,
    pub categorical_cols: Vec<String>,
    pub target_col: String,

    // Store / item slice columns and key sets for the per-combination slices
    pub group_mise_col: String,
    pub group_mise_keys: Vec<String>,
    pub group_item_col: String,
    pub group_item_keys: Vec<String>,
}

fn data_root() -> String {
    std::env::var("NIPPAN_DATA_ROOT").unwrap_or_else(|_| "data".to_string())
}

fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn base_config(job_name: &str, step_name: &str) -> JobConfig {
    let root = data_root();
    let input_dir = format!("{root}/input");
    let feature_dir = format!("{root}/feature");

    JobConfig {
        job_name: job_name.to_string(),
        step_name: step_name.to_string(),
        log_dir: "log".to_string(),

        input_sales: FileSpec {
            dir: input_dir.clone(),
            name: "train.csv".to_string(),
            usecols: Some(strs(&[
                "nichi",
                "org_mise",
                "group_mise",
                "group_item",
                "target",
            ])),
            dtypes: vec![
                ("nichi".to_string(), ColumnType::Str),
                ("org_mise".to_string(), ColumnType::Str),
                ("group_mise".to_string(), ColumnType::Str),
                ("group_item".to_string(), ColumnType::Str),
                ("target".to_string(), ColumnType::Float),
            ],
            outcols: None,
        },

        input_kyaku: FileSpec {
            dir: input_dir.clone(),
            name: "kyaku.csv".to_string(),
            usecols: Some(strs(&["nichi", "org_mise", "kyaku_su"])),
            dtypes: vec![
                ("nichi".to_string(), ColumnType::Str),
                ("org_mise".to_string(), ColumnType::Str),
                ("kyaku_su".to_string(), ColumnType::Float),
            ],
            outcols: None,
        },

        input_gis: FileSpec {
            dir: input_dir.clone(),
            name: "gis.csv".to_string(),
            usecols: Some(strs(&["org_mise", "inhabitants", "employees"])),
            dtypes: vec![
                ("org_mise".to_string(), ColumnType::Str),
                ("inhabitants".to_string(), ColumnType::Float),
                ("employees".to_string(), ColumnType::Float),
            ],
            outcols: None,
        },

        input_mise: DatSpec {
            dir: input_dir,
            name: "mise_master.dat".to_string(),
            filecols: strs(&["org_mise", "mise_name", "standing", "open_ymd"]),
            dtypes: vec![
                ("org_mise".to_string(), ColumnType::Str),
                ("mise_name".to_string(), ColumnType::Str),
                ("standing".to_string(), ColumnType::Str),
                ("open_ymd".to_string(), ColumnType::Str),
            ],
            usecols: Some(strs(&["org_mise", "standing"])),
        },

        feature_table: FileSpec {
            dir: feature_dir.clone(),
            name: "feature.arrow".to_string(),
            usecols: None,
            dtypes: vec![
                ("group_mise".to_string(), ColumnType::Int),
                ("group_item".to_string(), ColumnType::Int),
                ("standing".to_string(), ColumnType::Int),
                ("kyaku_su".to_string(), ColumnType::Float),
                ("inhabitants".to_string(), ColumnType::Float),
                ("employees".to_string(), ColumnType::Float),
                ("target".to_string(), ColumnType::Float),
            ],
            outcols: Some(strs(&[
                "group_mise",
                "group_item",
                "standing",
                "kyaku_su",
                "inhabitants",
                "employees",
                "target",
            ])),
        },
        slice_dir: feature_dir,
        model_dir: format!("{root}/model"),

        feature_cols: strs(&[
            "group_mise",
            "group_item",
            "standing",
            "kyaku_su",
            "inhabitants",
            "employees",
        ]),
        categorical_cols: strs(&["group_mise", "group_item", "standing"]),
        target_col: "target".to_string(),

        group_mise_col: "group_mise".to_string(),
        group_mise_keys: strs(&["A001", "A002", "A003"]),
        group_item_col: "group_item".to_string(),
        group_item_keys: strs(&["I01", "I02", "I03", "I04", "I05"]),
    }
}

static CONFIGS: Lazy<BTreeMap<&'static str, JobConfig>> = Lazy::new(|| {
    let mut configs = BTreeMap::new();
    configs.insert("feature", base_config("J301_FEATURE", "S301"));
    configs.insert("train", base_config("J310_TRAIN", "S310"));
    configs.insert("pipeline", base_config("J600_PIPELINE", "S600"));
    configs
});

/// Resolve a configuration by name.
pub fn resolve(name: &str) -> Result<&'static JobConfig, BatchError> {
    CONFIGS
        .get(name)
        .ok_or_else(|| BatchError::UnknownConfig(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_configs() {
        for name in ["feature", "train", "pipeline"] {
            let config = resolve(name).unwrap();
            assert!(!config.job_name.is_empty());
            assert_eq!(config.target_col, "target");
        }
    }

    #[test]
    fn resolve_unknown_config_fails() {
        let err = resolve("no_such_config").unwrap_err();
        assert!(matches!(err, BatchError::UnknownConfig(_)));
    }

    #[test]
    fn feature_roles_are_consistent() {
        let config = resolve("feature").unwrap();
        for col in &config.categorical_cols {
            assert!(config.feature_cols.contains(col));
        }
        assert!(!config.feature_cols.contains(&config.target_col));
        assert_eq!(config.group_mise_keys.len(), 3);
        assert_eq!(config.group_item_keys.len(), 5);

        // slice columns name real categorical features
        assert!(config.categorical_cols.contains(&config.group_mise_col));
        assert!(config.categorical_cols.contains(&config.group_item_col));
    }
}
