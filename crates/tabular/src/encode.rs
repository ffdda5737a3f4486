//! Column encoding helpers for the training handoff.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::info;

use crate::errors::TableError;

/// Replace categorical string columns with deterministic integer codes.
///
/// Codes are assigned in sorted value order, so the same data always encodes
/// the same way. Nulls stay null.
pub fn label_encode(df: &DataFrame, cols: &[String]) -> Result<DataFrame, TableError> {
    let mut out = df.clone();

    for col in cols {
        let strings = named_column(&out, col)?.str()?.clone();

        let mut mapping: BTreeMap<&str, i64> = BTreeMap::new();
        for value in strings.into_iter().flatten() {
            mapping.entry(value).or_insert(0);
        }
        for (code, (_, slot)) in mapping.iter_mut().enumerate() {
            *slot = code as i64;
        }

        let encoded: Int64Chunked = strings
            .into_iter()
            .map(|opt| opt.map(|v| mapping[v]))
            .collect();

        out.with_column(encoded.into_series().with_name(col))?;
        info!("label_encode: {} -> {} levels", col, mapping.len());
    }

    Ok(out)
}

/// Extract a row-major feature matrix and target vector for the trainer.
/// Every selected column is cast to f64; a null anywhere is an error.
pub fn to_matrix(
    df: &DataFrame,
    feature_cols: &[String],
    target_col: &str,
) -> Result<(Vec<Vec<f64>>, Vec<f64>), TableError> {
    let mut columns = Vec::with_capacity(feature_cols.len());
    for col in feature_cols {
        columns.push(float_column(df, col)?);
    }
    let target = float_column(df, target_col)?;

    let n = df.height();
    let mut features = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);

    for row in 0..n {
        let mut values = Vec::with_capacity(feature_cols.len());
        for (idx, column) in columns.iter().enumerate() {
            match column.get(row) {
                Some(v) => values.push(v),
                None => {
                    return Err(TableError::Null {
                        column: feature_cols[idx].clone(),
                        row,
                    })
                }
            }
        }
        match target.get(row) {
            Some(v) => targets.push(v),
            None => {
                return Err(TableError::Null {
                    column: target_col.to_string(),
                    row,
                })
            }
        }
        features.push(values);
    }

    Ok((features, targets))
}

fn float_column(df: &DataFrame, col: &str) -> Result<Float64Chunked, TableError> {
    let cast = named_column(df, col)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}

fn named_column<'a>(df: &'a DataFrame, col: &str) -> Result<&'a Series, TableError> {
    df.column(col)
        .map_err(|_| TableError::MissingColumn(col.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Series::new("group_mise", &["B", "A", "B", "C"]),
            Series::new("kyaku_su", &[10i64, 20, 30, 40]),
            Series::new("target", &[1.0f64, 2.0, 3.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn label_encode_is_sorted_and_stable() {
        let df = sample();
        let encoded = label_encode(&df, &["group_mise".to_string()]).unwrap();

        let codes: Vec<i64> = encoded
            .column("group_mise")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();

        // A < B < C in sorted order
        assert_eq!(codes, vec![1, 0, 1, 2]);

        let again = label_encode(&df, &["group_mise".to_string()]).unwrap();
        assert!(again.equals(&encoded));
    }

    #[test]
    fn to_matrix_casts_and_orders_rows() {
        let df = sample();
        let encoded = label_encode(&df, &["group_mise".to_string()]).unwrap();

        let (features, targets) = to_matrix(
            &encoded,
            &["group_mise".to_string(), "kyaku_su".to_string()],
            "target",
        )
        .unwrap();

        assert_eq!(features.len(), 4);
        assert_eq!(features[0], vec![1.0, 10.0]);
        assert_eq!(features[3], vec![2.0, 40.0]);
        assert_eq!(targets, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn absent_columns_are_typed_errors() {
        let df = sample();

        let err = label_encode(&df, &["no_such_col".to_string()]).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(col) if col == "no_such_col"));

        let err = to_matrix(&df, &["no_such_col".to_string()], "target").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(_)));
    }

    #[test]
    fn to_matrix_rejects_nulls() {
        let df = DataFrame::new(vec![
            Series::new("x", &[Some(1.0f64), None]),
            Series::new("target", &[1.0f64, 2.0]),
        ])
        .unwrap();

        let err = to_matrix(&df, &["x".to_string()], "target").unwrap_err();
        assert!(matches!(err, TableError::Null { row: 1, .. }));
    }
}
