//! Shared table-shaping steps for the pipeline binaries.
//!
//! The join, null handling and per-combination slicing live here so the
//! binaries stay thin and the logic is testable without spawning processes.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Join the four extracts into one training table.
///
/// Customer counts attach per store and day, GIS and store-master
/// attributes per store. All joins are inner: a sales row without a
/// matching store record is dropped.
pub fn assemble(
    sales: &DataFrame,
    kyaku: &DataFrame,
    gis: &DataFrame,
    mise: &DataFrame,
) -> Result<DataFrame> {
    let joined = sales
        .join(
            kyaku,
            ["nichi", "org_mise"],
            ["nichi", "org_mise"],
            JoinArgs::new(JoinType::Inner),
        )
        .context("joining customer counts")?;

    let joined = joined
        .join(
            gis,
            ["org_mise"],
            ["org_mise"],
            JoinArgs::new(JoinType::Inner),
        )
        .context("joining gis attributes")?;

    let joined = joined
        .join(
            mise,
            ["org_mise"],
            ["org_mise"],
            JoinArgs::new(JoinType::Inner),
        )
        .context("joining store master")?;

    Ok(joined)
}

/// Drop rows where any of the given columns is null.
pub fn drop_null_rows(df: &DataFrame, cols: &[&str]) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;

    for col in cols {
        let not_null = df
            .column(col)
            .with_context(|| format!("column {col}"))?
            .is_not_null();
        mask = Some(match mask {
            Some(prev) => &prev & &not_null,
            None => not_null,
        });
    }

    match mask {
        Some(mask) => Ok(df.filter(&mask)?),
        None => Ok(df.clone()),
    }
}

/// Split the table into one frame per (store group, item group) pair.
///
/// Column names and key lists both come from the configuration. Every pair
/// from the cross product of the key lists gets an entry, even when no rows
/// match; downstream consumers rely on the full grid existing.
pub fn slice_key_frames(
    df: &DataFrame,
    (mise_col, mise_keys): (&str, &[String]),
    (item_col, item_keys): (&str, &[String]),
) -> Result<BTreeMap<(String, String), DataFrame>> {
    let mise_col = df
        .column(mise_col)
        .with_context(|| format!("slice column {mise_col}"))?
        .str()?
        .clone();
    let item_col = df
        .column(item_col)
        .with_context(|| format!("slice column {item_col}"))?
        .str()?
        .clone();

    let mut slices = BTreeMap::new();
    for mise_key in mise_keys {
        let mise_mask = mise_col.equal(mise_key.as_str());
        for item_key in item_keys {
            let mask = &mise_mask & &item_col.equal(item_key.as_str());
            let frame = df.filter(&mask)?;
            slices.insert((mise_key.clone(), item_key.clone()), frame);
        }
    }

    Ok(slices)
}
