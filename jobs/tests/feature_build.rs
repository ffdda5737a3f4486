//! End-to-end feature build over temp-dir extracts: load, join, slice,
//! encode and round-trip the binary feature table the way the
//! build-features binary does.

use std::fs::File;
use std::io::Write;

use nippan_jobs::{assemble, drop_null_rows, slice_key_frames};
use nippan_tabular::{
    label_encode, load_csv, load_dat, load_table, to_matrix, write_csv, write_table, ColumnType,
    DatSpec, FileSpec,
};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) {
    let mut file = File::create(dir.path().join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn feature_build_from_extracts_to_binary_table() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_string_lossy().into_owned();

    write_file(
        &dir,
        "train.csv",
        "nichi,org_mise,group_mise,group_item,target\n\
         20200901,M001,A001,I01,120.0\n\
         20200901,M002,A002,I01,45.5\n\
         20200902,M001,A001,I02,98.0\n",
    );
    write_file(
        &dir,
        "kyaku.csv",
        "nichi,org_mise,kyaku_su\n\
         20200901,M001,812\n\
         20200901,M002,450\n\
         20200902,M001,790\n",
    );
    write_file(
        &dir,
        "gis.csv",
        "org_mise,inhabitants,employees\n\
         M001,12000,3400\n\
         M002,8000,900\n",
    );
    write_file(&dir, "mise_master.dat", "M001|north|urban\nM002|south|suburb\n");

    let sales = load_csv(&FileSpec {
        dir: root.clone(),
        name: "train.csv".to_string(),
        usecols: None,
        dtypes: vec![
            ("nichi".to_string(), ColumnType::Str),
            ("org_mise".to_string(), ColumnType::Str),
            ("group_mise".to_string(), ColumnType::Str),
            ("group_item".to_string(), ColumnType::Str),
            ("target".to_string(), ColumnType::Float),
        ],
        outcols: None,
    })
    .unwrap();

    let kyaku = load_csv(&FileSpec {
        dir: root.clone(),
        name: "kyaku.csv".to_string(),
        usecols: None,
        dtypes: vec![
            ("nichi".to_string(), ColumnType::Str),
            ("org_mise".to_string(), ColumnType::Str),
            ("kyaku_su".to_string(), ColumnType::Float),
        ],
        outcols: None,
    })
    .unwrap();

    let gis = load_csv(&FileSpec {
        dir: root.clone(),
        name: "gis.csv".to_string(),
        usecols: None,
        dtypes: vec![
            ("org_mise".to_string(), ColumnType::Str),
            ("inhabitants".to_string(), ColumnType::Float),
            ("employees".to_string(), ColumnType::Float),
        ],
        outcols: None,
    })
    .unwrap();

    let mise = load_dat(&DatSpec {
        dir: root.clone(),
        name: "mise_master.dat".to_string(),
        filecols: strs(&["org_mise", "mise_name", "standing"]),
        dtypes: vec![
            ("org_mise".to_string(), ColumnType::Str),
            ("mise_name".to_string(), ColumnType::Str),
            ("standing".to_string(), ColumnType::Str),
        ],
        usecols: Some(strs(&["org_mise", "standing"])),
    })
    .unwrap();

    let joined = assemble(&sales, &kyaku, &gis, &mise).unwrap();
    let clean = drop_null_rows(&joined, &["inhabitants", "employees"]).unwrap();
    assert_eq!(clean.height(), 3);

    // full slice grid, written like the binary writes it
    let mise_keys = strs(&["A001", "A002"]);
    let item_keys = strs(&["I01", "I02"]);
    let slices = slice_key_frames(
        &clean,
        ("group_mise", mise_keys.as_slice()),
        ("group_item", item_keys.as_slice()),
    )
    .unwrap();
    assert_eq!(slices.len(), 4);

    let slice_base = FileSpec {
        dir: root.clone(),
        name: String::new(),
        usecols: None,
        dtypes: Vec::new(),
        outcols: None,
    };
    for ((mise_key, item_key), frame) in &slices {
        let spec = slice_base.named(format!("slice_{mise_key}_{item_key}.csv"));
        write_csv(frame, &spec, true).unwrap();
        assert!(spec.path().is_file());
    }

    // encoded binary table round-trips into the trainer handoff
    let categorical = strs(&["group_mise", "group_item", "standing"]);
    let encoded = label_encode(&clean, &categorical).unwrap();

    let feature_spec = FileSpec {
        dir: root,
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
    };
    write_table(&encoded, &feature_spec).unwrap();

    let back = load_table(&feature_spec).unwrap();
    assert_eq!(back.shape(), (3, 7));

    let feature_cols = strs(&[
        "group_mise",
        "group_item",
        "standing",
        "kyaku_su",
        "inhabitants",
        "employees",
    ]);
    let (features, mut targets) = to_matrix(&back, &feature_cols, "target").unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0].len(), 6);

    // join output order is not guaranteed
    targets.sort_by(f64::total_cmp);
    assert_eq!(targets, vec![45.5, 98.0, 120.0]);
}
