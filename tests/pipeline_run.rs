use std::fs;
use std::path::Path;

use listing_pipeline::pipeline::{execute, StatsStage};
use listing_pipeline::{
    Layout, PipelineConfig, PipelineError, PipelineRunner, StageKind, StageOutcome,
};

const STORES: &str = r#"
[[stores]]
name = "A"
catalog = "a_repo"
scraped_prefix = "a_"
categories = ["Electronics*"]
stop_words = ["(used)"]

[stores.columns]
sku = 1
title = 2
category = 3

[[stores]]
name = "B"
catalog = "b_repo"
scraped_prefix = "b_"
categories = ["*Shoes*"]

[stores.columns]
sku = 2
title = 1
category = 3
image = 4
"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn seed_run(root: &Path) -> (PipelineConfig, Layout) {
    let layout = Layout::new(root);
    write(
        &layout.repos_dir().join("a_repo.csv"),
        "store,sku,title,image,category,brand,label\nA,1,Phone,,Electronics/Phones,,\n",
    );
    write(
        &layout.scraped_dir().join("a_week1.csv"),
        "sku\ttitle\tcategory\n\
         1\tPhone\tElectronics/Phones\n\
         2\tLaptop (used)\tElectronics/Laptops\n\
         3\tShirt\tApparel\n",
    );
    (PipelineConfig::from_toml(STORES).unwrap(), layout)
}

fn statuses(layout: &Layout) -> Vec<(String, String)> {
    let mut reader = csv::Reader::from_path(layout.classified_path()).unwrap();
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[1].to_string(), r[7].to_string())
        })
        .collect()
}

#[test]
fn classifies_and_counts_a_single_store_run() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());

    let report = PipelineRunner::new(&config, &layout).run().unwrap();
    assert_eq!(
        report,
        vec![
            (StageKind::Identities, StageOutcome::Completed(1)),
            (StageKind::Classify, StageOutcome::Completed(3)),
            (StageKind::Stats, StageOutcome::Completed(2)),
        ]
    );

    assert_eq!(
        fs::read_to_string(layout.identities_path()).unwrap(),
        "store,sku\nA,1\n"
    );
    assert_eq!(
        statuses(&layout),
        vec![
            ("1".to_string(), "DUPLICATE".to_string()),
            ("2".to_string(), "STOP_WORD_IN_TITLE".to_string()),
            ("3".to_string(), "OUT_OF_CATEGORY".to_string()),
        ]
    );
    assert_eq!(
        fs::read_to_string(layout.stats_path()).unwrap(),
        "store_name,accepted_count,category_rejected_count,title_rejected_count\n\
         A,0,1,1\n\
         B,0,0,0\n"
    );
}

#[test]
fn duplicates_across_files_resolve_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());
    write(
        &layout.scraped_dir().join("b_1.csv"),
        "title\tsku\tcategory\timage\n\
         Runner\t10\tMen/Shoes/Running\thttp://img/10.jpg\n\
         Runner\t10\tMen/Shoes/Running\t\n",
    );
    write(
        &layout.scraped_dir().join("nested").join("b_2.csv"),
        "title\tsku\tcategory\timage\n\
         Runner\t10\tMen/Shoes/Running\t\n\
         Boot\t11\tMen/Shoes/Boots\t\n\
         Hat\t12\tMen/Hats\t\n",
    );

    PipelineRunner::new(&config, &layout).run().unwrap();

    let b: Vec<_> = statuses(&layout).into_iter().skip(3).collect();
    assert_eq!(
        b,
        vec![
            ("10".to_string(), "NEW".to_string()),
            ("10".to_string(), "DUPLICATE".to_string()),
            ("10".to_string(), "DUPLICATE".to_string()),
            ("11".to_string(), "NEW".to_string()),
            ("12".to_string(), "OUT_OF_CATEGORY".to_string()),
        ]
    );

    let classified = fs::read_to_string(layout.classified_path()).unwrap();
    assert!(classified.contains("B,10,Runner,http://img/10.jpg,Men/Shoes/Running,,,NEW\n"));

    assert_eq!(
        fs::read_to_string(layout.stats_path()).unwrap(),
        "store_name,accepted_count,category_rejected_count,title_rejected_count\n\
         A,0,1,1\n\
         B,2,1,0\n"
    );
}

#[test]
fn rerun_with_all_artifacts_present_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());
    let runner = PipelineRunner::new(&config, &layout);
    runner.run().unwrap();

    let paths = [
        layout.identities_path(),
        layout.classified_path(),
        layout.stats_path(),
    ];
    let before: Vec<_> = paths
        .iter()
        .map(|p| (fs::read(p).unwrap(), fs::metadata(p).unwrap().modified().unwrap()))
        .collect();

    // New input must not leak into a completed run.
    write(
        &layout.scraped_dir().join("a_week2.csv"),
        "sku\ttitle\tcategory\n4\tTablet\tElectronics/Tablets\n",
    );
    let report = runner.run().unwrap();
    assert!(report
        .iter()
        .all(|(_, outcome)| *outcome == StageOutcome::Skipped));

    let after: Vec<_> = paths
        .iter()
        .map(|p| (fs::read(p).unwrap(), fs::metadata(p).unwrap().modified().unwrap()))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn only_missing_stages_are_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());
    let runner = PipelineRunner::new(&config, &layout);

    let partial = runner.run_until(StageKind::Classify).unwrap();
    assert_eq!(partial.len(), 2);
    assert!(!layout.stats_path().exists());

    let report = runner.run().unwrap();
    assert_eq!(report[0].1, StageOutcome::Skipped);
    assert_eq!(report[1].1, StageOutcome::Skipped);
    assert_eq!(report[2].1, StageOutcome::Completed(2));
}

#[test]
fn stats_stage_without_classified_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());

    let err = execute(&StatsStage::new(&config, &layout)).unwrap_err();
    assert!(matches!(err, PipelineError::MissingUpstreamArtifact { .. }));
    assert!(!layout.stats_path().exists());
}

#[test]
fn column_past_feed_width_aborts_without_partial_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (config, layout) = seed_run(dir.path());
    write(
        &layout.scraped_dir().join("b_narrow.csv"),
        "title\tsku\nRunner\t10\n",
    );

    let err = PipelineRunner::new(&config, &layout).run().unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
    assert!(layout.identities_path().exists());
    assert!(!layout.classified_path().exists());
    assert!(!layout.classified_path().with_extension("tmp").exists());
    assert!(!layout.stats_path().exists());
}

#[test]
fn run_without_any_catalog_accepts_first_sightings() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    write(
        &layout.scraped_dir().join("a_1.csv"),
        "sku\ttitle\tcategory\n1\tPhone\tElectronics\n1\tPhone\tElectronics\n",
    );
    let config = PipelineConfig::from_toml(STORES).unwrap();

    PipelineRunner::new(&config, &layout).run().unwrap();
    assert_eq!(
        fs::read_to_string(layout.identities_path()).unwrap(),
        "store,sku\n"
    );
    assert_eq!(
        statuses(&layout),
        vec![
            ("1".to_string(), "NEW".to_string()),
            ("1".to_string(), "DUPLICATE".to_string()),
        ]
    );
}
