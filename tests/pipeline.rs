use listing_insights::data::LoaderError;
use listing_insights::store::ListingStore;
use listing_insights::{Pipeline, PipelineConfig, PipelineError};
use std::path::{Path, PathBuf};

const HEADER: &str = "id,name,host_id,host_name,neighbourhood_group,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month,availability_365";

fn config_in(dir: &Path, rows: &[&str]) -> PipelineConfig {
    let input = dir.join("listings.csv");
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    std::fs::write(&input, body).unwrap();

    PipelineConfig {
        input_path: input,
        ..PipelineConfig::default()
    }
    .with_output_dir(dir)
}

fn stored_ids(db: &PathBuf, table: &str) -> Vec<i64> {
    let store = ListingStore::open(db).unwrap();
    store
        .read_listings(table)
        .unwrap()
        .into_iter()
        .filter_map(|l| l.id)
        .collect()
}

const FIVE_ROWS: [&str; 5] = [
    "1,Cozy room,10,Ann,Brooklyn,Bushwick,40.69,-73.92,Private room,60,2,15,2019-06-01,0.9,120",
    "2,Big loft,11,Ben,Manhattan,Chelsea,40.74,-74.00,Entire home/apt,250,3,40,2019-07-02,2.1,300",
    "3,No host,12,,Queens,Astoria,40.76,-73.92,Private room,70,1,3,2019-01-15,0.2,90",
    "4,Penthouse,13,Cara,Manhattan,Tribeca,40.71,-74.01,Entire home/apt,5000,2,1,2018-11-01,0.1,10",
    "5,Garden flat,14,Dan,,Riverdale,40.89,-73.91,Entire home/apt,95,30,0,,,365",
];

#[test]
fn five_row_scenario_keeps_three() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &FIVE_ROWS);
    let outcome = Pipeline::new(config.clone()).process().unwrap();

    assert_eq!(outcome.raw_rows, 5);
    assert_eq!(outcome.cleaned.listings.height(), 3);
    assert_eq!(outcome.cleaned.removed_incomplete, 1);
    assert_eq!(outcome.cleaned.removed_outliers, 1);
    assert_eq!(outcome.stored_rows, 3);

    let groups = &outcome.report.insights.groups;
    assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), 3);
    assert!(groups.iter().any(|g| g.group == "Other" && g.count == 1));

    assert_eq!(stored_ids(&config.database_path, &config.table_name), vec![1, 2, 5]);
}

#[test]
fn rerun_replaces_stored_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &FIVE_ROWS);
    let pipeline = Pipeline::new(config.clone());

    pipeline.process().unwrap();
    let store = ListingStore::open(&config.database_path).unwrap();
    let first = store.read_listings(&config.table_name).unwrap();
    store.close().unwrap();

    pipeline.process().unwrap();
    let store = ListingStore::open(&config.database_path).unwrap();
    let second = store.read_listings(&config.table_name).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(store.count(&config.table_name).unwrap(), 3);
}

#[test]
fn boundaries_and_defaults_survive_to_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(
        dir.path(),
        &[
            "1,At cap,10,Ann,Bronx,Fordham,40.86,-73.89,Private room,1000,30,5,2019-02-30,,200",
            "2,Over cap,11,Ben,Bronx,Fordham,40.86,-73.89,Private room,1001,1,5,2019-02-01,0.5,200",
            "3,Too long,12,Cal,Bronx,Fordham,40.86,-73.89,Private room,100,31,5,2019-02-01,0.5,200",
        ],
    );

    let outcome = Pipeline::new(config.clone()).process().unwrap();
    assert_eq!(outcome.stored_rows, 1);

    let store = ListingStore::open(&config.database_path).unwrap();
    let stored = store.read_listings(&config.table_name).unwrap();
    assert_eq!(stored.len(), 1);
    let kept = &stored[0];
    assert_eq!(kept.price, 1000.0);
    assert_eq!(kept.minimum_nights, 30);
    // February 30th does not exist
    assert_eq!(kept.last_review, None);
    assert!(!kept.has_reviews);
    assert_eq!(kept.reviews_per_month, 0.0);
}

#[test]
fn all_rows_rejected_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(
        dir.path(),
        &["1,,10,Ann,Bronx,Fordham,40.86,-73.89,Private room,100,1,5,2019-02-01,0.5,200"],
    );

    let outcome = Pipeline::new(config.clone()).process().unwrap();
    assert_eq!(outcome.stored_rows, 0);
    assert_eq!(outcome.report.insights.total_listings, 0);
    assert!(outcome.report.insights.groups.is_empty());

    let store = ListingStore::open(&config.database_path).unwrap();
    assert_eq!(store.count(&config.table_name).unwrap(), 0);
}

#[test]
fn missing_input_fails_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        input_path: dir.path().join("absent.csv"),
        ..PipelineConfig::default()
    }
    .with_output_dir(dir.path());

    let err = Pipeline::new(config.clone()).run().unwrap_err();
    assert!(matches!(err, PipelineError::Loader(LoaderError::NotFound(_))));
    assert!(!config.database_path.exists());
    assert!(!config.dashboard_path.exists());
}

#[test]
fn canonical_membership_matches_the_rules() {
    let dir = tempfile::tempdir().unwrap();
    let rows = [
        "1,A,1,H,Queens,Astoria,40.7,-73.9,Private room,80,2,1,2019-01-01,0.1,10",
        "2,B,1,H,Queens,Astoria,,-73.9,Private room,80,2,1,2019-01-01,0.1,10",
        "3,C,1,H,Queens,Astoria,40.7,-73.9,,80,2,1,2019-01-01,0.1,10",
        "4,D,1,H,Queens,,40.7,-73.9,Private room,80,2,1,2019-01-01,0.1,10",
        "5,E,1,H,Queens,Astoria,40.7,-73.9,Private room,abc,2,1,2019-01-01,0.1,10",
        "6,F,1,H,Queens,Astoria,40.7,-73.9,Private room,999.5,29,1,garbage,,10",
        "7,G,1,H,,Astoria,40.7,-73.9,Shared room,10,1,0,,,0",
    ];
    let config = config_in(dir.path(), &rows);

    Pipeline::new(config.clone()).process().unwrap();
    assert_eq!(stored_ids(&config.database_path, &config.table_name), vec![1, 6, 7]);
}

#[test]
fn nan_values_do_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(
        dir.path(),
        &[
            "1,Velocity nan,10,Ann,Bronx,Fordham,40.86,-73.89,Private room,90,2,5,2019-02-01,nan,200",
            "2,Latitude nan,11,Ben,Bronx,Fordham,NaN,-73.89,Private room,90,2,5,2019-02-01,0.5,200",
            "3,Float nights,12,Cal,Bronx,Fordham,40.86,-73.89,Private room,90,3.0,5,2019-02-01,0.5,200",
        ],
    );

    let outcome = Pipeline::new(config.clone()).process().unwrap();
    assert_eq!(outcome.cleaned.removed_incomplete, 1);
    assert_eq!(outcome.cleaned.removed_outliers, 0);
    assert_eq!(outcome.stored_rows, 2);

    let store = ListingStore::open(&config.database_path).unwrap();
    let stored = store.read_listings(&config.table_name).unwrap();
    assert_eq!(stored.iter().filter_map(|l| l.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(stored[0].reviews_per_month, 0.0);
    assert_eq!(stored[1].minimum_nights, 3);
}
