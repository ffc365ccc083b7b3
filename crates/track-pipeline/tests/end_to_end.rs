//! Full pipeline runs on the real SGP4 propagator

use chrono::{Duration, TimeZone, Utc};
use orbital_mechanics::{load_catalog, parse_catalog, ElementSet, Sgp4Propagator};
use std::io::{Cursor, Write};
use std::sync::Arc;
use tempfile::NamedTempFile;
use track_pipeline::{export, GeoCorner, PipelineConfig, Region, TimeGrid, TrackPipeline};

const CATALOG: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537

VANGUARD 1
1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753
2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667
";

fn catalog() -> Arc<[ElementSet]> {
    parse_catalog(Cursor::new(CATALOG)).unwrap().into()
}

#[tokio::test]
async fn test_single_satellite_single_instant_whole_globe() {
    let iss: Arc<[ElementSet]> = catalog()[..1].to_vec().into();
    let t = Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap();
    let grid = TimeGrid::from_minutes(t, t, 1.0).unwrap();
    let pipeline = TrackPipeline::new(Sgp4Propagator::default()).with_parallelism(4);

    let all = pipeline.run(Arc::clone(&iss), &grid).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.failures.is_empty());

    let record = &all.records[0];
    assert_eq!(record.satellite, "ISS (ZARYA)");
    assert_eq!(record.time, t);
    assert!(record.position.altitude_km > 300.0 && record.position.altitude_km < 450.0);
    assert!(record.speed() > 6.5 && record.speed() < 8.0);

    let filtered = pipeline
        .run_in_region(iss, &grid, &Region::whole_globe())
        .await
        .unwrap();
    assert_eq!(filtered.records, all.records);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_run_matches_serial_run() {
    let start = Utc.with_ymd_and_hms(2008, 9, 20, 0, 0, 0).unwrap();
    let grid = TimeGrid::new(start, start + Duration::hours(3), Duration::minutes(10)).unwrap();

    let serial = TrackPipeline::new(Sgp4Propagator::default())
        .with_parallelism(1)
        .run(catalog(), &grid)
        .await
        .unwrap();
    let parallel = TrackPipeline::new(Sgp4Propagator::default())
        .with_parallelism(2)
        .run(catalog(), &grid)
        .await
        .unwrap();

    assert_eq!(serial.len(), 2 * 19);
    assert_eq!(parallel.chunks, 2);

    let mut a = serial.records.clone();
    let mut b = parallel.records.clone();
    a.sort_by(|x, y| (x.time, &x.satellite).cmp(&(y.time, &y.satellite)));
    b.sort_by(|x, y| (x.time, &x.satellite).cmp(&(y.time, &y.satellite)));
    assert_eq!(a, b);

    // One chunk per satellite: each satellite's points are contiguous
    assert!(parallel.records[..19].iter().all(|r| r.satellite == "ISS (ZARYA)"));
    assert!(parallel.records[19..].iter().all(|r| r.satellite == "VANGUARD 1"));
}

#[tokio::test]
async fn test_region_subset_of_track() {
    let start = Utc.with_ymd_and_hms(2008, 9, 20, 0, 0, 0).unwrap();
    let config = PipelineConfig::new()
        .window(start, start + Duration::hours(6))
        .step_minutes(1.0)
        .parallelism(2)
        .corners(vec![
            GeoCorner::new(0.0, -180.0),
            GeoCorner::new(60.0, -180.0),
            GeoCorner::new(60.0, 180.0),
            GeoCorner::new(0.0, 180.0),
        ]);
    config.validate().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();
    let catalog: Arc<[ElementSet]> = load_catalog(file.path()).unwrap().into();

    let pipeline = TrackPipeline::from_config(Sgp4Propagator::default(), &config);
    let track = pipeline.run(catalog, &config.time_grid().unwrap()).await.unwrap();
    let region = config.region().unwrap().unwrap();
    let north = track.within(&region);

    assert!(!north.is_empty());
    assert!(north.len() < track.len());
    assert!(north.iter().all(|r| r.position.latitude >= 0.0));
    assert_eq!(region.filter(&north), north);

    let csv = NamedTempFile::new().unwrap();
    export::save_csv(csv.path(), &north).unwrap();
    let mut reader = csv::Reader::from_path(csv.path()).unwrap();
    assert_eq!(reader.records().count(), north.len());
}

#[tokio::test]
async fn test_empty_catalog_any_grid() {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let grid = TimeGrid::from_minutes(start, start + Duration::days(1), 1.0).unwrap();
    let empty: Arc<[ElementSet]> = Vec::new().into();

    let track = TrackPipeline::new(Sgp4Propagator::default())
        .run_in_region(empty, &grid, &Region::whole_globe())
        .await
        .unwrap();
    assert!(track.is_empty());
    assert_eq!(track.chunks, 0);
}
