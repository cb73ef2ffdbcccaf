// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

use futures::executor::{block_on, LocalPool};
use geochron::{
    EarthOrientation, EarthOrientationParameters, EopConfig, EopSample, GregorianDate,
    Iau2006Xys, JulianDate, LeapSecondTable, MemoryFetcher, PrecessionNutation, TimeStandard,
    Transforms, XysConfig, HISTORICAL_LEAP_SECONDS,
};
use glam::DMat3;
use serde_json::{json, Value};
use std::rc::Rc;
use std::sync::Arc;

fn table() -> Arc<LeapSecondTable> {
    Arc::new(LeapSecondTable::historical())
}

/// Smooth synthetic XYS values of realistic size for sample `index`.
fn xys_chunk(chunk: usize, per_file: usize) -> Value {
    let samples: Vec<f64> = (chunk * per_file..(chunk + 1) * per_file)
        .flat_map(|i| {
            let t = i as f64 / 36_525.0;
            let node = (i as f64 * 0.000_924_2).sin();
            [
                -1.2e-4 + 2.0e-3 * t + 4.0e-5 * node,
                -1.5e-5 + 9.0e-5 * node,
                -1.0e-8 + 3.0e-9 * node,
            ]
        })
        .collect();
    json!({ "samples": samples })
}

fn assert_orthonormal(m: &DMat3) {
    assert!((*m * m.transpose()).abs_diff_eq(DMat3::IDENTITY, 1e-13), "{m}");
    assert!((m.determinant() - 1.0).abs() < 1e-13);
}

#[test]
fn iso_date_at_leap_second_boundary_matches_table_entry() {
    let table = table();
    let date = JulianDate::from_iso8601_with_table("2012-07-01T00:00:00Z", &table).unwrap();
    assert_eq!(date, HISTORICAL_LEAP_SECONDS[25].date);
    assert_eq!(HISTORICAL_LEAP_SECONDS[25].offset, 35.0);
    assert_eq!(table.offset_at(&date), 35.0);

    let inserted =
        JulianDate::from_iso8601_with_table("2012-06-30T23:59:60Z", &table).unwrap();
    assert_eq!(date.seconds_difference(&inserted), 1.0);
    assert_eq!(inserted.to_iso8601_with_table(None, &table), "2012-06-30T23:59:60Z");
}

#[test]
fn calendar_and_iso_roundtrips() {
    let table = table();
    let inputs = [
        GregorianDate::new(1972, 1, 1, 0, 0, 0),
        GregorianDate::new(1999, 12, 31, 23, 59, 59),
        GregorianDate::new(2000, 2, 29, 12, 0, 0),
        GregorianDate::new(2016, 12, 31, 23, 59, 60),
        GregorianDate::new(2024, 7, 15, 6, 30, 15).with_millisecond(250.0),
    ];
    for input in inputs {
        let date = JulianDate::from_gregorian_with_table(&input, &table);
        assert_eq!(date.to_gregorian_with_table(&table), input);

        let text = date.to_iso8601_with_table(None, &table);
        let parsed = JulianDate::from_iso8601_with_table(&text, &table).unwrap();
        assert!(parsed.equals_epsilon(&date, 1e-6), "{text}");
    }
}

#[test]
fn ordering_is_antisymmetric_and_transitive() {
    let dates: Vec<JulianDate> = [
        (2_451_545, 0.0),
        (2_451_545, 0.5),
        (2_451_544, 86_399.9),
        (2_460_000, 10.0),
        (2_440_000, 43_200.0),
    ]
    .into_iter()
    .map(|(day, seconds)| JulianDate::from_tai_components(day, seconds))
    .collect();

    for a in &dates {
        for b in &dates {
            assert_eq!(a.compare(b), b.compare(a).reverse());
            for c in &dates {
                if a <= b && b <= c {
                    assert!(a <= c);
                }
            }
        }
    }
}

#[test]
fn icrf_transform_polls_until_xys_chunk_arrives() {
    let config = XysConfig::default();
    let fetcher = Rc::new(MemoryFetcher::new().with(
        config.chunk_url(16),
        xys_chunk(16, config.samples_per_xys_file),
    ));
    let mut pool = LocalPool::new();
    let xys = Rc::new(Iau2006Xys::new(config, fetcher.clone(), pool.spawner()));
    let transforms = Transforms::new(xys).with_leap_seconds(table());

    let date = JulianDate::from_iso8601_with_table("2020-06-01T00:00:00Z", transforms.leap_seconds())
        .unwrap();
    assert!(transforms.compute_fixed_to_icrf_matrix(&date).is_none());
    assert!(transforms.compute_icrf_to_fixed_matrix(&date).is_none());
    assert_eq!(
        fetcher.requests(),
        vec!["Assets/IAU2006_XYS/IAU2006_XYS_16.json"]
    );

    // Meanwhile the central-body transform falls back to TEME.
    let fallback = transforms.compute_icrf_to_central_body_fixed_matrix(&date);
    assert_eq!(fallback, transforms.compute_teme_to_pseudo_fixed_matrix(&date));

    pool.run_until_stalled();

    let fixed_to_icrf = transforms.compute_fixed_to_icrf_matrix(&date).unwrap();
    let icrf_to_fixed = transforms.compute_icrf_to_fixed_matrix(&date).unwrap();
    assert_orthonormal(&fixed_to_icrf);
    assert_eq!(icrf_to_fixed, fixed_to_icrf.transpose());
    assert_eq!(
        transforms.compute_icrf_to_central_body_fixed_matrix(&date),
        icrf_to_fixed
    );
    assert_eq!(fetcher.request_count(), 1);
}

#[test]
fn preload_warms_an_interval() {
    let config = XysConfig::default();
    let fetcher = Rc::new(MemoryFetcher::new());
    for chunk in 15..=16 {
        fetcher.insert(
            config.chunk_url(chunk),
            xys_chunk(chunk, config.samples_per_xys_file),
        );
    }
    let mut pool = LocalPool::new();
    let xys = Rc::new(Iau2006Xys::new(config, fetcher.clone(), pool.spawner()));
    let transforms = Transforms::new(xys.clone()).with_leap_seconds(table());

    // Sample 16 000 sits on the chunk boundary.
    let start = xys.sample_zero().add_days(15_990.0);
    let stop = start.add_days(20.0);
    pool.run_until(transforms.preload_icrf_fixed(&start, &stop))
        .unwrap();
    assert_eq!(fetcher.request_count(), 2);

    let mut date = start;
    while date < stop {
        assert!(transforms.compute_icrf_to_fixed_matrix(&date).is_some());
        date = date.add_hours(7.0);
    }
    assert_eq!(fetcher.request_count(), 2);

    // Continuity across the chunk boundary.
    let boundary = xys.sample_zero().add_days(16_000.0);
    let below = boundary.add_seconds(-1e-3);
    let above = boundary.add_seconds(1e-3);
    let a = xys
        .compute_xys_radians(below.day_number(), below.seconds_of_day())
        .unwrap();
    let b = xys
        .compute_xys_radians(above.day_number(), above.seconds_of_day())
        .unwrap();
    assert!((a.x - b.x).abs() < 1e-12);
    assert!((a.y - b.y).abs() < 1e-12);
    assert!((a.s - b.s).abs() < 1e-15);
}

fn eop_record() -> Value {
    json!({
        "columnNames": [
            "dateIso8601", "modifiedJulianDateUtc", "xPoleWanderRadians",
            "yPoleWanderRadians", "ut1MinusUtcSeconds", "lengthOfDayCorrectionSeconds",
            "xCelestialPoleOffsetRadians", "yCelestialPoleOffsetRadians", "taiMinusUtcSeconds"
        ],
        "samples": [
            "2016-12-30T00:00:00Z", 57752.0, 5.4e-7, 1.3e-6, -0.4111, 0.0009, 4.8e-10, -1.9e-10, 36.0,
            "2016-12-31T00:00:00Z", 57753.0, 5.5e-7, 1.3e-6, -0.4120, 0.0009, 4.9e-10, -1.9e-10, 36.0,
            "2017-01-01T00:00:00Z", 57754.0, 5.6e-7, 1.4e-6, 0.5871, 0.0009, 5.0e-10, -2.0e-10, 37.0,
            "2017-01-02T00:00:00Z", 57755.0, 5.7e-7, 1.4e-6, 0.5862, 0.0009, 5.1e-10, -2.0e-10, 37.0
        ]
    })
}

#[test]
fn eop_loaded_through_fetcher() {
    let table = table();
    let fetcher = MemoryFetcher::new().with("eop.json", eop_record());
    let eop = EarthOrientationParameters::with_table(EopConfig::default(), Arc::clone(&table));
    assert!(eop.compute(&HISTORICAL_LEAP_SECONDS[27].date).is_none());

    block_on(eop.load(&fetcher, "eop.json")).unwrap();
    assert_eq!(eop.len(), 4);
    // Every leap second in the record is already known.
    assert_eq!(table.len(), HISTORICAL_LEAP_SECONDS.len());

    // Exact epoch: the 2017-01-01 row, which is the leap-second entry.
    let sample = eop.compute(&HISTORICAL_LEAP_SECONDS[27].date).unwrap();
    assert_eq!(sample.x_pole_wander, 5.6e-7);
    assert_eq!(sample.ut1_minus_utc, 0.5871);

    // UT1 − UTC gains one second at the leap; interpolation must hide it.
    let before = JulianDate::new_with_table(2_457_753.5, 36.0, TimeStandard::Tai, &table);
    let noon = before.add_hours(12.0);
    let mid = eop.compute(&noon).unwrap();
    assert!((mid.ut1_minus_utc + 0.4125).abs() < 1e-3, "{}", mid.ut1_minus_utc);

    // After the last sample: zeros, no extrapolation.
    let late = JulianDate::from_iso8601_with_table("2017-03-01T00:00:00Z", &table).unwrap();
    assert_eq!(eop.compute(&late), Some(EopSample::default()));
}

#[test]
fn eop_registers_new_leap_second_in_isolated_table() {
    let table = table();
    let record = json!({
        "columnNames": [
            "modifiedJulianDateUtc", "xPoleWanderRadians", "yPoleWanderRadians",
            "ut1MinusUtcSeconds", "xCelestialPoleOffsetRadians",
            "yCelestialPoleOffsetRadians", "taiMinusUtcSeconds"
        ],
        "samples": [
            63_000.0, 0.0, 0.0, -0.4, 0.0, 0.0, 37.0,
            63_001.0, 0.0, 0.0, 0.6, 0.0, 0.0, 38.0
        ]
    });
    let eop = EarthOrientationParameters::with_table(EopConfig::default(), Arc::clone(&table));
    eop.install(&record).unwrap();

    assert_eq!(table.len(), HISTORICAL_LEAP_SECONDS.len() + 1);
    let new_entry = *table.entries().last().unwrap();
    assert_eq!(new_entry.offset, 38.0);

    // UTC midnight of MJD 63001 now maps through the new offset.
    let utc = JulianDate::new_with_table(63_001.0 + 2_400_000.5, 0.0, TimeStandard::Utc, &table);
    assert_eq!(utc, new_entry.date);
    assert_eq!(table.tai_to_utc(&new_entry.date.add_seconds(-0.5)), None);

    // The global table is untouched.
    assert_eq!(LeapSecondTable::global().offset_at(&new_entry.date), 37.0);
}

#[test]
fn full_transform_with_earth_orientation() {
    let table = table();
    let config = XysConfig::default();
    let mut pool = LocalPool::new();
    let fetcher = Rc::new(MemoryFetcher::new());
    let xys = Rc::new(Iau2006Xys::new(config.clone(), fetcher, pool.spawner()));
    xys.load_chunk(15, &xys_chunk(15, config.samples_per_xys_file))
        .unwrap();

    let eop = EarthOrientationParameters::with_table(EopConfig::default(), Arc::clone(&table));
    eop.install(&eop_record()).unwrap();
    let transforms = Transforms::new(xys)
        .with_leap_seconds(Arc::clone(&table))
        .with_earth_orientation(Rc::new(eop));

    let mut date = JulianDate::from_iso8601_with_table("2016-12-30T06:00:00Z", &table).unwrap();
    for _ in 0..12 {
        let m = transforms.compute_fixed_to_icrf_matrix(&date).unwrap();
        assert_orthonormal(&m);
        date = date.add_hours(5.0);
    }
    pool.run_until_stalled();
}

#[test]
fn julian_date_serializes_as_components() {
    let date = HISTORICAL_LEAP_SECONDS[0].date;
    let json = serde_json::to_value(date).unwrap();
    assert_eq!(json, json!({ "dayNumber": 2_441_317, "secondsOfDay": 43_210.0 }));
    let back: JulianDate = serde_json::from_value(json).unwrap();
    assert_eq!(back, date);
}
