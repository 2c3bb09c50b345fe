use chrono::DateTime;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use strava_activities_client::shaping::shape_all;
use strava_activities_client::sink::write_records;
use strava_activities_client::{ActivityRecord, LatLng};

fn activities(n: u64) -> Vec<ActivityRecord> {
    let start = DateTime::parse_from_rfc3339("2024-05-01T07:30:00+02:00").expect("timestamp");
    (0..n)
        .map(|i| ActivityRecord {
            id: 10_000_000_000 + i,
            start_date_local: start,
            distance: 1000.0 + i as f64,
            moving_time: 600 + i,
            start_latlng: (i % 3 != 0).then_some(LatLng {
                lat: 52.37,
                lng: 4.89,
            }),
            average_speed: 2.5,
            max_speed: 6.1,
            activity_type: "Ride".into(),
        })
        .collect()
}

fn bench_shape_and_write(c: &mut Criterion) {
    let records = activities(10_000);
    c.bench_function("shape_10k_activities", |b| {
        b.iter(|| shape_all(black_box(&records)))
    });

    let shaped = shape_all(&records);
    c.bench_function("write_10k_rows", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(2 * 1024 * 1024);
            write_records(&mut buf, black_box(&shaped)).expect("write");
            buf
        })
    });
}

criterion_group!(benches, bench_shape_and_write);
criterion_main!(benches);
