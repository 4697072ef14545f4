use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use signal_charts::ChartError;
use signal_charts::core::{
    Agg, Bucket, IntervalSpec, SignalSetWindow, datetime_to_timestamp, single_agg_values,
    timestamp_to_datetime,
};

#[test]
fn non_finite_values_normalize_to_null() {
    let mut values = single_agg_values(Agg::Avg, Some(f64::NAN));
    values.insert(Agg::Min, Some(f64::INFINITY));
    values.insert(Agg::Max, Some(1.0));
    let mut window = SignalSetWindow::from_main(vec![Bucket::new(0).with_signal("sig", values)]);

    let rewritten = window.normalize();

    assert_eq!(rewritten, 2);
    assert_eq!(window.main[0].value("sig", Agg::Avg), None);
    assert_eq!(window.main[0].value("sig", Agg::Min), None);
    assert_eq!(window.main[0].value("sig", Agg::Max), Some(1.0));
}

#[test]
fn window_invariants_are_checked() {
    let sorted = SignalSetWindow::from_main(vec![Bucket::new(0), Bucket::new(1)]);
    assert!(sorted.validate().is_ok());

    let unsorted = SignalSetWindow::from_main(vec![Bucket::new(1), Bucket::new(0)]);
    assert!(matches!(
        unsorted.validate(),
        Err(ChartError::InvalidData(_))
    ));

    let bad_prev = SignalSetWindow {
        prev: Some(Bucket::new(10)),
        main: vec![Bucket::new(5)],
        next: None,
    };
    assert!(matches!(
        bad_prev.validate(),
        Err(ChartError::InvalidData(_))
    ));

    let bad_next = SignalSetWindow {
        prev: None,
        main: vec![Bucket::new(5)],
        next: Some(Bucket::new(5)),
    };
    assert!(matches!(
        bad_next.validate(),
        Err(ChartError::InvalidData(_))
    ));
}

#[test]
fn decimal_aggregates_ingest_as_f64() {
    let bucket = Bucket::new(0)
        .with_decimal_signal("price", Agg::Avg, Decimal::new(12345, 2))
        .expect("decimal ingestion");

    assert_eq!(bucket.value("price", Agg::Avg), Some(123.45));
}

#[test]
fn missing_signals_and_aggregates_read_as_null() {
    let bucket = Bucket::new(0).with_signal("sig", single_agg_values(Agg::Avg, Some(1.0)));

    assert_eq!(bucket.value("other", Agg::Avg), None);
    assert_eq!(bucket.value("sig", Agg::Max), None);
}

#[test]
fn timestamp_datetime_round_trip() {
    let time = Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 45).unwrap();
    let ts = datetime_to_timestamp(time);
    let recovered = timestamp_to_datetime(ts).expect("in range");
    assert_eq!(recovered, time);
}

#[test]
fn interval_specs_build_from_datetimes() {
    let from = Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 0).unwrap();

    let spec = IntervalSpec::auto_between(from, to).expect("spec");
    let direct = IntervalSpec::auto(
        datetime_to_timestamp(from),
        datetime_to_timestamp(to),
    )
    .expect("spec");
    assert_eq!(spec, direct);
}
