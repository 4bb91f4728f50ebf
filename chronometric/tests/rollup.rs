use assert2::{check, let_assert};
use chronometric::histogram::{PercentileConfig, PercentileMetric};
use chronometric::value::{CountMetric, CpmMetric, LongAvgMetric};
use chronometric::{Metric, MetricId, MetricsAggregator, Precision, TimeBucket};
use rstest::rstest;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn downsampling_copies_without_touching_the_source() {
    let mut minute = LongAvgMetric::new("svc", 201809120511);
    minute.accept(40);
    minute.accept(60);
    minute.extend_survival_time(5);
    minute.extend_survival_time(3);
    check!(minute.survival_time() == 8);

    let hour = minute.to_hour().unwrap();
    check!(hour.time_bucket() == TimeBucket::new(2018091205));
    check!(hour.survival_time() == 0);
    check!(hour.entity_id() == "svc");
    check!((hour.summation(), hour.count()) == (100, 2));

    check!(minute.time_bucket() == TimeBucket::new(201809120511));
    check!(minute.survival_time() == 8);
    check!((minute.summation(), minute.count()) == (100, 2));

    check!(minute.to_day().unwrap().time_bucket() == TimeBucket::new(20180912));
    check!(minute.to_month().unwrap().time_bucket() == TimeBucket::new(201809));
    check!(hour.to_day().unwrap().time_bucket() == TimeBucket::new(20180912));
    check!(hour.to_month().unwrap().time_bucket() == TimeBucket::new(201809));
}

#[rstest]
#[case(2018091205, Precision::Hour, "to_hour")]
#[case(20180912, Precision::Hour, "to_hour")]
#[case(20180912, Precision::Day, "to_day")]
#[case(201809, Precision::Day, "to_day")]
#[case(201809, Precision::Month, "to_month")]
#[case(201809120511, Precision::Minute, "to_minute")]
fn downsampling_rejects_non_coarser_targets(
    #[case] bucket: u64,
    #[case] target: Precision,
    #[case] operation: &str,
) {
    let metric = CountMetric::new("svc", bucket);
    let_assert!(Err(err) = metric.downsample(target));
    check!(err.operation() == operation);
    check!(err.bucket() == TimeBucket::new(bucket));
}

#[test]
fn minutes_roll_up_to_months() {
    init_logging();

    // two entities, 60 calls in every minute of 05:00..07:00, delivered out of order
    let mut minutes = MetricsAggregator::new();
    for entity in ["svc-a", "svc-b"] {
        for hour in (5..7).rev() {
            for minute in 0..60 {
                let bucket: u64 = 201809120000 + hour * 100 + minute;
                let mut cpm = CpmMetric::new(entity, bucket);
                cpm.accept(60);
                minutes.add(cpm);
            }
        }
    }
    check!(minutes.len() == 240);

    let mut hours = minutes.downsample(Precision::Hour).unwrap();
    let mut days = hours.downsample(Precision::Day).unwrap();
    let mut months = days.downsample(Precision::Month).unwrap();
    check!(minutes.len() == 240);

    let hourly = hours.drain();
    check!(hourly.len() == 4);
    check!(hourly[0].id() == MetricId::new("svc-a", 2018091205));
    check!(hourly[1].id() == MetricId::new("svc-b", 2018091205));
    check!(hourly.iter().all(|h| h.total() == 3600 && h.value() == 60));

    let daily = days.drain();
    check!(daily.len() == 2);
    check!(daily.iter().all(|d| d.total() == 7200 && d.value() == 5));

    let monthly = months.drain();
    let_assert!([a, b] = monthly.as_slice());
    check!(a.id() == MetricId::new("svc-a", 201809));
    check!(b.id() == MetricId::new("svc-b", 201809));
    check!(a.total() == 7200);
    check!(a.value() == 0);

    let mut busy_month = a.clone();
    busy_month.accept(30 * 1440 * 3 - 7200);
    busy_month.calculate();
    check!(busy_month.value() == 3);
}

#[test]
fn month_rollup_skipping_levels_matches_stepwise_rollup() {
    init_logging();

    let config = PercentileConfig::default();
    let mut minutes = MetricsAggregator::new();
    for (bucket, latency) in [
        (201809120000_u64, 12),
        (201809120001, 250),
        (201809120059, 31),
        (201809120210, 18),
        (201809122359, 25),
    ] {
        let mut metric = PercentileMetric::new("endpoint", bucket, &config);
        metric.accept(latency);
        minutes.add(metric);
    }
    check!(minutes.len() == 5);

    let direct = minutes.downsample(Precision::Month).unwrap().drain();
    let stepwise = minutes
        .downsample(Precision::Hour)
        .and_then(|h| h.downsample(Precision::Day))
        .and_then(|d| d.downsample(Precision::Month))
        .unwrap()
        .drain();

    check!(direct.len() == 1);
    check!(stepwise.len() == 1);
    check!(direct[0].id() == stepwise[0].id());
    check!(direct[0].values() == stepwise[0].values());
    check!(direct[0].count() == 5);
    check!(direct[0].value(50) == Some(20));
    check!(direct[0].value(99) == Some(250));
}

#[test]
fn counts_merge_across_duplicate_deliveries() {
    let mut aggregator = MetricsAggregator::new();
    for _ in 0..3 {
        let mut metric = CountMetric::new("svc", 201809120511);
        metric.increment();
        aggregator.add(metric);
    }
    let drained = aggregator.drain();
    check!(drained.len() == 1);
    check!(drained[0].value() == 3);
    check!(aggregator.is_empty());
}
