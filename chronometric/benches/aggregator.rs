use chronometric::histogram::{PercentileConfig, PercentileMetric};
use chronometric::value::CpmMetric;
use chronometric::{MetricsAggregator, Precision};
use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

const ENTITIES: &[usize] = &[1, 100, 1000];

fn minute_bucket(i: usize) -> u64 {
    201809120000 + (i as u64 % 24) * 100 + (i as u64 % 60)
}

#[divan::bench(args = ENTITIES)]
fn add_cpm(bencher: Bencher, entities: usize) {
    let names: Vec<String> = (0..entities).map(|i| format!("svc-{i}")).collect();
    bencher.bench_local(|| {
        let mut aggregator = MetricsAggregator::new();
        for i in 0..10_000 {
            let mut metric = CpmMetric::new(names[i % entities].as_str(), minute_bucket(i));
            metric.accept(1);
            aggregator.add(metric);
        }
        black_box(aggregator.drain())
    });
}

#[divan::bench(args = ENTITIES)]
fn rollup_percentiles(bencher: Bencher, entities: usize) {
    let config = PercentileConfig::default();
    let minutes: MetricsAggregator<PercentileMetric> = (0..10_000)
        .map(|i| {
            let mut metric =
                PercentileMetric::new(format!("svc-{}", i % entities), minute_bucket(i), &config);
            metric.accept(i as u64 % 2_000);
            metric
        })
        .collect();
    bencher.bench_local(|| {
        black_box(
            minutes
                .downsample(Precision::Hour)
                .and_then(|hours| hours.downsample(Precision::Day))
                .map(|mut days| days.drain()),
        )
    });
}
