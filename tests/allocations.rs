#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use cardinality_similarity::{CardinalityEstimator, SimilaritySketch, SketchConfig};
use hyperloglogplus::{HyperLogLog, HyperLogLogPlus};
use std::hash::BuildHasherDefault;
use tabled::{
    settings::{Settings, Style},
    Table, Tabled,
};
use wyhash::WyHash;

#[derive(Tabled)]
struct Record {
    cardinality: usize,
    cardinality_estimator: String,
    similarity_sketch: String,
    amadeus_streaming: String,
    probabilistic_collections: String,
    hyperloglog: String,
    hyperloglogplus: String,
}

fn measure_memory_usage<T>(
    cardinality: usize,
    create: impl Fn() -> T,
    insert: impl Fn(&mut T, &usize),
) -> (usize, u64)
where
    T: Sized,
{
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut estimator = create();
    for i in 0..cardinality {
        insert(&mut estimator, &i);
    }
    let stats = dhat::HeapStats::get();
    (stats.max_bytes, stats.total_blocks)
}

fn format_usage<T>((max_bytes, total_blocks): (usize, u64)) -> String {
    format!(
        "{} / {} / {}",
        std::mem::size_of::<T>(),
        max_bytes,
        total_blocks
    )
}

#[test]
fn test_allocations() {
    let config = SketchConfig::default();
    let mut estimator_peaks = Vec::new();

    let results: Vec<Record> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= 1 << 16)
        .map(|cardinality| {
            let estimator = measure_memory_usage(
                cardinality,
                || CardinalityEstimator::<usize>::with_config(&config).unwrap(),
                |est, i| est.insert(i),
            );
            estimator_peaks.push(estimator.0);
            Record {
                cardinality,
                cardinality_estimator: format_usage::<CardinalityEstimator<usize>>(estimator),
                similarity_sketch: format_usage::<SimilaritySketch<usize>>(measure_memory_usage(
                    cardinality,
                    || SimilaritySketch::<usize>::new(&config).unwrap(),
                    |est, i| est.insert(i),
                )),
                amadeus_streaming: format_usage::<amadeus_streaming::HyperLogLog<usize>>(
                    measure_memory_usage(
                        cardinality,
                        || amadeus_streaming::HyperLogLog::new(0.01625),
                        |est, i| est.push(i),
                    ),
                ),
                probabilistic_collections: format_usage::<
                    probabilistic_collections::hyperloglog::HyperLogLog<usize>,
                >(measure_memory_usage(
                    cardinality,
                    || probabilistic_collections::hyperloglog::HyperLogLog::<usize>::new(0.004),
                    |est, i| est.insert(i),
                )),
                hyperloglog: format_usage::<hyperloglog::HyperLogLog>(measure_memory_usage(
                    cardinality,
                    || hyperloglog::HyperLogLog::new(0.004),
                    |est, i| est.insert(i),
                )),
                hyperloglogplus: format_usage::<HyperLogLogPlus<usize, BuildHasherDefault<WyHash>>>(
                    measure_memory_usage(
                        cardinality,
                        || {
                            HyperLogLogPlus::<usize, _>::new(
                                12,
                                BuildHasherDefault::<WyHash>::default(),
                            )
                            .unwrap()
                        },
                        |est, i| est.insert(i),
                    ),
                ),
            }
        })
        .collect();

    // buckets are allocated once up front, inserts never grow the heap
    assert!(estimator_peaks.iter().all(|&peak| peak == estimator_peaks[0]));

    let table_config = Settings::default().with(Style::markdown());
    let markdown = Table::new(results).with(table_config).to_string();
    std::fs::write(
        format!("{}/target/memory_allocations.md", env!("CARGO_MANIFEST_DIR")),
        &markdown,
    )
    .unwrap();
    println!("{}", markdown);
}
