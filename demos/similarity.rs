use cardinality_similarity::{union, CardinalityEstimator, SimilaritySketch, SketchConfig};

fn main() {
    let mut estimator1 = CardinalityEstimator::<usize>::new(12).unwrap();
    for i in 0..10 {
        estimator1.insert(&i);
    }
    println!("estimator1 estimate = {}", estimator1.estimate());

    let mut estimator2 = CardinalityEstimator::<usize>::new(12).unwrap();
    for i in 10..15 {
        estimator2.insert(&i);
    }
    println!("estimator2 estimate = {}", estimator2.estimate());

    let merged = union(&estimator1, [&estimator2]).unwrap();
    println!("union estimate = {}", merged.estimate());

    let config = SketchConfig::default()
        .with_precision(14)
        .with_sample_capacity(1024);
    let mut sketch1 = SimilaritySketch::<usize>::new(&config).unwrap();
    let mut sketch2 = SimilaritySketch::<usize>::new(&config).unwrap();
    for i in 0..20_000 {
        sketch1.insert(&i);
        sketch2.insert(&(i + 10_000));
    }
    println!("sketch1 = {:?}", sketch1);
    println!("sketch2 = {:?}", sketch2);
    println!("jaccard = {:.4}", sketch1.jaccard(&sketch2).unwrap());
    println!("intersection estimate = {}", sketch1.intersect(&sketch2).unwrap());
    println!("union estimate = {}", sketch1.union_estimate(&sketch2).unwrap());
}
