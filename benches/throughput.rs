use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use fraud_form::context::{AppConfig, AppContext};
use fraud_form::features::FeatureMapper;
use fraud_form::generator::TransactionGenerator;
use fraud_form::model::{Classifier, TreeEnsemble};

const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/model.json");

fn predict_throughput(c: &mut Criterion) {
    let model = TreeEnsemble::load(MODEL_PATH).unwrap();
    let mapper = FeatureMapper::new(model.schema().clone());
    let mut gen = TransactionGenerator::new(0.05);

    let mut group = c.benchmark_group("predict_throughput");
    for size in [100, 500, 1000, 5000] {
        let batches: Vec<_> = gen
            .generate_batch(size)
            .iter()
            .map(|tx| mapper.map(tx).unwrap())
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batches, |b, batches| {
            b.iter(|| {
                for batch in batches {
                    model.predict_proba(batch).unwrap();
                }
            });
        });
    }
    group.finish();
}

fn end_to_end(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let ctx = AppContext::new(AppConfig {
        model_path: MODEL_PATH.into(),
        ..AppConfig::default()
    });
    rt.block_on(ctx.model()).unwrap();
    let mut gen = TransactionGenerator::new(0.05);

    let mut group = c.benchmark_group("end_to_end");
    for size in [100, 500, 1000] {
        let txs = gen.generate_batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txs, |b, txs| {
            b.iter(|| {
                rt.block_on(async {
                    for tx in txs {
                        ctx.predict(tx).await.unwrap();
                    }
                })
            });
        });
    }
    group.finish();
}

fn artifact_load(c: &mut Criterion) {
    c.bench_function("artifact_load", |b| {
        b.iter(|| TreeEnsemble::load(MODEL_PATH).unwrap());
    });
}

criterion_group!(benches, predict_throughput, end_to_end, artifact_load);
criterion_main!(benches);
