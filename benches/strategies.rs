use std::sync::Arc;
use std::thread;

use contesa::record::{CounterRecord, RecordId};
use contesa::service::CounterService;
use contesa::store::{FastIncrementStore, MemoryFastStore, MemoryStore, ResourceStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const NUM_THREADS: usize = 8;
const ITERATIONS_PER_THREAD: usize = 1_000;

type Service = CounterService<MemoryStore, MemoryFastStore>;

fn service(rows: u64) -> Arc<Service> {
    let records = Arc::new(MemoryStore::new());
    for raw in 1..=rows {
        let record = CounterRecord::new(RecordId::new(raw)).with_code(format!("post-{}", raw));
        records.insert(record).unwrap();
    }
    Arc::new(CounterService::new(records, Arc::new(MemoryFastStore::new())))
}

fn hammer(service: &Arc<Service>, op: fn(&Service)) {
    let mut handles = vec![];

    for _ in 0..NUM_THREADS {
        let service_clone = Arc::clone(service);
        let handle = thread::spawn(move || {
            for _ in 0..ITERATIONS_PER_THREAD {
                op(&service_clone);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_increment");
    let id = RecordId::new(1);
    let label = format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD);

    group.bench_function(BenchmarkId::new("exclusive", &label), |b| {
        b.iter(|| {
            let service = service(1);
            hammer(&service, |s| {
                s.increment_exclusive(RecordId::new(1)).unwrap();
            });
            black_box(service.records().read_versioned(id).unwrap().value)
        })
    });

    group.bench_function(BenchmarkId::new("optimistic", &label), |b| {
        b.iter(|| {
            let service = service(1);
            hammer(&service, |s| {
                s.increment_optimistic(RecordId::new(1)).unwrap();
            });
            black_box(service.records().read_versioned(id).unwrap().value)
        })
    });

    group.bench_function(BenchmarkId::new("fast", &label), |b| {
        b.iter(|| {
            let service = service(1);
            hammer(&service, |s| {
                s.increment_fast(RecordId::new(1)).unwrap();
            });
            black_box(service.fast_store().get(id).unwrap())
        })
    });

    group.finish();
}

fn bench_unindexed_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("unindexed_update");

    for rows in [10u64, 100, 1_000] {
        let service = service(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| black_box(service.increment_by_unindexed_key("post-1").unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_unindexed_scan);
criterion_main!(benches);
