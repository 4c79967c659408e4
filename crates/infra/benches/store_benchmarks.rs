use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use petclinic_infra::config::DatabaseConfig;
use petclinic_infra::seed::reference_dataset;
use petclinic_infra::store::{
    InMemoryClinicStore, OwnerRepository, SqliteClinicStore, VetRepository,
};
use petclinic_model::{Owner, Person};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn sqlite_store(rt: &Runtime) -> SqliteClinicStore {
    rt.block_on(async {
        let store = SqliteClinicStore::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        store.seed(&reference_dataset()).await.unwrap();
        store
    })
}

fn bench_owner_search(c: &mut Criterion) {
    let rt = runtime();
    let memory = &InMemoryClinicStore::with_seed(&reference_dataset());
    let sqlite = &sqlite_store(&rt);

    let mut group = c.benchmark_group("owner_search");
    for prefix in ["", "Davis", "Zz"] {
        group.bench_with_input(BenchmarkId::new("in_memory", prefix), &prefix, |b, &prefix| {
            b.to_async(&rt)
                .iter(|| async move { black_box(memory.find_by_last_name(prefix).await.unwrap()) });
        });
        group.bench_with_input(BenchmarkId::new("sqlite", prefix), &prefix, |b, &prefix| {
            b.to_async(&rt)
                .iter(|| async move { black_box(sqlite.find_by_last_name(prefix).await.unwrap()) });
        });
    }
    group.finish();
}

fn bench_vet_listing(c: &mut Criterion) {
    let rt = runtime();
    let memory = &InMemoryClinicStore::with_seed(&reference_dataset());
    let sqlite = &sqlite_store(&rt);

    let mut group = c.benchmark_group("vet_listing");
    group.bench_function("in_memory", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(memory.find_all().await.unwrap()) });
    });
    group.bench_function("sqlite", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(sqlite.find_all().await.unwrap()) });
    });
    group.finish();
}

fn bench_owner_insert(c: &mut Criterion) {
    let rt = runtime();
    let memory = &InMemoryClinicStore::with_seed(&reference_dataset());

    c.bench_function("owner_insert_in_memory", |b| {
        b.to_async(&rt).iter(|| async move {
            let mut owner = Owner::new(
                Person::new("Sam", "Schultz"),
                "4, Evans Street",
                "Wollongong",
                "4444444444",
            );
            OwnerRepository::save(memory, &mut owner).await.unwrap();
            black_box(owner.id)
        });
    });
}

criterion_group!(benches, bench_owner_search, bench_vet_listing, bench_owner_insert);
criterion_main!(benches);
