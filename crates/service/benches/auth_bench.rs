use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::{domain::{LoginInput, RegisterInput}, AuthService};
use service::password::{hash_password, verify_password};
use service::repository::memory::MemoryStore;
use service::token::TokenConfig;

fn bench_hashing(c: &mut Criterion) {
    let hash = hash_password("Benchmark1").unwrap();
    c.bench_function("argon2_verify", |b| {
        b.iter(|| verify_password("Benchmark1", &hash).unwrap());
    });
}

fn bench_login(c: &mut Criterion) {
    let svc = AuthService::new(Arc::new(MemoryStore::new()), &TokenConfig::new("secret", 1), 6);

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput {
        name: "Bench".into(),
        email: "bench@example.com".into(),
        password: "Benchmark1".into(),
        phone: "1234567890".into(),
        role: None,
        location: "New York".into(),
        specialization: None,
    }))
    .unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
        });
    });
}

criterion_group!(benches, bench_hashing, bench_login);
criterion_main!(benches);
