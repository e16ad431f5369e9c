//! Route lookup and validation benchmarks.
//!
//! Run with: `cargo bench -p switchyard-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use switchyard_router::{validate, RouteTable, Routes};

fn build_table(num_routes: usize) -> RouteTable {
    let mut routes = Routes::new();

    for i in 0..num_routes / 3 {
        routes
            .get(&format!("/api/v1/resource{i}"), &format!("Resource{i}@index"))
            .expect("static route");
    }
    for i in 0..num_routes / 3 {
        routes
            .get(
                &format!("/api/v1/resource{i}/{{id}}[int]"),
                &format!("Resource{i}@show"),
            )
            .expect("param route");
    }
    for i in 0..num_routes / 3 {
        routes
            .get(
                &format!("/api/v1/org/{{org}}/resource{i}/{{id}}[int]"),
                &format!("OrgResource{i}@show"),
            )
            .expect("nested route");
    }

    routes.into_table()
}

fn bench_static_lookup(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("static_lookup", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_dynamic_lookup(c: &mut Criterion) {
    let table = build_table(100);

    // Late registration: the scan visits most of the dynamic partition.
    c.bench_function("dynamic_lookup", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "/api/v1/resource30/12345")));
    });
}

fn bench_nested_lookup(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("nested_lookup", |b| {
        b.iter(|| {
            black_box(table.lookup(&Method::GET, "/api/v1/org/acme-corp/resource10/12345"))
        });
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "/api/v1/nonexistent/path")));
    });
}

fn bench_lookup_and_validate(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("lookup_and_validate", |b| {
        b.iter(|| {
            let found = table.lookup(&Method::GET, "/api/v1/resource5/12345");
            black_box(found.map(|m| validate(&m.params, &m.entry.field_types).is_valid()))
        });
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("static_lookup", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}", n / 6);
                b.iter(|| black_box(table.lookup(&Method::GET, &path)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("dynamic_lookup", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}/12345", n / 6);
                b.iter(|| black_box(table.lookup(&Method::GET, &path)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_lookup,
    bench_dynamic_lookup,
    bench_nested_lookup,
    bench_miss,
    bench_lookup_and_validate,
    bench_scaling
);
criterion_main!(benches);
