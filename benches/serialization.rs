use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_sled::{from_str, parse, to_string, to_string_minified, Serializer, Value};

#[derive(Serialize, Deserialize)]
struct Listener {
    host: String,
    port: u16,
    tls: bool,
    backlog: i64,
}

#[derive(Serialize, Deserialize)]
struct Upstream {
    name: String,
    address: String,
    weight: f64,
    retries: u32,
}

#[derive(Serialize, Deserialize)]
struct Pool {
    upstreams: Vec<Upstream>,
}

#[derive(Serialize, Deserialize)]
struct Deployment {
    revision: u32,
    limits: Limits,
    regions: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Limits {
    memory: String,
    cpu: f64,
    max_connections: u64,
}

fn listener() -> Listener {
    Listener {
        host: "0.0.0.0".to_string(),
        port: 8443,
        tls: true,
        backlog: 1024,
    }
}

fn pool(size: u32) -> Pool {
    Pool {
        upstreams: (0..size)
            .map(|i| Upstream {
                name: format!("node-{}", i),
                address: format!("10.0.{}.{}:9000", i / 256, i % 256),
                weight: 0.5 + f64::from(i) / 8.0,
                retries: i % 5,
            })
            .collect(),
    }
}

fn deployment() -> Deployment {
    Deployment {
        revision: 17,
        limits: Limits {
            memory: "512 MiB".to_string(),
            cpu: 1.5,
            max_connections: 65_536,
        },
        regions: vec![
            "eu-west".to_string(),
            "us-east".to_string(),
            "ap-south".to_string(),
        ],
    }
}

fn benchmark_flat(c: &mut Criterion) {
    let listener = listener();
    let sled = "host = \"0.0.0.0\"\nport = 8_443\ntls = @true\nbacklog = 1_024\n";

    c.bench_function("serialize_flat", |b| {
        b.iter(|| to_string(black_box(&listener)))
    });
    c.bench_function("deserialize_flat", |b| {
        b.iter(|| from_str::<Listener>(black_box(sled)))
    });
}

fn benchmark_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    for size in [16u32, 128, 1024] {
        let pool = pool(size);
        let canonical = to_string(&pool).unwrap();
        let minified = to_string_minified(&pool).unwrap();

        group.bench_with_input(BenchmarkId::new("to_canonical", size), &pool, |b, pool| {
            b.iter(|| to_string(black_box(pool)))
        });
        group.bench_with_input(BenchmarkId::new("to_minified", size), &pool, |b, pool| {
            b.iter(|| to_string_minified(black_box(pool)))
        });
        group.bench_with_input(BenchmarkId::new("from_canonical", size), &canonical, |b, text| {
            b.iter(|| from_str::<Pool>(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("from_minified", size), &minified, |b, text| {
            b.iter(|| from_str::<Pool>(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_nested(c: &mut Criterion) {
    let deployment = deployment();
    let sled = to_string(&deployment).unwrap();

    c.bench_function("serialize_nested", |b| {
        b.iter(|| to_string(black_box(&deployment)))
    });
    c.bench_function("parse_nested_untyped", |b| b.iter(|| parse(black_box(&sled))));
}

fn benchmark_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    let identity = Value::from("short");
    let quoted = Value::from("This is a medium length string with \"quotes\" and spaces");
    let multi_line = Value::from("first line\nsecond line\nthird line\n".repeat(10));

    for (name, value) in [("identity", identity), ("quoted", quoted), ("multi_line", multi_line)] {
        let doc = serde_sled::sled!({ "s": (value) });
        group.bench_function(name, |b| b.iter(|| to_string(black_box(&doc))));
    }

    group.finish();
}

fn benchmark_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("hex");

    let doc = serde_sled::sled!({ "blob": (Value::bytes((0..4096).map(|i| (i % 256) as u8).collect::<Vec<u8>>())) });
    let serializer = Serializer::canonical();
    let sled = serializer.to_sled(&doc).unwrap();

    group.bench_function("serialize_4k", |b| {
        b.iter(|| serializer.to_sled(black_box(&doc)))
    });
    group.bench_function("parse_4k", |b| b.iter(|| parse(black_box(&sled))));

    group.finish();
}

fn benchmark_against_json(c: &mut Criterion) {
    let pool = pool(128);
    let sled = to_string_minified(&pool).unwrap();
    let json = serde_json::to_string(&pool).unwrap();

    let mut group = c.benchmark_group("against_json");
    group.bench_function("sled_write", |b| {
        b.iter(|| to_string_minified(black_box(&pool)))
    });
    group.bench_function("json_write", |b| {
        b.iter(|| serde_json::to_string(black_box(&pool)))
    });
    group.bench_function("sled_read", |b| {
        b.iter(|| from_str::<Pool>(black_box(&sled)))
    });
    group.bench_function("json_read", |b| {
        b.iter(|| serde_json::from_str::<Pool>(black_box(&json)))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_flat,
    benchmark_pool,
    benchmark_nested,
    benchmark_strings,
    benchmark_hex,
    benchmark_against_json
);
criterion_main!(benches);
