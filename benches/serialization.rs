use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dson::{clone, from_value, is_equal, parse, stringify, to_value, Value};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

/// A doubly linked list: every node points at both neighbours.
fn linked_list(size: usize) -> Value {
    let nodes: Vec<Value> = (0..size)
        .map(|i| {
            let node = Value::empty_object();
            node.set("index", Value::from(i));
            node
        })
        .collect();
    for pair in nodes.windows(2) {
        pair[0].set("next", pair[1].clone());
        pair[1].set("prev", pair[0].clone());
    }
    Value::array(nodes)
}

fn benchmark_stringify_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("stringify_array");

    for size in [10, 50, 100, 500].iter() {
        let value = to_value(&products(*size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| stringify(black_box(value)))
        });
    }
    group.finish();
}

fn benchmark_parse_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_array");

    for size in [10, 50, 100, 500].iter() {
        let text = stringify(&to_value(&products(*size)).unwrap()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_cyclic_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("linked_list");

    for size in [10, 100, 1000].iter() {
        let list = linked_list(*size);
        let text = stringify(&list).unwrap();

        group.bench_with_input(BenchmarkId::new("stringify", size), &list, |b, list| {
            b.iter(|| stringify(black_box(list)))
        });
        group.bench_with_input(BenchmarkId::new("parse", size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("clone", size), &list, |b, list| {
            b.iter(|| clone(black_box(list)))
        });
        let other = linked_list(*size);
        group.bench_with_input(BenchmarkId::new("is_equal", size), &other, |b, other| {
            b.iter(|| is_equal(black_box(&list), black_box(other)))
        });
    }
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let items = products(100);
    let value = to_value(&items).unwrap();

    let mut group = c.benchmark_group("comparison");

    group.bench_function("dson_stringify", |b| b.iter(|| stringify(black_box(&value))));

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&items)))
    });

    let dson_str = stringify(&value).unwrap();
    let json_str = serde_json::to_string(&items).unwrap();

    group.bench_function("dson_parse", |b| b.iter(|| parse(black_box(&dson_str))));

    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_str::<Vec<Product>>(black_box(&json_str)))
    });

    group.finish();
}

fn benchmark_roundtrip(c: &mut Criterion) {
    let items = products(10);

    c.bench_function("roundtrip_serde", |b| {
        b.iter(|| {
            let text = stringify(&to_value(black_box(&items)).unwrap()).unwrap();
            let _back: Vec<Product> = from_value(&parse(black_box(&text)).unwrap()).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_stringify_array,
    benchmark_parse_array,
    benchmark_cyclic_graph,
    benchmark_comparison_with_json,
    benchmark_roundtrip
);
criterion_main!(benches);
