//! # Assembly Benchmarks
//!
//! Performance benchmarks for schemaforge-core schema assembly.
//!
//! Run with: `cargo bench -p schemaforge-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use schemaforge_core::{
    ClassCatalog, MemoryStoreFactory, ModelCreator, Schema, SchemaContext, SchemaGraph, graph_to_bytes, print_sdl,
};
use serde_json::{Map, Value, json};
use std::hint::black_box;
use std::sync::Arc;

/// A config fragment with `size` types of ten fields each, one query per type.
fn types_fragment(size: usize) -> Value {
    let mut types = Map::new();
    let mut queries = Map::new();
    for i in 0..size {
        let name = format!("Type{}", i);
        let fields: Map<String, Value> = (0..10)
            .map(|f| (format!("field{}", f), Value::String("String".to_string())))
            .collect();
        types.insert(name.clone(), json!({"fields": fields}));
        queries.insert(format!("all{}", name), Value::String(format!("[{}!]!", name)));
    }
    json!({"types": types, "queries": queries})
}

/// A catalog of `size` classes, each related to the next.
fn catalog(size: usize) -> ClassCatalog {
    let mut classes = Map::new();
    for i in 0..size {
        classes.insert(
            format!("App\\Model{}", i),
            json!({"fields": {
                "title": "String!",
                "body": "String",
                "next": {"relation": format!("App\\Model{}", (i + 1) % size)}
            }}),
        );
    }
    ClassCatalog::from_value(&Value::Object(classes)).expect("catalog")
}

fn models_fragment(size: usize) -> Value {
    let models: Map<String, Value> = (0..size)
        .map(|i| {
            (
                format!("App\\Model{}", i),
                json!({"fields": {"*": true}, "operations": {"*": true}}),
            )
        })
        .collect();
    json!({"models": models})
}

fn built_graph(size: usize) -> SchemaGraph {
    let mut schema =
        Schema::new("bench", SchemaContext::new(), &MemoryStoreFactory::new()).expect("schema");
    schema.apply_config(&types_fragment(size)).expect("apply");
    schema.build().expect("build")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_apply_config(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_config");

    for size in [10, 100, 500].iter() {
        let fragment = types_fragment(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &fragment, |b, fragment| {
            b.iter(|| {
                let mut schema = Schema::new("bench", SchemaContext::new(), &MemoryStoreFactory::new())
                    .expect("schema");
                schema.apply_config(fragment).expect("apply");
                black_box(schema)
            });
        });
    }

    group.finish();
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");

    for size in [10, 100, 500].iter() {
        let fragment = types_fragment(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &fragment, |b, fragment| {
            b.iter(|| {
                let mut schema = Schema::new("bench", SchemaContext::new(), &MemoryStoreFactory::new())
                    .expect("schema");
                schema.apply_config(fragment).expect("apply");
                black_box(schema.save().expect("save"))
            });
        });
    }

    group.finish();
}

fn bench_model_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_expansion");

    for size in [10, 50, 200].iter() {
        let catalog: Arc<dyn ModelCreator> = Arc::new(catalog(*size));
        let fragment = models_fragment(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &fragment, |b, fragment| {
            b.iter(|| {
                let context = SchemaContext::new().with_model_creator(Arc::clone(&catalog));
                let mut schema =
                    Schema::new("bench", context, &MemoryStoreFactory::new()).expect("schema");
                schema.apply_config(fragment).expect("apply");
                black_box(schema.build().expect("build"))
            });
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [10, 100, 500].iter() {
        let graph = built_graph(*size);
        group.bench_with_input(BenchmarkId::new("postcard", size), &graph, |b, graph| {
            b.iter(|| black_box(graph_to_bytes(graph)));
        });
        group.bench_with_input(BenchmarkId::new("sdl", size), &graph, |b, graph| {
            b.iter(|| black_box(print_sdl(graph)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_apply_config,
    bench_save,
    bench_model_expansion,
    bench_encode
);
criterion_main!(benches);
