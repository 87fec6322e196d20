use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use umlflow_core::{compile_diagram_json, update_class_pos};

/// Synthetic document: a chain of classes with members, extra
/// cross-edges, and a couple of groups. Shaped like the documents the
/// host pipeline recompiles on every keystroke.
fn dense_document(nodes: usize, extra_edges: usize) -> String {
    let mut out = String::new();
    for i in 0..nodes {
        out.push_str(&format!(
            "class N{i} \"Node {i}\" {{\n    +field: u32\n    +method()\n}}\n"
        ));
    }
    for i in 0..nodes.saturating_sub(1) {
        out.push_str(&format!("N{} --> N{}\n", i, i + 1));
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            out.push_str(&format!("N{i} ..> N{j}\n"));
            count += 1;
        }
    }
    out.push_str("group Extras {\n    class Extra1\n    class Extra2\n}\n");
    out
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for (name, nodes, extra) in [("small", 10, 5), ("medium", 40, 30), ("large", 120, 80)] {
        let source = dense_document(nodes, extra);
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, source| {
            b.iter(|| compile_diagram_json(black_box(source)));
        });
    }
    group.finish();
}

fn bench_drag_update(c: &mut Criterion) {
    // One pointer-move during a drag: reparse plus minimal splice.
    let source = dense_document(40, 30);
    c.bench_function("update_class_pos", |b| {
        b.iter(|| update_class_pos(black_box(&source), "N7", 123, 456));
    });
}

criterion_group!(benches, bench_compile, bench_drag_update);
criterion_main!(benches);
