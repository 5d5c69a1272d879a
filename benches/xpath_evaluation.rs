//! XPath compile and evaluate throughput
//!
//! Measures:
//! - Parsing expressions of increasing complexity
//! - Evaluating against documents of growing size (10, 100, 1000 rows)
//! - Materializing the same expression as snapshot, iterator and scalar results
//!
//! Run benchmarks: `cargo bench --bench xpath_evaluation`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use domxpath::{Document, ResultType, XPathEvaluator, compile};
use std::hint::black_box;

const EXPRESSIONS: &[(&str, &str)] = &[
    ("simple_path", "//row"),
    ("predicate", "//row[@id='r5']/cell[2]"),
    ("functions", "count(//row[contains(cell[1], '1')]) + sum(//row/@n)"),
    (
        "axes",
        ".//*[@id='level1']/*[not(preceding-sibling::* or following-sibling::*)]",
    ),
];

fn table_document(rows: usize) -> Document {
    let mut xml = String::from("<table>");
    for i in 0..rows {
        xml.push_str(&format!(
            "<row id='r{i}' n='{i}'><cell>{i}</cell><cell>value {i}</cell></row>"
        ));
    }
    xml.push_str("</table>");
    Document::parse(&xml).expect("benchmark document should parse")
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for (name, expression) in EXPRESSIONS {
        group.bench_with_input(BenchmarkId::from_parameter(name), expression, |b, expr| {
            b.iter(|| compile(black_box(expr)).expect("expression should compile"))
        });
    }
    group.finish();
}

fn bench_document_size(c: &mut Criterion) {
    let evaluator = XPathEvaluator::new();
    let expr = evaluator
        .compile("//row[cell[1] mod 2 = 0]")
        .expect("expression should compile");
    let mut group = c.benchmark_group("document_size");
    for rows in [10usize, 100, 1000] {
        let doc = table_document(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &doc, |b, doc| {
            b.iter(|| {
                evaluator
                    .evaluate(&expr, doc.root_node(), None, ResultType::OrderedNodeSnapshot)
                    .expect("evaluation should succeed")
            })
        });
    }
    group.finish();
}

fn bench_result_types(c: &mut Criterion) {
    let evaluator = XPathEvaluator::new();
    let expr = evaluator.compile("//row").expect("expression should compile");
    let doc = table_document(500);
    let mut group = c.benchmark_group("result_type");
    for requested in [
        ResultType::OrderedNodeSnapshot,
        ResultType::UnorderedNodeIterator,
        ResultType::FirstOrderedNode,
        ResultType::Number,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(requested), &requested, |b, &requested| {
            b.iter(|| {
                evaluator
                    .evaluate(&expr, doc.root_node(), None, requested)
                    .expect("evaluation should succeed")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_document_size, bench_result_types);
criterion_main!(benches);
