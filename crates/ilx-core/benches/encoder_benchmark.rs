use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ilx_core::{
    ast::Param, domain, encode_tree, to_ilx, DomainExtractor, SourceAst,
};

/// A model class with `methods` methods, each doing a little arithmetic,
/// a branch and a call with a block.
fn synthetic_model(methods: usize) -> SourceAst {
    let mut body = vec![
        SourceAst::call("has_many", vec![SourceAst::sym("line_items")]),
        SourceAst::call("belongs_to", vec![SourceAst::sym("customer")]),
    ];
    for i in 0..methods {
        let total = SourceAst::method_call(
            SourceAst::local("amount"),
            "+",
            vec![SourceAst::Integer(i as i64)],
        );
        let branch = SourceAst::If {
            condition: Box::new(SourceAst::method_call(
                SourceAst::local("amount"),
                ">",
                vec![SourceAst::Integer(100)],
            )),
            then_branch: Some(Box::new(SourceAst::method_call(
                SourceAst::constant("OrderMailer"),
                "deliver!",
                vec![],
            ))),
            else_branch: Some(Box::new(total)),
        };
        let each = SourceAst::Call {
            receiver: Some(Box::new(SourceAst::local("items"))),
            name: "each".to_string(),
            args: vec![],
            block: Some(Box::new(SourceAst::Block {
                params: vec![Param::required("item")],
                body: Some(Box::new(SourceAst::call("puts", vec![SourceAst::local("item")]))),
            })),
        };
        body.push(SourceAst::Def {
            name: format!("step_{i}"),
            params: vec![Param::required("amount"), Param::required("items")],
            body: Some(Box::new(SourceAst::Statements(vec![branch, each]))),
            line: (i as u32) * 5 + 3,
            singleton: false,
        });
    }
    SourceAst::Class {
        name: "Order".to_string(),
        superclass: Some("ApplicationRecord".to_string()),
        body: Some(Box::new(SourceAst::Statements(body))),
        line: 1,
    }
}

fn benchmark_graph_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_encoding");
    for methods in [10, 100, 1000] {
        let tree = synthetic_model(methods);
        group.bench_with_input(BenchmarkId::from_parameter(methods), &tree, |b, tree| {
            b.iter(|| to_ilx(&encode_tree("app/models/order.rb", black_box(tree), None)))
        });
    }
    group.finish();
}

fn benchmark_domain_extraction(c: &mut Criterion) {
    let tree = synthetic_model(100);
    let extractor = DomainExtractor::new();
    c.bench_function("domain_extraction_100", |b| {
        b.iter(|| domain::to_ilx(&extractor.extract(black_box(&tree))))
    });
}

criterion_group!(benches, benchmark_graph_encoding, benchmark_domain_extraction);
criterion_main!(benches);
