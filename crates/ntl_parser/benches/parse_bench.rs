//! Parser benchmark over a representative source.

use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SOURCE: &str = r#"
val config = { retries: 3, verbose: true, tags: ["a", "b"] }

fn retry(task, attempts: number) -> any {
    var last = null
    for val i of [1, 2, 3] {
        try { return task() } catch (e) { last = e }
    }
    throw last
}

class Queue {
    items = []
    init() { this.items = [] }
    push(item) { this.items.push(item) }
    get size() { return this.items.length }
}

match status {
    case Ok(value) => console.log(value)
    case Err(message) | Timeout(message) => console.log(message)
    default => console.log("unknown")
}

val status = { _tag: "Ok", _0: 1 }
val rendered = `queue has ${new Queue().size} items`
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_source_file", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let sf = ntl_parser::parse(&arena, "bench.ntl", black_box(SOURCE)).unwrap();
            black_box(sf.statements.len())
        })
    });

    c.bench_function("tokenize", |b| {
        b.iter(|| {
            let tokens = ntl_lexer::tokenize("bench.ntl", black_box(SOURCE)).unwrap();
            black_box(tokens.len())
        })
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
