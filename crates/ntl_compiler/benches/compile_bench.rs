//! Whole-pipeline compilation benchmark.

use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ntl_compiler::Compiler;
use ntl_config::CompilerOptions;

const SOURCE: &str = r#"
type Result = Ok(v) | Err(e)

enum Level { Debug, Info, Warn, Error }

fn classify(n: number) -> string {
    match n {
        case 0 => "zero"
        case x when x < 0 => "negative"
        default => "positive"
    }
    return "done"
}

class Counter {
    count: number = 0
    init(start) { this.count = start }
    bump(by = 1) { this.count += by }
}

val parts = [1, 2, 3] |> (xs => xs.map(x => x * 2)) |> (xs => xs.join(","))
val counter = new Counter(10)
counter.bump()
console.log(`parts: ${parts}, count: ${counter.count}`, classify(5))
"#;

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_source", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let compiler = Compiler::new(&arena, CompilerOptions::default());
            let output = compiler.compile_source("bench.ntl", black_box(SOURCE));
            assert!(output.success);
            black_box(output.stats.output_chars)
        })
    });

    c.bench_function("compile_source_strict", |b| {
        let options = CompilerOptions {
            strict: true,
            ..CompilerOptions::default()
        };
        b.iter(|| {
            let arena = Bump::new();
            let compiler = Compiler::new(&arena, options.clone());
            let output = compiler.compile_source("bench.ntl", black_box(SOURCE));
            black_box(output.success)
        })
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
