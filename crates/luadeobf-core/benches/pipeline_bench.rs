use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use luadeobf_core::passes::fold_arithmetic;
use luadeobf_core::Pipeline;
use std::hint::black_box;

/// Generate an obfuscated script with `block_count` copies of each idiom
fn generate_obfuscated_script(block_count: usize) -> String {
    let mut code = String::new();

    for i in 0..block_count {
        code.push_str(&format!(
            r#"local a{i} = {{112,114,105,110,116,40}}
local b{i} = {{39,104,105,39,41}}
loadstring(a{i}_resolved .. b{i}_resolved)
local s{i} = "SGVsbG8gd29ybGQ="
local function f{i}(x)
if x > {i} * 2 + 1 then
return string.char(111, 107)
end
end
"#,
            i = i
        ));
    }

    code
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for block_count in [10, 100, 500] {
        let source = generate_obfuscated_script(block_count);
        group.bench_with_input(
            BenchmarkId::new("deobfuscate", block_count),
            &source,
            |b, source| {
                b.iter(|| {
                    let mut pipeline = Pipeline::default();
                    pipeline.run(black_box(source)).unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_folding(c: &mut Criterion) {
    let source = (0..1000)
        .map(|i| format!("x{} = {} * 3 + 7 - 2 / 4\n", i, i))
        .collect::<String>();

    c.bench_function("fold_arithmetic", |b| {
        b.iter(|| fold_arithmetic(black_box(&source)).unwrap())
    });
}

criterion_group!(benches, bench_pipeline, bench_folding);
criterion_main!(benches);
