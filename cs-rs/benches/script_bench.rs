use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cipherscript::console::BufferConsole;
use cipherscript::script::{parse_program, tokenize, Interpreter};

const LOOP_SRC: &str = "
total = 0;
for (i = 0; i < 1000; i++) {
    if (i % 3 == 0) { total += i; } else { total -= 1; }
}
";

const FIB_SRC: &str = "
function fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); };
x = fib(16);
";

const ENC_SRC: &str = "
@ENCacc = 0;
for (i = 0; i < 200; i++) { acc += i; }
";

fn run(src: &str) {
    let mut interp = Interpreter::new(Box::new(BufferConsole::new()));
    interp.exec_source(src).expect("bench program failed");
}

fn bench_front_end(c: &mut Criterion) {
    let big = FIB_SRC.repeat(50) + &LOOP_SRC.repeat(50);

    let mut g = c.benchmark_group("front_end");
    g.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(&big))));
    g.bench_function("parse", |b| b.iter(|| parse_program(black_box(&big))));
    g.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut g = c.benchmark_group("execute");
    g.bench_function("loop_1000", |b| b.iter(|| run(black_box(LOOP_SRC))));
    g.bench_function("fib_16", |b| b.iter(|| run(black_box(FIB_SRC))));
    g.bench_function("encrypted_accumulator_200", |b| b.iter(|| run(black_box(ENC_SRC))));
    g.finish();
}

criterion_group!(benches, bench_front_end, bench_execute);
criterion_main!(benches);
