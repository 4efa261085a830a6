use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ocho::prelude::*;

// Draws the sixteen font glyphs across the display in an endless loop.
//
// 0x200 LD V0, 0     digit
// 0x202 LD V1, 0     x position
// 0x204 LD V2, 5     y position
// 0x206 LD F, V0
// 0x208 DRW V1, V2, 5
// 0x20A ADD V0, 1
// 0x20C ADD V1, 5
// 0x20E SE V0, 0x10
// 0x210 JP 0x206
// 0x212 LD V0, 0
// 0x214 JP 0x206
#[rustfmt::skip]
const GLYPH_LOOP: &[u8] = &[
    0x60, 0x00,
    0x61, 0x00,
    0x62, 0x05,
    0xF0, 0x29,
    0xD1, 0x25,
    0x70, 0x01,
    0x71, 0x05,
    0x30, 0x10,
    0x12, 0x06,
    0x60, 0x00,
    0x12, 0x06,
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut vm = OchoVm::new();
    vm.load_program(GLYPH_LOOP).unwrap();

    c.bench_function("glyph loop", |b| {
        b.iter(|| {
            let step_count = black_box(1000_usize);
            for _ in 0..step_count {
                vm.step().unwrap();
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
