use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use entrain_stim::analysis::{FrameAnalyzer, LuminanceAnalyzer, MotionAnalyzer};
use entrain_stim::config::ExclusionConfig;
use entrain_stim::source::Frame;
use entrain_stim::timing::{RateConverter, SampleMode};

/// One hour of video per iteration at common camera rates.
pub fn bench_converter_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("converter_advance");

    for fps in [24.0, 29.97, 30.0, 60.0] {
        let frames = (fps * 3600.0) as u64;
        group.bench_with_input(BenchmarkId::from_parameter(fps), &fps, |b, &fps| {
            b.iter(|| {
                let mut converter =
                    RateConverter::new(fps, SampleMode::OverTime { target_rate: 1000.0 }).unwrap();
                let mut total = 0u64;
                for _ in 0..frames {
                    total += converter.advance();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

/// Per-frame analysis cost on HD frames with the default exclusion profile.
pub fn bench_analyze_hd(c: &mut Criterion) {
    let exclusions = ExclusionConfig {
        enabled: true,
        ..Default::default()
    };
    let bright = Frame::solid(1920, 1080, [200, 180, 160], 1);
    let dark = Frame::solid(1920, 1080, [20, 30, 40], 2);

    c.bench_function("luminance_hd", |b| {
        let mut analyzer = LuminanceAnalyzer::new(exclusions.clone());
        b.iter(|| black_box(analyzer.analyze(black_box(&bright)).unwrap()));
    });

    c.bench_function("motion_hd", |b| {
        let mut analyzer = MotionAnalyzer::new(10.0, exclusions.clone());
        analyzer.analyze(&dark).unwrap();
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let frame = if toggle { &bright } else { &dark };
            black_box(analyzer.analyze(black_box(frame)).unwrap())
        });
    });
}

criterion_group!(benches, bench_converter_advance, bench_analyze_hd);
criterion_main!(benches);
