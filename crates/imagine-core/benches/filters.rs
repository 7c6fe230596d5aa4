//! Benchmarks for filter chains and the resolve path.
//!
//! Run with: cargo bench -p imagine-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::DynamicImage;
use imagine_core::config::FilterSetConfig;
use imagine_core::{Config, FilterRegistry, FilterSet, Image, Imagine, MemoryAdapter};
use std::sync::Arc;

fn filter_set(toml: &str) -> FilterSet {
    let config: FilterSetConfig = toml::from_str(toml).unwrap();
    FilterSet::from_config("bench", &config, &FilterRegistry::with_builtins()).unwrap()
}

fn benchmark_downscale(c: &mut Criterion) {
    let set = filter_set("[filters.downscale]\nmax = [800, 600]\n");
    let img = Image::new(DynamicImage::new_rgb8(1920, 1080));

    c.bench_function("downscale_1080p_to_800x600", |b| {
        b.iter(|| {
            let _ = set.apply(black_box(img.clone()));
        })
    });
}

fn benchmark_thumbnail_outbound(c: &mut Criterion) {
    let set = filter_set("[filters.thumbnail]\nsize = [256, 256]\nmode = \"outbound\"\n");
    let img = Image::new(DynamicImage::new_rgb8(1920, 1080));

    c.bench_function("thumbnail_outbound_256px", |b| {
        b.iter(|| {
            let _ = set.apply(black_box(img.clone()));
        })
    });
}

fn benchmark_chain(c: &mut Criterion) {
    let set = filter_set(
        r#"
[filters.autorotate]
[filters.rotate]
angle = 90
[filters.relative_resize]
scale = 0.5
[filters.crop]
start = [10, 10]
size = [300, 300]
"#,
    );
    let img = Image::new(DynamicImage::new_rgb8(1280, 720)).with_orientation(6);

    c.bench_function("chain_autorotate_rotate_scale_crop", |b| {
        b.iter(|| {
            let _ = set.apply(black_box(img.clone()));
        })
    });
}

fn benchmark_resolve_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let adapter = Arc::new(MemoryAdapter::new("/static/cache"));
    rt.block_on(adapter.insert_source("a.jpg", Image::new(DynamicImage::new_rgb8(64, 64))));

    let config = Config::from_toml(
        "[adapter]\nname = \"memory\"\n[filter_sets.thumb]\ncached = true\n[filter_sets.thumb.filters.downscale]\nmax = [32, 32]\n",
    )
    .unwrap();
    let imagine = Imagine::builder(config).adapter(adapter).build().unwrap();
    rt.block_on(imagine.resolve("thumb", "a.jpg")).unwrap();

    c.bench_function("resolve_cache_hit", |b| {
        b.iter(|| {
            let _ = rt.block_on(imagine.resolve(black_box("thumb"), black_box("a.jpg")));
        })
    });
}

criterion_group!(
    benches,
    benchmark_downscale,
    benchmark_thumbnail_outbound,
    benchmark_chain,
    benchmark_resolve_hit,
);
criterion_main!(benches);
