//! Criterion microbenches for cocodet parsing and indexing.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - COCO JSON parsing (from_coco_str, from_coco_slice)
//! - Indexing a parsed dataset for the loader
//! - YOLO label line parsing

use std::fmt::Write;
use std::hint::black_box;
use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use cocodet::convert::parse_label_line;
use cocodet::dataset::CocoDetectionDataset;
use cocodet::ir::io_coco_json::{from_coco_slice, from_coco_str};

/// Builds a COCO document with `images` images and `per_image` boxes each.
fn coco_fixture(images: u64, per_image: u64) -> String {
    let mut json = String::from(r#"{"images":["#);
    for id in 1..=images {
        if id > 1 {
            json.push(',');
        }
        write!(
            json,
            r#"{{"id":{id},"file_name":"img{id}.png","width":640,"height":480}}"#
        )
        .unwrap();
    }
    json.push_str(r#"],"annotations":["#);
    let mut ann_id = 1;
    for image_id in 1..=images {
        for k in 0..per_image {
            if ann_id > 1 {
                json.push(',');
            }
            write!(
                json,
                r#"{{"id":{ann_id},"image_id":{image_id},"category_id":{},"bbox":[{}.5,20.0,64.0,48.0],"area":3072.0,"iscrowd":0}}"#,
                k % 2 + 1,
                k * 10
            )
            .unwrap();
            ann_id += 1;
        }
    }
    json.push_str(r#"],"categories":[{"id":1,"name":"P"},{"id":2,"name":"Y"}]}"#);
    json
}

fn bench_coco_parse_str(c: &mut Criterion) {
    let fixture = coco_fixture(200, 8);
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("from_coco_str", |b| {
        b.iter(|| {
            let ds = from_coco_str(black_box(&fixture)).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

fn bench_coco_parse_slice(c: &mut Criterion) {
    let fixture = coco_fixture(200, 8);
    let bytes = fixture.as_bytes();
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_coco_slice", |b| {
        b.iter(|| {
            let ds = from_coco_slice(black_box(bytes)).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

/// Indexing cost on its own, parsed once outside the timed region.
fn bench_dataset_index(c: &mut Criterion) {
    let dataset = from_coco_str(&coco_fixture(1000, 8)).unwrap();
    let mut group = c.benchmark_group("dataset_index");
    group.throughput(Throughput::Elements(dataset.annotations.len() as u64));

    group.bench_function("from_dataset_and_targets", |b| {
        b.iter(|| {
            let indexed = CocoDetectionDataset::from_dataset(black_box(dataset.clone()), "images");
            for index in 0..indexed.len() {
                black_box(indexed.target(index).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_label_line_parse(c: &mut Criterion) {
    let lines: Vec<String> = (0..1000)
        .map(|i| format!("{} 0.{i:03} 0.5 0.125 0.25", i % 2))
        .collect();
    let path = Path::new("bench.txt");
    let mut group = c.benchmark_group("label_parse");
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("parse_label_line", |b| {
        b.iter(|| {
            for (i, line) in lines.iter().enumerate() {
                black_box(parse_label_line(black_box(line), path, i + 1).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_coco_parse_str,
    bench_coco_parse_slice,
    bench_dataset_index,
    bench_label_line_parse,
);
criterion_main!(benches);
