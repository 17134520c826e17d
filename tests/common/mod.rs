#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    image::RgbImage::new(width, height)
        .save(path)
        .expect("write png file");
}

pub fn write_label(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write label file");
}

/// `labels/` and `images/` under `root`: img1 and img2 have images, img3 does not.
pub fn create_yolo_tree(root: &Path) {
    write_png(&root.join("images/img1.png"), 100, 200);
    write_png(&root.join("images/img2.png"), 64, 32);

    write_label(&root.join("labels/img1.txt"), "0 0.5 0.5 0.2 0.4\n");
    write_label(
        &root.join("labels/img2.txt"),
        "1 0.25 0.5 0.5 0.5\n0 0.5 0.5\n1 0.75 0.5 0.5 1.0\n",
    );
    write_label(&root.join("labels/img3.txt"), "0 0.5 0.5 0.1 0.1\n");
}
