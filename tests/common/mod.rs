#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use cursus_pdf::model::ContentNode;

pub fn node(tag: &str, x: f32, y: f32, w: f32, h: f32) -> ContentNode {
    ContentNode {
        tag: tag.to_string(),
        classes: Vec::new(),
        x,
        y,
        w,
        h,
        href: None,
        text: None,
        ignore: false,
        children: Vec::new(),
    }
}

/// Full-width block in a 100-unit-wide tree, the default geometry for
/// splitter cases.
pub fn block(y: f32, h: f32) -> ContentNode {
    node("div", 0.0, y, 100.0, h)
}

pub fn classed(mut n: ContentNode, class: &str) -> ContentNode {
    n.classes.push(class.to_string());
    n
}

pub fn with_children(mut n: ContentNode, children: Vec<ContentNode>) -> ContentNode {
    n.children = children;
    n
}

pub fn ignored(mut n: ContentNode) -> ContentNode {
    n.ignore = true;
    n
}

pub fn link(x: f32, y: f32, w: f32, h: f32, href: &str, text: &str) -> ContentNode {
    let mut n = classed(node("a", x, y, w, h), "pdf-link");
    n.href = Some(href.to_string());
    n.text = Some(text.to_string());
    n
}

/// A planning-table link into a module sheet, eligible for a page-jump
/// marker.
pub fn module_link(x: f32, y: f32, w: f32, h: f32, href: &str, text: &str) -> ContentNode {
    classed(link(x, y, w, h, href, text), "module-header")
}

/// Fresh scratch directory under tests/output/ for one case.
pub fn test_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create test dir");
    dir
}

/// Write a page snapshot (layout.json + flat grey render.png sized to the
/// tree) into `dir`.
pub fn write_snapshot(dir: &Path, root: &ContentNode) {
    fs::create_dir_all(dir).expect("create snapshot dir");
    let json = serde_json::to_vec_pretty(root).expect("serialize layout");
    fs::write(dir.join("layout.json"), json).expect("write layout.json");

    let w = (root.x + root.w).ceil().max(1.0) as u32;
    let h = (root.y + root.h).ceil().max(1.0) as u32;
    image::RgbaImage::from_pixel(w, h, image::Rgba([220, 220, 220, 255]))
        .save(dir.join("render.png"))
        .expect("write render.png");
}
