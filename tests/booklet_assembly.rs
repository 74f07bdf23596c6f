mod common;

use std::fs;
use std::path::Path;

use common::{classed, module_link, node, with_children};
use cursus_pdf::model::ContentNode;
use cursus_pdf::pdf::PageStyle;
use cursus_pdf::snapshot::SnapshotStore;
use cursus_pdf::{Outcome, generate_booklet, generate_module_sheet, generate_unit_sheet};

/// 555-unit-wide content root, close to the output content box so the
/// scale stays near 1 and page budgets are easy to reason about.
fn content_root(h: f32, children: Vec<ContentNode>) -> ContentNode {
    classed(
        with_children(node("div", 0.0, 0.0, 555.0, h), children),
        "pdf-content",
    )
}

fn wide_block(y: f32, h: f32) -> ContentNode {
    node("div", 0.0, y, 555.0, h)
}

fn assert_pdf(path: &Path) {
    let bytes = fs::read(path).expect("read output");
    assert!(bytes.starts_with(b"%PDF-"), "{} is not a PDF", path.display());
}

#[test]
fn module_sheet_renders_one_page() {
    let dir = common::test_dir("module_sheet");
    let site = dir.join("site");
    let root = content_root(400.0, vec![wide_block(0.0, 200.0), wide_block(200.0, 200.0)]);
    common::write_snapshot(&site.join("modules/m1"), &root);

    let store = SnapshotStore::new(&site);
    let out = dir.join("m1.pdf");
    let outcome = generate_module_sheet(
        &store,
        "modules/m1",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::Written { pages: 1 });
    assert_pdf(&out);
}

#[test]
fn tall_module_sheet_paginates() {
    let dir = common::test_dir("module_sheet_tall");
    let site = dir.join("site");
    let root = content_root(
        1500.0,
        vec![
            wide_block(0.0, 500.0),
            wide_block(500.0, 500.0),
            wide_block(1000.0, 500.0),
        ],
    );
    common::write_snapshot(&site.join("modules/m1"), &root);

    let store = SnapshotStore::new(&site);
    let out = dir.join("m1.pdf");
    let outcome = generate_module_sheet(
        &store,
        "modules/m1",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::Written { pages: 3 });
    assert_pdf(&out);
}

#[test]
fn unit_sheet_renders() {
    let dir = common::test_dir("unit_sheet");
    let site = dir.join("site");
    let root = content_root(300.0, vec![wide_block(0.0, 300.0)]);
    common::write_snapshot(&site.join("unites/u1"), &root);

    let store = SnapshotStore::new(&site);
    let out = dir.join("u1.pdf");
    let outcome = generate_unit_sheet(
        &store,
        "unites/u1",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::Written { pages: 1 });
    assert_pdf(&out);
}

#[test]
fn missing_snapshot_is_not_validated() {
    let dir = common::test_dir("module_missing");
    let site = dir.join("site");
    fs::create_dir_all(&site).expect("site dir");

    let store = SnapshotStore::new(&site);
    let out = dir.join("m1.pdf");
    let outcome = generate_module_sheet(
        &store,
        "modules/m1",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::NotValidated);
    assert!(!out.exists());
}

#[test]
fn oversized_block_still_renders_once() {
    let dir = common::test_dir("module_oversized");
    let site = dir.join("site");
    let mut figure = wide_block(0.0, 3000.0);
    figure.tag = "img".to_string();
    let root = content_root(3000.0, vec![figure]);
    common::write_snapshot(&site.join("modules/m1"), &root);

    let store = SnapshotStore::new(&site);
    let out = dir.join("m1.pdf");
    let outcome = generate_module_sheet(
        &store,
        "modules/m1",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::Written { pages: 1 });
    assert_pdf(&out);
}

/// Planning page: one section header row, then one link row per module.
fn booklet_root(module_hrefs: &[&str]) -> ContentNode {
    let mut rows = vec![{
        let mut section = wide_block(0.0, 20.0);
        section.classes.push("section-header".to_string());
        section.text = Some("Informatique".to_string());
        section
    }];
    for (i, href) in module_hrefs.iter().enumerate() {
        let y = 20.0 + i as f32 * 20.0;
        rows.push(with_children(
            wide_block(y, 20.0),
            vec![module_link(5.0, y + 5.0, 80.0, 10.0, href, &format!("Module {i}"))],
        ));
    }
    let table_h = 20.0 + module_hrefs.len() as f32 * 20.0;
    let table = classed(
        with_children(node("table", 0.0, 0.0, 555.0, table_h), rows),
        "modules-planning",
    );
    content_root(table_h, vec![table])
}

fn two_page_module() -> ContentNode {
    content_root(1200.0, vec![wide_block(0.0, 600.0), wide_block(600.0, 600.0)])
}

#[test]
fn booklet_appends_validated_module_sheets() {
    let dir = common::test_dir("booklet_validated");
    let site = dir.join("site");
    common::write_snapshot(&site.join("info/plein-temps"), &booklet_root(&["modules/m1"]));
    common::write_snapshot(&site.join("modules/m1"), &two_page_module());

    let store = SnapshotStore::new(&site);
    let out = dir.join("info-plein-temps.pdf");
    let outcome = generate_booklet(
        &store,
        "info/plein-temps",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    // One planning page plus the module's two pages.
    assert_eq!(outcome, Outcome::Written { pages: 3 });
    assert_pdf(&out);
}

fn count_bytes(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

#[test]
fn module_content_links_get_no_jump_markers() {
    let dir = common::test_dir("booklet_module_links");
    let site = dir.join("site");
    common::write_snapshot(&site.join("info/plein-temps"), &booklet_root(&["modules/m1"]));
    let module = content_root(
        400.0,
        vec![with_children(
            wide_block(0.0, 400.0),
            vec![module_link(5.0, 10.0, 80.0, 10.0, "modules/m2", "Module 2")],
        )],
    );
    common::write_snapshot(&site.join("modules/m1"), &module);

    let store = SnapshotStore::new(&site);
    let out = dir.join("info-plein-temps.pdf");
    let outcome = generate_booklet(
        &store,
        "info/plein-temps",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");
    assert_eq!(outcome, Outcome::Written { pages: 2 });
    assert_pdf(&out);

    // One jump per planning entry; the marked link inside the module's own
    // content stays a plain URI hot zone.
    let bytes = fs::read(&out).expect("read output");
    assert_eq!(count_bytes(&bytes, b"/GoTo"), 1);
    assert!(count_bytes(&bytes, b"/URI") >= 2);
}

#[test]
fn booklet_lists_unvalidated_modules() {
    let dir = common::test_dir("booklet_unvalidated");
    let site = dir.join("site");
    common::write_snapshot(&site.join("info/plein-temps"), &booklet_root(&["modules/m1"]));
    // modules/m1 has no snapshot: not validated yet.

    let store = SnapshotStore::new(&site);
    let out = dir.join("info-plein-temps.pdf");
    let outcome = generate_booklet(
        &store,
        "info/plein-temps",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    // One planning page plus the unvalidated-modules list.
    assert_eq!(outcome, Outcome::Written { pages: 2 });
    assert_pdf(&out);
}

#[test]
fn booklet_without_renderable_page_is_skipped() {
    let dir = common::test_dir("booklet_missing");
    let site = dir.join("site");
    fs::create_dir_all(&site).expect("site dir");

    let store = SnapshotStore::new(&site);
    let out = dir.join("info-plein-temps.pdf");
    let outcome = generate_booklet(
        &store,
        "info/plein-temps",
        "https://example.edu",
        &PageStyle::default(),
        &out,
    )
    .expect("generate");

    assert_eq!(outcome, Outcome::NotValidated);
    assert!(!out.exists());
}
