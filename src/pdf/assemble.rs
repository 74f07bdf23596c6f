//! Document assembly.
//!
//! A `DocShape` describes one kind of output document as data: its printed
//! title, which class-tagged sections the splitter must keep whole, and
//! whether the splitter runs in planning-table mode. The assembly routines
//! below are shape-agnostic; the three shapes cover module sheets, unit
//! sheets and formation booklets.

use crate::error::Error;
use crate::model::{ContentNode, MODULE_HEADER_CLASS, PLANNING_CLASS, SECTION_CLASS};
use crate::pdf::links::{
    AnchorSpot, ModulePageRecord, fragment_links, locate_links, place_links,
    resolve_page_anchors,
};
use crate::pdf::OutputDoc;
use crate::snapshot::{ContentSource, MeasuredPage};
use crate::split::{SplitConfig, split, split_planning};

pub struct DocShape {
    pub title: &'static str,
    pub atomic_classes: &'static [&'static str],
    /// Paginate via the planning-table row pairing instead of the general
    /// recursive descent.
    pub planning: bool,
}

pub const MODULE_SHEET: DocShape = DocShape {
    title: "Descriptif de module",
    atomic_classes: &["module-titre", "module-titre-infos", "module-organisation"],
    planning: false,
};

pub const UNIT_SHEET: DocShape = DocShape {
    title: "Fiche d'unit\u{e9}",
    atomic_classes: &["unit-title", "unit-general-infos", "unit-periods-table"],
    planning: false,
};

pub const BOOKLET: DocShape = DocShape {
    title: "Programme de formation",
    atomic_classes: &[MODULE_HEADER_CLASS],
    planning: true,
};

const UNVALIDATED_TITLE: &str = "Modules en cours de validation";

/// Paginate one measured page into `doc` under `shape`: one output page per
/// fragment, decorated, with the fragment's raster placed in the content
/// box and its links rebased onto it. Returns the rendered page range.
pub(crate) fn assemble_sheet(
    doc: &mut OutputDoc,
    measured: &MeasuredPage,
    shape: &DocShape,
    page_path: &str,
    base_url: &str,
    anchors: &mut Vec<AnchorSpot>,
) -> Result<std::ops::Range<usize>, Error> {
    let style = doc.style().clone();
    let root = &measured.root;
    let config = SplitConfig::for_root(
        root,
        style.content_width(),
        style.content_height(),
        style.epsilon,
        shape.atomic_classes,
    );

    let fragments = if shape.planning {
        split_planning(root, &config)
            .ok_or_else(|| Error::PlanningNotFound(page_path.to_string()))?
    } else {
        split(root, &config)
    };

    let links = locate_links(root);
    let max_source_h = style.content_height() / config.scale;
    let first = doc.page_count();
    for fragment in &fragments {
        let page = doc.start_page();
        doc.decorate(page, shape.title);

        let bitmap = measured.rasterize(fragment, max_source_h);
        doc.place_bitmap(
            page,
            &bitmap,
            style.margin_left,
            style.margin_top,
            style.content_width(),
            bitmap.height as f32 * config.scale,
        );

        let placed = fragment_links(root, fragment, &links);
        place_links(doc, page, &placed, config.scale, root.x, base_url, anchors);
    }
    Ok(first..doc.page_count())
}

/// The planning table's link targets in reading order, grouped under the
/// section header row preceding them.
fn planning_entries(root: &ContentNode) -> Vec<(String, Vec<(String, String)>)> {
    let Some(planning) = root.find_class(PLANNING_CLASS) else {
        return Vec::new();
    };
    let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for row in &planning.children {
        if row.ignore {
            continue;
        }
        if row.has_class(SECTION_CLASS) {
            let name = row.text.clone().unwrap_or_default();
            sections.push((name, Vec::new()));
            continue;
        }
        for link in locate_links(row) {
            if !link.header_anchor {
                continue;
            }
            if sections.is_empty() {
                sections.push((String::new(), Vec::new()));
            }
            let last = sections.len() - 1;
            sections[last].1.push((link.href, link.text));
        }
    }
    sections
}

/// Assemble a formation booklet: the planning pages first, then one module
/// sheet per validated planning entry, then (when some modules are not yet
/// validated) a trailing list page. Cross-reference markers resolve last,
/// once every module has a page or is known to be missing.
pub(crate) fn assemble_booklet(
    doc: &mut OutputDoc,
    source: &dyn ContentSource,
    booklet: &MeasuredPage,
    booklet_path: &str,
    base_url: &str,
) -> Result<(), Error> {
    let mut anchors: Vec<AnchorSpot> = Vec::new();
    assemble_sheet(doc, booklet, &BOOKLET, booklet_path, base_url, &mut anchors)?;

    let mut records: Vec<ModulePageRecord> = Vec::new();
    let mut unvalidated: Vec<(String, Vec<String>)> = Vec::new();
    for (section, entries) in planning_entries(&booklet.root) {
        for (href, label) in entries {
            let mut record = ModulePageRecord::new(href.clone(), label.clone());
            match source.fetch(&href)? {
                Some(module) => {
                    // Module pages only get URI hot zones; forward-reference
                    // markers belong to the planning pages.
                    let mut sheet_anchors = Vec::new();
                    let range = assemble_sheet(
                        doc,
                        &module,
                        &MODULE_SHEET,
                        &href,
                        base_url,
                        &mut sheet_anchors,
                    )?;
                    record.page = range.start as i32;
                }
                None => {
                    log::info!("module {href} not validated yet, listing it instead");
                    match unvalidated.iter_mut().find(|(s, _)| *s == section) {
                        Some((_, modules)) => modules.push(label.clone()),
                        None => unvalidated.push((section.clone(), vec![label.clone()])),
                    }
                }
            }
            records.push(record);
        }
    }

    if !unvalidated.is_empty() {
        doc.unvalidated_page(UNVALIDATED_TITLE, &unvalidated);
    }

    resolve_page_anchors(doc, &anchors, &records);
    doc.number_pages();
    Ok(())
}
