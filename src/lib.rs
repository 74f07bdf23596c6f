mod error;
mod fonts;
pub mod model;
pub mod pdf;
pub mod snapshot;
pub mod split;

pub use error::Error;

use std::path::Path;
use std::time::Instant;

use pdf::assemble::{self, DocShape, MODULE_SHEET, UNIT_SHEET};
use pdf::{OutputDoc, PageStyle};
use snapshot::ContentSource;

/// Result of one generation request. A page whose snapshot is missing or
/// carries no renderable content is not an error: the site publishes pages
/// before they are validated, and those simply get no PDF yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Written { pages: usize },
    NotValidated,
}

fn generate_sheet(
    source: &dyn ContentSource,
    page_path: &str,
    shape: &DocShape,
    base_url: &str,
    style: &PageStyle,
    output: &Path,
) -> Result<Outcome, Error> {
    let t0 = Instant::now();

    let Some(measured) = source.fetch(page_path)? else {
        log::warn!("{page_path}: no renderable content, skipping");
        return Ok(Outcome::NotValidated);
    };
    let t_fetch = t0.elapsed();

    let mut doc = OutputDoc::new(style.clone())?;
    let mut anchors = Vec::new();
    assemble::assemble_sheet(&mut doc, &measured, shape, page_path, base_url, &mut anchors)?;
    doc.number_pages();
    let pages = doc.page_count();
    let t_render = t0.elapsed();

    let bytes = doc.finish();
    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing for {page_path}: fetch={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({pages} pages, {} bytes)",
        t_fetch.as_secs_f64() * 1000.0,
        (t_render - t_fetch).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(Outcome::Written { pages })
}

/// Render one module's descriptive sheet to `output`.
pub fn generate_module_sheet(
    source: &dyn ContentSource,
    page_path: &str,
    base_url: &str,
    style: &PageStyle,
    output: &Path,
) -> Result<Outcome, Error> {
    generate_sheet(source, page_path, &MODULE_SHEET, base_url, style, output)
}

/// Render one teaching unit's sheet to `output`.
pub fn generate_unit_sheet(
    source: &dyn ContentSource,
    page_path: &str,
    base_url: &str,
    style: &PageStyle,
    output: &Path,
) -> Result<Outcome, Error> {
    generate_sheet(source, page_path, &UNIT_SHEET, base_url, style, output)
}

/// Render a formation booklet to `output`: the planning pages, every
/// validated module's sheet, the unvalidated-modules list when needed, and
/// the cross-reference markers between them.
pub fn generate_booklet(
    source: &dyn ContentSource,
    booklet_path: &str,
    base_url: &str,
    style: &PageStyle,
    output: &Path,
) -> Result<Outcome, Error> {
    let t0 = Instant::now();

    let Some(booklet) = source.fetch(booklet_path)? else {
        log::warn!("{booklet_path}: no renderable content, skipping");
        return Ok(Outcome::NotValidated);
    };
    let t_fetch = t0.elapsed();

    let mut doc = OutputDoc::new(style.clone())?;
    assemble::assemble_booklet(&mut doc, source, &booklet, booklet_path, base_url)?;
    let pages = doc.page_count();
    let t_render = t0.elapsed();

    let bytes = doc.finish();
    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing for {booklet_path}: fetch={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({pages} pages, {} bytes)",
        t_fetch.as_secs_f64() * 1000.0,
        (t_render - t_fetch).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(Outcome::Written { pages })
}
