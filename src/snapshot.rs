//! Layout-snapshot content source.
//!
//! The site's headless measuring pass leaves, per page directory, a
//! `layout.json` (the content tree annotated with computed bounding boxes)
//! and a `render.png` (the page rasterized in the same coordinate space).
//! Together they stand in for the browser's attach-and-measure and
//! rasterize capabilities, batched up front.

use std::fs;
use std::path::PathBuf;

use image::RgbaImage;

use crate::error::Error;
use crate::model::{CONTENT_ROOT_CLASS, ContentNode};
use crate::split::PageFragment;

const LAYOUT_FILE: &str = "layout.json";
const RASTER_FILE: &str = "render.png";

/// A raw RGB image ready to be placed on an output page.
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Bitmap {
    pub fn from_rgba(img: &RgbaImage) -> Self {
        let mut rgb = Vec::with_capacity((img.width() * img.height() * 3) as usize);
        for p in img.pixels() {
            rgb.extend_from_slice(&p.0[..3]);
        }
        Self {
            width: img.width(),
            height: img.height(),
            rgb,
        }
    }
}

/// A page's `pdf-content` subtree together with its raster.
pub struct MeasuredPage {
    pub root: ContentNode,
    raster: RgbaImage,
}

impl MeasuredPage {
    pub fn new(root: ContentNode, raster: RgbaImage) -> Self {
        Self { root, raster }
    }

    /// Cut each slice's region out of the page raster and stack them into
    /// one bitmap, full content-root width. Rows beyond `max_source_height`
    /// are clipped (oversized fragments render truncated rather than
    /// overflowing the page box). Regions outside the raster stay white.
    pub fn rasterize(&self, fragment: &PageFragment, max_source_height: f32) -> Bitmap {
        let width = self.root.w.round().max(1.0) as u32;
        let height = fragment.height.min(max_source_height).round().max(1.0) as u32;
        let mut rgb = vec![255u8; (width * height * 3) as usize];

        let x0 = self.root.x.round() as i64;
        for slice in &fragment.slices {
            let Some(node) = self.root.node_at(&slice.path) else {
                continue;
            };
            let src_top = node.y.round() as i64;
            let dst_top = slice.y_offset.round() as i64;
            for row in 0..node.h.round() as i64 {
                let dy = dst_top + row;
                let sy = src_top + row;
                if dy < 0 || dy >= height as i64 || sy < 0 || sy >= self.raster.height() as i64 {
                    continue;
                }
                for col in 0..width as i64 {
                    let sx = x0 + col;
                    if sx < 0 || sx >= self.raster.width() as i64 {
                        continue;
                    }
                    let p = self.raster.get_pixel(sx as u32, sy as u32);
                    let i = ((dy as u32 * width + col as u32) * 3) as usize;
                    rgb[i] = p[0];
                    rgb[i + 1] = p[1];
                    rgb[i + 2] = p[2];
                }
            }
        }

        Bitmap { width, height, rgb }
    }
}

/// Where measured pages come from. `Ok(None)` means the page exists but is
/// not renderable (no snapshot, or no `pdf-content` root) — the caller
/// decides whether that skips a document or marks a booklet entry
/// unvalidated.
pub trait ContentSource {
    fn fetch(&self, page_path: &str) -> Result<Option<MeasuredPage>, Error>;
}

/// Filesystem store over the generated site tree.
pub struct SnapshotStore {
    site_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
        }
    }
}

impl ContentSource for SnapshotStore {
    fn fetch(&self, page_path: &str) -> Result<Option<MeasuredPage>, Error> {
        let dir = self.site_dir.join(page_path.trim_matches('/'));
        let layout_path = dir.join(LAYOUT_FILE);
        if !layout_path.exists() {
            return Ok(None);
        }

        let data = fs::read(&layout_path)?;
        let tree: ContentNode = serde_json::from_slice(&data).map_err(|e| Error::Snapshot {
            path: layout_path,
            source: e,
        })?;
        let Some(content) = tree.find_class(CONTENT_ROOT_CLASS) else {
            return Ok(None);
        };

        let raster = image::ImageReader::open(dir.join(RASTER_FILE))?
            .decode()?
            .to_rgba8();
        Ok(Some(MeasuredPage::new(content.clone(), raster)))
    }
}
