//! Paged PDF output.
//!
//! `OutputDoc` buffers one content stream per page plus pending link
//! annotations, then assembles the object graph in one pass at `finish()`.
//! Buffering matters because internal jump targets (page refs) and page
//! totals are only known once every page exists.
//!
//! The drawing API takes y as a distance from the page's top edge, matching
//! the snapshot coordinate space; conversion to PDF's bottom-up axis
//! happens here and nowhere else.

pub mod assemble;
pub mod links;

use std::path::{Path, PathBuf};

use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{self, FontMetrics};
use crate::snapshot::Bitmap;

/// Geometry and chrome shared by every document of a run. All the small
/// placement offsets are fields rather than inline constants so a template
/// change on the site side is a config edit here.
#[derive(Clone, Debug)]
pub struct PageStyle {
    /// A4 in points.
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Fit tolerance for the splitter, in points.
    pub epsilon: f32,
    /// Horizontal nudge applied to link hot zones.
    pub link_nudge_x: f32,
    /// Vertical nudge applied to link hot zones (negative moves up).
    pub link_nudge_y: f32,
    /// Gap between a link's text and its page-jump marker.
    pub anchor_shift_x: f32,
    pub footer_text: String,
    pub title_font_size: f32,
    pub footer_font_size: f32,
    pub page_number_font_size: f32,
    /// Logo PNGs for the page chrome; absent files are a startup error,
    /// absent settings just leave the chrome text-only.
    pub header_logo: Option<PathBuf>,
    pub footer_logo: Option<PathBuf>,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin_top: 60.0,
            margin_bottom: 30.0,
            margin_left: 20.0,
            margin_right: 20.0,
            epsilon: 2.0,
            link_nudge_x: 0.5,
            link_nudge_y: -1.0,
            anchor_shift_x: 2.0,
            footer_text: "T +41 (0)24 557 63 30\ninfo@heig-vd.ch".to_string(),
            title_font_size: 14.0,
            footer_font_size: 7.0,
            page_number_font_size: 8.0,
            header_logo: None,
            footer_logo: None,
        }
    }
}

impl PageStyle {
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }
}

/// Chrome faces. Content arrives pre-rendered as bitmaps, so text drawing
/// is limited to titles, footers, markers and the unvalidated-modules page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

enum PendingAnnot {
    Uri { rect: Rect, url: String },
    Jump { rect: Rect, target: usize },
}

struct PageBuf {
    content: Content,
    annots: Vec<PendingAnnot>,
}

/// Handle to an image embedded once and drawable on any page.
#[derive(Clone, Copy)]
pub struct ImageSlot(usize);

struct EmbeddedImage {
    name: String,
    xref: Ref,
    width: u32,
    height: u32,
}

// Unvalidated-modules page layout.
const SECTION_BOX_COLOR: (f32, f32, f32) =
    (0x07 as f32 / 255.0, 0x62 as f32 / 255.0, 0xFD as f32 / 255.0);
const SECTION_FONT_SIZE: f32 = 10.0;
const MODULE_NAME_FONT_SIZE: f32 = 8.0;
const SECTION_BOX_MARGIN: f32 = 2.0;
const SECTION_SPACING_Y: f32 = 10.0;
const INTER_LINE: f32 = 3.0;

pub struct OutputDoc {
    style: PageStyle,
    pdf: Pdf,
    pages: Vec<PageBuf>,
    images: Vec<EmbeddedImage>,
    header_logo: Option<ImageSlot>,
    footer_logo: Option<ImageSlot>,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    font_regular_id: Ref,
    font_bold_id: Ref,
    regular: FontMetrics,
    bold: FontMetrics,
}

impl OutputDoc {
    pub fn new(style: PageStyle) -> Result<Self, Error> {
        let mut next_id = 1;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let font_regular_id = alloc();
        let font_bold_id = alloc();
        let header_logo = style.header_logo.clone();
        let footer_logo = style.footer_logo.clone();
        let mut doc = Self {
            style,
            pdf: Pdf::new(),
            pages: Vec::new(),
            images: Vec::new(),
            header_logo: None,
            footer_logo: None,
            next_id,
            catalog_id,
            pages_id,
            font_regular_id,
            font_bold_id,
            regular: fonts::helvetica(),
            bold: fonts::helvetica_bold(),
        };
        if let Some(path) = header_logo {
            doc.header_logo = Some(doc.embed_png(&path)?);
        }
        if let Some(path) = footer_logo {
            doc.footer_logo = Some(doc.embed_png(&path)?);
        }
        Ok(doc)
    }

    fn embed_png(&mut self, path: &Path) -> Result<ImageSlot, Error> {
        let img = image::ImageReader::open(path)?.decode()?.to_rgba8();
        Ok(self.register_bitmap(&Bitmap::from_rgba(&img)))
    }

    pub fn style(&self) -> &PageStyle {
        &self.style
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn metrics(&self, face: Face) -> &FontMetrics {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        }
    }

    /// Append an empty page and return its index.
    pub fn start_page(&mut self) -> usize {
        self.pages.push(PageBuf {
            content: Content::new(),
            annots: Vec::new(),
        });
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_width(&self, text: &str, face: Face, size: f32) -> f32 {
        self.metrics(face).text_width(text, size)
    }

    /// Embed an RGB bitmap as a flate-compressed XObject, reusable on any
    /// page.
    pub fn register_bitmap(&mut self, bitmap: &Bitmap) -> ImageSlot {
        let xobj_ref = self.alloc();
        let pdf_name = format!("Im{}", self.images.len() + 1);
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&bitmap.rgb, 6);
        {
            let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(bitmap.width as i32);
            xobj.height(bitmap.height as i32);
            xobj.bits_per_component(8);
            xobj.color_space().device_rgb();
        }
        self.images.push(EmbeddedImage {
            name: pdf_name,
            xref: xobj_ref,
            width: bitmap.width,
            height: bitmap.height,
        });
        ImageSlot(self.images.len() - 1)
    }

    fn image_aspect(&self, slot: ImageSlot) -> f32 {
        let img = &self.images[slot.0];
        img.width as f32 / img.height.max(1) as f32
    }

    /// Draw a registered image; `y_top` is the distance from the page's top
    /// edge to the image's top edge, in points.
    pub fn draw_image(&mut self, page: usize, slot: ImageSlot, x: f32, y_top: f32, w: f32, h: f32) {
        let name = self.images[slot.0].name.clone();
        let y = self.style.page_height - y_top - h;
        let c = &mut self.pages[page].content;
        c.save_state();
        c.transform([w, 0.0, 0.0, h, x, y]);
        c.x_object(Name(name.as_bytes()));
        c.restore_state();
    }

    /// Embed and place in one step, for one-shot fragment rasters.
    pub fn place_bitmap(
        &mut self,
        page: usize,
        bitmap: &Bitmap,
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
    ) {
        let slot = self.register_bitmap(bitmap);
        self.draw_image(page, slot, x, y_top, w, h);
    }

    /// Draw a single line of text; `y_top` is the baseline's distance from
    /// the page's top edge.
    pub fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f32,
        y_top: f32,
        face: Face,
        size: f32,
        color: (f32, f32, f32),
    ) {
        let pdf_name = match face {
            Face::Regular => self.regular.pdf_name,
            Face::Bold => self.bold.pdf_name,
        };
        let y = self.style.page_height - y_top;
        let c = &mut self.pages[page].content;
        c.begin_text();
        c.set_fill_rgb(color.0, color.1, color.2);
        c.set_font(Name(pdf_name.as_bytes()), size);
        c.next_line(x, y);
        c.show(Str(&fonts::to_winansi_bytes(text)));
        c.end_text();
    }

    fn fill_rect(
        &mut self,
        page: usize,
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        color: (f32, f32, f32),
    ) {
        let y = self.style.page_height - y_top - h;
        let c = &mut self.pages[page].content;
        c.save_state();
        c.set_fill_rgb(color.0, color.1, color.2);
        c.rect(x, y, w, h);
        c.fill_nonzero();
        c.restore_state();
    }

    fn top_rect(&self, x: f32, y_top: f32, w: f32, h: f32) -> Rect {
        Rect::new(
            x,
            self.style.page_height - y_top - h,
            x + w,
            self.style.page_height - y_top,
        )
    }

    /// External URI hot zone over an already-drawn region.
    pub fn add_link(&mut self, page: usize, x: f32, y_top: f32, w: f32, h: f32, url: &str) {
        let rect = self.top_rect(x, y_top, w, h);
        self.pages[page].annots.push(PendingAnnot::Uri {
            rect,
            url: url.to_string(),
        });
    }

    /// Internal jump to the top of `target` (a page index of this document,
    /// clamped at `finish()` if out of range).
    pub fn add_page_jump(&mut self, page: usize, x: f32, y_top: f32, w: f32, h: f32, target: usize) {
        let rect = self.top_rect(x, y_top, w, h);
        self.pages[page]
            .annots
            .push(PendingAnnot::Jump { rect, target });
    }

    /// Header and footer chrome on one page: logo plus bold right-aligned
    /// title on top, contact text bottom-left, logo bottom-right.
    pub fn decorate(&mut self, page: usize, title: &str) {
        let style = self.style.clone();
        let title_w = self.text_width(title, Face::Bold, style.title_font_size);
        self.draw_text(
            page,
            title,
            style.page_width - style.margin_right - title_w,
            style.margin_top - 25.0,
            Face::Bold,
            style.title_font_size,
            (0.0, 0.0, 0.0),
        );
        if let Some(slot) = self.header_logo {
            let h = style.margin_top - 30.0;
            let w = h * self.image_aspect(slot);
            self.draw_image(page, slot, style.margin_left, 12.0, w, h);
        }

        let line_h = style.footer_font_size + 2.0;
        let lines: Vec<String> = style.footer_text.lines().map(str::to_string).collect();
        let first_baseline =
            style.page_height - 8.0 - (lines.len().saturating_sub(1)) as f32 * line_h;
        for (i, line) in lines.iter().enumerate() {
            self.draw_text(
                page,
                line,
                style.margin_left,
                first_baseline + i as f32 * line_h,
                Face::Regular,
                style.footer_font_size,
                (0.0, 0.0, 0.0),
            );
        }
        if let Some(slot) = self.footer_logo {
            let h = style.margin_bottom - 14.0;
            let w = h * self.image_aspect(slot);
            self.draw_image(
                page,
                slot,
                style.page_width - style.margin_right - w,
                style.page_height - style.margin_bottom + 6.0,
                w,
                h,
            );
        }
    }

    /// Stamp `n / total` on every page; run once, after the page set is
    /// final.
    pub fn number_pages(&mut self) {
        let style = self.style.clone();
        let total = self.pages.len();
        for page in 0..total {
            let label = format!("{} / {}", page + 1, total);
            let w = self.text_width(&label, Face::Regular, style.page_number_font_size);
            self.draw_text(
                page,
                &label,
                (style.page_width - w) / 2.0,
                style.page_height - 8.0,
                Face::Regular,
                style.page_number_font_size,
                (0.0, 0.0, 0.0),
            );
        }
    }

    /// Trailing booklet page listing modules that are not yet validated,
    /// grouped by section: a filled section box followed by one line per
    /// module name. Returns the page index.
    pub fn unvalidated_page(&mut self, title: &str, sections: &[(String, Vec<String>)]) -> usize {
        let style = self.style.clone();
        let page = self.start_page();
        self.decorate(page, title);

        let box_h = SECTION_FONT_SIZE + 2.0 * SECTION_BOX_MARGIN;
        let mut y = style.margin_top;
        for (section, modules) in sections {
            self.fill_rect(
                page,
                style.margin_left,
                y,
                style.content_width(),
                box_h,
                SECTION_BOX_COLOR,
            );
            self.draw_text(
                page,
                section,
                style.margin_left + SECTION_BOX_MARGIN,
                y + SECTION_BOX_MARGIN + SECTION_FONT_SIZE,
                Face::Bold,
                SECTION_FONT_SIZE,
                (0.0, 0.0, 0.0),
            );
            y += box_h + SECTION_SPACING_Y / 2.0;

            for module in modules {
                y += MODULE_NAME_FONT_SIZE + INTER_LINE;
                self.draw_text(
                    page,
                    module,
                    style.margin_left + SECTION_BOX_MARGIN,
                    y,
                    Face::Regular,
                    MODULE_NAME_FONT_SIZE,
                    (0.0, 0.0, 0.0),
                );
            }
            y += SECTION_SPACING_Y;
        }
        page
    }

    /// Assemble the object graph and serialize the document.
    pub fn finish(self) -> Vec<u8> {
        let OutputDoc {
            style,
            mut pdf,
            pages,
            images,
            mut next_id,
            catalog_id,
            pages_id,
            font_regular_id,
            font_bold_id,
            regular,
            bold,
            ..
        } = self;

        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let n = pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        let page_annot_refs: Vec<Vec<Ref>> = pages
            .iter()
            .map(|p| {
                p.annots
                    .iter()
                    .map(|pending| {
                        let annot_ref = alloc();
                        let mut annot = pdf.annotation(annot_ref);
                        annot
                            .subtype(AnnotationType::Link)
                            .border(0.0, 0.0, 0.0, None);
                        match pending {
                            PendingAnnot::Uri { rect, url } => {
                                annot.rect(*rect);
                                annot
                                    .action()
                                    .action_type(ActionType::Uri)
                                    .uri(Str(url.as_bytes()));
                            }
                            PendingAnnot::Jump { rect, target } => {
                                annot.rect(*rect);
                                let target = (*target).min(n.saturating_sub(1));
                                annot
                                    .action()
                                    .action_type(ActionType::GoTo)
                                    .destination()
                                    .page(page_ids[target])
                                    .xyz(0.0, style.page_height, None);
                            }
                        }
                        annot_ref
                    })
                    .collect()
            })
            .collect();

        for (i, p) in pages.into_iter().enumerate() {
            let raw = p.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        fonts::register_base_font(&mut pdf, font_regular_id, &regular);
        fonts::register_base_font(&mut pdf, font_bold_id, &bold);

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, style.page_width, style.page_height))
                .parent(pages_id)
                .contents(content_ids[i]);
            if !page_annot_refs[i].is_empty() {
                page.annotations(page_annot_refs[i].iter().copied());
            }
            let mut resources = page.resources();
            {
                let mut font_res = resources.fonts();
                font_res.pair(Name(regular.pdf_name.as_bytes()), font_regular_id);
                font_res.pair(Name(bold.pdf_name.as_bytes()), font_bold_id);
            }
            if !images.is_empty() {
                let mut xobjects = resources.x_objects();
                for img in &images {
                    xobjects.pair(Name(img.name.as_bytes()), img.xref);
                }
            }
        }

        pdf.finish()
    }
}
