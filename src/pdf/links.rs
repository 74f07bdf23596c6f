//! Link remapping.
//!
//! Links are measured in the snapshot's coordinate space. Once the splitter
//! has decided which subtree lands on which page, every link rectangle is
//! rebased onto its fragment (distance from the fragment's top) and then
//! projected into page points. Cross-references between documents of one
//! booklet resolve in a second pass, after every module sheet has a page.

use crate::model::{ContentNode, LINK_CLASS, MODULE_HEADER_CLASS, NodePath};
use crate::pdf::{Face, OutputDoc, PageStyle};
use crate::split::PageFragment;

const ANCHOR_FONT_SIZE: f32 = 7.0;
const ANCHOR_COLOR: (f32, f32, f32) = (0.0, 0.0, 1.0);

/// A `pdf-link` element in source coordinates, with its tree path.
#[derive(Clone, Debug)]
pub struct LinkDescriptor {
    pub path: NodePath,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub href: String,
    pub text: String,
    /// Carries the `module-header` marker: a cross-reference into a module
    /// sheet, eligible for a page-jump anchor.
    pub header_anchor: bool,
}

/// Collect every link below `root`, skipping ignore-marked subtrees.
pub fn locate_links(root: &ContentNode) -> Vec<LinkDescriptor> {
    fn walk(node: &ContentNode, path: &mut NodePath, out: &mut Vec<LinkDescriptor>) {
        if node.ignore {
            return;
        }
        if node.has_class(LINK_CLASS) {
            if let Some(href) = &node.href {
                out.push(LinkDescriptor {
                    path: path.clone(),
                    x: node.x,
                    y: node.y,
                    w: node.w,
                    h: node.h,
                    href: href.clone(),
                    text: node.text.clone().unwrap_or_default(),
                    header_anchor: node.has_class(MODULE_HEADER_CLASS),
                });
            }
        }
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            walk(child, path, out);
            path.pop();
        }
    }
    let mut out = Vec::new();
    walk(root, &mut NodePath::new(), &mut out);
    out
}

/// A link rebased onto one fragment. `x` stays in absolute source units;
/// `y_offset` is measured from the fragment's top.
#[derive(Clone, Debug)]
pub struct PlacedLink {
    pub x: f32,
    pub y_offset: f32,
    pub w: f32,
    pub h: f32,
    pub href: String,
    pub text: String,
    pub header_anchor: bool,
}

/// The links of `fragment`: those whose path falls inside one of its
/// slices, shifted by the slice's offset within the fragment.
pub fn fragment_links(
    root: &ContentNode,
    fragment: &PageFragment,
    links: &[LinkDescriptor],
) -> Vec<PlacedLink> {
    let mut placed = Vec::new();
    for slice in &fragment.slices {
        let Some(slice_node) = root.node_at(&slice.path) else {
            continue;
        };
        for link in links {
            if !link.path.starts_with(&slice.path) {
                continue;
            }
            placed.push(PlacedLink {
                x: link.x,
                y_offset: link.y - slice_node.y + slice.y_offset,
                w: link.w,
                h: link.h,
                href: link.href.clone(),
                text: link.text.clone(),
                header_anchor: link.header_anchor,
            });
        }
    }
    placed
}

/// Project a rebased source position into page points: x against the
/// content root's left edge, y from the fragment's top under the top
/// margin.
pub fn page_position(
    style: &PageStyle,
    scale: f32,
    content_left: f32,
    x_src: f32,
    y_src: f32,
) -> (f32, f32) {
    (
        style.margin_left + (x_src - content_left) * scale,
        style.margin_top + y_src * scale,
    )
}

fn is_absolute(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

/// Absolute URL for a link target (site-relative paths join the base URL).
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if is_absolute(href) {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Where a module sheet landed in a booklet. `page` stays at the sentinel
/// until the sheet is rendered; it never is for unvalidated modules.
#[derive(Clone, Debug)]
pub struct ModulePageRecord {
    pub href: String,
    pub label: String,
    pub page: i32,
}

impl ModulePageRecord {
    pub const UNPLACED: i32 = -1;

    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
            page: Self::UNPLACED,
        }
    }
}

/// A spot reserved next to a link for its page-jump marker.
#[derive(Clone, Debug)]
pub struct AnchorSpot {
    pub page: usize,
    pub x: f32,
    pub y_top: f32,
    pub href: String,
}

/// Annotate one page's links: every link gets an external URI hot zone
/// (nudged per style); header-anchor links additionally reserve a spot for
/// the cross-reference pass.
pub fn place_links(
    doc: &mut OutputDoc,
    page: usize,
    links: &[PlacedLink],
    scale: f32,
    content_left: f32,
    base_url: &str,
    anchors: &mut Vec<AnchorSpot>,
) {
    let style = doc.style().clone();
    for link in links {
        let (x, y) = page_position(&style, scale, content_left, link.x, link.y_offset);
        let w = link.w * scale;
        let h = link.h * scale;
        let url = absolute_url(base_url, &link.href);
        doc.add_link(
            page,
            x + style.link_nudge_x,
            y + style.link_nudge_y,
            w,
            h,
            &url,
        );
        if link.header_anchor {
            anchors.push(AnchorSpot {
                page,
                x: x + w + style.anchor_shift_x,
                y_top: y + h,
                href: link.href.clone(),
            });
        }
    }
}

fn normalize(href: &str) -> &str {
    href.trim_matches('/')
}

/// Cross-reference pass: give every reserved anchor spot a `§N` marker and
/// an internal jump. Targets match by href; a link to a module that never
/// rendered (not validated) points at the document's last page, where the
/// unvalidated list lives. Always runs, even when every module rendered.
pub fn resolve_page_anchors(
    doc: &mut OutputDoc,
    anchors: &[AnchorSpot],
    records: &[ModulePageRecord],
) {
    if doc.page_count() == 0 {
        return;
    }
    let last = doc.page_count() - 1;
    for anchor in anchors {
        let target = records
            .iter()
            .find(|r| normalize(&r.href) == normalize(&anchor.href))
            .map(|r| r.page)
            .filter(|&p| p >= 0)
            .map(|p| p as usize)
            .unwrap_or(last);
        let label = format!("\u{a7}{}", target + 1);
        let w = doc.text_width(&label, Face::Regular, ANCHOR_FONT_SIZE);
        doc.draw_text(
            anchor.page,
            &label,
            anchor.x,
            anchor.y_top,
            Face::Regular,
            ANCHOR_FONT_SIZE,
            ANCHOR_COLOR,
        );
        doc.add_page_jump(
            anchor.page,
            anchor.x,
            anchor.y_top - ANCHOR_FONT_SIZE,
            w,
            ANCHOR_FONT_SIZE,
            target,
        );
    }
}
