//! Content-to-page pagination.
//!
//! Pure packing over an immutable, size-annotated content tree: fragments
//! are index-path descriptors into the original tree, never clones. Heights
//! come from the layout snapshot and are compared against the page content
//! box after scaling.

use std::collections::HashSet;

use crate::model::{CAPTION_CLASS, ContentNode, NodePath, PLANNING_CLASS};

pub struct SplitConfig {
    /// Page content box height, in output units (points).
    pub page_height: f32,
    /// page_width / content root width; fixed for one run over one root.
    pub scale: f32,
    /// Fit tolerance: a fragment may exceed the content box by this much.
    pub epsilon: f32,
    /// Element tags that may be recursively split across pages.
    pub splittable_tags: HashSet<String>,
    /// Class-tagged sections that must never be cut, whatever their tag.
    pub atomic_classes: Vec<String>,
}

impl SplitConfig {
    pub fn for_root(
        root: &ContentNode,
        page_width: f32,
        page_height: f32,
        epsilon: f32,
        atomic_classes: &[&str],
    ) -> Self {
        let scale = if root.w > 0.0 { page_width / root.w } else { 1.0 };
        Self {
            page_height,
            scale,
            epsilon,
            splittable_tags: ["div", "section"].iter().map(|s| s.to_string()).collect(),
            atomic_classes: atomic_classes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn is_splittable_kind(&self, node: &ContentNode) -> bool {
        self.splittable_tags.contains(&node.tag)
            && !self.atomic_classes.iter().any(|c| node.has_class(c))
    }
}

/// One subtree placed into a fragment, with its vertical offset from the
/// fragment's top (source units).
#[derive(Clone, Debug)]
pub struct FragmentSlice {
    pub path: NodePath,
    pub y_offset: f32,
    pub height: f32,
}

/// An ordered run of subtrees guaranteed to fit one page's content box,
/// unless flagged `oversized` (a single atomic block taller than an empty
/// page, kept so the content appears exactly once).
#[derive(Clone, Debug)]
pub struct PageFragment {
    pub slices: Vec<FragmentSlice>,
    /// Total height in source units.
    pub height: f32,
    pub oversized: bool,
}

struct FragmentBuilder<'a> {
    config: &'a SplitConfig,
    fragments: Vec<PageFragment>,
    slices: Vec<FragmentSlice>,
    height: f32,
    oversized: bool,
}

impl<'a> FragmentBuilder<'a> {
    fn new(config: &'a SplitConfig) -> Self {
        Self {
            config,
            fragments: Vec::new(),
            slices: Vec::new(),
            height: 0.0,
            oversized: false,
        }
    }

    fn fits(&self, extra_source_h: f32) -> bool {
        (self.height + extra_source_h) * self.config.scale
            <= self.config.page_height + self.config.epsilon
    }

    fn push(&mut self, path: NodePath, height: f32) {
        self.slices.push(FragmentSlice {
            path,
            y_offset: self.height,
            height,
        });
        self.height += height;
    }

    fn close(&mut self) {
        if self.slices.is_empty() {
            return;
        }
        self.fragments.push(PageFragment {
            slices: std::mem::take(&mut self.slices),
            height: self.height,
            oversized: self.oversized,
        });
        self.height = 0.0;
        self.oversized = false;
    }

    fn finish(mut self) -> Vec<PageFragment> {
        self.close();
        self.fragments
    }
}

/// Greedy depth-first packing of `root` into page-sized fragments.
///
/// A node that fits the remaining budget is taken whole. A node that does
/// not fit is recursed into only when it is of a splittable kind, every one
/// of its live children is too, and it has more than one descendant leaf;
/// otherwise it is atomic and opens a new fragment. Splitting a container
/// with mixed-kind children would cut at the wrong granularity, so it moves
/// whole. Ignore-marked nodes are skipped without descending. Deterministic
/// for a given tree and config.
pub fn split(root: &ContentNode, config: &SplitConfig) -> Vec<PageFragment> {
    let mut builder = FragmentBuilder::new(config);
    visit(root, Vec::new(), &mut builder);
    builder.finish()
}

fn visit(node: &ContentNode, path: NodePath, builder: &mut FragmentBuilder) {
    if node.ignore {
        return;
    }

    if builder.fits(node.h) {
        builder.push(path, node.h);
        return;
    }

    let live_children: Vec<&ContentNode> = node.children.iter().filter(|c| !c.ignore).collect();
    let can_descend = !live_children.is_empty()
        && live_children
            .iter()
            .all(|c| builder.config.is_splittable_kind(c))
        && node.leaf_count() > 1;

    if builder.config.is_splittable_kind(node) && can_descend {
        log::debug!(
            "splitting <{}> ({:.0}px) across pages",
            node.tag,
            node.h
        );
        for (i, child) in node.children.iter().enumerate() {
            let mut child_path = path.clone();
            child_path.push(i);
            visit(child, child_path, builder);
        }
        return;
    }

    // Hard boundary: the node moves whole onto a fresh page.
    builder.close();
    if builder.fits(node.h) {
        builder.push(path, node.h);
    } else {
        log::warn!(
            "atomic block <{}> is taller than one page ({:.0}px for {:.0}pt available); flagged oversized",
            node.tag,
            node.h,
            builder.config.page_height / builder.config.scale.max(f32::EPSILON),
        );
        builder.push(path, node.h);
        builder.oversized = true;
        builder.close();
    }
}

/// Tabular variant for a booklet's planning table: rows are paired
/// (header + body) and tested as pairs so a logical row group is never
/// separated; the trailing aggregate row and the caption block are tested
/// individually. Rows are leaves here — no recursive descent.
///
/// Returns `None` when the root carries no `modules-planning` table.
pub fn split_planning(root: &ContentNode, config: &SplitConfig) -> Option<Vec<PageFragment>> {
    let planning_path = root.path_of_class(PLANNING_CLASS)?;
    let planning = root.node_at(&planning_path)?;

    let mut builder = FragmentBuilder::new(config);
    let rows = &planning.children;
    let mut i = 0;
    while i < rows.len() {
        let unit: Vec<usize> = if i + 1 < rows.len() {
            vec![i, i + 1]
        } else {
            // Trailing aggregate row.
            vec![i]
        };
        let unit_h: f32 = unit.iter().map(|&r| rows[r].h).sum();
        if !builder.fits(unit_h) {
            builder.close();
        }
        if !builder.fits(unit_h) {
            log::warn!(
                "planning row group ({:.0}px) is taller than one page; flagged oversized",
                unit_h
            );
            builder.oversized = true;
        }
        for &r in &unit {
            let mut path = planning_path.clone();
            path.push(r);
            builder.push(path, rows[r].h);
        }
        if builder.oversized {
            builder.close();
        }
        i += unit.len();
    }

    if let Some(caption_path) = root.path_of_class(CAPTION_CLASS) {
        if let Some(caption) = root.node_at(&caption_path) {
            if !builder.fits(caption.h) {
                builder.close();
            }
            if !builder.fits(caption.h) {
                log::warn!(
                    "planning caption ({:.0}px) is taller than one page; flagged oversized",
                    caption.h
                );
                builder.oversized = true;
            }
            builder.push(caption_path, caption.h);
        }
    }

    Some(builder.finish())
}
