use serde::{Deserialize, Serialize};

/// Class markers fixed by contract with the site templates.
pub const CONTENT_ROOT_CLASS: &str = "pdf-content";
pub const LINK_CLASS: &str = "pdf-link";
pub const MODULE_HEADER_CLASS: &str = "module-header";
pub const PLANNING_CLASS: &str = "modules-planning";
pub const SECTION_CLASS: &str = "section-header";
pub const CAPTION_CLASS: &str = "caption";

/// Child-index path from a content root down to a node.
pub type NodePath = Vec<usize>;

/// One node of a measured content tree, as emitted by the site's layout
/// snapshot pass. Coordinates are CSS pixels, absolute in the snapshot's
/// coordinate space (the same space as the page raster). The geometry is
/// only meaningful for the snapshot that produced it; nothing in this crate
/// mutates or re-measures the tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentNode {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Target of a `pdf-link` element (site-relative path or absolute URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Visible text of a `pdf-link` element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Snapshot encoding of the render-ignore marker.
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Depth-first search (including self) for the first node with `class`.
    pub fn find_class(&self, class: &str) -> Option<&ContentNode> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }

    /// Child-index path (relative to self) of the first descendant with
    /// `class`. Empty path if self carries the class.
    pub fn path_of_class(&self, class: &str) -> Option<NodePath> {
        fn walk(node: &ContentNode, class: &str, path: &mut NodePath) -> bool {
            if node.has_class(class) {
                return true;
            }
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                if walk(child, class, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = NodePath::new();
        walk(self, class, &mut path).then_some(path)
    }

    /// Resolve a child-index path. Empty path is the node itself.
    pub fn node_at(&self, path: &[usize]) -> Option<&ContentNode> {
        let mut node = self;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Leaves below this node, skipping ignore-marked subtrees.
    pub fn leaf_count(&self) -> usize {
        if self.ignore {
            return 0;
        }
        if self.children.iter().all(|c| c.ignore) {
            return 1;
        }
        self.children.iter().map(|c| c.leaf_count()).sum()
    }
}
