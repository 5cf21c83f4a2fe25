//! Display tree: node store, parent/child structure, hit-testing, coordinate
//! conversion, and the render traversal.
//!
//! Nodes live in a flat map keyed by [`NodeId`]; parent and child links are
//! ids, never references. A handle whose node has been destroyed simply fails
//! to resolve, which callers treat as "no node".
//!
//! Rendering walks the tree depth-first, children in order (first child is
//! drawn first, so it ends up at the bottom). Movie clip nodes swap in the
//! display node of their current frame before drawing and advance their
//! timeline after drawing.

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StageError;
use crate::geom::{Point, Rect, Transform};
use crate::surface::Surface;
use crate::timeline::Timeline;

/// Unique identifier for a display node.
pub type NodeId = Uuid;

/// Filled primitive drawn by a shape node, anchored at its local origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Graphic {
    /// Axis-aligned rectangle from `(0, 0)` to `(width, height)`.
    Rect { width: f64, height: f64, fill: String },
    /// Ellipse inscribed in the `(0, 0)`–`(width, height)` box.
    Ellipse { width: f64, height: f64, fill: String },
}

impl Graphic {
    /// Parse a graphic from a tagged JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Descriptor`] if `json` is not a known graphic.
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Local-space bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect { width, height, .. } | Self::Ellipse { width, height, .. } => {
                Rect::new(0.0, 0.0, *width, *height)
            }
        }
    }

    #[must_use]
    pub fn fill(&self) -> &str {
        match self {
            Self::Rect { fill, .. } | Self::Ellipse { fill, .. } => fill,
        }
    }

    /// Whether a local-space point lies on the graphic.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        match self {
            Self::Rect { .. } => self.bounds().contains(pt),
            Self::Ellipse { width, height, .. } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return false;
                }
                let rx = width / 2.0;
                let ry = height / 2.0;
                let dx = (pt.x - rx) / rx;
                let dy = (pt.y - ry) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

/// What a node is, beyond its placement and children.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Groups children; draws nothing itself.
    Container,
    /// Draws a graphic beneath its children.
    Shape(Graphic),
    /// A container driven by a frame timeline.
    Clip(Timeline),
}

/// A node in the display tree.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct DisplayNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Left offset in parent units.
    pub x: f64,
    /// Top offset in parent units.
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Opacity multiplied into the parent's; `0` skips the subtree.
    pub alpha: f64,
    /// Hidden nodes are neither drawn, hit, nor advanced.
    pub visible: bool,
    /// Whether the node takes part in interactive hit-testing.
    pub mouse_enabled: bool,
    /// When false, a hit on any descendant reports this node instead.
    pub mouse_children: bool,
    /// Show the pointer cursor while this node is the hit target.
    pub button_mode: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DisplayNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
            visible: true,
            mouse_enabled: true,
            mouse_children: true,
            button_mode: false,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in draw order (bottom first).
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform { x: self.x, y: self.y, scale_x: self.scale_x, scale_y: self.scale_y }
    }

    #[must_use]
    pub fn graphic(&self) -> Option<&Graphic> {
        match &self.kind {
            NodeKind::Shape(graphic) => Some(graphic),
            _ => None,
        }
    }

    #[must_use]
    pub fn timeline(&self) -> Option<&Timeline> {
        match &self.kind {
            NodeKind::Clip(timeline) => Some(timeline),
            _ => None,
        }
    }

    pub fn timeline_mut(&mut self) -> Option<&mut Timeline> {
        match &mut self.kind {
            NodeKind::Clip(timeline) => Some(timeline),
            _ => None,
        }
    }
}

/// Store of display nodes rooted at the stage container.
pub struct DisplayTree {
    nodes: HashMap<NodeId, DisplayNode>,
    root: NodeId,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    /// A tree holding only the root container.
    #[must_use]
    pub fn new() -> Self {
        let root = DisplayNode::new(NodeKind::Container);
        let id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(id, root);
        Self { nodes, root: id }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    // --- Creation ---

    /// Create a detached node and return its id.
    pub fn insert(&mut self, kind: NodeKind) -> NodeId {
        let node = DisplayNode::new(kind);
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    pub fn create_container(&mut self) -> NodeId {
        self.insert(NodeKind::Container)
    }

    pub fn create_shape(&mut self, graphic: Graphic) -> NodeId {
        self.insert(NodeKind::Shape(graphic))
    }

    pub fn create_clip(&mut self, timeline: Timeline) -> NodeId {
        self.insert(NodeKind::Clip(timeline))
    }

    // --- Queries ---

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&DisplayNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DisplayNode> {
        self.nodes.get_mut(&id)
    }

    #[must_use]
    pub fn timeline(&self, id: NodeId) -> Option<&Timeline> {
        self.nodes.get(&id).and_then(DisplayNode::timeline)
    }

    pub fn timeline_mut(&mut self, id: NodeId) -> Option<&mut Timeline> {
        self.nodes.get_mut(&id).and_then(DisplayNode::timeline_mut)
    }

    /// Children of `id` in draw order; empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|node| node.children.as_slice()).unwrap_or_default()
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `ancestor` sits strictly above `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.nodes.get(&id).and_then(|node| node.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent);
        }
        false
    }

    // --- Structure ---

    /// Append `child` on top of `parent`'s children.
    ///
    /// # Errors
    ///
    /// See [`DisplayTree::add_child_at`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StageError> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Insert `child` at `index` in `parent`'s children (clamped to the end).
    /// A child that already has a parent is moved.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownNode`] if either id is unknown, or
    /// [`StageError::CyclicAttach`] if `child` is `parent` or one of its ancestors.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<(), StageError> {
        if !self.nodes.contains_key(&parent) {
            return Err(StageError::UnknownNode(parent));
        }
        if !self.nodes.contains_key(&child) {
            return Err(StageError::UnknownNode(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(StageError::CyclicAttach { parent, child });
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Remove `child` from `parent`. Returns false if it was not `parent`'s child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.nodes.get(&child).and_then(|node| node.parent) != Some(parent) {
            return false;
        }
        self.detach(child)
    }

    /// Unlink `id` from its parent, keeping it in the store.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|node| node.parent.take()) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != id);
        }
        true
    }

    /// Remove `id` and its whole subtree from the store, returning every removed id.
    /// The root cannot be destroyed.
    ///
    /// A clip also takes its frame displays down, including those of frames
    /// not on screen. A frame display that another live node has adopted is
    /// left alone.
    pub fn destroy(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.root || !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        self.detach(id);
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(&current) else {
                continue;
            };
            if let NodeKind::Clip(timeline) = &node.kind {
                stack.extend(self.orphaned_displays(timeline));
            }
            stack.extend(node.children);
            removed.push(current);
        }
        removed
    }

    /// Frame displays of `timeline` with no live parent.
    fn orphaned_displays(&self, timeline: &Timeline) -> Vec<NodeId> {
        timeline
            .frames()
            .iter()
            .filter_map(|frame| frame.display)
            .filter(|display| {
                self.nodes
                    .get(display)
                    .is_some_and(|node| node.parent.is_none_or(|parent| !self.nodes.contains_key(&parent)))
            })
            .collect()
    }

    // --- Coordinates ---

    /// Convert a stage-space point into `id`'s local space.
    #[must_use]
    pub fn global_to_local(&self, id: NodeId, global: Point) -> Option<Point> {
        let chain = self.transform_chain(id)?;
        Some(chain.iter().rev().fold(global, |pt, t| t.to_local(pt)))
    }

    /// Convert a point in `id`'s local space into stage space.
    #[must_use]
    pub fn local_to_global(&self, id: NodeId, local: Point) -> Option<Point> {
        let chain = self.transform_chain(id)?;
        Some(chain.iter().fold(local, |pt, t| t.to_parent(pt)))
    }

    /// Transforms from `id` up to its topmost ancestor.
    fn transform_chain(&self, id: NodeId) -> Option<Vec<Transform>> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.nodes.get(&current)?;
            chain.push(node.transform());
            cursor = node.parent;
        }
        Some(chain)
    }

    // --- Hit-testing ---

    /// Front-most visible node under a stage-space point.
    ///
    /// With `interactive_only`, nodes with `mouse_enabled == false` are
    /// transparent to the test along with their subtrees. The root itself is
    /// never reported.
    #[must_use]
    pub fn object_under_point(&self, global: Point, interactive_only: bool) -> Option<NodeId> {
        let root = self.nodes.get(&self.root)?;
        self.hit_children(root, root.transform().to_local(global), interactive_only)
    }

    fn hit_children(&self, node: &DisplayNode, local: Point, interactive_only: bool) -> Option<NodeId> {
        for child_id in node.children.iter().rev() {
            let Some(child) = self.nodes.get(child_id) else {
                continue;
            };
            if !child.visible || (interactive_only && !child.mouse_enabled) {
                continue;
            }
            let child_local = child.transform().to_local(local);
            if let Some(hit) = self.hit_children(child, child_local, interactive_only) {
                return Some(if child.mouse_children { hit } else { child.id });
            }
            if child.graphic().is_some_and(|g| g.contains(child_local)) {
                return Some(child.id);
            }
        }
        None
    }

    // --- Rendering ---

    /// Draw the whole tree and advance every visible playing clip by one frame.
    ///
    /// # Errors
    ///
    /// Propagates the first failing surface call.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<(), StageError> {
        self.render_node(self.root, 1.0, surface)
    }

    fn render_node(&mut self, id: NodeId, parent_alpha: f64, surface: &mut dyn Surface) -> Result<(), StageError> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(());
        };
        if !node.visible || node.alpha <= 0.0 {
            return Ok(());
        }
        let alpha = parent_alpha * node.alpha;
        let is_clip = node.timeline().is_some();

        if is_clip {
            self.show_current_frame(id);
        }

        surface.save();
        let painted = self.paint(id, alpha, surface);
        surface.restore();
        painted?;

        if is_clip {
            self.advance_clip(id);
        }
        Ok(())
    }

    fn paint(&mut self, id: NodeId, alpha: f64, surface: &mut dyn Surface) -> Result<(), StageError> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(());
        };
        surface.transform(node.x, node.y, node.scale_x, node.scale_y)?;
        surface.set_alpha(alpha);
        if let Some(graphic) = node.graphic() {
            surface.draw(graphic)?;
        }
        let children = node.children.clone();
        for child in children {
            self.render_node(child, alpha, surface)?;
        }
        Ok(())
    }

    /// Put the current frame's display node at the bottom of the clip,
    /// replacing the previous frame's, and honor the frame's stop flag.
    fn show_current_frame(&mut self, id: NodeId) {
        let Some(timeline) = self.timeline(id) else {
            return;
        };
        let wanted = timeline.current().and_then(|frame| frame.display);
        let stop = timeline.current().is_some_and(|frame| frame.stop);
        let mut shown = timeline.shown;

        if wanted != shown
            && let Some(old) = shown.take()
        {
            self.remove_child(id, old);
        }
        if let Some(new) = wanted {
            let pinned = self.nodes.get(&id).is_some_and(|clip| clip.children.first() == Some(&new));
            if !pinned {
                match self.add_child_at(id, new, 0) {
                    Ok(()) => shown = Some(new),
                    Err(err) => log::warn!("clip {id}: frame display not attached: {err}"),
                }
            }
        }

        if let Some(timeline) = self.timeline_mut(id) {
            timeline.shown = shown;
            if stop {
                timeline.stop();
            }
        }
    }

    fn advance_clip(&mut self, id: NodeId) {
        let Some(timeline) = self.timeline_mut(id) else {
            return;
        };
        if timeline.is_paused() || timeline.total_frames() == 0 {
            return;
        }
        if let Err(err) = timeline.next_frame() {
            log::warn!("clip {id}: playhead not advanced: {err}");
        }
    }
}
