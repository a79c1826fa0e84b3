//! Per-render composition state.
//!
//! Holds the element stack of the primary document, the fill bodies being
//! captured and the slot buffers of each include path. Everything here lives
//! for one render and is dropped with it.

use std::collections::HashMap;

use crate::node::{Arena, Attributes, Node, NodeId};
use crate::serialize::serialize;

/// Serialized slot markup keyed by slot name.
pub type SlotMap = HashMap<String, String>;

#[derive(Debug, Default)]
pub(crate) struct CompositionState {
    pub(crate) arena: Arena,
    /// One entry per open element, directive tags included.
    stack: Vec<NodeId>,
    /// Root of each fill body, keyed by slot name.
    fill_content: HashMap<String, NodeId>,
    /// Finalized slot nodes per include path.
    slot_buffer: HashMap<String, HashMap<String, NodeId>>,
    /// Slot name of the innermost open fill.
    current_slot: Option<String>,
}

impl CompositionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_capturing(&self) -> bool {
        self.current_slot.is_some()
    }

    /// Create an element node and push it on the stack.
    pub(crate) fn push_element(&mut self, tag: &str, attributes: Attributes) -> NodeId {
        let id = self.arena.alloc(Node::element(tag, attributes));
        self.stack.push(id);
        id
    }

    pub(crate) fn pop_element(&mut self) {
        self.stack.pop();
    }

    /// Attach a just-pushed element to the active fill's tree.
    ///
    /// The parent is the stack entry below the element; with no such entry
    /// the element goes to the fill root.
    pub(crate) fn capture_element(&mut self, id: NodeId) {
        let parent = self
            .stack
            .len()
            .checked_sub(2)
            .and_then(|index| self.stack.get(index).copied());
        match parent {
            Some(parent) => self.arena.append_child(parent, id),
            None => {
                if let Some(root) = self.fill_root() {
                    self.arena.append_child(root, id);
                }
            }
        }
    }

    /// Attach text to the active fill's tree.
    ///
    /// The text goes to the top element, and the top element is appended to
    /// the fill root again on every call. An element with several text
    /// children therefore appears several times in the fill root.
    pub(crate) fn capture_text(&mut self, content: &str) {
        let Some(root) = self.fill_root() else {
            return;
        };
        let text = self.arena.alloc(Node::text(content));
        match self.stack.last().copied() {
            Some(top) => {
                self.arena.append_child(top, text);
                self.arena.append_child(root, top);
            }
            None => self.arena.append_child(root, text),
        }
    }

    /// Start capturing a fill body for `slot`.
    pub(crate) fn begin_fill(&mut self, slot: &str) {
        let root = self.arena.alloc(Node::root());
        self.fill_content.insert(slot.to_owned(), root);
        self.current_slot = Some(slot.to_owned());
    }

    /// Finish the fill for `slot`, storing `node` in the nearest include's
    /// slot buffer. Content of a fill outside any include is dropped.
    pub(crate) fn end_fill(&mut self, slot: &str, node: NodeId) {
        if let Some(path) = self.nearest_include_path() {
            self.slot_buffer
                .entry(path)
                .or_default()
                .insert(slot.to_owned(), node);
        }
        self.current_slot = None;
    }

    /// Create or clear the slot buffer for `path`.
    pub(crate) fn open_include(&mut self, path: &str) {
        self.slot_buffer.insert(path.to_owned(), HashMap::new());
    }

    /// Serialize the current slot buffer of `path`.
    pub(crate) fn slot_markup(&self, path: &str) -> SlotMap {
        self.slot_buffer
            .get(path)
            .map(|slots| {
                slots
                    .iter()
                    .map(|(name, &node)| (name.clone(), serialize(&self.arena, node)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `path` of the innermost open `include`, if it has one.
    fn nearest_include_path(&self) -> Option<String> {
        self.stack
            .iter()
            .rev()
            .map(|&id| self.arena.get(id))
            .find(|node| node.tag() == Some("include"))
            .and_then(|node| node.attribute("path"))
            .filter(|path| !path.is_empty())
            .map(str::to_owned)
    }

    fn fill_root(&self) -> Option<NodeId> {
        let slot = self.current_slot.as_ref()?;
        self.fill_content.get(slot).copied()
    }

    #[cfg(test)]
    pub(crate) fn fill_root_for(&self, slot: &str) -> Option<NodeId> {
        self.fill_content.get(slot).copied()
    }

    #[cfg(test)]
    pub(crate) fn slot_node(&self, path: &str, slot: &str) -> Option<NodeId> {
        self.slot_buffer.get(path)?.get(slot).copied()
    }
}
