#![forbid(unsafe_code)]

//! Structural patching of the headless document from a [`VNode`] tree.
//!
//! Children are matched by position. A node is kept (and patched in place)
//! when its tag and key attribute equal the template's; otherwise it is
//! replaced by a fresh subtree. Surplus children are removed. Patching an
//! unchanged tree touches nothing, so node handles held by subscriptions
//! stay valid across renders unless the structure really changed.

use scrollable_core::{HostError, NodeRef, RenderingEngine, VNode};

use crate::document::{HeadlessDocument, NodeData};

/// Attribute used to match existing nodes against template nodes.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "data-section-id";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PatchStats {
    created: usize,
    removed: usize,
}

impl HeadlessDocument {
    fn build(&self, vnode: &VNode, stats: &mut PatchStats) -> NodeRef {
        let node = NodeRef::from_raw(self.mint());
        let mut data = NodeData::element(&vnode.tag);
        data.attributes = vnode.attribute_strings();
        self.state.borrow_mut().nodes.insert(node, data);
        stats.created += 1;
        for child in &vnode.children {
            let built = self.build(child, stats);
            let mut state = self.state.borrow_mut();
            if let Some(data) = state.nodes.get_mut(&built) {
                data.parent = Some(node);
            }
            if let Some(data) = state.nodes.get_mut(&node) {
                data.children.push(built);
            }
        }
        node
    }

    fn matches(&self, node: NodeRef, vnode: &VNode) -> bool {
        let state = self.state.borrow();
        let Some(data) = state.nodes.get(&node) else {
            return false;
        };
        let key = vnode
            .attribute(&self.key_attribute)
            .and_then(|value| value.to_attribute_string());
        data.tag == vnode.tag && data.attributes.get(&self.key_attribute) == key.as_ref()
    }

    fn patch_node(&self, node: NodeRef, vnode: &VNode, stats: &mut PatchStats) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.attributes = vnode.attribute_strings();
        }
        self.patch_children(node, &vnode.children, stats);
    }

    fn patch_children(&self, parent: NodeRef, desired: &[VNode], stats: &mut PatchStats) {
        for (index, vnode) in desired.iter().enumerate() {
            let existing = self.children(parent).get(index).copied();
            match existing {
                Some(node) if self.matches(node, vnode) => self.patch_node(node, vnode, stats),
                existing => {
                    let fresh = self.build(vnode, stats);
                    {
                        let mut state = self.state.borrow_mut();
                        if let Some(data) = state.nodes.get_mut(&fresh) {
                            data.parent = Some(parent);
                        }
                        if let Some(old) = existing
                            && let Some(data) = state.nodes.get_mut(&old)
                        {
                            data.parent = None;
                        }
                        if let Some(data) = state.nodes.get_mut(&parent) {
                            match existing {
                                Some(_) => data.children[index] = fresh,
                                None => data.children.push(fresh),
                            }
                        }
                    }
                    if let Some(old) = existing {
                        self.remove_node(old);
                        stats.removed += 1;
                    }
                }
            }
        }

        let surplus: Vec<NodeRef> = self
            .children(parent)
            .into_iter()
            .skip(desired.len())
            .collect();
        for node in surplus {
            self.remove_node(node);
            stats.removed += 1;
        }
    }
}

impl RenderingEngine for HeadlessDocument {
    fn add_style(&self, sheet: &str) {
        if self.stylesheets.borrow_mut().register(sheet) {
            tracing::debug!(target: "scrollable.host", sheet, "Stylesheet registered");
        }
    }

    fn render(&self, root: NodeRef, tree: &VNode) -> Result<(), HostError> {
        if !self.exists(root) {
            return Err(HostError::NodeNotFound(root));
        }
        let mut stats = PatchStats::default();
        self.patch_children(root, std::slice::from_ref(tree), &mut stats);
        self.renders.set(self.renders.get() + 1);
        tracing::debug!(
            target: "scrollable.host",
            root = %root,
            created = stats.created,
            removed = stats.removed,
            "Render applied"
        );
        Ok(())
    }
}
