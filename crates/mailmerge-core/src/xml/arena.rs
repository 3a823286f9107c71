use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use indextree::{Arena, NodeId};

/// A mutable XML tree for one package part. Each part gets an independently
/// parsed and serialized tree; nodes are never shared across trees.
pub struct XmlDocument {
    arena: Arena<XmlNodeData>,
    root: Option<NodeId>,
}

impl XmlDocument {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNodeData> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNodeData> {
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    pub fn add_root(&mut self, data: XmlNodeData) -> NodeId {
        let id = self.arena.new_node(data);
        self.root = Some(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    pub fn add_after(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_after(new_node, &mut self.arena);
        new_node
    }

    /// Detach a node and its entire subtree; parent-child links are fully
    /// severed so no dangling references remain.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    /// Put `replacement` in `node`'s place and detach `node`'s subtree.
    pub fn replace(&mut self, node: NodeId, replacement: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(replacement);
        node.insert_after(new_node, &mut self.arena);
        node.remove_subtree(&mut self.arena);
        new_node
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent.children(&self.arena)
    }

    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.next_sibling()
    }

    pub fn name(&self, node: NodeId) -> Option<&XName> {
        self.get(node)?.name()
    }

    pub fn is_element_named(&self, node: NodeId, name: &XName) -> bool {
        self.name(node) == Some(name)
    }

    pub fn attribute(&self, node: NodeId, name: &XName) -> Option<&str> {
        self.get(node)?.attribute(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &XName, value: &str) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                if let Some(attr) = attrs.iter_mut().find(|a| &a.name == name) {
                    attr.value = value.to_string();
                } else {
                    attrs.push(XAttribute::new(name.clone(), value));
                }
            }
        }
    }

    /// Direct text content of a text or CDATA node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.get(node)?.text_content()
    }

    /// First child element with the given name.
    pub fn find_child(&self, parent: NodeId, name: &XName) -> Option<NodeId> {
        self.children(parent)
            .find(|&child| self.is_element_named(child, name))
    }

    /// Every descendant element (the node itself included) with the given name.
    pub fn find_descendants(&self, start: NodeId, name: &XName) -> Vec<NodeId> {
        self.descendants(start)
            .filter(|&id| self.is_element_named(id, name))
            .collect()
    }

    /// Concatenated text of every text node under `node`.
    pub fn inner_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in self.descendants(node) {
            if let Some(text) = self.text(id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace the text content of an element: existing text children are
    /// dropped and a single text node with `content` takes their place.
    /// Non-text children (w:br and the like) are left where they are.
    pub fn set_inner_text(&mut self, element: NodeId, content: &str) {
        let text_children: Vec<NodeId> = self
            .children(element)
            .filter(|&child| self.get(child).is_some_and(|d| d.is_text()))
            .collect();
        for child in text_children {
            self.remove(child);
        }
        self.add_child(element, XmlNodeData::text(content));
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_document_with_root() {
        let mut doc = XmlDocument::new();
        let root_name = XName::new("http://example.com", "root");
        let root_id = doc.add_root(XmlNodeData::element(root_name.clone()));

        assert_eq!(doc.root(), Some(root_id));
        assert_eq!(doc.name(root_id), Some(&root_name));
    }

    #[test]
    fn remove_detaches_whole_subtree() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(XName::local("root")));
        let child = doc.add_child(root, XmlNodeData::element(XName::local("child")));
        doc.add_child(child, XmlNodeData::text("inner"));
        let sibling = doc.add_child(root, XmlNodeData::element(XName::local("sibling")));

        doc.remove(child);

        let remaining: Vec<_> = doc.children(root).collect();
        assert_eq!(remaining, vec![sibling]);
        assert_eq!(doc.inner_text(root), "");
    }

    #[test]
    fn replace_swaps_node_in_place() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(XName::local("root")));
        let first = doc.add_child(root, XmlNodeData::element(XName::local("first")));
        doc.add_child(root, XmlNodeData::element(XName::local("second")));

        let swapped = doc.replace(first, XmlNodeData::element(XName::local("swapped")));

        let names: Vec<_> = doc
            .children(root)
            .filter_map(|id| doc.name(id).map(|n| n.local_name.clone()))
            .collect();
        assert_eq!(names, vec!["swapped", "second"]);
        assert_eq!(doc.parent(swapped), Some(root));
    }

    #[test]
    fn set_inner_text_replaces_only_text_children() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(XName::local("t")));
        doc.add_child(root, XmlNodeData::text("old"));

        doc.set_inner_text(root, "new");

        assert_eq!(doc.inner_text(root), "new");
        assert_eq!(doc.children(root).count(), 1);
    }

    #[test]
    fn following_siblings_in_document_order() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(XName::local("root")));
        let a = doc.add_child(root, XmlNodeData::element(XName::local("a")));
        let b = doc.add_child(root, XmlNodeData::element(XName::local("b")));
        let c = doc.add_child(root, XmlNodeData::element(XName::local("c")));

        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(b), Some(c));
        assert_eq!(doc.next_sibling(c), None);
    }
}
