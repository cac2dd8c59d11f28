use std::collections::HashMap;

use crate::html::{escape_attr, escape_text, is_void_tag, parse_fragment};
use crate::{Error, NodeId, Result};

mod selector_matching;
mod style;

pub(crate) use style::css_property_name;

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) client_width: f64,
    pub(crate) client_height: f64,
}

impl Element {
    pub(crate) fn new(tag_name: String, attrs: HashMap<String, String>) -> Self {
        Self {
            tag_name,
            attrs,
            client_width: 0.0,
            client_height: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        self.create_node(Some(parent), NodeType::Element(Element::new(tag_name, attrs)))
    }

    pub(crate) fn create_detached_element(&mut self, tag_name: String) -> NodeId {
        self.create_node(
            None,
            NodeType::Element(Element::new(tag_name, HashMap::new())),
        )
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn require_element(&self, node_id: NodeId, op: &str) -> Result<&Element> {
        self.element(node_id)
            .ok_or_else(|| Error::NotAnElement(format!("{op} target {node_id}")))
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map_or(&[], |node| node.children.as_slice())
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Inclusive: a node contains itself.
    pub(crate) fn contains(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        ancestor == node_id || self.is_descendant_of(node_id, ancestor)
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        self.contains(self.root, node_id)
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::NotAnElement(format!("setAttribute target {node_id}")))?;
        element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.collect_elements_dfs(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id").as_deref() == Some(id))
    }

    fn find_first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.collect_elements_dfs(self.root)
            .into_iter()
            .find(|node| self.tag_name(*node) == Some(tag))
    }

    pub(crate) fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|node| self.element(*node).is_some())
    }

    pub(crate) fn head(&self) -> Option<NodeId> {
        self.find_first_by_tag("head")
    }

    pub(crate) fn body(&self) -> Option<NodeId> {
        self.find_first_by_tag("body")
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        match self.nodes.get(node_id.0).map(|node| &node.node_type) {
            Some(NodeType::Document) => true,
            Some(NodeType::Element(element)) => !is_void_tag(&element.tag_name),
            _ => false,
        }
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId, op: &str) -> Result<()> {
        if !self.is_valid_node(parent) || !self.is_valid_node(child) {
            return Err(Error::invalid_argument(op, "node is invalid"));
        }
        if !self.can_have_children(parent) {
            return Err(Error::invalid_argument(op, "target cannot have children"));
        }
        if child == self.root || child == parent {
            return Err(Error::invalid_argument(op, "invalid child node"));
        }
        if self.contains(child, parent) {
            return Err(Error::invalid_argument(op, "insertion would create a cycle"));
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = None;
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_insertable(parent, child, "append")?;
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub(crate) fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let reference = self.children(parent).first().copied();
        match reference {
            Some(reference) if reference != child => self.insert_before(parent, child, reference),
            Some(_) => Ok(()),
            None => self.append_child(parent, child),
        }
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        self.ensure_insertable(parent, child, "insertBefore")?;
        if self.parent(reference) != Some(parent) {
            return Err(Error::invalid_argument(
                "insertBefore",
                "reference is not a direct child",
            ));
        }
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
            .ok_or_else(|| Error::invalid_argument("insertBefore", "reference is missing"))?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::invalid_argument(
                "removeChild",
                "node is not a child of the target",
            ));
        }
        self.detach(child);
        Ok(())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match self.nodes.get(node_id.0).map(|node| &node.node_type) {
            Some(NodeType::Document | NodeType::Element(_)) => self
                .children(node_id)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
            Some(NodeType::Text(text)) => text.clone(),
            None => String::new(),
        }
    }

    pub(crate) fn inner_html(&self, node_id: NodeId) -> Result<String> {
        self.require_element(node_id, "innerHTML")?;
        Ok(self
            .children(node_id)
            .iter()
            .map(|child| self.dump_node(*child))
            .collect())
    }

    pub(crate) fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        self.require_element(node_id, "innerHTML")?;
        let fragment = parse_fragment(html)?;

        for child in std::mem::take(&mut self.nodes[node_id.0].children) {
            self.nodes[child.0].parent = None;
        }

        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.clone_subtree_from_dom(&fragment, child, Some(node_id));
        }
        Ok(())
    }

    pub(crate) fn clone_subtree_from_dom(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let node_type = match &source.nodes[source_node.0].node_type {
            NodeType::Document => return None,
            other => other.clone(),
        };
        let node = self.create_node(parent, node_type);
        for child in &source.nodes[source_node.0].children {
            self.clone_subtree_from_dom(source, *child, Some(node));
        }
        Some(node)
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let Some(node) = self.nodes.get(node_id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Document => node
                .children
                .iter()
                .map(|child| self.dump_node(*child))
                .collect(),
            NodeType::Text(text) => escape_text(text),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_by(|(left, _), (right, _)| left.cmp(right));
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(v));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return out;
                }
                let raw_text = matches!(element.tag_name.as_str(), "script" | "style");
                for child in &node.children {
                    match &self.nodes[child.0].node_type {
                        NodeType::Text(text) if raw_text => out.push_str(text),
                        _ => out.push_str(&self.dump_node(*child)),
                    }
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }

    pub(crate) fn client_size(&self, node_id: NodeId) -> (f64, f64) {
        self.element(node_id)
            .map_or((0.0, 0.0), |element| (element.client_width, element.client_height))
    }

    pub(crate) fn set_client_size(
        &mut self,
        node_id: NodeId,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::NotAnElement(format!("client size target {node_id}")))?;
        element.client_width = width;
        element.client_height = height;
        Ok(())
    }

    /// Guarantees `<html>` with `<head>` and `<body>`; stray top-level nodes move into the body.
    pub(crate) fn ensure_document_structure(&mut self) {
        let html = match self
            .document_element()
            .filter(|node| self.tag_name(*node) == Some("html"))
        {
            Some(html) => html,
            None => {
                let html = self.create_node(
                    None,
                    NodeType::Element(Element::new("html".into(), HashMap::new())),
                );
                let stray = std::mem::take(&mut self.nodes[self.root.0].children);
                self.nodes[html.0].parent = Some(self.root);
                self.nodes[self.root.0].children.push(html);
                for child in stray {
                    self.nodes[child.0].parent = Some(html);
                    self.nodes[html.0].children.push(child);
                }
                html
            }
        };

        let head = match self.head() {
            Some(head) => head,
            None => {
                let head = self.create_detached_element("head".into());
                self.nodes[head.0].parent = Some(html);
                self.nodes[html.0].children.insert(0, head);
                head
            }
        };

        if self.body().is_none() {
            let body = self.create_detached_element("body".into());
            let loose = self.nodes[html.0]
                .children
                .iter()
                .copied()
                .filter(|child| *child != head)
                .collect::<Vec<_>>();
            self.nodes[html.0].children.retain(|child| *child == head);
            self.nodes[body.0].parent = Some(html);
            self.nodes[html.0].children.push(body);
            for child in loose {
                self.nodes[child.0].parent = Some(body);
                self.nodes[body.0].children.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Dom> {
        let mut dom = parse_fragment("<ul id='list'><li>a</li><li class='x'>b</li></ul>")?;
        dom.ensure_document_structure();
        Ok(dom)
    }

    #[test]
    fn ensure_document_structure_wraps_fragment_in_body() -> Result<()> {
        let dom = sample()?;
        let body = dom.body().ok_or_else(|| Error::HtmlParse("no body".into()))?;
        let list = dom.by_id("list").ok_or_else(|| Error::HtmlParse("no list".into()))?;
        assert_eq!(dom.parent(list), Some(body));
        assert!(dom.head().is_some());
        assert_eq!(
            dom.dump_node(dom.root),
            "<html><head></head><body><ul id=\"list\"><li>a</li><li class=\"x\">b</li></ul></body></html>"
        );
        Ok(())
    }

    #[test]
    fn append_child_moves_and_rejects_cycles() -> Result<()> {
        let mut dom = sample()?;
        let list = dom.by_id("list").ok_or_else(|| Error::HtmlParse("no list".into()))?;
        let first = dom.children(list)[0];
        let second = dom.children(list)[1];
        dom.append_child(list, first)?;
        assert_eq!(dom.children(list), &[second, first]);
        assert!(dom.append_child(first, list).is_err());
        dom.prepend_child(list, first)?;
        assert_eq!(dom.children(list), &[first, second]);
        dom.remove_child(list, first)?;
        assert_eq!(dom.children(list), &[second]);
        assert!(!dom.is_connected(first));
        Ok(())
    }

    #[test]
    fn inner_html_replaces_children() -> Result<()> {
        let mut dom = sample()?;
        let list = dom.by_id("list").ok_or_else(|| Error::HtmlParse("no list".into()))?;
        dom.set_inner_html(list, "<li>z &amp; y</li>")?;
        assert_eq!(dom.inner_html(list)?, "<li>z &amp; y</li>");
        assert_eq!(dom.text_content(list), "z & y");
        Ok(())
    }
}
