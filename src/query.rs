use std::rc::Rc;
use std::sync::OnceLock;

use crate::events::{Discriminator, Event, Handler, SubscriptionId};
use crate::ext::SliceExt;
use crate::{Document, Error, MethodTable, NodeId, Result, Value};

/// Ordered set of elements with batch method dispatch.
///
/// Duplicates are allowed and order is whatever produced the query: document
/// order for selectors, call order for vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    members: Vec<NodeId>,
}

/// Anything a [`Query`] can be built from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryInput<'a> {
    #[default]
    None,
    /// A CSS selector, or `<tag>` to create a detached element.
    Selector(&'a str),
    Element(NodeId),
    Elements(Vec<NodeId>),
    Query(Query),
}

impl<'a> From<&'a str> for QueryInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Selector(value)
    }
}

impl<'a> From<&'a String> for QueryInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Selector(value.as_str())
    }
}

impl From<NodeId> for QueryInput<'_> {
    fn from(value: NodeId) -> Self {
        Self::Element(value)
    }
}

impl From<Vec<NodeId>> for QueryInput<'_> {
    fn from(value: Vec<NodeId>) -> Self {
        Self::Elements(value)
    }
}

impl From<Query> for QueryInput<'_> {
    fn from(value: Query) -> Self {
        Self::Query(value)
    }
}

impl<'a, T: Into<QueryInput<'a>>> From<Option<T>> for QueryInput<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// How a query-level name maps onto an element method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMethod {
    /// Applied to every member; a bare call reads from the first member.
    Invoker(String),
    /// Applied to every member, results gathered into a new query.
    Transformer(String),
}

const INVOKERS: &[&str] = &[
    "width",
    "height",
    "position",
    "top",
    "right",
    "bottom",
    "left",
    "attr",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "paddingTop",
    "paddingVertical",
    "paddingHorizontal",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "opacity",
    "border",
    "borderVertical",
    "borderHorizontal",
    "borderTop",
    "borderRight",
    "borderBottom",
    "borderLeft",
    "borderTopWidth",
    "borderRightWidth",
    "borderBottomWidth",
    "borderLeftWidth",
    "borderWidth",
    "borderRadius",
    "center",
    "centerX",
    "centerY",
    "background",
    "backgroundColor",
    "classes",
    "addClass",
    "removeClass",
    "html",
    "appendTo",
    "removeFrom",
    "prependTo",
    "prepend",
    "has",
    "tag",
    "matches",
    "src",
    "float",
    "visibility",
    "layer",
    "rotate",
    "x",
    "y",
    "z",
    "transform",
    "transition",
    "tooltip",
    "shadow",
    "display",
    "cursor",
];

const TRANSFORMERS: &[&str] = &["closest", "find", "next", "prev", "siblings"];

pub(crate) fn default_query_methods() -> MethodTable<QueryMethod> {
    static DEFAULT: OnceLock<MethodTable<QueryMethod>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| {
            let mut table = MethodTable::new("Query");
            table.implement(
                INVOKERS
                    .iter()
                    .map(|name| (*name, QueryMethod::Invoker((*name).to_string()))),
            );
            table.implement(
                TRANSFORMERS
                    .iter()
                    .map(|name| (*name, QueryMethod::Transformer((*name).to_string()))),
            );
            table
        })
        .clone()
}

impl Query {
    pub(crate) fn from_members(members: Vec<NodeId>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }

    pub fn get(&self, idx: usize) -> Option<NodeId> {
        self.members.get(idx).copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.members.first().copied()
    }

    /// Member at `i` modulo the length, for negative and over-range `i` too.
    pub fn index(&self, i: i64) -> Option<NodeId> {
        self.members.index_wrapped(i).copied()
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.members.iter().position(|member| *member == node)
    }

    /// Copy without any occurrence of `node`.
    pub fn without(&self, node: NodeId) -> Query {
        Self::from_members(
            self.members
                .iter()
                .copied()
                .filter(|member| *member != node)
                .collect(),
        )
    }

    /// Element children of every member, parent by parent, optionally filtered.
    /// A blank selector filters nothing.
    pub fn children(&self, doc: &Document, selector: Option<&str>) -> Result<Query> {
        let groups = selector
            .filter(|selector| !selector.trim().is_empty())
            .map(crate::selector::parse_selector_groups)
            .transpose()?;
        let mut matches = Vec::new();
        for member in &self.members {
            for child in doc.dom.child_elements(*member) {
                if groups
                    .as_ref()
                    .is_none_or(|groups| doc.dom.matches_any_group(child, groups))
                {
                    matches.push(child);
                }
            }
        }
        Ok(Self::from_members(matches))
    }

    /// Dispatches `name` through the document's query method table.
    pub fn call(&self, doc: &mut Document, name: &str, args: &[Value]) -> Result<Value> {
        match lookup(doc, name)? {
            QueryMethod::Invoker(method) => self.run_invoker(doc, &method, args),
            QueryMethod::Transformer(method) => {
                self.run_transformer(doc, name, &method, args).map(Value::Query)
            }
        }
    }

    /// Runs an invoker on every member and returns the query, or with no
    /// arguments reads from the first member only (`Undefined` when empty).
    pub fn invoke(&self, doc: &mut Document, name: &str, args: &[Value]) -> Result<Value> {
        match lookup(doc, name)? {
            QueryMethod::Invoker(method) => self.run_invoker(doc, &method, args),
            QueryMethod::Transformer(_) => Err(Error::invalid_argument(
                name,
                "is a transformer; use Query::transform",
            )),
        }
    }

    /// Runs a transformer on every member, splicing query results and
    /// dropping absent ones.
    pub fn transform(&self, doc: &mut Document, name: &str, args: &[Value]) -> Result<Query> {
        match lookup(doc, name)? {
            QueryMethod::Transformer(method) => self.run_transformer(doc, name, &method, args),
            QueryMethod::Invoker(_) => Err(Error::invalid_argument(
                name,
                "is an invoker; use Query::invoke",
            )),
        }
    }

    fn run_invoker(&self, doc: &mut Document, method: &str, args: &[Value]) -> Result<Value> {
        if args.is_empty() {
            return match self.first() {
                Some(first) => doc.call(first, method, &[]),
                None => Ok(Value::Undefined),
            };
        }
        for member in &self.members {
            doc.call(*member, method, args)?;
        }
        Ok(Value::Query(self.clone()))
    }

    fn run_transformer(
        &self,
        doc: &mut Document,
        name: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Query> {
        let mut gathered = Vec::new();
        for member in &self.members {
            match doc.call(*member, method, args)? {
                Value::Query(query) => gathered.extend(query.members),
                Value::Element(node) => gathered.push(node),
                Value::Undefined | Value::Null => {}
                other => {
                    return Err(Error::invalid_argument(
                        name,
                        format!("transformer produced {}", other.kind().as_str()),
                    ));
                }
            }
        }
        Ok(Self::from_members(gathered))
    }

    /// Registers `handler` for `event` on every member with a wildcard discriminator.
    pub fn on(
        &self,
        doc: &mut Document,
        event: &str,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<Vec<SubscriptionId>> {
        self.subscribe(doc, event, Discriminator::Any, None, Rc::new(handler))
    }

    pub fn on_detail(
        &self,
        doc: &mut Document,
        event: &str,
        detail: impl Into<Discriminator>,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<Vec<SubscriptionId>> {
        self.subscribe(doc, event, detail.into(), None, Rc::new(handler))
    }

    /// Like [`Query::on_detail`], but only for events whose origin matches `selector`.
    pub fn on_filtered(
        &self,
        doc: &mut Document,
        event: &str,
        detail: impl Into<Discriminator>,
        selector: &str,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<Vec<SubscriptionId>> {
        self.subscribe(doc, event, detail.into(), Some(selector), Rc::new(handler))
    }

    fn subscribe(
        &self,
        doc: &mut Document,
        event: &str,
        discriminator: Discriminator,
        delegation: Option<&str>,
        handler: Handler,
    ) -> Result<Vec<SubscriptionId>> {
        self.members
            .iter()
            .map(|member| {
                doc.subscribe(
                    *member,
                    event,
                    discriminator.clone(),
                    delegation,
                    Rc::clone(&handler),
                )
            })
            .collect()
    }

    /// Removes every record under `event` on every member.
    pub fn off_all(&self, doc: &mut Document, event: &str) -> Result<&Self> {
        for member in &self.members {
            doc.unregister(*member, event)?;
        }
        Ok(self)
    }

    pub fn off(&self, doc: &mut Document, node: NodeId, id: SubscriptionId) -> bool {
        self.members.contains(&node) && doc.off(node, id)
    }

    /// Makes `event` a dead end on every member: default prevented, propagation stopped.
    pub fn suppress(&self, doc: &mut Document, event: &str) -> Result<Vec<SubscriptionId>> {
        self.members
            .iter()
            .map(|member| doc.suppress(*member, event))
            .collect()
    }

    pub fn trigger(&self, doc: &mut Document, event: &str) -> Result<&Self> {
        for member in &self.members {
            doc.trigger(*member, event)?;
        }
        Ok(self)
    }

    pub fn dispatch(
        &self,
        doc: &mut Document,
        event: &str,
        detail: impl Into<Value>,
    ) -> Result<&Self> {
        let detail = detail.into();
        for member in &self.members {
            doc.dispatch(*member, event, detail.clone())?;
        }
        Ok(self)
    }

    /// `mousemove` handler that only runs while the pointer is held down on the body.
    pub fn drag(
        &self,
        doc: &mut Document,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<Vec<SubscriptionId>> {
        let handler: Handler = Rc::new(handler);
        self.members
            .iter()
            .map(|member| doc.drag_handler(*member, Rc::clone(&handler)))
            .collect()
    }
}

fn lookup(doc: &Document, name: &str) -> Result<QueryMethod> {
    doc.query_methods
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownMethod(format!("Query.{name}")))
}

impl IntoIterator for Query {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound_index() {
        let query = Query::from_members(vec![NodeId(4), NodeId(5), NodeId(6)]);
        assert_eq!(query.index(0), Some(NodeId(4)));
        assert_eq!(query.index(-1), Some(NodeId(6)));
        assert_eq!(query.index(7), Some(NodeId(5)));
        assert_eq!(Query::default().index(3), None);
    }

    #[test]
    fn without_drops_every_occurrence() {
        let query = Query::from_members(vec![NodeId(1), NodeId(2), NodeId(1)]);
        assert_eq!(query.without(NodeId(1)).members(), &[NodeId(2)]);
        assert_eq!(query.index_of(NodeId(2)), Some(1));
    }

    #[test]
    fn default_table_splits_invokers_and_transformers() {
        let table = default_query_methods();
        assert_eq!(table.get("find"), Some(&QueryMethod::Transformer("find".into())));
        assert_eq!(table.get("center"), Some(&QueryMethod::Invoker("center".into())));
        assert_eq!(table.len(), INVOKERS.len() + TRANSFORMERS.len());
        assert!(!table.contains("mousedown"));
    }
}
