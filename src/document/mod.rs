use crate::decorate::{self, ElementMethod, default_element_methods};
use crate::dom::Dom;
use crate::events::ListenerStore;
use crate::ext::{ObjectMap, Rng};
use crate::extend::MethodTable;
use crate::html::parse_fragment;
use crate::location::{Viewport, parse_params};
use crate::net::{MockTransport, Transport};
use crate::query::{Query, QueryInput, QueryMethod, default_query_methods};
use crate::storage::Storage;
use crate::style_queue::StyleQueue;
use crate::timers::SchedulerState;
use crate::trace::TraceState;
use crate::{Error, NodeId, Result, Value};

mod dispatch;
mod window;

/// A deterministic page: DOM, listeners, virtual clock, style frame,
/// storage, URL params and network transport.
#[derive(Debug)]
pub struct Document {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) scheduler: SchedulerState,
    pub(crate) styles: StyleQueue,
    pub(crate) element_methods: MethodTable<ElementMethod>,
    pub(crate) query_methods: MethodTable<QueryMethod>,
    pub(crate) storage: Storage,
    pub(crate) url: String,
    pub(crate) params: Option<ObjectMap>,
    pub(crate) viewport: Viewport,
    pub(crate) dragging: bool,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) rng: Rng,
    pub(crate) trace: TraceState,
    pub(crate) head: NodeId,
    pub(crate) body: NodeId,
}

impl Document {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_impl("about:blank", html, Storage::default())
    }

    pub fn from_html_with_url(url: &str, html: &str) -> Result<Self> {
        Self::from_html_impl(url, html, Storage::default())
    }

    pub fn from_html_with_url_and_storage(url: &str, html: &str, storage: Storage) -> Result<Self> {
        Self::from_html_impl(url, html, storage)
    }

    fn from_html_impl(url: &str, html: &str, storage: Storage) -> Result<Self> {
        let mut dom = parse_fragment(html)?;
        dom.ensure_document_structure();
        let head = dom
            .head()
            .ok_or_else(|| Error::HtmlParse("document has no <head>".into()))?;
        let body = dom
            .body()
            .ok_or_else(|| Error::HtmlParse("document has no <body>".into()))?;

        let mut document = Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: SchedulerState::default(),
            styles: StyleQueue::default(),
            element_methods: default_element_methods(),
            query_methods: default_query_methods(),
            storage,
            url: url.to_string(),
            params: parse_params(url),
            viewport: Viewport::default(),
            dragging: false,
            transport: Box::new(MockTransport::default()),
            rng: Rng::new(0x9E37_79B9_7F4A_7C15),
            trace: TraceState::default(),
            head,
            body,
        };
        document.install_drag_tracking()?;
        tracing::debug!(url, "document created");
        Ok(document)
    }

    /// Builds a [`Query`].
    ///
    /// A blank selector yields an empty query. A selector of the form `<tag>`
    /// creates one detached element instead of matching. Elements and vectors
    /// are checked to be element nodes; a query
    /// is passed through as is.
    pub fn query<'a>(&mut self, input: impl Into<QueryInput<'a>>) -> Result<Query> {
        match input.into() {
            QueryInput::None => Ok(Query::default()),
            QueryInput::Selector(selector) if selector.trim().is_empty() => Ok(Query::default()),
            QueryInput::Selector(selector) => match creation_tag(selector) {
                Some(tag) => {
                    let node = self.dom.create_detached_element(tag);
                    Ok(Query::from_members(vec![node]))
                }
                None => Ok(Query::from_members(self.dom.query_selector_all(selector)?)),
            },
            QueryInput::Element(node) => {
                self.dom.require_element(node, "query")?;
                Ok(Query::from_members(vec![node]))
            }
            QueryInput::Elements(nodes) => {
                for node in &nodes {
                    self.dom.require_element(*node, "query")?;
                }
                Ok(Query::from_members(nodes))
            }
            QueryInput::Query(query) => Ok(query),
        }
    }

    /// Calls element method `name` on `node`.
    pub fn call(&mut self, node: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .element_methods
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMethod(format!("Element.{name}")))?;
        self.dom.require_element(node, name)?;
        decorate::apply(self, node, &method, args)
    }

    /// Adds element methods to this document's table; returns the replaced names.
    pub fn implement_element_methods<I, S>(&mut self, members: I) -> Vec<String>
    where
        I: IntoIterator<Item = (S, ElementMethod)>,
        S: Into<String>,
    {
        let replaced = self.element_methods.implement(members);
        self.trace_overwrites(self.element_methods.type_name(), &replaced);
        replaced
    }

    pub fn implement_query_methods<I, S>(&mut self, members: I) -> Vec<String>
    where
        I: IntoIterator<Item = (S, QueryMethod)>,
        S: Into<String>,
    {
        let replaced = self.query_methods.implement(members);
        self.trace_overwrites(self.query_methods.type_name(), &replaced);
        replaced
    }

    fn trace_overwrites(&mut self, type_name: &str, replaced: &[String]) {
        for name in replaced {
            self.trace_line(format!("[extend] {type_name}.{name} overwritten"));
        }
    }

    pub fn element_methods(&self) -> &MethodTable<ElementMethod> {
        &self.element_methods
    }

    pub fn query_methods(&self) -> &MethodTable<QueryMethod> {
        &self.query_methods
    }

    pub fn document_node(&self) -> NodeId {
        self.dom.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// New element not attached anywhere.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.dom.create_detached_element(tag_name.to_ascii_lowercase())
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    /// Element children in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.dom.child_elements(node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.dom.text_content(node)
    }

    pub fn inner_html(&self, node: NodeId) -> Result<String> {
        self.dom.inner_html(node)
    }

    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        self.dom.set_inner_html(node, html)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.dom.set_attr(node, name, value)
    }

    /// Inline style value as last flushed; queued writes are not visible.
    pub fn style(&self, node: NodeId, property: &str) -> Result<String> {
        self.dom.style_get(node, property)
    }

    /// Supplies the geometry a layout engine would compute.
    pub fn set_client_size(&mut self, node: NodeId, width: f64, height: f64) -> Result<()> {
        self.dom.set_client_size(node, width, height)
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        self.dom.matches_selector(node, selector)
    }

    pub fn dump(&self, node: NodeId) -> String {
        self.dom.dump_node(node)
    }
}

// `<tag>` or `<tag/>` with an ASCII tag name.
fn creation_tag(selector: &str) -> Option<String> {
    let inner = selector.trim().strip_prefix('<')?.strip_suffix('>')?;
    let inner = inner.strip_suffix('/').unwrap_or(inner).trim();
    let valid = inner
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then(|| inner.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_tag_forms() {
        assert_eq!(creation_tag("<script>"), Some("script".into()));
        assert_eq!(creation_tag(" <DIV/> "), Some("div".into()));
        assert_eq!(creation_tag("<my-widget>"), Some("my-widget".into()));
        assert_eq!(creation_tag("<>"), None);
        assert_eq!(creation_tag("div"), None);
        assert_eq!(creation_tag("<a b>"), None);
    }
}
