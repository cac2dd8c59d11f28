use std::rc::Rc;

use crate::events::{Event, Handler, SubscriptionId};
use crate::ext::{ObjectMap, Rng};
use crate::location::Viewport;
use crate::net::Transport;
use crate::storage::Storage;
use crate::{Document, NodeId, Result, Value};

impl Document {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query-string pairs of the document URL, parsed once at creation.
    pub fn params(&self) -> Option<&ObjectMap> {
        self.params.as_ref()
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref()?.get(key)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Sets the viewport and dispatches `resize` on the document node.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<Event> {
        self.viewport = Viewport { width, height };
        let node = self.dom.root;
        let mut event = Event::new("resize", node, Value::Undefined, self.scheduler.now_ms);
        event.bubbles = false;
        self.dispatch_event(event)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// `mousemove` listener on `node` that only runs while the left button is
    /// held down on the body.
    pub fn drag(
        &mut self,
        node: NodeId,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<SubscriptionId> {
        self.drag_handler(node, Rc::new(handler))
    }

    pub(crate) fn drag_handler(
        &mut self,
        node: NodeId,
        handler: Handler,
    ) -> Result<SubscriptionId> {
        self.register(node, "mousemove", move |doc, event| {
            if doc.dragging {
                handler(doc, event);
            }
        })
    }

    pub(crate) fn install_drag_tracking(&mut self) -> Result<()> {
        let body = self.body;
        self.register_detail(body, "mousedown", "left", |doc, _| doc.dragging = true)?;
        self.register_detail(body, "mouseup", "left", |doc, _| doc.dragging = false)?;
        Ok(())
    }

    /// Appends `<script src=...>` to the head and returns it.
    pub fn script(&mut self, src: &str) -> Result<NodeId> {
        let node = self.dom.create_detached_element("script".into());
        self.dom.set_attr(node, "src", src)?;
        self.dom.append_child(self.head, node)?;
        self.trace_line(format!("[net] script {src}"));
        Ok(node)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Box::new(transport);
    }

    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    /// Uniform in `[0, 1)` from the document's seeded generator.
    pub fn random(&mut self) -> f64 {
        self.rng.next_f64()
    }

    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }
}
