use std::rc::Rc;

use crate::events::{Delegation, Discriminator, Event, Handler, Subscription, SubscriptionId};
use crate::selector::parse_selector_groups;
use crate::{Document, Error, NodeId, Result, Value};

impl Document {
    /// Listens for `event` on `node` whatever its detail.
    pub fn register(
        &mut self,
        node: NodeId,
        event: &str,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<SubscriptionId> {
        self.subscribe(node, event, Discriminator::Any, None, Rc::new(handler))
    }

    /// Listens for `event` when its normalized detail equals `detail`
    /// (`"*"` for any).
    pub fn register_detail(
        &mut self,
        node: NodeId,
        event: &str,
        detail: impl Into<Discriminator>,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<SubscriptionId> {
        self.subscribe(node, event, detail.into(), None, Rc::new(handler))
    }

    /// Delegated listener: fires only for events whose origin matches `selector`.
    pub fn register_filtered(
        &mut self,
        node: NodeId,
        event: &str,
        detail: impl Into<Discriminator>,
        selector: &str,
        handler: impl Fn(&mut Document, &mut Event) + 'static,
    ) -> Result<SubscriptionId> {
        self.subscribe(node, event, detail.into(), Some(selector), Rc::new(handler))
    }

    pub(crate) fn subscribe(
        &mut self,
        node: NodeId,
        event: &str,
        discriminator: Discriminator,
        selector: Option<&str>,
        handler: Handler,
    ) -> Result<SubscriptionId> {
        self.require_listener_target(node, event)?;
        let delegation = selector
            .map(|selector| {
                parse_selector_groups(selector).map(|groups| Delegation {
                    selector: selector.to_string(),
                    groups,
                })
            })
            .transpose()?;
        let id = self.listeners.next_id();
        tracing::debug!(
            %node,
            event,
            ?discriminator,
            delegated = delegation.is_some(),
            "listener registered"
        );
        self.listeners.add(
            node,
            Subscription {
                id,
                event: event.to_string(),
                discriminator,
                delegation,
                handler,
            },
        );
        Ok(id)
    }

    /// Removes every record for `event` on `node`; returns how many were removed.
    pub fn unregister(&mut self, node: NodeId, event: &str) -> Result<usize> {
        self.require_listener_target(node, event)?;
        Ok(self.listeners.remove_all(node, event))
    }

    pub fn off(&mut self, node: NodeId, id: SubscriptionId) -> bool {
        self.listeners.remove(node, id)
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners.count(node, event)
    }

    /// Makes `event` stop at `node` with its default prevented.
    pub fn suppress(&mut self, node: NodeId, event: &str) -> Result<SubscriptionId> {
        self.register(node, event, |_, event| {
            event.prevent_default();
            event.stop_propagation();
        })
    }

    /// Dispatches `event` with the wildcard detail `"*"`.
    pub fn trigger(&mut self, node: NodeId, event: &str) -> Result<Event> {
        self.dispatch(node, event, "*")
    }

    pub fn dispatch(
        &mut self,
        node: NodeId,
        event: &str,
        detail: impl Into<Value>,
    ) -> Result<Event> {
        let event = Event::new(event, node, detail.into(), self.scheduler.now_ms);
        self.dispatch_event(event)
    }

    /// Mouse event with a button code (1 left, 2 middle, 3 right).
    pub fn dispatch_pointer(&mut self, node: NodeId, event: &str, button: u32) -> Result<Event> {
        let event =
            Event::new(event, node, Value::Undefined, self.scheduler.now_ms).with_button(button);
        self.dispatch_event(event)
    }

    pub fn dispatch_key(&mut self, node: NodeId, event: &str, key_code: u32) -> Result<Event> {
        let event = Event::new(event, node, Value::Undefined, self.scheduler.now_ms)
            .with_key_code(key_code);
        self.dispatch_event(event)
    }

    /// Runs `event` from its target up through the ancestors.
    pub fn dispatch_event(&mut self, event: Event) -> Result<Event> {
        stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || self.dispatch_event_impl(event))
    }

    fn dispatch_event_impl(&mut self, mut event: Event) -> Result<Event> {
        let target = event.target;
        self.require_listener_target(target, &event.event_type)?;
        tracing::debug!(event = %event.event_type, %target, name = event.name(), "dispatch");

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        for node in path {
            event.current_target = node;
            self.invoke_listeners(node, &mut event);
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
            if !event.bubbles {
                break;
            }
        }
        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut Event) {
        for record in self.listeners.get(node, &event.event_type) {
            // Earlier handlers may have removed this one.
            if !self.listeners.is_live(node, &event.event_type, record.id) {
                continue;
            }
            let origin_matches = record
                .delegation
                .as_ref()
                .is_none_or(|delegation| {
                    self.dom.matches_any_group(event.target, &delegation.groups)
                });
            if !origin_matches {
                continue;
            }
            if !record.discriminator.matches(event.name()) {
                continue;
            }
            self.trace_event_line(format!(
                "[event] {} target={} current={} name={}",
                event.event_type,
                event.target,
                node,
                event.name()
            ));
            (record.handler)(self, event);
        }
    }

    fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type, event.target, outcome, event.default_prevented
        ));
    }

    // Elements and the document node itself (for window-level events).
    fn require_listener_target(&self, node: NodeId, event: &str) -> Result<()> {
        if node == self.dom.root || self.dom.element(node).is_some() {
            Ok(())
        } else {
            Err(Error::NotAnElement(format!("{event} listener target {node}")))
        }
    }
}
