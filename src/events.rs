use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ext::NumberExt;
use crate::selector::SelectorPart;
use crate::{Document, NodeId, Value};

pub type Handler = Rc<dyn Fn(&mut Document, &mut Event)>;

/// Secondary filter on an event: a mouse button or key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discriminator {
    Any,
    Named(String),
}

impl Discriminator {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => name == normalized,
        }
    }
}

impl From<&str> for Discriminator {
    fn from(value: &str) -> Self {
        if value == "*" {
            Self::Any
        } else {
            Self::Named(value.to_string())
        }
    }
}

impl From<String> for Discriminator {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFamily {
    Plain,
    Pointer,
    Key,
}

pub fn event_family(event_type: &str) -> EventFamily {
    match event_type {
        "mousedown" | "mouseup" | "click" | "dblclick" | "contextmenu" => EventFamily::Pointer,
        "keydown" | "keyup" | "keypress" => EventFamily::Key,
        _ => EventFamily::Plain,
    }
}

pub fn button_name(code: u32) -> Option<&'static str> {
    f64::from(code).to_click()
}

pub fn key_name(code: u32) -> String {
    f64::from(code).to_key()
}

#[derive(Clone)]
pub(crate) struct Delegation {
    pub(crate) selector: String,
    pub(crate) groups: Vec<Vec<SelectorPart>>,
}

#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) event: String,
    pub(crate) discriminator: Discriminator,
    pub(crate) delegation: Option<Delegation>,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("discriminator", &self.discriminator)
            .field(
                "delegation",
                &self.delegation.as_ref().map(|d| d.selector.as_str()),
            )
            .finish_non_exhaustive()
    }
}

/// A dispatched event, as seen by handlers.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    /// Origin of the event; delegation selectors are matched against it.
    pub target: NodeId,
    pub current_target: NodeId,
    pub detail: Value,
    pub button: Option<u32>,
    pub key_code: Option<u32>,
    pub(crate) normalized: String,
    pub time_stamp_ms: i64,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub bubbles: bool,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId, detail: Value, time_stamp_ms: i64) -> Self {
        let mut event = Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            detail,
            button: None,
            key_code: None,
            normalized: String::new(),
            time_stamp_ms,
            default_prevented: false,
            propagation_stopped: false,
            bubbles: true,
        };
        event.normalize();
        event
    }

    pub(crate) fn with_button(mut self, button: u32) -> Self {
        self.button = Some(button);
        self.normalize();
        self
    }

    pub(crate) fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = Some(key_code);
        self.normalize();
        self
    }

    // Pointer codes become button names and key codes key names; otherwise the
    // detail's string form is the discriminator.
    fn normalize(&mut self) {
        let from_code = match event_family(&self.event_type) {
            EventFamily::Pointer => self
                .button
                .map(|code| button_name(code).unwrap_or_default().to_string()),
            EventFamily::Key => self.key_code.map(key_name),
            EventFamily::Plain => None,
        };
        self.normalized = from_code.unwrap_or_else(|| self.detail.to_display_string());
    }

    /// Normalized discriminator name, e.g. `"left"` or `"esc"`.
    pub fn name(&self) -> &str {
        &self.normalized
    }

    pub fn click(&self) -> Option<&'static str> {
        self.button.and_then(button_name)
    }

    pub fn key(&self) -> Option<String> {
        self.key_code.map(key_name)
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Subscription>>>,
    next_id: u64,
}

impl ListenerStore {
    pub(crate) fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub(crate) fn add(&mut self, node_id: NodeId, subscription: Subscription) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(subscription.event.clone())
            .or_default()
            .push(subscription);
    }

    /// Drops every record for `event` on the node; returns how many were removed.
    pub(crate) fn remove_all(&mut self, node_id: NodeId, event: &str) -> usize {
        let Some(events) = self.map.get_mut(&node_id) else {
            return 0;
        };
        let removed = events.remove(event).map_or(0, |records| records.len());
        if events.is_empty() {
            self.map.remove(&node_id);
        }
        removed
    }

    pub(crate) fn remove(&mut self, node_id: NodeId, id: SubscriptionId) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let mut removed = false;
        events.retain(|_, records| {
            if let Some(pos) = records.iter().position(|record| record.id == id) {
                records.remove(pos);
                removed = true;
            }
            !records.is_empty()
        });
        if events.is_empty() {
            self.map.remove(&node_id);
        }
        removed
    }

    /// Snapshot of the records, so handlers may (un)register while dispatching.
    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Subscription> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn is_live(&self, node_id: NodeId, event: &str, id: SubscriptionId) -> bool {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .is_some_and(|records| records.iter().any(|record| record.id == id))
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_by_family() {
        let node = NodeId(1);
        let click = Event::new("mousedown", node, Value::Undefined, 0).with_button(3);
        assert_eq!(click.name(), "right");
        assert_eq!(click.click(), Some("right"));

        let key = Event::new("keyup", node, Value::Undefined, 0).with_key_code(27);
        assert_eq!(key.name(), "esc");
        let letter = Event::new("keydown", node, Value::Undefined, 0).with_key_code(65);
        assert_eq!(letter.name(), "a");

        let custom = Event::new("saved", node, Value::from("draft"), 0);
        assert_eq!(custom.name(), "draft");
        assert_eq!(event_family("saved"), EventFamily::Plain);
    }

    #[test]
    fn discriminator_wildcard() {
        assert_eq!(Discriminator::from("*"), Discriminator::Any);
        assert!(Discriminator::Any.matches("anything"));
        assert!(Discriminator::from("left").matches("left"));
        assert!(!Discriminator::from("left").matches("*"));
    }
}
