use std::collections::VecDeque;

use crate::{Document, NodeId, Result};

/// One deferred inline-style assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleWrite {
    pub node: NodeId,
    pub property: String,
    pub value: String,
}

/// Style writes waiting for the next frame, in call order.
#[derive(Debug, Default)]
pub(crate) struct StyleQueue {
    writes: VecDeque<StyleWrite>,
}

impl StyleQueue {
    pub(crate) fn push(&mut self, node: NodeId, property: &str, value: impl Into<String>) {
        self.writes.push_back(StyleWrite {
            node,
            property: property.to_string(),
            value: value.into(),
        });
    }

    pub(crate) fn drain(&mut self) -> Vec<StyleWrite> {
        self.writes.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Last queued value for one property of one node.
    pub(crate) fn pending_for(&self, node: NodeId, property: &str) -> Option<&str> {
        self.writes
            .iter()
            .rev()
            .find(|write| write.node == node && write.property == property)
            .map(|write| write.value.as_str())
    }
}

impl Document {
    /// Applies queued style writes in FIFO order and returns how many ran.
    ///
    /// Called automatically before every timer callback and at the end of
    /// `advance_time`, `advance_time_to` and `flush`.
    pub fn flush_frame(&mut self) -> Result<usize> {
        if self.styles.is_empty() {
            return Ok(0);
        }
        let writes = self.styles.drain();
        let applied = writes.len();
        for write in writes {
            // Nodes may have been discarded since the write was queued.
            if self.dom.element(write.node).is_none() {
                continue;
            }
            self.dom.style_set(write.node, &write.property, &write.value)?;
        }
        tracing::debug!(applied, "style frame flushed");
        Ok(applied)
    }

    /// Style writes not yet applied.
    pub fn pending_style_writes(&self) -> usize {
        self.styles.len()
    }

    pub(crate) fn queue_style(&mut self, node: NodeId, property: &str, value: impl Into<String>) {
        self.styles.push(node, property, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_for_sees_last_write() {
        let mut queue = StyleQueue::default();
        let node = NodeId(3);
        queue.push(node, "top", "1px");
        queue.push(NodeId(4), "top", "9px");
        queue.push(node, "top", "2px");
        assert_eq!(queue.pending_for(node, "top"), Some("2px"));
        assert_eq!(queue.pending_for(node, "left"), None);
        assert_eq!(queue.drain().len(), 3);
        assert!(queue.is_empty());
    }
}
