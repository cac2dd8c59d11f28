use super::*;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

mod event_delegation;
mod extension_tables;
mod network_and_storage;

fn element(doc: &Document, id: &str) -> Result<NodeId> {
    doc.by_id(id)
        .ok_or_else(|| Error::NotAnElement(format!("no element with id {id}")))
}
