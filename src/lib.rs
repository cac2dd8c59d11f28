use std::fmt;

mod decorate;
mod document;
mod dom;
mod events;
pub mod ext;
mod extend;
mod html;
mod location;
mod net;
mod query;
mod selector;
mod storage;
mod style_queue;
mod timers;
mod trace;
mod value;

pub use decorate::{Builtin, CustomMethod, ElementMethod};
pub use document::Document;
pub use events::{
    Discriminator, Event, EventFamily, Handler, SubscriptionId, button_name, event_family,
    key_name,
};
pub use ext::ObjectMap;
pub use extend::MethodTable;
pub use location::Viewport;
pub use net::{
    Method, MockTransport, Request, RequestOptions, Response, ResponseCallback, Transport,
};
pub use query::{Query, QueryInput, QueryMethod};
pub use storage::Storage;
pub use style_queue::StyleWrite;
pub use timers::{Debounced, PendingTimer, Throttled, TimerId};
pub use value::{Kind, Value};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("invalid argument for {method}: {message}")]
    InvalidArgument { method: String, message: String },
    #[error("node is not an element: {0}")]
    NotAnElement(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("timer error: {0}")]
    Timer(String),
}

impl Error {
    pub(crate) fn invalid_argument(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Handle to a node in a [`Document`].
///
/// Ids are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[cfg(test)]
mod tests;
