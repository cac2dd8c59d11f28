use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Document, ObjectMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ResponseCallback = Rc<dyn Fn(&mut Document, &str)>;

/// Configuration of one request.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub to: String,
    pub params: Option<ObjectMap>,
    pub success: Option<ResponseCallback>,
    pub error: Option<ResponseCallback>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("to", &self.to)
            .field("params", &self.params)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl RequestOptions {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn params(mut self, params: ObjectMap) -> Self {
        self.params = Some(params);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&mut Document, &str) + 'static) -> Self {
        self.success = Some(Rc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&mut Document, &str) + 'static) -> Self {
        self.error = Some(Rc::new(callback));
        self
    }

    /// Target with the params appended as `?k=v&k=v`, for every method.
    pub fn url(&self) -> String {
        match &self.params {
            Some(params) => format!("{}?{}", self.to, params.destructure("&", "=")),
            None => self.to.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Sends requests for a [`Document`].
///
/// `Ok` is any completed exchange, whatever its status; `Err` is a network
/// failure.
pub trait Transport: fmt::Debug {
    fn send(&mut self, request: &Request) -> Result<Response, Response>;
}

#[derive(Debug, Default)]
struct MockRoutes {
    routes: HashMap<String, Result<Response, Response>>,
    calls: Vec<Request>,
}

/// In-memory transport keyed by full URL; clones share routes and the call log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Rc<RefCell<MockRoutes>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, url: &str, status: u16, body: &str) {
        self.inner.borrow_mut().routes.insert(
            url.to_string(),
            Ok(Response {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn set_failure(&self, url: &str, body: &str) {
        self.inner.borrow_mut().routes.insert(
            url.to_string(),
            Err(Response {
                status: 0,
                body: body.to_string(),
            }),
        );
    }

    pub fn take_calls(&self) -> Vec<Request> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: &Request) -> Result<Response, Response> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(request.clone());
        inner.routes.get(&request.url).cloned().unwrap_or_else(|| {
            Err(Response {
                status: 0,
                body: String::new(),
            })
        })
    }
}

impl Document {
    /// Sends the request; the matching callback runs on the next timer turn.
    pub fn xhr(&mut self, options: RequestOptions) {
        let request = Request {
            method: options.method,
            url: options.url(),
        };
        let outcome = self.transport.send(&request);
        let (callback, body) = match outcome {
            Ok(response) => {
                tracing::info!(
                    method = %request.method,
                    url = %request.url,
                    status = response.status,
                    "request completed"
                );
                self.trace_line(format!(
                    "[net] {} {} status={}",
                    request.method, request.url, response.status
                ));
                (options.success, response.body)
            }
            Err(response) => {
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    status = response.status,
                    "request failed"
                );
                self.trace_line(format!(
                    "[net] {} {} failed status={}",
                    request.method, request.url, response.status
                ));
                (options.error, response.body)
            }
        };
        if let Some(callback) = callback {
            self.set_timeout(0, move |doc| callback(doc, &body));
        }
    }

    pub fn get(&mut self, options: RequestOptions) {
        self.xhr(options.method(Method::Get));
    }

    pub fn post(&mut self, options: RequestOptions) {
        self.xhr(options.method(Method::Post));
    }

    pub fn put(&mut self, options: RequestOptions) {
        self.xhr(options.method(Method::Put));
    }

    pub fn del(&mut self, options: RequestOptions) {
        self.xhr(options.method(Method::Delete));
    }
}
