use super::*;

use crate::ext::SliceExt;

fn capture() -> (Rc<RefCell<Vec<String>>>, impl Fn(&mut Document, &str) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |_: &mut Document, body: &str| {
        sink.borrow_mut().push(body.to_string())
    })
}

#[test]
fn success_callback_runs_on_the_next_turn() -> Result<()> {
    let mut doc = Document::from_html("")?;
    let transport = MockTransport::new();
    transport.set_response("/api/items?page=2&sort=asc", 200, "[1,2]");
    doc.set_transport(transport.clone());

    let (bodies, on_success) = capture();
    let (errors, on_error) = capture();
    doc.get(
        RequestOptions::new("/api/items")
            .params(ObjectMap::new().with("page", 2).with("sort", "asc"))
            .on_success(on_success)
            .on_error(on_error),
    );
    assert!(bodies.borrow().is_empty());

    doc.advance_time(0)?;
    assert_eq!(*bodies.borrow(), ["[1,2]"]);
    assert!(errors.borrow().is_empty());
    assert_eq!(
        transport.take_calls(),
        vec![Request {
            method: Method::Get,
            url: "/api/items?page=2&sort=asc".into(),
        }]
    );
    Ok(())
}

#[test]
fn completed_exchanges_with_error_status_still_succeed() -> Result<()> {
    let mut doc = Document::from_html("")?;
    let transport = MockTransport::new();
    transport.set_response("/missing", 404, "not found");
    doc.set_transport(transport.clone());

    let (bodies, on_success) = capture();
    doc.post(RequestOptions::new("/missing").on_success(on_success));
    doc.flush()?;
    assert_eq!(*bodies.borrow(), ["not found"]);
    assert_eq!(transport.take_calls()[0].method, Method::Post);
    Ok(())
}

#[test]
fn transport_failure_reaches_only_the_error_callback() -> Result<()> {
    let mut doc = Document::from_html("")?;
    let transport = MockTransport::new();
    transport.set_failure("/down", "connection refused");
    doc.set_transport(transport);
    doc.enable_trace(true);
    doc.set_trace_stderr(false);

    let (bodies, on_success) = capture();
    let (errors, on_error) = capture();
    doc.del(
        RequestOptions::new("/down")
            .on_success(on_success)
            .on_error(on_error),
    );
    doc.flush()?;
    assert!(bodies.borrow().is_empty());
    assert_eq!(*errors.borrow(), ["connection refused"]);
    assert!(
        doc.take_trace_logs()
            .iter()
            .any(|line| line == "[net] DELETE /down failed status=0")
    );

    // Unrouted URLs fail with an empty body.
    let (errors, on_error) = capture();
    doc.put(RequestOptions::new("/unknown").on_error(on_error));
    doc.flush()?;
    assert_eq!(*errors.borrow(), [""]);
    Ok(())
}

#[test]
fn storage_round_trips_through_the_document() -> Result<()> {
    let storage = Storage::from_entries([("theme", "\"dark\"")]);
    let mut doc = Document::from_html_with_url_and_storage("https://example.com/", "", storage)?;
    assert_eq!(doc.storage().load::<String>("theme")?, Some("dark".to_string()));

    doc.storage_mut().save("sizes", &[1, 2, 3])?;
    assert_eq!(doc.storage().get_item("sizes"), Some("[1,2,3]"));
    assert_eq!(doc.storage().load::<Vec<u8>>("sizes")?, Some(vec![1, 2, 3]));
    assert!(doc.storage_mut().erase("sizes"));
    assert_eq!(doc.storage().load::<Vec<u8>>("sizes")?, None);
    Ok(())
}

#[test]
fn url_params_are_parsed_once() -> Result<()> {
    let doc = Document::from_html_with_url("https://example.com/list?page=3&q=rust#top", "")?;
    assert_eq!(doc.url(), "https://example.com/list?page=3&q=rust#top");
    assert_eq!(doc.param("page"), Some(&Value::from("3")));
    assert_eq!(doc.param("q"), Some(&Value::from("rust")));
    assert_eq!(doc.param("missing"), None);

    let plain = Document::from_html("")?;
    assert_eq!(plain.params(), None);
    Ok(())
}

#[test]
fn script_is_appended_to_head() -> Result<()> {
    let mut doc = Document::from_html("<head><title>t</title></head><body></body>")?;
    let script = doc.script("/app.js")?;
    assert_eq!(doc.parent(script), Some(doc.head()));
    assert_eq!(doc.attr(script, "src").as_deref(), Some("/app.js"));
    assert_eq!(doc.query("head > script[src='/app.js']")?.members(), &[script]);
    Ok(())
}

#[test]
fn seeded_randomness_is_reproducible() -> Result<()> {
    let mut left = Document::from_html("")?;
    let mut right = Document::from_html("")?;
    left.set_random_seed(7);
    right.set_random_seed(7);
    let a = (left.random(), left.random());
    let b = (right.random(), right.random());
    assert_eq!(a, b);
    assert!((0.0..1.0).contains(&a.0));

    let items = [1, 2, 3, 4];
    let shuffled = items.shuffled(left.rng());
    let mut sorted = shuffled.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, items);
    Ok(())
}
