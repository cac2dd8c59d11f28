use super::*;

const TOOLBAR: &str = r#"
    <div id='bar'>
      <button class='btn' id='save'>save</button>
      <span id='label'>label</span>
      <div id='group'><button class='btn' id='nested'>x</button></div>
    </div>
"#;

#[test]
fn delegated_mousedown_fires_only_from_matching_origin() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let bar = element(&doc, "bar")?;
    let save = element(&doc, "save")?;
    let label = element(&doc, "label")?;
    let nested = element(&doc, "nested")?;

    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);
    doc.register_filtered(bar, "mousedown", "left", ".btn", move |_, event| {
        sink.borrow_mut().push((event.target, event.current_target));
    })?;

    doc.dispatch_pointer(save, "mousedown", 1)?;
    doc.dispatch_pointer(label, "mousedown", 1)?;
    doc.dispatch_pointer(bar, "mousedown", 1)?;
    doc.dispatch_pointer(save, "mousedown", 3)?;
    doc.dispatch_pointer(nested, "mousedown", 1)?;

    assert_eq!(*hits.borrow(), vec![(save, bar), (nested, bar)]);
    Ok(())
}

#[test]
fn delegation_selector_is_validated_at_registration() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let bar = element(&doc, "bar")?;
    let result = doc.register_filtered(bar, "click", "*", "button[", |_, _| {});
    assert!(matches!(result, Err(Error::UnsupportedSelector(_))));
    assert_eq!(doc.listener_count(bar, "click"), 0);
    Ok(())
}

#[test]
fn discriminators_follow_event_family() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let label = element(&doc, "label")?;
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    doc.register_detail(label, "keydown", "esc", move |_, event| {
        sink.borrow_mut().push(format!("key:{}", event.name()));
    })?;
    let sink = Rc::clone(&seen);
    doc.register_detail(label, "contextmenu", "right", move |_, event| {
        sink.borrow_mut().push(format!("menu:{:?}", event.click()));
    })?;
    let sink = Rc::clone(&seen);
    doc.register_detail(label, "saved", "draft", move |_, event| {
        sink.borrow_mut().push(format!("saved:{}", event.detail.to_display_string()));
    })?;

    doc.dispatch_key(label, "keydown", 27)?;
    doc.dispatch_key(label, "keydown", 13)?;
    doc.dispatch_pointer(label, "contextmenu", 3)?;
    doc.dispatch_pointer(label, "contextmenu", 1)?;
    doc.dispatch(label, "saved", "draft")?;
    doc.dispatch(label, "saved", "final")?;
    // A bare trigger carries the wildcard detail, which named records ignore.
    doc.trigger(label, "saved")?;

    assert_eq!(
        *seen.borrow(),
        vec![
            "key:esc".to_string(),
            "menu:Some(\"right\")".to_string(),
            "saved:draft".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn wildcard_records_see_every_dispatch() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let save = element(&doc, "save")?;
    let count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&count);
    doc.register(save, "click", move |_, _| sink.set(sink.get() + 1))?;

    doc.trigger(save, "click")?;
    doc.dispatch(save, "click", 42)?;
    doc.dispatch_pointer(save, "click", 2)?;
    assert_eq!(count.get(), 3);
    Ok(())
}

#[test]
fn bubbling_stops_at_stop_propagation() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let bar = element(&doc, "bar")?;
    let group = element(&doc, "group")?;
    let nested = element(&doc, "nested")?;

    let order = Rc::new(RefCell::new(Vec::new()));
    for (node, name) in [(nested, "nested"), (group, "group"), (bar, "bar")] {
        let sink = Rc::clone(&order);
        doc.register(node, "ping", move |_, _| sink.borrow_mut().push(name))?;
    }
    doc.trigger(nested, "ping")?;
    assert_eq!(*order.borrow(), ["nested", "group", "bar"]);

    order.borrow_mut().clear();
    doc.suppress(group, "ping")?;
    let event = doc.trigger(nested, "ping")?;
    assert_eq!(*order.borrow(), ["nested", "group"]);
    assert!(event.default_prevented);
    assert!(event.propagation_stopped);
    Ok(())
}

#[test]
fn unregister_and_off() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let save = element(&doc, "save")?;
    let count = Rc::new(Cell::new(0));

    let sink = Rc::clone(&count);
    let first = doc.register(save, "click", move |_, _| sink.set(sink.get() + 1))?;
    let sink = Rc::clone(&count);
    doc.register(save, "click", move |_, _| sink.set(sink.get() + 10))?;

    assert!(doc.off(save, first));
    assert!(!doc.off(save, first));
    doc.trigger(save, "click")?;
    assert_eq!(count.get(), 10);

    assert_eq!(doc.unregister(save, "click")?, 1);
    doc.trigger(save, "click")?;
    assert_eq!(count.get(), 10);
    Ok(())
}

#[test]
fn handler_removed_mid_dispatch_does_not_run() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let save = element(&doc, "save")?;
    let ran = Rc::new(Cell::new(false));

    doc.register(save, "click", |doc, event| {
        let target = event.current_target;
        let _ = doc.unregister(target, "click");
    })?;
    let sink = Rc::clone(&ran);
    doc.register(save, "click", move |_, _| sink.set(true))?;

    doc.trigger(save, "click")?;
    assert!(!ran.get());
    assert_eq!(doc.listener_count(save, "click"), 0);
    Ok(())
}

#[test]
fn query_batch_registration_shares_one_handler() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let buttons = doc.query(".btn")?;
    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);
    let ids = buttons.on(&mut doc, "press", move |_, event| {
        sink.borrow_mut().push(event.current_target);
    })?;
    assert_eq!(ids.len(), 2);

    buttons.trigger(&mut doc, "press")?;
    assert_eq!(hits.borrow().as_slice(), buttons.members());

    buttons.off_all(&mut doc, "press")?;
    buttons.dispatch(&mut doc, "press", "again")?;
    assert_eq!(hits.borrow().len(), 2);
    Ok(())
}

#[test]
fn drag_runs_only_between_left_mousedown_and_mouseup() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    let label = element(&doc, "label")?;
    let moves = Rc::new(Cell::new(0));
    let sink = Rc::clone(&moves);
    doc.drag(label, move |_, _| sink.set(sink.get() + 1))?;

    doc.dispatch(label, "mousemove", Value::Undefined)?;
    assert_eq!(moves.get(), 0);

    doc.dispatch_pointer(label, "mousedown", 3)?;
    assert!(!doc.is_dragging());
    doc.dispatch_pointer(label, "mousedown", 1)?;
    assert!(doc.is_dragging());
    doc.dispatch(label, "mousemove", Value::Undefined)?;
    doc.dispatch(label, "mousemove", Value::Undefined)?;

    doc.dispatch_pointer(label, "mouseup", 1)?;
    assert!(!doc.is_dragging());
    doc.dispatch(label, "mousemove", Value::Undefined)?;
    assert_eq!(moves.get(), 2);
    Ok(())
}

#[test]
fn resize_dispatches_on_the_document_node() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    assert_eq!(doc.viewport(), Viewport::default());
    let root = doc.document_node();
    let seen = Rc::new(Cell::new(0.0));
    let sink = Rc::clone(&seen);
    doc.register(root, "resize", move |doc, _| sink.set(doc.viewport().width))?;

    doc.resize(640.0, 480.0)?;
    assert_eq!(seen.get(), 640.0);
    assert_eq!(doc.viewport().height, 480.0);
    Ok(())
}

#[test]
fn listeners_need_an_element_or_the_document() -> Result<()> {
    let mut doc = Document::from_html("<p id='t'>text</p>")?;
    let paragraph = element(&doc, "t")?;
    let text = doc
        .dom
        .children(paragraph)
        .first()
        .copied()
        .ok_or_else(|| Error::NotAnElement("text".into()))?;
    assert!(matches!(
        doc.register(text, "click", |_, _| {}),
        Err(Error::NotAnElement(_))
    ));
    Ok(())
}

#[test]
fn event_trace_lines() -> Result<()> {
    let mut doc = Document::from_html(TOOLBAR)?;
    doc.enable_trace(true);
    doc.set_trace_stderr(false);
    let save = element(&doc, "save")?;
    doc.register(save, "click", |_, _| {})?;
    doc.trigger(save, "click")?;

    let logs = doc.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[event] click")));
    assert!(logs.iter().any(|line| line.contains("outcome=completed")));

    doc.set_trace_events(false);
    doc.trigger(save, "click")?;
    assert!(doc.take_trace_logs().is_empty());
    Ok(())
}
