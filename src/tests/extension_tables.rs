use super::*;

#[test]
fn custom_element_method_is_reachable_through_queries() -> Result<()> {
    let mut doc = Document::from_html("<p class='n'>a</p><p class='n'>bb</p>")?;
    let replaced = doc.implement_element_methods([(
        "textLength",
        ElementMethod::custom(|doc, node, _| Ok(Value::from(doc.text_content(node).len()))),
    )]);
    assert!(replaced.is_empty());
    doc.implement_query_methods([("textLength", QueryMethod::Invoker("textLength".into()))]);

    let paragraphs = doc.query(".n")?;
    assert_eq!(paragraphs.invoke(&mut doc, "textLength", &[])?, Value::from(1));
    let second = paragraphs.index(1).ok_or_else(|| Error::NotAnElement("p".into()))?;
    assert_eq!(doc.call(second, "textLength", &[])?, Value::from(2));
    Ok(())
}

#[test]
fn overwrites_are_reported_and_traced() -> Result<()> {
    let mut doc = Document::from_html("<div id='box'></div>")?;
    doc.enable_trace(true);
    doc.set_trace_stderr(false);

    // Identical re-registration is silent.
    let same = doc.implement_element_methods([("tag", ElementMethod::Builtin(Builtin::Tag))]);
    assert!(same.is_empty());

    let replaced = doc.implement_element_methods([(
        "tag",
        ElementMethod::custom(|_, _, _| Ok(Value::from("custom"))),
    )]);
    assert_eq!(replaced, ["tag"]);
    assert_eq!(doc.take_trace_logs(), ["[extend] Element.tag overwritten"]);

    let node = element(&doc, "box")?;
    assert_eq!(doc.call(node, "tag", &[])?, Value::from("custom"));
    Ok(())
}

#[test]
fn document_tables_do_not_leak_into_each_other() -> Result<()> {
    let mut extended = Document::from_html("")?;
    extended.implement_element_methods([(
        "ping",
        ElementMethod::custom(|_, _, _| Ok(Value::from("pong"))),
    )]);
    let fresh = Document::from_html("")?;

    assert!(extended.element_methods().contains("ping"));
    assert!(!fresh.element_methods().contains("ping"));
    assert_eq!(
        fresh.element_methods().len() + 1,
        extended.element_methods().len()
    );
    assert_eq!(fresh.query_methods().type_name(), "Query");
    Ok(())
}

#[test]
fn query_transformer_can_be_added() -> Result<()> {
    let mut doc = Document::from_html("<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>")?;
    doc.implement_element_methods([(
        "firstItem",
        ElementMethod::custom(|doc, node, _| {
            Ok(doc
                .children(node)
                .first()
                .map_or(Value::Undefined, |child| Value::Element(*child)))
        }),
    )]);
    doc.implement_query_methods([("firstItem", QueryMethod::Transformer("firstItem".into()))]);

    let lists = doc.query("ul, ol")?;
    let firsts = lists.transform(&mut doc, "firstItem", &[])?;
    let texts = firsts
        .iter()
        .map(|node| doc.text_content(node))
        .collect::<Vec<_>>();
    assert_eq!(texts, ["a", "c"]);
    Ok(())
}
