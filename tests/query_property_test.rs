use natives::{Document, Query, Value};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError};

const QUERY_PROPTEST_REGRESSION_FILE: &str = "tests/proptest-regressions/query_property_test.txt";
const DEFAULT_QUERY_PROPTEST_CASES: u32 = 96;

fn query_proptest_cases() -> u32 {
    std::env::var("NATIVES_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_QUERY_PROPTEST_CASES)
}

fn fail(err: natives::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

/// One `<ul>` per entry; entry `n` gives it `n` items, every third marked `.odd`.
fn lists_html(sizes: &[usize]) -> String {
    let mut html = String::new();
    let mut counter = 0usize;
    for size in sizes {
        html.push_str("<ul>");
        for _ in 0..*size {
            let class = if counter % 3 == 0 { " class='odd'" } else { "" };
            html.push_str(&format!("<li{class}>{counter}</li>"));
            counter += 1;
        }
        html.push_str("</ul>");
    }
    html
}

fn texts(doc: &Document, query: &Query) -> Vec<String> {
    query.iter().map(|node| doc.text_content(node)).collect()
}

fn list_sizes_strategy() -> BoxedStrategy<Vec<usize>> {
    vec(0usize..6, 0..=5).boxed()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: query_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(QUERY_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn children_count_and_order_follow_parents(sizes in list_sizes_strategy()) {
        let mut doc = Document::from_html(&lists_html(&sizes)).map_err(fail)?;
        let lists = doc.query("ul").map_err(fail)?;
        prop_assert_eq!(lists.len(), sizes.len());

        let children = lists.children(&doc, None).map_err(fail)?;
        let total: usize = sizes.iter().sum();
        prop_assert_eq!(children.len(), total);
        let expected = (0..total).map(|n| n.to_string()).collect::<Vec<_>>();
        prop_assert_eq!(texts(&doc, &children), expected);

        let odd = lists.children(&doc, Some(".odd")).map_err(fail)?;
        prop_assert_eq!(odd.len(), total.div_ceil(3));
    }

    #[test]
    fn index_wraps_modulo_length(sizes in list_sizes_strategy(), i in -40i64..40) {
        let mut doc = Document::from_html(&lists_html(&sizes)).map_err(fail)?;
        let items = doc.query("li").map_err(fail)?;
        match items.len() {
            0 => prop_assert_eq!(items.index(i), None),
            len => {
                let len = i64::try_from(len).map_err(|err| TestCaseError::fail(err.to_string()))?;
                let expected = usize::try_from(i.rem_euclid(len))
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                prop_assert_eq!(items.index(i), items.get(expected));
            }
        }
    }

    #[test]
    fn empty_queries_ignore_every_invoker(value in -100i64..100) {
        let mut doc = Document::from_html(&lists_html(&[2])).map_err(fail)?;
        let empty = doc.query(".absent").map_err(fail)?;
        let before = doc.inner_html(doc.body()).map_err(fail)?;
        for name in ["top", "opacity", "addClass", "html", "tooltip"] {
            let chained = empty.invoke(&mut doc, name, &[Value::from(value)]).map_err(fail)?;
            prop_assert_eq!(chained, Value::Query(empty.clone()));
            prop_assert_eq!(empty.invoke(&mut doc, name, &[]).map_err(fail)?, Value::Undefined);
        }
        prop_assert_eq!(doc.pending_style_writes(), 0);
        prop_assert_eq!(doc.inner_html(doc.body()).map_err(fail)?, before);
    }
}
