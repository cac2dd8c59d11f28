use std::cell::RefCell;
use std::rc::Rc;

use natives::{Debounced, Document, Throttled};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError};

const TIMER_PROPTEST_REGRESSION_FILE: &str = "tests/proptest-regressions/timer_property_test.txt";
const DEFAULT_TIMER_PROPTEST_CASES: u32 = 128;

fn timer_proptest_cases() -> u32 {
    std::env::var("NATIVES_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TIMER_PROPTEST_CASES)
}

fn fail(err: natives::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

type Firings = Rc<RefCell<Vec<(i64, usize)>>>;

fn recorder() -> (Firings, impl Fn(&mut Document, usize) + 'static) {
    let firings = Firings::default();
    let sink = Rc::clone(&firings);
    (firings, move |doc: &mut Document, arg: usize| {
        sink.borrow_mut().push((doc.now_ms(), arg))
    })
}

/// Absolute call times from gaps between consecutive calls.
fn call_times(gaps: &[i64]) -> Vec<i64> {
    gaps.iter()
        .scan(0i64, |now, gap| {
            *now += gap;
            Some(*now)
        })
        .collect()
}

// A call is the last of its burst when the next one comes `wait` or more later.
fn expected_debounce(times: &[i64], wait: i64) -> Vec<(i64, usize)> {
    times
        .iter()
        .enumerate()
        .filter(|(idx, time)| times.get(idx + 1).is_none_or(|next| *next >= **time + wait))
        .map(|(idx, time)| (time + wait, idx))
        .collect()
}

// Trailing window: opened by a call while idle, fires at its end with the
// latest arguments.
fn expected_throttle(times: &[i64], wait: i64) -> Vec<(i64, usize)> {
    let mut fired = Vec::new();
    let mut pending: Option<(i64, usize)> = None;
    for (idx, time) in times.iter().enumerate() {
        if let Some((due, arg)) = pending {
            if due <= *time {
                fired.push((due, arg));
                pending = None;
            }
        }
        pending = match pending {
            Some((due, _)) => Some((due, idx)),
            None => Some((time + wait, idx)),
        };
    }
    fired.extend(pending);
    fired
}

fn gaps_strategy() -> BoxedStrategy<Vec<i64>> {
    vec(0i64..40, 1..=16).boxed()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: timer_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(TIMER_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn debounce_matches_burst_model(gaps in gaps_strategy(), wait in 1i64..30) {
        let mut doc = Document::from_html("").map_err(fail)?;
        let (firings, callback) = recorder();
        let debounced = Debounced::new(wait, callback);
        let times = call_times(&gaps);
        for (idx, time) in times.iter().enumerate() {
            doc.advance_time_to(*time).map_err(fail)?;
            debounced.call(&mut doc, idx);
        }
        doc.flush().map_err(fail)?;
        prop_assert_eq!(firings.borrow().clone(), expected_debounce(&times, wait));
    }

    #[test]
    fn throttle_matches_window_model(gaps in gaps_strategy(), wait in 1i64..30) {
        let mut doc = Document::from_html("").map_err(fail)?;
        let (firings, callback) = recorder();
        let throttled = Throttled::new(wait, callback);
        let times = call_times(&gaps);
        for (idx, time) in times.iter().enumerate() {
            doc.advance_time_to(*time).map_err(fail)?;
            throttled.call(&mut doc, idx);
        }
        doc.flush().map_err(fail)?;
        prop_assert!(!throttled.is_pending());
        prop_assert_eq!(firings.borrow().clone(), expected_throttle(&times, wait));
    }
}
