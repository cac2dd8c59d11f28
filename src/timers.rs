use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{Document, Error, Result};

pub(crate) type TimerCallback = Rc<dyn Fn(&mut Document)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) i64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: TimerId,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) interval_ms: Option<i64>,
    pub(crate) callback: TimerCallback,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("due_at", &self.due_at)
            .field("order", &self.order)
            .field("interval_ms", &self.interval_ms)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: i64,
    pub order: i64,
    pub interval_ms: Option<i64>,
}

#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) task_queue: Vec<ScheduledTask>,
    pub(crate) now_ms: i64,
    pub(crate) timer_step_limit: usize,
    pub(crate) next_timer_id: i64,
    pub(crate) next_task_order: i64,
    pub(crate) running_timer_id: Option<TimerId>,
    pub(crate) running_timer_canceled: bool,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
            running_timer_id: None,
            running_timer_canceled: false,
        }
    }
}

impl SchedulerState {
    pub(crate) fn allocate_timer_id(&mut self) -> TimerId {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        TimerId(id)
    }

    pub(crate) fn allocate_task_order(&mut self) -> i64 {
        let order = self.next_task_order;
        self.next_task_order += 1;
        order
    }

    pub(crate) fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }
}

impl Document {
    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Timer("timer step limit must be at least 1".into()));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    /// Runs `callback` once, `delay_ms` after now. Negative delays count as zero.
    pub fn set_timeout(
        &mut self,
        delay_ms: i64,
        callback: impl Fn(&mut Document) + 'static,
    ) -> TimerId {
        self.schedule(delay_ms, None, Rc::new(callback))
    }

    pub fn set_interval(
        &mut self,
        interval_ms: i64,
        callback: impl Fn(&mut Document) + 'static,
    ) -> TimerId {
        let interval_ms = interval_ms.max(0);
        self.schedule(interval_ms, Some(interval_ms), Rc::new(callback))
    }

    /// Next-turn scheduling.
    pub fn defer(&mut self, callback: impl Fn(&mut Document) + 'static) -> TimerId {
        self.set_timeout(1, callback)
    }

    fn schedule(
        &mut self,
        delay_ms: i64,
        interval_ms: Option<i64>,
        callback: TimerCallback,
    ) -> TimerId {
        let id = self.scheduler.allocate_timer_id();
        let order = self.scheduler.allocate_task_order();
        let due_at = self.scheduler.now_ms.saturating_add(delay_ms.max(0));
        self.scheduler.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            interval_ms,
            callback,
        });
        tracing::debug!(timer = id.0, due_at, ?interval_ms, "timer scheduled");
        self.trace_timer_line(format!(
            "[timer] schedule id={id} due_at={due_at} interval_ms={}",
            interval_ms.map_or_else(|| "none".into(), |value| value.to_string())
        ));
        id
    }

    /// Cancels a pending timer, or stops an interval from inside its own callback.
    pub fn clear_timer(&mut self, timer_id: TimerId) -> bool {
        let running = self.scheduler.running_timer_id == Some(timer_id);
        if running {
            self.scheduler.running_timer_canceled = true;
        }
        let before = self.scheduler.task_queue.len();
        self.scheduler.task_queue.retain(|task| task.id != timer_id);
        let existed = running || self.scheduler.task_queue.len() != before;
        if existed {
            self.trace_timer_line(format!("[timer] clear id={timer_id}"));
        }
        existed
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = self.scheduler.task_queue.len();
        self.scheduler.task_queue.clear();
        if self.scheduler.running_timer_id.is_some() {
            self.scheduler.running_timer_canceled = true;
        }
        self.trace_timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .scheduler
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                interval_ms: task.interval_ms,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    /// Moves the clock forward, running every timer that falls due on the way.
    ///
    /// Each task observes the clock at its own due time; the clock ends at
    /// `now + delta_ms`.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Timer(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        let to = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(to), true)?;
        self.scheduler.now_ms = to;
        self.flush_frame()?;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={to} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Timer(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(target_ms), true)?;
        self.scheduler.now_ms = target_ms;
        self.flush_frame()?;
        self.trace_timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs the queue to exhaustion, jumping the clock to each due time.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.flush_frame()?;
        self.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(next_idx) = self.scheduler.next_task_index(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        let task = self.scheduler.task_queue.remove(next_idx);
        if task.due_at > self.scheduler.now_ms {
            self.scheduler.now_ms = task.due_at;
        }
        self.execute_timer_task(task)?;
        Ok(true)
    }

    /// Runs what is already due without moving the clock.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms), false)?;
        self.trace_timer_line(format!(
            "[timer] run_due now_ms={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(ran)
    }

    pub(crate) fn run_timer_queue(
        &mut self,
        due_limit: Option<i64>,
        advance_clock: bool,
    ) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.scheduler.next_task_index(due_limit) {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(self.timer_step_limit_error(steps, due_limit));
            }
            let task = self.scheduler.task_queue.remove(next_idx);
            if advance_clock && task.due_at > self.scheduler.now_ms {
                self.scheduler.now_ms = task.due_at;
            }
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn timer_step_limit_error(&self, steps: usize, due_limit: Option<i64>) -> Error {
        let next_task = self
            .scheduler
            .next_task_index(due_limit)
            .and_then(|idx| self.scheduler.task_queue.get(idx))
            .map_or_else(
                || "none".to_string(),
                |task| format!("id={},due_at={}", task.id, task.due_at),
            );
        Error::Timer(format!(
            "exceeded max task steps (possible uncleared interval): limit={}, steps={steps}, now_ms={}, pending_tasks={}, next_task={next_task}",
            self.scheduler.timer_step_limit,
            self.scheduler.now_ms,
            self.scheduler.task_queue.len(),
        ))
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || self.execute_timer_task_impl(task))
    }

    fn execute_timer_task_impl(&mut self, task: ScheduledTask) -> Result<()> {
        self.flush_frame()?;
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            task.id, task.due_at, self.scheduler.now_ms
        ));

        self.scheduler.running_timer_id = Some(task.id);
        self.scheduler.running_timer_canceled = false;
        (task.callback)(self);
        let canceled = self.scheduler.running_timer_canceled;
        self.scheduler.running_timer_id = None;
        self.scheduler.running_timer_canceled = false;

        if let Some(interval_ms) = task.interval_ms {
            if !canceled {
                let due_at = task.due_at.saturating_add(interval_ms.max(1));
                let order = self.scheduler.allocate_task_order();
                self.trace_timer_line(format!(
                    "[timer] requeue id={} due_at={due_at} interval_ms={interval_ms}",
                    task.id
                ));
                self.scheduler.task_queue.push(ScheduledTask {
                    due_at,
                    order,
                    ..task
                });
            }
        }
        Ok(())
    }
}

type Callback<A> = Rc<dyn Fn(&mut Document, A)>;

struct PendingCall<A> {
    timer: Option<TimerId>,
    args: Option<A>,
}

impl<A> Default for PendingCall<A> {
    fn default() -> Self {
        Self {
            timer: None,
            args: None,
        }
    }
}

// Takes the stored arguments and clears the slot before the callback runs, so
// the callback may call the wrapper again.
fn fire<A>(state: &Rc<RefCell<PendingCall<A>>>, callback: &Callback<A>, doc: &mut Document) {
    let args = {
        let mut state = state.borrow_mut();
        state.timer = None;
        state.args.take()
    };
    if let Some(args) = args {
        callback(doc, args);
    }
}

/// Fires once with the last arguments after `wait` ms without another call.
pub struct Debounced<A> {
    wait: i64,
    callback: Callback<A>,
    state: Rc<RefCell<PendingCall<A>>>,
}

impl<A: 'static> Debounced<A> {
    pub fn new(wait: i64, callback: impl Fn(&mut Document, A) + 'static) -> Self {
        Self {
            wait,
            callback: Rc::new(callback),
            state: Rc::default(),
        }
    }

    pub fn call(&self, doc: &mut Document, args: A) {
        let previous = {
            let mut state = self.state.borrow_mut();
            state.args = Some(args);
            state.timer.take()
        };
        if let Some(timer) = previous {
            doc.clear_timer(timer);
        }
        let state = Rc::clone(&self.state);
        let callback = Rc::clone(&self.callback);
        let timer = doc.set_timeout(self.wait, move |doc| fire(&state, &callback, doc));
        self.state.borrow_mut().timer = Some(timer);
    }

    pub fn cancel(&self, doc: &mut Document) -> bool {
        let timer = {
            let mut state = self.state.borrow_mut();
            state.args = None;
            state.timer.take()
        };
        timer.is_some_and(|timer| doc.clear_timer(timer))
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().timer.is_some()
    }
}

/// Trailing-edge throttle: at most one firing per `wait` window, with the
/// most recent arguments.
///
/// A call while idle opens a window ending at `now + wait`; calls inside the
/// window only replace the pending arguments.
pub struct Throttled<A> {
    wait: i64,
    callback: Callback<A>,
    state: Rc<RefCell<PendingCall<A>>>,
}

impl<A: 'static> Throttled<A> {
    pub fn new(wait: i64, callback: impl Fn(&mut Document, A) + 'static) -> Self {
        Self {
            wait,
            callback: Rc::new(callback),
            state: Rc::default(),
        }
    }

    pub fn call(&self, doc: &mut Document, args: A) {
        let window_open = {
            let mut state = self.state.borrow_mut();
            state.args = Some(args);
            state.timer.is_some()
        };
        if window_open {
            return;
        }
        let state = Rc::clone(&self.state);
        let callback = Rc::clone(&self.callback);
        let timer = doc.set_timeout(self.wait, move |doc| fire(&state, &callback, doc));
        self.state.borrow_mut().timer = Some(timer);
    }

    pub fn cancel(&self, doc: &mut Document) -> bool {
        let timer = {
            let mut state = self.state.borrow_mut();
            state.args = None;
            state.timer.take()
        };
        timer.is_some_and(|timer| doc.clear_timer(timer))
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().timer.is_some()
    }
}
