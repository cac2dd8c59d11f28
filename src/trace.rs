use std::collections::VecDeque;

use crate::Document;

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

impl Document {
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.logs.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    /// Keeps at most `max_entries` lines, dropping the oldest.
    pub fn set_trace_log_limit(&mut self, max_entries: usize) {
        self.trace.log_limit = max_entries.max(1);
        while self.trace.logs.len() > self.trace.log_limit {
            self.trace.logs.pop_front();
        }
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace.events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace.timers {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace.enabled {
            return;
        }
        if self.trace.to_stderr {
            eprintln!("{line}");
        }
        if self.trace.logs.len() >= self.trace.log_limit {
            self.trace.logs.pop_front();
        }
        self.trace.logs.push_back(line);
    }
}
