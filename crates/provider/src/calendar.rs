//! Derives "today" and "yesterday" from local wall-clock time.

use chrono::{Local, NaiveDate};
use seatsync_core::{CalendarDay, RunWindow};

/// Window for the current local date.
pub fn resolve() -> RunWindow {
    resolve_on(Local::now().date_naive())
}

/// Window ending on `today`.
pub fn resolve_on(today: NaiveDate) -> RunWindow {
    let yesterday = today.pred_opt().unwrap_or(today);
    RunWindow {
        today: CalendarDay::new(today),
        yesterday: CalendarDay::new(yesterday),
    }
}
