use chrono::{NaiveDateTime, Utc};

// Clock is the single source of "now" for lending decisions; all times are UTC.
pub trait Clock: Sync + Send {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}
