use chrono::{Datelike, Local, Timelike};
use flatfs_storage::{Clock, Timestamp};

#[derive(Debug, Default, Clone, Copy)]
/// Wall clock of the host, in its local time zone
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        to_timestamp(&Local::now())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Every field but the year is bounded by the calendar"
)]
/// Copies the calendar fields of a date-time into a record timestamp.
///
/// Years outside of `0..=65535` are clamped.
fn to_timestamp<T: Datelike + Timelike>(time: &T) -> Timestamp {
    let year = u16::try_from(time.year().max(0)).unwrap_or(u16::MAX);
    Timestamp::new(
        year,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
}
