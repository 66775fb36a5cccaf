//! Read-only views computed from the routine collection.
//!
//! Everything here is a pure function of the routines, a local "now" and the
//! active season; calendar-day comparisons use the caller's time zone.

mod calendar;
mod dashboard;
mod timeline;
mod weekly;

pub use calendar::month_grid;
pub use dashboard::dashboard;
pub use timeline::{gallery, group_by_month, timeline};
pub use weekly::{format_minutes, weekly_summary};
