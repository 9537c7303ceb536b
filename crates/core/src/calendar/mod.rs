//! Business-day calendar.

pub mod business_day;

pub use business_day::{BusinessDayCalendar, CalendarError};
