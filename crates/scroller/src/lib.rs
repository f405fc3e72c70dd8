//! Kiosk auto-scroll: sweep an overflowing list end to end, pausing at each end.

mod driver;
mod machine;

pub use driver::{ScrollDriver, ScrollFrame};
pub use machine::{AutoScroller, ScrollConfig, ScrollState};
