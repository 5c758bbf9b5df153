#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Runtime helpers on top of engine handles (epoch ticker, deadlines).

mod deadline;
mod ticker;

pub use deadline::{EpochDeadline, deadline_ticks};
pub use ticker::EpochTicker;
