//! Operator-side editing of the price list.

mod gate;
mod input;
mod session;

pub use gate::{AdminGate, GateOutcome, MAX_ATTEMPTS};
pub use input::normalize_price;
pub use session::{
    AdminEditSession, Confirm, DeleteOutcome, EditState, Field, Notice, NoticeKind, SessionError,
    NEW_ROW_NAME,
};
