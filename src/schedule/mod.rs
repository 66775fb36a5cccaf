mod due;
mod status;

pub use due::{due_state, DueState};
pub use status::{classify, effective_cadence};
