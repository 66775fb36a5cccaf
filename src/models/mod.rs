mod filter;
mod routine;
mod season;
mod status;

pub use filter::{all_tags, ArchiveFilter, RoutineFilter};
pub use routine::{
    coerce_cadence, CompletionEvent, Friction, HistoryPatch, LogData, NewRoutine, Routine,
    RoutinePatch,
};
pub use season::Season;
pub use status::{FuzzyStatus, RoutineStatus};
