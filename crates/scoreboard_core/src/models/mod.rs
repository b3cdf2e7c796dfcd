pub mod events;
pub mod record;
pub mod setup;
pub mod snapshot;
pub mod types;

pub use events::{GoalRecord, LastEvent, SubKind, SubRecord, UNKNOWN_SCORER};
pub use record::{MatchRecord, PeriodEntry, DEFAULT_MATCH_DURATION_MS};
pub use setup::{MatchMeta, MatchSetup, PersistedMatch, TeamSetup};
pub use snapshot::{Derived, Snapshot};
pub use types::{Period, Score, Side, TeamInfo, Teams};
