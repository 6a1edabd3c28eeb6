mod ids;
mod leaderboard;
mod plan;
mod problem;
mod record;
mod section;
mod session;
mod settings;

pub use ids::{EntryId, ParseIdError, ProblemId, RunId, SectionId};

pub use leaderboard::{
    LeaderboardEntry, LeaderboardEntryDraft, LeaderboardEntryError, NewLeaderboardEntry,
};
pub use plan::{PlanError, WorkshopPlan};
pub use problem::{Problem, ProblemError, ProblemKind};
pub use record::{CompletionEvent, RecordError, RecordedSecret, SessionRecord};
pub use section::{SecretSource, Section, SectionError, SectionTemplate};
pub use session::{CapturedSecret, Session, SessionStateError, Stage, resolve_sections};
pub use settings::{SettingsError, WorkshopSettings};
