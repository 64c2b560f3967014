pub mod actor;
pub mod errors;
pub mod janitor;
pub mod match_handle;
pub mod protocol;
pub mod registry;
pub mod repository;
pub mod topic;
pub mod types;

pub use errors::{CreateMatchError, JoinError, LeaveError, MatchError, RepoError, StartError};
pub use match_handle::MatchHandle;
pub use protocol::{ClientMessage, DeltaPayload, JoinPayload, ServerMessage};
pub use registry::MatchRegistry;
pub use repository::{InMemoryRepository, MatchRecord, MatchRepository};
pub use topic::MatchTopic;
pub use types::{MatchInfo, MatchOptions, ServerConfig, ServerEvent, UserProfile};
