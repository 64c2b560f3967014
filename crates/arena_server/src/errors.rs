use std::fmt;

/// Error when creating a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateMatchError {
    /// Maximum number of concurrent matches reached.
    TooManyMatches,
}

impl fmt::Display for CreateMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateMatchError::TooManyMatches => write!(f, "maximum number of matches reached"),
        }
    }
}

impl std::error::Error for CreateMatchError {}

/// Error when joining a match. Re-joining a match the player is already in
/// is not an error; it returns the current full state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    MatchNotFound,
    MatchFull,
    GameInProgress,
}

impl JoinError {
    pub fn reason(&self) -> &'static str {
        match self {
            JoinError::MatchNotFound => "match_not_found",
            JoinError::MatchFull => "match_full",
            JoinError::GameInProgress => "game_in_progress",
        }
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::MatchNotFound => write!(f, "match not found"),
            JoinError::MatchFull => write!(f, "match is full"),
            JoinError::GameInProgress => write!(f, "match has already started"),
        }
    }
}

impl std::error::Error for JoinError {}

/// Error when starting a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    MatchNotFound,
    NotHost,
    GameAlreadyStarted,
    NotEnoughPlayers,
}

impl StartError {
    pub fn reason(&self) -> &'static str {
        match self {
            StartError::MatchNotFound => "match_not_found",
            StartError::NotHost => "not_host",
            StartError::GameAlreadyStarted => "game_already_started",
            StartError::NotEnoughPlayers => "not_enough_players",
        }
    }
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::MatchNotFound => write!(f, "match not found"),
            StartError::NotHost => write!(f, "only the host can start the match"),
            StartError::GameAlreadyStarted => write!(f, "match has already started"),
            StartError::NotEnoughPlayers => write!(f, "not enough players to start"),
        }
    }
}

impl std::error::Error for StartError {}

/// Error when leaving a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveError {
    MatchNotFound,
    NotInGame,
}

impl LeaveError {
    pub fn reason(&self) -> &'static str {
        match self {
            LeaveError::MatchNotFound => "match_not_found",
            LeaveError::NotInGame => "not_in_game",
        }
    }
}

impl fmt::Display for LeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaveError::MatchNotFound => write!(f, "match not found"),
            LeaveError::NotInGame => write!(f, "player is not in this match"),
        }
    }
}

impl std::error::Error for LeaveError {}

/// Error for registry operations on a specific match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    NotFound,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NotFound => write!(f, "match not found"),
        }
    }
}

impl std::error::Error for MatchError {}

/// Repository failures are fatal for the affected match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    NotFound,
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::NotFound => write!(f, "record not found"),
        }
    }
}

impl std::error::Error for RepoError {}
