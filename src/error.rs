use thiserror::Error;

/// Expected, user-facing failures. The `Display` text of each variant is the
/// reply posted back to the channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MusicError {
    #[error("Invalid song index, please refer to !playlist for the song index.")]
    InvalidIndex,
    #[error("Cannot delete the currently playing song, use !skip instead.")]
    CannotRemoveCurrent,
    #[error("You do not have sufficient privileges to access this command.")]
    PermissionDenied,
    #[error("Not playing anything right now...")]
    NotConnected,
    #[error("{0}")]
    InputFormat(String),
}
