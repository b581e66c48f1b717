use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Embedded runtime was already started in this process")]
    AlreadyStarted,
    #[error("Invalid launch argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to spawn launcher thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
    #[error("Runtime entry point panicked: {0}")]
    EntryPanicked(String),
    #[error("Launcher thread panicked")]
    ThreadPanicked,
}
