use thiserror::Error;

/// Failures surfaced by a translation session to its dispatcher.
///
/// Collaborator errors for a single utterance never show up here; they are
/// turned into `translation_error` events on the session's worker.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The recognition collaborator could not be opened (credentials, connect).
    #[error("failed to start translation session: {0:#}")]
    Setup(anyhow::Error),

    /// Audio or recognizer events arrived for a session that is not running.
    #[error("translation session is not running")]
    NotRunning,

    #[error("translation session was already started")]
    AlreadyStarted,
}
