use causerie_net::NetError;
use causerie_shared::ValidationError;
use causerie_store::StoreError;
use thiserror::Error;

/// Errors returned by [`crate::ChatClient`] operations.
///
/// None of them is fatal: the client state stays consistent and usable
/// after any of these.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("{0} introuvable")]
    NotFound(String),

    /// A send is already in flight.
    #[error("un envoi est déjà en cours")]
    Busy,

    #[error("aucune session active")]
    NotAuthenticated,

    #[error("state lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
