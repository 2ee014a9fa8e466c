use thiserror::Error;

/// Input rejected on the client before any network call.
///
/// The `Display` text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message vide")]
    EmptyMessage,

    #[error("Fichier trop volumineux (max {max_mb}MB)")]
    AttachmentTooLarge { size: u64, max_mb: u64 },

    #[error("Tous les champs sont requis")]
    MissingFields,

    #[error("Les mots de passe ne correspondent pas")]
    PasswordMismatch,

    #[error("Le mot de passe doit contenir au moins {min} caractères")]
    PasswordTooShort { min: usize },

    #[error("Adresse email invalide")]
    InvalidEmail,

    #[error("Email et mot de passe requis")]
    MissingCredentials,
}
