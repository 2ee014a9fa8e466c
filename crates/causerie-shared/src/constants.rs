/// Application name
pub const APP_NAME: &str = "Causerie";

/// Maximum attachment size in bytes (5 MiB)
pub const MAX_ATTACHMENT_SIZE: u64 = 5 * 1024 * 1024;

/// Number of conversations kept in local history
pub const HISTORY_LIMIT: usize = 50;

/// Conversation titles are cut to this many characters
pub const TITLE_MAX_CHARS: usize = 50;

/// At most this many follow-up questions are kept per bot reply
pub const MAX_SUGGESTED_QUESTIONS: usize = 3;

/// Suggested questions must be strictly longer than this (in characters)
pub const MIN_SUGGESTION_CHARS: usize = 10;

/// Quiet window before the active conversation is written to history
pub const SAVE_DEBOUNCE_MS: u64 = 1_000;

/// Default lifetime of a notification
pub const NOTIFICATION_DURATION_MS: u64 = 4_000;

/// Lifetime of short confirmations ("Conversation chargée")
pub const SHORT_NOTIFICATION_MS: u64 = 2_000;

/// Minimum password length accepted at signup
pub const MIN_PASSWORD_LEN: usize = 6;

/// Bot text used when the webhook answer carries no usable reply field
pub const FALLBACK_REPLY: &str = "Désolé, je n'ai pas pu traiter votre demande.";

/// Chat input sent with an attachment that has neither caption nor text
pub const DEFAULT_FILE_PROMPT: &str = "Analyse ce fichier";

/// Name used in the welcome message when nobody is logged in
pub const DEFAULT_USER_NAME: &str = "utilisateur";

/// Title of a conversation whose first message has no text
pub const DEFAULT_CONVERSATION_TITLE: &str = "Nouvelle conversation";

/// Text of a staged voice recording
pub const VOICE_MESSAGE_LABEL: &str = "Message vocal";

/// Export format version written into data exports
pub const EXPORT_VERSION: &str = "1.0.0";
