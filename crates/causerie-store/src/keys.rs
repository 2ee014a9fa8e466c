//! Storage keys. Names match the web client's local storage. That client
//! writes `fontSize` and `currentConversationId` as bare strings; both are
//! read with [`get_json_or_bare`](crate::kv::get_json_or_bare).

pub const DARK_MODE: &str = "darkMode";
pub const FONT_SIZE: &str = "fontSize";
pub const SOUND_ENABLED: &str = "soundEnabled";
pub const TTS_ENABLED: &str = "ttsEnabled";
pub const PINNED_MESSAGES: &str = "pinnedMessages";
pub const FAVORITE_CONVERSATIONS: &str = "favoriteConversations";
pub const CONVERSATION_HISTORY: &str = "conversationHistory";
pub const CURRENT_CONVERSATION_ID: &str = "currentConversationId";
pub const DEVICE_ID: &str = "deviceId";
pub const SESSION_TOKEN: &str = "sessionToken";
pub const USER_INFO: &str = "userInfo";
