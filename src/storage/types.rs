//! Keys of the persisted client store

/// Bearer token returned by login
pub const TOKEN: &str = "token";

/// JSON-encoded `UserInfo` of the signed-in user
pub const USER_INFO: &str = "user_info";

/// JSON-encoded list of `ChatSession` (local mirror of the sessions API)
pub const CHAT_SESSIONS: &str = "chat_sessions";

/// Id of the session the chat view shows
pub const CURRENT_SESSION_ID: &str = "current_session_id";

/// Backend conversation id; follows the current session id
pub const CONVERSATION_ID: &str = "conversation_id";

/// Every key the client writes
pub const ALL_KEYS: [&str; 5] = [
    TOKEN,
    USER_INFO,
    CHAT_SESSIONS,
    CURRENT_SESSION_ID,
    CONVERSATION_ID,
];
