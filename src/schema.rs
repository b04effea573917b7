//! Source database schema definitions
//!
//! Table and column names read from the message store and the contact store.
//! Both stores are only ever read.

/// Messages table of the message store
pub mod message {
    /// Table name
    pub const TABLE: &str = "message";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Foreign key to the chat table
    pub const CHAT_ROW_ID: &str = "chat_row_id";
    /// Flag indicating if the message was sent by the device owner
    pub const FROM_ME: &str = "from_me";
    /// Send time in milliseconds since the Unix epoch
    pub const TIMESTAMP: &str = "timestamp";
    /// Message text column
    pub const TEXT_DATA: &str = "text_data";
    /// Message type code column
    pub const MESSAGE_TYPE: &str = "message_type";
}

/// Chats table of the message store
pub mod chat {
    /// Table name
    pub const TABLE: &str = "chat";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Foreign key to the identity table
    pub const JID_ROW_ID: &str = "jid_row_id";
    /// Chat subject column
    pub const SUBJECT: &str = "subject";
}

/// Media table of the message store
pub mod message_media {
    /// Table name
    pub const TABLE: &str = "message_media";
    /// Foreign key to the messages table
    pub const MESSAGE_ROW_ID: &str = "message_row_id";
    /// MIME type column
    pub const MIME_TYPE: &str = "mime_type";
}

/// Identity table of the message store
pub mod jid {
    /// Table name
    pub const TABLE: &str = "jid";
    /// Primary key column
    pub const ID: &str = "_id";
    /// Raw identity string column
    pub const RAW_STRING: &str = "raw_string";
    /// Local part column
    pub const USER: &str = "user";
}

/// Contacts table of the contact store
pub mod wa_contacts {
    /// Table name
    pub const TABLE: &str = "wa_contacts";
    /// Raw identity string column
    pub const JID: &str = "jid";
    /// Display name column
    pub const DISPLAY_NAME: &str = "display_name";
    /// Alternate name column
    pub const WA_NAME: &str = "wa_name";
}
