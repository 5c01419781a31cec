//! Engine RPC protocol types.
//!
//! The gateway and the automation engine exchange newline-delimited JSON
//! over a Unix socket: requests carry a correlation id, responses echo it,
//! and lifecycle events arrive unsolicited on the same stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClientEvent;

/// One messaging operation, addressed to a session's client.
///
/// Variants mirror the operations the engine exposes on its client, chat,
/// group, message and contact objects. Results are opaque JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ClientCommand {
    // Client-level operations.
    SendMessage {
        chat_id: String,
        content: MessageContent,
        #[serde(default)]
        options: Value,
    },
    GetClassInfo,
    GetState,
    SetStatus {
        status: String,
    },
    GetChats,
    GetChatById {
        chat_id: String,
    },
    GetContacts,
    GetContactById {
        contact_id: String,
    },
    GetNumberId {
        number: String,
    },
    IsRegisteredUser {
        number: String,
    },
    CreateGroup {
        title: String,
        participants: Vec<String>,
    },

    // Chat operations.
    ChatClearMessages {
        chat_id: String,
    },
    ChatDelete {
        chat_id: String,
    },
    ChatFetchMessages {
        chat_id: String,
        #[serde(default)]
        search_options: Value,
    },
    ChatGetContact {
        chat_id: String,
    },

    // Group chat operations.
    GroupGetClassInfo {
        chat_id: String,
    },
    GroupAddParticipants {
        chat_id: String,
        participants: Vec<String>,
    },
    GroupRemoveParticipants {
        chat_id: String,
        participants: Vec<String>,
    },
    GroupGetInviteCode {
        chat_id: String,
    },
    GroupLeave {
        chat_id: String,
    },
    GroupSetSubject {
        chat_id: String,
        subject: String,
    },
    GroupSetDescription {
        chat_id: String,
        description: String,
    },
    GroupSetInfoAdminsOnly {
        chat_id: String,
        admins_only: bool,
    },
    GroupSetMessagesAdminsOnly {
        chat_id: String,
        admins_only: bool,
    },
    GroupSetPicture {
        chat_id: String,
        media: MediaPayload,
    },
    GroupDeletePicture {
        chat_id: String,
    },

    // Message operations.
    MessageGetClassInfo {
        chat_id: String,
        message_id: String,
    },
    MessageDelete {
        chat_id: String,
        message_id: String,
        #[serde(default)]
        everyone: bool,
    },
    MessageDownloadMedia {
        chat_id: String,
        message_id: String,
    },
    MessageGetInfo {
        chat_id: String,
        message_id: String,
    },
    MessageReply {
        chat_id: String,
        message_id: String,
        content: MessageContent,
        #[serde(default)]
        destination_chat_id: Option<String>,
        #[serde(default)]
        options: Value,
    },

    // Contact operations.
    ContactGetClassInfo {
        contact_id: String,
    },
    ContactBlock {
        contact_id: String,
    },
    ContactUnblock {
        contact_id: String,
    },
    ContactGetAbout {
        contact_id: String,
    },
    ContactGetChat {
        contact_id: String,
    },
    ContactGetFormattedNumber {
        contact_id: String,
    },
    ContactGetCountryCode {
        contact_id: String,
    },
    ContactGetProfilePicUrl {
        contact_id: String,
    },
}

/// Message body for send/reply operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "contentType", content = "content", rename_all = "camelCase")]
pub enum MessageContent {
    /// Plain text.
    #[serde(alias = "String")]
    String(String),
    /// Inline media (base64 payload).
    #[serde(alias = "MessageMedia")]
    MessageMedia(MediaPayload),
    /// Media fetched by the engine from a URL.
    #[serde(alias = "MessageMediaFromURL")]
    MessageMediaFromUrl(String),
    /// A location pin.
    #[serde(alias = "Location")]
    Location(LocationPayload),
    /// A contact card by contact id.
    #[serde(alias = "Contact")]
    Contact {
        #[serde(rename = "contactId")]
        contact_id: String,
    },
    /// A poll.
    #[serde(alias = "Poll")]
    Poll(PollPayload),
}

/// Inline media payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mimetype: String,
    /// Base64-encoded bytes.
    pub data: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Location payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Poll payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPayload {
    pub poll_name: String,
    pub poll_options: Vec<String>,
    #[serde(default)]
    pub options: Value,
}

/// Request sent from the gateway to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineRequest {
    /// Open (or resume) a session. The engine keeps its credential state
    /// under `auth_dir`, which the gateway's credential store manages.
    Open {
        id: u64,
        session_id: String,
        auth_dir: String,
    },
    /// Execute a messaging operation against the opened session.
    Command { id: u64, command: ClientCommand },
    /// Close the session's connection without touching credentials.
    Close { id: u64 },
}

/// Message received from the engine: a reply to a request, or an
/// unsolicited lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// Successful reply to the request with the matching id.
    Result { id: u64, data: Value },
    /// Failed reply. `id` is absent for stream-level failures.
    Error {
        #[serde(default)]
        id: Option<u64>,
        message: String,
    },
    /// Lifecycle event for the opened session.
    Event { event: ClientEvent },
}
