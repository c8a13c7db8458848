//! Envelope types exchanged with the chat server.
//!
//! Every envelope is a JSON object carrying a `type` discriminant plus
//! type-specific fields. [`Request`] covers the client-to-server direction,
//! [`ServerEvent`] the server-to-client direction. Both are internally
//! tagged serde enums, so the `type` field is produced and consumed by the
//! derive without any hand-written routing.
//!
//! Responses carry no correlation identifiers; the server matches replies to
//! requests purely by payload shape (`chat_id`, `is_team`). Subscribers that
//! keep several requests of the same kind outstanding must disambiguate with
//! those fields.

use serde::{Deserialize, Serialize};

/// Client-to-server request envelope.
///
/// Constructed through the associated builder functions, which are the only
/// supported way to produce well-formed requests. Field order within each
/// variant is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Log in with an existing account.
    Auth(Credentials),
    /// Create a new account.
    Register(Credentials),
    /// Direct message to a single user.
    Message(OutgoingMessage),
    /// Message to every member of a team.
    TeamMessage(OutgoingMessage),
    /// Fetch the stored history of one chat.
    GetChatMessages(HistoryQuery),
    /// Create a new team owned by the authenticated user.
    CreateTeam(TeamRef),
    /// Invite a user into a team.
    InviteToTeam(Invite),
    /// Fetch the set of known users and teams.
    GetChatList {},
}

impl Request {
    /// Build an authentication request.
    ///
    /// The password is hashed by the caller; this layer never sees
    /// plaintext credentials handling beyond forwarding the hash.
    pub fn auth(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self::Auth(Credentials { username: username.into(), password_hash: password_hash.into() })
    }

    /// Build a registration request.
    pub fn register(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self::Register(Credentials {
            username: username.into(),
            password_hash: password_hash.into(),
        })
    }

    /// Build an outgoing chat message.
    ///
    /// `is_team` selects between the `message` and `team_message` types;
    /// `to` is a username for the former and a team name for the latter.
    pub fn chat_message(
        to: impl Into<String>,
        content: impl Into<String>,
        is_team: bool,
    ) -> Self {
        let message = OutgoingMessage { to: to.into(), content: content.into() };
        if is_team { Self::TeamMessage(message) } else { Self::Message(message) }
    }

    /// Build a history request for one chat.
    pub fn chat_history(chat_id: impl Into<String>, is_team: bool) -> Self {
        Self::GetChatMessages(HistoryQuery { chat_id: chat_id.into(), is_team })
    }

    /// Build a team creation request.
    pub fn create_team(team_name: impl Into<String>) -> Self {
        Self::CreateTeam(TeamRef { team_name: team_name.into() })
    }

    /// Build a team invitation request.
    pub fn invite_to_team(team_name: impl Into<String>, username: impl Into<String>) -> Self {
        Self::InviteToTeam(Invite { team_name: team_name.into(), user: username.into() })
    }

    /// Build a chat list request.
    pub fn chat_list() -> Self {
        Self::GetChatList {}
    }
}

/// Username plus client-side password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Hash of the account password.
    pub password_hash: String,
}

/// Body of an outgoing direct or team message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Recipient username, or team name for team messages.
    pub to: String,
    /// Message text.
    pub content: String,
}

/// Selector for one chat's stored history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Username or team name identifying the chat.
    pub chat_id: String,
    /// Whether `chat_id` names a team.
    pub is_team: bool,
}

/// Reference to a team by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    /// Team name.
    pub team_name: String,
}

/// Team invitation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Team the user is invited into.
    pub team_name: String,
    /// Username being invited.
    pub user: String,
}

/// Server-to-client event envelope.
///
/// Unknown `type` values deserialize to [`ServerEvent::Unknown`] rather than
/// failing the frame, so a newer server can introduce message types without
/// breaking older clients. Unrecognized fields inside known types are
/// ignored for the same reason (the reference server already sends a
/// `timestamp` the protocol does not require).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Direct message delivered to or echoed back at this client.
    Message(IncomingMessage),
    /// Message delivered to a team this client belongs to.
    TeamMessage(IncomingMessage),
    /// Outcome of an `auth` request.
    AuthResponse(AuthResponse),
    /// Outcome of a `register` request.
    RegisterResponse(RegisterResponse),
    /// Stored history for one chat.
    ChatMessages(ChatHistory),
    /// A team this client requested was created.
    TeamCreated(TeamRef),
    /// A user was added to a team.
    UserAdded(TeamRef),
    /// Current set of known users and teams.
    ChatList(ChatList),
    /// Server-reported application error.
    Error(ServerError),
    /// Any type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// A message pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Sending username.
    pub from: String,
    /// Recipient username, or team name for team messages.
    pub to: String,
    /// Message text.
    pub content: String,
    /// Server-side send time (Unix seconds), when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Success/failure discriminant carried by response envelopes.
///
/// Anything other than the literal `success` is treated as failure, matching
/// the server's loosely specified status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Status {
    /// The request succeeded.
    Success,
    /// The request failed.
    Failure,
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        if value == "success" { Self::Success } else { Self::Failure }
    }
}

impl Status {
    /// True for [`Status::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Success/failure discriminant.
    pub status: Status,
    /// Human-readable detail, mostly present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Canonical username, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Outcome of a registration attempt.
///
/// The server reports the interesting part in `message`; `status` is not
/// always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Success/failure discriminant, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Stored history for one chat, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Username or team name identifying the chat.
    pub chat_id: String,
    /// Whether `chat_id` names a team.
    pub is_team: bool,
    /// Messages in server storage order.
    pub messages: Vec<HistoryEntry>,
}

/// One stored message inside a [`ChatHistory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Sending username.
    pub from: String,
    /// Message text.
    pub content: String,
}

/// Directory of users and teams visible to this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatList {
    /// Directory contents.
    pub data: ChatListData,
}

/// Payload of a `chat_list` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatListData {
    /// Known usernames.
    pub users: Vec<String>,
    /// Teams this client belongs to.
    pub teams: Vec<TeamRef>,
}

/// Application-level error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Human-readable error description, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
