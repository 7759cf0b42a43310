//! Dispatch event names
//!
//! The `t` field of an op=0 frame. Names the client does not know about are
//! still delivered as raw [`GatewayEvent`](super::GatewayEvent)s, just without a kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch events the relay knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    /// Identify accepted; carries the session id
    Ready,
    /// Resume accepted; missed events were replayed before this
    Resumed,

    GuildCreate,
    GuildUpdate,
    GuildDelete,

    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,

    MessageCreate,
    MessageUpdate,
    MessageDelete,
    MessageReactionAdd,
    MessageReactionRemove,

    GuildMemberAdd,
    GuildMemberRemove,

    PresenceUpdate,
    TypingStart,
    InteractionCreate,
}

impl GatewayEventType {
    /// Every known event, in declaration order
    pub const ALL: [Self; 18] = [
        Self::Ready,
        Self::Resumed,
        Self::GuildCreate,
        Self::GuildUpdate,
        Self::GuildDelete,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::MessageCreate,
        Self::MessageUpdate,
        Self::MessageDelete,
        Self::MessageReactionAdd,
        Self::MessageReactionRemove,
        Self::GuildMemberAdd,
        Self::GuildMemberRemove,
        Self::PresenceUpdate,
        Self::TypingStart,
        Self::InteractionCreate,
    ];

    /// Wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate => "GUILD_CREATE",
            Self::GuildUpdate => "GUILD_UPDATE",
            Self::GuildDelete => "GUILD_DELETE",
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::ChannelUpdate => "CHANNEL_UPDATE",
            Self::ChannelDelete => "CHANNEL_DELETE",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageUpdate => "MESSAGE_UPDATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::MessageReactionAdd => "MESSAGE_REACTION_ADD",
            Self::MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
            Self::GuildMemberAdd => "GUILD_MEMBER_ADD",
            Self::GuildMemberRemove => "GUILD_MEMBER_REMOVE",
            Self::PresenceUpdate => "PRESENCE_UPDATE",
            Self::TypingStart => "TYPING_START",
            Self::InteractionCreate => "INTERACTION_CREATE",
        }
    }

    /// Look up an event by wire name
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
