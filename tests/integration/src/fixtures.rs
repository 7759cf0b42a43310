//! Configuration fixtures

use relay_common::{DiscordSettings, RelayConfig, TwitchSettings};
use serde_json::json;

pub const NICK: &str = "relaybot";
pub const PASS: &str = "oauth:integration";
pub const CHANNEL: &str = "#rust";
pub const TOKEN: &str = "integration-token";

/// Line-protocol settings pointing at a plain-TCP server on loopback
pub fn twitch_settings(port: u16) -> TwitchSettings {
    let config = json!({
        "twitch": {
            "host": "127.0.0.1",
            "port": port,
            "tls": false,
            "nick": NICK,
            "pass": PASS,
            "channels": [CHANNEL]
        }
    });
    RelayConfig::from_json_str(&config.to_string())
        .expect("valid twitch fixture")
        .twitch
}

/// Gateway settings with a short reconnect delay
pub fn discord_settings(api_base: &str) -> DiscordSettings {
    let config = json!({
        "discord": {
            "token": TOKEN,
            "api_base": api_base,
            "reconnect_delay_ms": 20
        }
    });
    RelayConfig::from_json_str(&config.to_string())
        .expect("valid discord fixture")
        .discord
}

/// READY payload for `session_id`
pub fn ready_payload(session_id: &str) -> serde_json::Value {
    json!({
        "v": 10,
        "user": {"id": "80351110224678912", "username": NICK, "bot": true},
        "session_id": session_id,
        "guilds": []
    })
}

/// MESSAGE_CREATE payload in channel 1000
pub fn message_payload(author: &str, content: &str) -> serde_json::Value {
    json!({
        "id": "1100000000000000000",
        "channel_id": "1000",
        "author": {"id": "42", "username": author},
        "content": content,
        "timestamp": "2024-05-01T12:00:00+00:00"
    })
}
