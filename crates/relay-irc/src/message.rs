//! Line grammar for inbound protocol messages
//!
//! ```text
//! [@tags ] [:who ] COMMAND [middle ...] [ :trailing]
//! ```
//!
//! Up to 14 middle parameters are collected into `target`; after the 14th, the
//! rest of the line is the trailing parameter even without a colon. Spaces at
//! the end of a line without a trailing parameter are ignored. Anything that
//! does not fit the grammar is a [`ParseError`]; callers log it and keep reading.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use relay_core::SessionError;

/// Anchored grammar for one line, terminator already stripped
static LINE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:@(?P<tags>[^ ]+) +)?(?::(?P<who>[^ ]+) +)?(?P<command>[^ :][^ ]*)(?P<target>(?: +[^ :][^ ]*){0,14})(?: +:(?P<trailing>.*)| +(?P<overflow>[^ :].*?))? *$",
    )
    .expect("line grammar is valid")
});

/// One parsed protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Raw IRCv3 tag block, without the leading `@`
    pub tags: Option<String>,
    /// Message source (`nick!user@host` or a server name); empty when absent
    pub who: String,
    /// Command word or three-digit numeric
    pub command: String,
    /// Middle parameters, space separated
    pub target: String,
    pub trailing: Option<String>,
}

impl IrcMessage {
    /// Parse one line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let caps = LINE_GRAMMAR.captures(line).ok_or_else(|| ParseError {
            line: line.to_string(),
        })?;

        let text = |name: &str| caps.name(name).map(|m| m.as_str());

        Ok(Self {
            tags: text("tags").map(str::to_string),
            who: text("who").unwrap_or_default().to_string(),
            command: text("command").unwrap_or_default().to_string(),
            target: text("target").unwrap_or_default().trim().to_string(),
            trailing: text("trailing")
                .or_else(|| text("overflow"))
                .map(str::to_string),
        })
    }

    /// Sender nick: the part of `who` before `!`
    pub fn nick(&self) -> Option<&str> {
        let nick = self.who.split('!').next().unwrap_or_default();
        (!nick.is_empty()).then_some(nick)
    }

    /// Middle parameters as individual words
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.target.split_whitespace()
    }

    /// Text carried by the message: trailing if present, else empty
    pub fn text(&self) -> &str {
        self.trailing.as_deref().unwrap_or_default()
    }

    /// Token to echo back in `PONG`: trailing, or the last middle parameter
    pub fn ping_token(&self) -> &str {
        match &self.trailing {
            Some(trailing) => trailing,
            None => self.params().last().unwrap_or_default(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for IrcMessage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A line that does not match the message grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Line does not match the message grammar: {line:?}")]
pub struct ParseError {
    pub line: String,
}

impl From<ParseError> for SessionError {
    fn from(err: ParseError) -> Self {
        SessionError::ProtocolParse(err.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ping_without_prefix() {
        let msg = IrcMessage::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.who, "");
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.target, "");
        assert_eq!(msg.trailing.as_deref(), Some("tmi.twitch.tv"));
        assert_eq!(msg.ping_token(), "tmi.twitch.tv");
    }

    #[test]
    fn test_ping_token_from_middle() {
        let msg = IrcMessage::parse("PING abc123").unwrap();
        assert_eq!(msg.trailing, None);
        assert_eq!(msg.ping_token(), "abc123");
    }

    #[test]
    fn test_privmsg() {
        let msg =
            IrcMessage::parse(":alice!alice@alice.tmi.twitch.tv PRIVMSG #rust :hello: world ")
                .unwrap();
        assert_eq!(msg.nick(), Some("alice"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.target, "#rust");
        assert_eq!(msg.text(), "hello: world ");
    }

    #[test]
    fn test_numeric_with_several_middles() {
        let msg = IrcMessage::parse(":tmi.twitch.tv 001 relaybot :Welcome, GLHF!").unwrap();
        assert!(msg.is_numeric());
        assert_eq!(msg.command, "001");
        assert_eq!(msg.target, "relaybot");

        let msg = IrcMessage::parse(":tmi.twitch.tv 353 relaybot = #rust :alice bob").unwrap();
        assert_eq!(msg.params().collect::<Vec<_>>(), vec!["relaybot", "=", "#rust"]);
        assert_eq!(msg.text(), "alice bob");
    }

    #[test]
    fn test_tags_are_split_off() {
        let msg = IrcMessage::parse(
            "@badge-info=;color=#1E90FF :bob!bob@bob.tmi.twitch.tv PRIVMSG #rust :hi",
        )
        .unwrap();
        assert_eq!(msg.tags.as_deref(), Some("badge-info=;color=#1E90FF"));
        assert_eq!(msg.nick(), Some("bob"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.text(), "hi");
    }

    #[test]
    fn test_join_without_trailing() {
        let msg = IrcMessage::parse(":bob!bob@bob.tmi.twitch.tv JOIN #rust").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.target, "#rust");
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn test_spaces_after_last_middle_are_not_a_trailing() {
        let msg = IrcMessage::parse("PING abc ").unwrap();
        assert_eq!(msg.trailing, None);
        assert_eq!(msg.ping_token(), "abc");

        let msg = IrcMessage::parse(":bob!bob@bob.tmi.twitch.tv JOIN #rust   ").unwrap();
        assert_eq!(msg.target, "#rust");
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn test_empty_trailing_needs_colon() {
        let msg = IrcMessage::parse("PRIVMSG #rust :").unwrap();
        assert_eq!(msg.target, "#rust");
        assert_eq!(msg.trailing.as_deref(), Some(""));
    }

    #[test]
    fn test_fifteenth_parameter_is_trailing() {
        let middles = (1..=14).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let msg = IrcMessage::parse(&format!("CMD {middles} fifteen and more ")).unwrap();
        assert_eq!(msg.params().count(), 14);
        assert_eq!(msg.target, middles);
        assert_eq!(msg.trailing.as_deref(), Some("fifteen and more"));
    }

    #[test]
    fn test_malformed_lines() {
        for line in ["", " ", ":prefix-only", ":who  ", " PING", ":who :PRIVMSG"] {
            assert!(IrcMessage::parse(line).is_err(), "{line:?} should not parse");
        }
    }

    #[test]
    fn test_parse_error_maps_to_session_error() {
        let err: SessionError = IrcMessage::parse("").unwrap_err().into();
        assert_eq!(err.code(), "PROTOCOL_PARSE_ERROR");
        assert!(!err.is_session_fatal());
    }

    proptest! {
        #[test]
        fn prop_well_formed_lines_round_trip(
            who in "[a-z][a-z0-9_]{0,8}(![a-z]{1,8}@[a-z.]{1,12})?",
            command in "[A-Z]{1,10}|[0-9]{3}",
            params in prop::collection::vec("[#a-z0-9][a-z0-9=*]{0,8}", 0..6),
            trailing in prop::option::of("[ -~]{0,40}"),
            padding in " {0,3}",
        ) {
            let mut line = format!(":{who} {command}");
            for param in &params {
                line.push(' ');
                line.push_str(param);
            }
            match &trailing {
                Some(trailing) => {
                    line.push_str(" :");
                    line.push_str(trailing);
                }
                None => line.push_str(&padding),
            }

            let msg = IrcMessage::parse(&line).unwrap();
            prop_assert_eq!(msg.who, who);
            prop_assert_eq!(msg.command, command);
            prop_assert_eq!(msg.target, params.join(" "));
            prop_assert_eq!(msg.trailing, trailing);
        }

        #[test]
        fn prop_parse_never_panics(line in "\\PC{0,200}") {
            let _ = IrcMessage::parse(&line);
        }
    }
}
