//! Built-in console commands

use relay_core::RuntimeContext;
use relay_gateway::{DiscordHttp, Snowflake};
use relay_irc::IrcHandle;

use super::CommandTable;

/// What the built-in commands act on; disabled clients are `None`
#[derive(Debug, Clone)]
pub struct Builtins {
    pub irc: Option<IrcHandle>,
    pub discord: Option<DiscordHttp>,
    pub ctx: RuntimeContext,
}

/// Register `say`, `join`, `raw`, `discord`, `quit` and `help`
pub fn register_builtins(table: &mut CommandTable, builtins: Builtins) {
    let Builtins { irc, discord, ctx } = builtins;

    if let Some(irc) = irc {
        let handle = irc.clone();
        table.add("say", move |arg| {
            let Some((target, text)) = arg.split_once(' ') else {
                return Some("usage: say <target> <text>".into());
            };
            Some(outcome(handle.say(target, text)))
        });

        let handle = irc.clone();
        table.add("join", move |arg| {
            if arg.is_empty() {
                return Some("usage: join <channel>".into());
            }
            Some(outcome(handle.join(arg)))
        });

        table.add("raw", move |arg| {
            if arg.is_empty() {
                return Some("usage: raw <line>".into());
            }
            Some(outcome(irc.send_line(arg)))
        });
    }

    if let Some(http) = discord {
        table.add("discord", move |arg| {
            let Some((channel, text)) = arg.split_once(' ') else {
                return Some("usage: discord <channel_id> <text>".into());
            };
            let Ok(channel_id) = channel.parse::<Snowflake>() else {
                return Some(format!("invalid channel id: {channel}"));
            };

            // The POST completes in the background; its result is only logged
            let http = http.clone();
            let text = text.to_string();
            tokio::spawn(async move {
                if let Err(e) = http.create_message(channel_id, &text).await {
                    tracing::warn!(channel_id = %channel_id, code = e.code(), error = %e, "Discord send failed");
                }
            });
            Some("queued".into())
        });
    }

    table.add("quit", move |_| {
        ctx.shutdown();
        Some("bye".into())
    });

    let mut names = table.names();
    names.push("help".into());
    names.sort();
    table.add("help", move |_| Some(format!("commands: {}", names.join(", "))));
}

fn outcome<E: std::fmt::Display>(result: Result<(), E>) -> String {
    match result {
        Ok(()) => "ok".into(),
        Err(e) => format!("error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(irc: Option<IrcHandle>, ctx: &RuntimeContext) -> CommandTable {
        let mut table = CommandTable::new();
        register_builtins(
            &mut table,
            Builtins {
                irc,
                discord: None,
                ctx: ctx.clone(),
            },
        );
        table
    }

    #[test]
    fn test_disconnected_irc_reports_error() {
        let ctx = RuntimeContext::new();
        let table = table(Some(IrcHandle::new()), &ctx);

        let reply = table.execute("say #rust hello");
        assert_eq!(reply.len(), 1);
        assert!(reply[0].starts_with("error:"), "{reply:?}");
        assert_eq!(table.execute("say"), vec!["usage: say <target> <text>"]);
    }

    #[test]
    fn test_help_lists_enabled_commands() {
        let ctx = RuntimeContext::new();
        let table = table(None, &ctx);

        assert_eq!(table.execute("help"), vec!["commands: help, quit"]);
        assert_eq!(table.execute("say x y"), vec!["unknown command: say"]);
    }

    #[test]
    fn test_quit_shuts_down() {
        let ctx = RuntimeContext::new();
        let table = table(None, &ctx);

        assert_eq!(table.execute("quit"), vec!["bye"]);
        assert!(ctx.is_shutdown());
    }
}
