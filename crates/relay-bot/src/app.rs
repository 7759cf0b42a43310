//! Agent wiring: storage, clients, console, shutdown

use relay_common::{AppError, AppResult, DiscordSettings, RelayConfig, TwitchSettings};
use relay_core::{ChatMessage, Connector, RuntimeContext};
use relay_gateway::{GatewayClient, GatewayEventType, GatewayResult, MessageCreateEvent};
use relay_irc::IrcClient;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::console::{register_builtins, Builtins, CommandTable, ConsoleServer};
use crate::store::{MessageLog, SqliteMessageStore};

type TaskResult = (&'static str, AppResult<()>);

/// Line-protocol client that joins the configured channels on welcome and
/// logs every channel message
pub fn irc_client(settings: &TwitchSettings, connector: Connector, log: MessageLog) -> IrcClient {
    let mut client = IrcClient::new(settings.clone(), connector);

    let channels = settings.channels.clone();
    client.on("001", move |sender, _| {
        for channel in &channels {
            if let Err(e) = sender.join(channel) {
                tracing::warn!(channel = %channel, error = %e, "JOIN failed");
            }
        }
    });

    client.on("PRIVMSG", move |_, message| {
        let nick = message.nick().unwrap_or_default().trim();
        let channel = message.params().next().unwrap_or_default();
        let text = message.text();
        tracing::info!(channel = %channel, nick = %nick, text = %text, "IRC message");

        if let Err(e) = log.record(ChatMessage::new(nick, channel, text)) {
            tracing::warn!(error = %e, "Message dropped");
        }
    });

    client
}

/// Gateway client that logs every channel message it sees
pub fn gateway_client(
    settings: &DiscordSettings,
    connector: Connector,
    log: MessageLog,
) -> GatewayResult<GatewayClient> {
    let mut client = GatewayClient::new(settings, connector)?;

    client.on(GatewayEventType::MessageCreate, move |event| {
        let message: MessageCreateEvent = match event.parse() {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(seq = event.sequence, error = %e, "Malformed MESSAGE_CREATE");
                return;
            }
        };

        let channel = format!("discord:{}", message.channel_id);
        tracing::info!(
            channel = %channel,
            nick = %message.author.username,
            text = %message.content,
            "Discord message"
        );

        let mut entry = ChatMessage::new(message.author.username, channel, message.content);
        entry.timestamp = message.timestamp;
        if let Err(e) = log.record(entry) {
            tracing::warn!(error = %e, "Message dropped");
        }
    });

    Ok(client)
}

/// Run the agent until shutdown
pub async fn run(config: RelayConfig, database: &Path) -> AppResult<()> {
    let ctx = RuntimeContext::new();

    let store = SqliteMessageStore::open(database).await?;
    let (log, log_task) = MessageLog::spawn(Arc::new(store.clone()));
    let connector = Connector::new().map_err(AppError::tls)?;

    let mut tasks: JoinSet<TaskResult> = JoinSet::new();
    let mut builtins = Builtins {
        irc: None,
        discord: None,
        ctx: ctx.clone(),
    };

    if config.twitch.enabled {
        let client = irc_client(&config.twitch, connector.clone(), log.clone());
        builtins.irc = Some(client.handle());
        let ctx = ctx.clone();
        tasks.spawn(async move {
            client.run(ctx).await;
            ("irc", Ok(()))
        });
    }

    if config.discord.enabled {
        let client = gateway_client(&config.discord, connector.clone(), log.clone())
            .map_err(AppError::internal)?;
        builtins.discord = Some(client.http().clone());
        let ctx = ctx.clone();
        tasks.spawn(async move { ("gateway", client.run(ctx).await.map_err(AppError::internal)) });
    }

    // Handlers hold their own clones; the writer stops when the clients do
    drop(log);

    if config.console.enabled {
        let mut commands = CommandTable::new();
        register_builtins(&mut commands, builtins);
        let console = ConsoleServer::bind(&config.console, commands).await?;
        let ctx = ctx.clone();
        tasks.spawn(async move {
            console.run(ctx).await;
            ("console", Ok(()))
        });
    }

    if tasks.is_empty() {
        tracing::warn!("Nothing enabled in the configuration");
    }

    supervise(&ctx, &mut tasks).await;

    let stored = log_task.await.map_err(AppError::internal)?;
    store.close().await;
    tracing::info!(stored, "Relay stopped");
    Ok(())
}

/// Wait for every task, turning Ctrl-C into a shutdown request
async fn supervise(ctx: &RuntimeContext, tasks: &mut JoinSet<TaskResult>) {
    let mut interrupted = false;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                } else {
                    tracing::info!("Interrupted");
                }
                ctx.shutdown();
            }
            joined = tasks.join_next() => match joined {
                None => break,
                Some(Ok((task, Ok(())))) => tracing::info!(task, "Task finished"),
                Some(Ok((task, Err(e)))) => {
                    tracing::error!(task, code = e.error_code(), error = %e, "Task failed");
                }
                Some(Err(e)) => tracing::error!(error = %e, "Task panicked"),
            },
        }
    }
}
