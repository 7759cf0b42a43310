//! Line-protocol client against a fake server
//!
//! Run with: cargo test -p integration-tests --test irc_tests

use std::sync::Arc;
use std::time::Duration;

use integration_tests::*;
use relay_bot::{irc_client, MessageLog, SqliteMessageStore};
use relay_core::{Connector, MessageStore, RuntimeContext};
use relay_irc::IrcClient;

fn spawn_client(client: IrcClient, ctx: &RuntimeContext) -> tokio::task::JoinHandle<()> {
    tokio::spawn(client.run(ctx.clone()))
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let server = FakeIrcServer::start().await.unwrap();
    let ctx = RuntimeContext::new();
    let client = IrcClient::new(twitch_settings(server.port()), Connector::new().unwrap());
    let task = spawn_client(client, &ctx);

    let mut peer = server.accept().await.unwrap();
    assert_eq!(peer.next_line().await.unwrap(), format!("PASS {PASS}"));
    assert_eq!(peer.next_line().await.unwrap(), format!("NICK {NICK}"));

    peer.send("PING :abc").await.unwrap();
    assert_eq!(peer.next_line().await.unwrap(), "PONG :abc");

    ctx.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_welcome_joins_and_messages_are_logged() {
    let server = FakeIrcServer::start().await.unwrap();
    let store = SqliteMessageStore::in_memory().await.unwrap();
    let (log, log_task) = MessageLog::spawn(Arc::new(store.clone()));

    let ctx = RuntimeContext::new();
    let client = irc_client(
        &twitch_settings(server.port()),
        Connector::new().unwrap(),
        log,
    );
    let task = spawn_client(client, &ctx);

    let mut peer = server.accept().await.unwrap();
    peer.expect_line(&format!("NICK {NICK}")).await.unwrap();

    peer.send(":tmi.twitch.tv 001 relaybot :Welcome, GLHF!").await.unwrap();
    assert_eq!(peer.next_line().await.unwrap(), format!("JOIN {CHANNEL}"));

    // A line outside the grammar is skipped; the session carries on
    peer.send(":tmi.twitch.tv").await.unwrap();
    peer.send(":alice!alice@alice.tmi.twitch.tv PRIVMSG #rust :hello relay")
        .await
        .unwrap();
    peer.send("PING :still-here").await.unwrap();
    assert_eq!(peer.next_line().await.unwrap(), "PONG :still-here");

    ctx.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(tokio::time::timeout(WAIT, log_task).await.unwrap().unwrap(), 1);

    let stored = store.recent(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].nick, "alice");
    assert_eq!(stored[0].channel, CHANNEL);
    assert_eq!(stored[0].text, "hello relay");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reconnects_after_server_drops_connection() {
    let server = FakeIrcServer::start().await.unwrap();
    let ctx = RuntimeContext::new();
    let client = IrcClient::new(twitch_settings(server.port()), Connector::new().unwrap());
    let handle = client.handle();
    let task = spawn_client(client, &ctx);

    let mut first = server.accept().await.unwrap();
    first.expect_line(&format!("NICK {NICK}")).await.unwrap();
    drop(first);

    // Fresh session, fresh credentials
    let mut second = server.accept().await.unwrap();
    assert_eq!(second.next_line().await.unwrap(), format!("PASS {PASS}"));
    assert_eq!(second.next_line().await.unwrap(), format!("NICK {NICK}"));

    // The handle follows the live session
    tokio::time::timeout(WAIT, async {
        while handle.say(CHANNEL, "back again").is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    second
        .expect_line(&format!("PRIVMSG {CHANNEL} :back again"))
        .await
        .unwrap();

    ctx.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert!(!handle.is_connected());
}

#[tokio::test]
async fn test_unreachable_server_is_retried_until_shutdown() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let server = FakeIrcServer::start().await.unwrap();
        server.port()
    };

    let ctx = RuntimeContext::new();
    let client = IrcClient::new(twitch_settings(port), Connector::new().unwrap());
    let task = spawn_client(client, &ctx);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!task.is_finished());

    ctx.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}
