//! End-to-end dispatch through a live session

use std::sync::Arc;

use ircwarden::store::host_key;
use ircwarden::{AdminIdentity, Store};

use crate::common::*;

fn is_answer(line: &str) -> bool {
    line == "PRIVMSG #room :Yes." || line == "PRIVMSG #room :No."
}

#[tokio::test]
async fn test_each_ping_gets_matching_pong_in_order() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    for token in ["one", "two", "three"] {
        server.send(&format!("PING :{}", token)).await;
    }
    assert_eq!(server.expect_line().await, "PONG :one");
    assert_eq!(server.expect_line().await, "PONG :two");
    assert_eq!(server.expect_line().await, "PONG :three");
}

#[tokio::test]
async fn test_dice_in_channel() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    server.send(&from_alice("#room", "bot: dice")).await;
    let line = server.expect_line().await;
    let n: u8 = line
        .strip_prefix("PRIVMSG #room :")
        .expect("reply to channel")
        .parse()
        .expect("numeric roll");
    assert!((1..=6).contains(&n));
}

#[tokio::test]
async fn test_command_names_case_insensitive() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    for text in ["bot: DICE", "bot: DiCe", "+Dice"] {
        server.send(&from_alice("#room", text)).await;
        let line = server.expect_line().await;
        assert!(line.starts_with("PRIVMSG #room :"), "{} -> {}", text, line);
    }
}

#[tokio::test]
async fn test_private_command_replies_to_sender() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    server.send(&from_alice(NICK, "coin")).await;
    let line = server.expect_line().await;
    assert!(line == "PRIVMSG alice :Heads." || line == "PRIVMSG alice :Tails.");
}

#[tokio::test]
async fn test_question_gets_exactly_one_answer() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    server.send(&from_alice("#room", "bot: are you real?")).await;
    server.send("PING :after").await;
    let lines = server
        .collect_until(|lines| {
            lines.iter().any(|l| l == "PONG :after") && lines.iter().any(|l| is_answer(l))
        })
        .await;
    assert_eq!(lines.iter().filter(|l| is_answer(l)).count(), 1);

    // nothing else was queued behind the answer
    server.send("PING :final").await;
    assert_eq!(server.expect_line().await, "PONG :final");
}

#[tokio::test]
async fn test_ctcp_version_reply() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    server.send(&from_alice(NICK, "\x01VERSION\x01")).await;
    let line = server.expect_line().await;
    assert!(line.starts_with("NOTICE alice :\x01VERSION ircwarden "));
    assert!(line.ends_with('\x01'));
}

#[tokio::test]
async fn test_unauthorized_join_is_rejected() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    // verified, but not an admin
    store.set(&host_key("alice"), "host").unwrap();
    let config = ircwarden::SessionConfig {
        admins: vec!["root@admin.example".parse::<AdminIdentity>().unwrap()],
        ..test_config()
    };
    let mut bot = TestBot::start_with(config, None, Some(store));
    let mut server = bot.accept().await;

    server.send(&from_alice("#room", "bot: join #secret")).await;
    server.send("PING :after").await;
    let lines = server
        .collect_until(|lines| {
            lines.iter().any(|l| l == "PONG :after")
                && lines.iter().any(|l| l.contains("UNAUTHORIZED"))
        })
        .await;
    assert!(lines.contains(&"PRIVMSG #room :alice IS UNAUTHORIZED.".to_string()));
    assert!(!lines.iter().any(|l| l.starts_with("JOIN")));
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    server.send(&from_alice("#room", "bot: frobnicate")).await;
    server.send(":irc.example.org 001 bot :Welcome").await;
    server.send("PING :after").await;
    assert_eq!(server.expect_line().await, "PONG :after");
}

#[tokio::test]
async fn test_overlong_line_dropped_without_reconnect() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    let flood = "x".repeat(20_000);
    server.send(&from_alice("#room", &flood)).await;
    server.send("PING :after").await;
    assert_eq!(server.next_line().await.as_deref(), Some("PONG :after"));
    assert_eq!(bot.attempt_times().len(), 1);
}
