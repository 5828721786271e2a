//! Reconnect and backoff behavior

use std::time::Duration;

use ircwarden::session::GenerationId;
use ircwarden::{BotError, SessionState};

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_first_attempt_immediate_then_backoff() {
    let started = tokio::time::Instant::now();
    let mut bot = TestBot::start(test_config());

    let server = bot.accept().await;
    server.disconnect();

    let mut second = bot.accept().await;
    let attempts = bot.attempt_times();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[0] - started < Duration::from_secs(1));
    assert!(
        attempts[1] - attempts[0] >= Duration::from_secs(60),
        "reconnected after {:?}",
        attempts[1] - attempts[0]
    );

    second.send("PING :still-here").await;
    assert_eq!(second.expect_line().await, "PONG :still-here");
}

#[tokio::test(start_paused = true)]
async fn test_generations_increase_across_reconnects() {
    let mut bot = TestBot::start(test_config());

    for expected in 0..3u64 {
        let mut server = bot.accept().await;
        // registration done, writer running
        server.send("PING :sync").await;
        assert_eq!(server.expect_line().await, "PONG :sync");
        assert_eq!(
            *bot.state.borrow(),
            SessionState::Active(GenerationId(expected))
        );
        server.disconnect();
    }
}

#[tokio::test(start_paused = true)]
async fn test_console_lines_reach_next_generation() {
    let mut bot = TestBot::start(test_config());
    let server = bot.accept().await;
    server.disconnect();

    // queued during backoff, delivered by the next generation's writer
    bot.type_line("PRIVMSG #room :back soon").await;
    let mut second = bot.accept().await;
    assert_eq!(second.expect_line().await, "PRIVMSG #room :back soon");
}

#[tokio::test]
async fn test_connect_failure_is_fatal() {
    let bot = TestBot::start_with(test_config(), Some(0), None);
    let attempts = bot.attempts.clone();

    let result = bot.finish().await;
    assert!(matches!(result, Err(BotError::Connect { .. })));
    assert_eq!(attempts.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reconnect_is_fatal_without_retry() {
    let mut bot = TestBot::start_with(test_config(), Some(1), None);
    let server = bot.accept().await;
    server.disconnect();

    let mut state = bot.state.clone();
    state
        .wait_for(|s| s.is_terminal())
        .await
        .expect("state channel closed");
    let attempts = bot.attempt_times();
    assert_eq!(attempts.len(), 2);

    let result = bot.handle.await.expect("Bot task panicked");
    assert!(matches!(result, Err(BotError::Connect { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_registration_failure_backs_off_and_reconnects() {
    let mut bot = TestBot::start_closed_first(test_config(), 1);

    // First generation cannot register; the next one is served normally
    let mut server = bot.accept().await;
    let attempts = bot.attempt_times();
    assert_eq!(attempts.len(), 2);
    assert!(
        attempts[1] - attempts[0] >= Duration::from_secs(60),
        "reconnected after {:?}",
        attempts[1] - attempts[0]
    );

    server.send("PING :registered").await;
    assert_eq!(server.expect_line().await, "PONG :registered");
    assert_eq!(*bot.state.borrow(), SessionState::Active(GenerationId(1)));
    assert!(!bot.handle.is_finished());
}
