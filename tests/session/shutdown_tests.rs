//! Operator shutdown

use ircwarden::SessionState;

use crate::common::*;

#[tokio::test]
async fn test_quit_sentinel_flushes_and_terminates() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    bot.type_line("PRIVMSG #room :bye all").await;
    bot.type_line("QUIT").await;

    assert_eq!(server.expect_line().await, "PRIVMSG #room :bye all");
    assert_eq!(server.expect_line().await, "QUIT");

    let mut servers = std::mem::replace(&mut bot.servers, tokio::sync::mpsc::unbounded_channel().1);
    let state = bot.state.clone();
    let report = bot.finish().await.expect("clean shutdown");
    assert_eq!(report.generations, 1);
    assert_eq!(*state.borrow(), SessionState::Terminated);

    // no generation was started after the sentinel
    assert!(servers.try_recv().is_err());
    // the generation's writer is gone, so the socket is closed
    assert_eq!(server.next_line().await, None);
}

#[tokio::test]
async fn test_console_end_of_input_shuts_down() {
    let mut bot = TestBot::start(test_config());
    let _server = bot.accept().await;

    let TestBot {
        console, handle, ..
    } = bot;
    drop(console);

    let report = tokio::time::timeout(LINE_TIMEOUT, handle)
        .await
        .expect("Bot did not terminate")
        .expect("Bot task panicked")
        .expect("clean shutdown");
    assert_eq!(report.generations, 1);
}

#[tokio::test]
async fn test_shutdown_token_stops_session() {
    let mut bot = TestBot::start(test_config());
    let mut server = bot.accept().await;

    bot.shutdown.cancel();
    let report = bot.finish().await.expect("clean shutdown");
    assert_eq!(report.generations, 1);
    assert_eq!(server.next_line().await, None);
}
