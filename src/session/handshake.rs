//! Registration lines sent at the start of every generation

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::LineCodec;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::queue::redact;

/// Lines that register the session: `NICK`, `USER`, and the optional
/// NickServ `IDENTIFY`.
pub fn registration_lines(config: &SessionConfig) -> Vec<String> {
    let mut lines = vec![
        format!("NICK {}", config.nick),
        format!(
            "USER {} {} * :{}",
            config.nick, config.hostname, config.realname
        ),
    ];
    if let Some(password) = config.nickserv_password.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("PRIVMSG NickServ :IDENTIFY {}", password));
    }
    lines
}

/// Write the registration lines directly to the fresh connection.
///
/// Runs before the writer task takes over the sink, so nothing queued by
/// the console or dispatcher can overtake `NICK`/`USER`.
pub async fn register<W>(sink: &mut FramedWrite<W, LineCodec>, config: &SessionConfig) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for line in registration_lines(config) {
        tracing::info!(">> {}", redact(&line));
        sink.send(line).await?;
    }
    Ok(())
}
