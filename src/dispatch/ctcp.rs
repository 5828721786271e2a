//! CTCP replies

use crate::config::SessionConfig;

const CTCP_DELIM: char = '\x01';

/// Payload (between the `\x01` delimiters) answering a CTCP request.
/// Unknown request types get an empty payload.
pub fn reply_payload(kind: &str, args: &[String], config: &SessionConfig) -> String {
    match kind {
        "VERSION" => format!(
            "VERSION {} {} - rust",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        "BOTINFO" => "BOTINFO ASSIMILATION IMMINENT. HUMANS WILL SERVE. PENDING ACTIVATION...".to_string(),
        "PING" if args.is_empty() => "PING".to_string(),
        "PING" => format!("PING {}", args.join(" ")),
        "SOURCE" => {
            let source = config
                .links
                .source
                .as_deref()
                .unwrap_or(env!("CARGO_PKG_REPOSITORY"));
            format!("SOURCE {}", source).trim_end().to_string()
        }
        "TIME" => format!(
            "TIME {}",
            chrono::Local::now().format("%a %b %e %H:%M:%S %Y")
        ),
        "FINGER" => format!("FINGER {} - Idle since: NEVER", env!("CARGO_PKG_NAME")),
        "CLIENTINFO" => "CLIENTINFO FINGER VERSION SOURCE CLIENTINFO PING TIME BOTINFO".to_string(),
        _ => String::new(),
    }
}

/// Full `NOTICE` line answering `kind` from `sender`
pub fn reply_line(sender: &str, kind: &str, args: &[String], config: &SessionConfig) -> String {
    format!(
        "NOTICE {} :{}{}{}",
        sender,
        CTCP_DELIM,
        reply_payload(kind, args, config),
        CTCP_DELIM
    )
}
