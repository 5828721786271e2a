//! Channel operations: kick, join (admin only)

use futures_util::FutureExt;

use super::{CommandError, CommandRegistry, CommandResult, CommandSpec, Invocation};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "kick",
        help: "Kicks user with given reason. Takes two arguments, user and reason.",
        handler: |inv| kick(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "join",
        help: "Joins channel(s) supplied as argument(s). Admin only command",
        handler: |inv| join(inv).boxed(),
    });
}

/// The caller is always kicked first. The target follows, unless it is the
/// bot itself.
async fn kick(inv: Invocation) -> CommandResult {
    if !inv.in_channel() {
        return Err(CommandError::Usage("kick only works in a channel".to_string()));
    }
    inv.out.send(format!(
        "KICK {} {} :You don't tell me what to do.",
        inv.reply_to, inv.nick
    ));

    let (target, reason) = match inv.args.split_first() {
        Some(split) => split,
        None => return Err(CommandError::Arity),
    };
    if target.eq_ignore_ascii_case(&inv.config().nick) {
        return Ok(());
    }
    let line = if reason.is_empty() {
        format!("KICK {} {}", inv.reply_to, target)
    } else {
        format!("KICK {} {} :{}", inv.reply_to, target, reason.join(" "))
    };
    inv.out.send(line);
    Ok(())
}

/// Requires both a store-verified host and a matching admin entry
async fn join(inv: Invocation) -> CommandResult {
    if inv.args.is_empty() {
        return Err(CommandError::Usage("Not enough arguments.".to_string()));
    }

    let verified = match inv.services.store.as_deref() {
        Some(store) => store.is_verified(&inv.nick, &inv.host)?,
        None => false,
    };
    if !verified {
        tracing::warn!("Rejected join from unverified {}@{}", inv.nick, inv.host);
        inv.reply(format!(
            "I don't know who {} is. Please verify yourself.",
            inv.nick
        ));
        return Ok(());
    }
    if !inv.config().is_admin(&inv.nick, &inv.host) {
        tracing::warn!("Rejected join from non-admin {}@{}", inv.nick, inv.host);
        inv.reply(format!("{} IS UNAUTHORIZED.", inv.nick));
        return Ok(());
    }

    inv.out.send(format!("JOIN {}", inv.args.join(" ")));
    Ok(())
}
