//! Linking IRC identities to web accounts with a one-time PIN

use futures_util::FutureExt;

use super::{CommandRegistry, CommandResult, CommandSpec, Invocation};
use crate::store::{host_key, pin_key};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "verify",
        help: "Links IRC nick to web server user. Takes two arguments, web username, and PIN. Both provided on account page",
        handler: |inv| verify(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "verified",
        help: "Returns whether or not user is verified with web username, supplied as only argument.",
        handler: |inv| verified(inv).boxed(),
    });
}

async fn verify(inv: Invocation) -> CommandResult {
    inv.expect_args(2)?;
    let (user, pin) = (&inv.args[0], &inv.args[1]);
    let store = inv.services.store()?;

    if store.get(&pin_key(user))?.as_deref() == Some(pin.as_str()) {
        store.set(&host_key(user), &inv.host)?;
        store.issue_pin(user)?;
        tracing::info!("{} verified as {} from {}", inv.nick, user, inv.host);
        inv.reply(format!("You are now verified as {}", user));
    } else {
        inv.reply(format!("PIN does not match that of {}", user));
    }
    Ok(())
}

async fn verified(inv: Invocation) -> CommandResult {
    inv.expect_args(1)?;
    let user = &inv.args[0];
    let store = inv.services.store()?;

    if store.is_verified(user, &inv.host)? {
        inv.reply(format!("You are {} at {}", user, inv.host));
    } else {
        inv.reply(format!("You are not {}", user));
    }
    Ok(())
}
