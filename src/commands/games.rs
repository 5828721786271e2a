//! Random answers: dice, coin, yes/no

use futures_util::FutureExt;
use rand::Rng;

use super::{CommandRegistry, CommandResult, CommandSpec, Invocation};
use crate::queue::Outbound;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "dice",
        help: "Displays a number in the range [1, 6].",
        handler: |inv| dice(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "coin",
        help: "Displays either heads or tails.",
        handler: |inv| coin(inv).boxed(),
    });
}

pub fn roll_die() -> u8 {
    rand::thread_rng().gen_range(1..=6)
}

async fn dice(inv: Invocation) -> CommandResult {
    inv.reply(roll_die().to_string());
    Ok(())
}

async fn coin(inv: Invocation) -> CommandResult {
    let face = if rand::thread_rng().gen_bool(0.5) {
        "Heads."
    } else {
        "Tails."
    };
    inv.reply(face);
    Ok(())
}

/// Answer a question addressed to the bot with exactly one of `Yes.` / `No.`
pub async fn yes_no(out: Outbound, reply_to: String) {
    let answer = if rand::thread_rng().gen_bool(0.5) {
        "Yes."
    } else {
        "No."
    };
    out.privmsg(&reply_to, answer);
}
