//! Informational commands: help, command list, links

use futures_util::FutureExt;

use super::{CommandError, CommandRegistry, CommandResult, CommandSpec, Invocation};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "help",
        help: "Gives help about commands",
        handler: |inv| help(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "commands",
        help: "Lists available commands",
        handler: |inv| commands(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "source",
        help: "Returns link to the source repository",
        handler: |inv| link(inv, Link::Source).boxed(),
    });
    registry.register(CommandSpec {
        name: "web",
        help: "Returns link to home page of web server",
        handler: |inv| link(inv, Link::Home).boxed(),
    });
    registry.register(CommandSpec {
        name: "register",
        help: "Returns link to register on the web server",
        handler: |inv| link(inv, Link::Register).boxed(),
    });
    registry.register(CommandSpec {
        name: "login",
        help: "Returns link to login on the web server",
        handler: |inv| link(inv, Link::Login).boxed(),
    });
    registry.register(CommandSpec {
        name: "botsnack",
        help: "8)",
        handler: |inv| botsnack(inv).boxed(),
    });
}

async fn help(inv: Invocation) -> CommandResult {
    match inv.args.as_slice() {
        [] => inv.reply(format!(
            "Try help <command>. For a list of commands try '{}: commands'",
            inv.config().nick
        )),
        [name] => match inv.services.registry.help(name) {
            Some(text) => inv.reply(format!("{}: {}", name, text)),
            None => inv.reply(format!("Found no help for '{}'", name)),
        },
        _ => return Err(CommandError::Arity),
    }
    Ok(())
}

async fn commands(inv: Invocation) -> CommandResult {
    let names: Vec<&str> = inv.services.registry.names().collect();
    inv.reply(names.join(" "));
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Source,
    Home,
    Register,
    Login,
}

async fn link(inv: Invocation, which: Link) -> CommandResult {
    let links = &inv.config().links;
    let (configured, what) = match which {
        Link::Source => (
            links
                .source
                .clone()
                .or_else(|| Some(env!("CARGO_PKG_REPOSITORY").to_string()).filter(|s| !s.is_empty())),
            "source",
        ),
        Link::Home => (links.home.clone(), "home page"),
        Link::Register => (links.register.clone(), "registration"),
        Link::Login => (links.login.clone(), "login"),
    };
    match configured {
        Some(url) => {
            inv.reply(url);
            Ok(())
        }
        None => Err(CommandError::Unavailable {
            what: format!("A {} link", what),
        }),
    }
}

async fn botsnack(inv: Invocation) -> CommandResult {
    inv.reply("Kisses commend. Perplexities deprave.");
    Ok(())
}
