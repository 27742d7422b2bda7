//! Demo commands served by `cmdbot run`.
//!
//! Every command is registered in the catalog under the identifier the
//! bundled manifest (`cmdbot.commands`) refers to.

use tokio::sync::mpsc;
use tracing::info;

use cmdbot_commands::{
    ChannelScope, CommandCatalog, CommandDescriptor, ConfigError, HandlerError, Output, ResponderDescriptor,
    register_builtins,
};
use cmdbot_core::{Embed, ExitSignal, OutgoingAction, UserId};

/// The manifest compiled into the binary.
pub const BUNDLED_MANIFEST: &str = include_str!("../cmdbot.commands");

/// Build the catalog of every command this binary can serve.
///
/// `control` receives the exit signal requested by `restart` and `shutdown`.
pub fn catalog(control: mpsc::Sender<ExitSignal>) -> CommandCatalog {
    let mut catalog = CommandCatalog::new();
    register_builtins(&mut catalog);
    let restart_control = control.clone();
    catalog
        .add("demo.Ping", ping)
        .add("demo.Echo", echo)
        .add("demo.Notify", notify)
        .add("demo.WhoAmI", whoami)
        .add("demo.Announce", announce)
        .add("demo.Restart", move || {
            exit_command("restart", "Restart the bot.", ExitSignal::Restart, restart_control.clone())
        })
        .add("demo.Shutdown", move || {
            exit_command("shutdown", "Stop the bot.", ExitSignal::CompleteClose, control.clone())
        });
    catalog
}

fn ping() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("ping")
        .help("Check that the bot is alive.")
        .responder(
            ResponderDescriptor::builder("respond")
                .returns::<&'static str>()
                .handler(|_| async { Ok(Some(Output::new("pong"))) }),
        )
        .build()
}

fn echo() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("echo")
        .alias("say")
        .help("Repeat a message.")
        .responder(
            ResponderDescriptor::builder("respond")
                .param_with_help::<String>("text", "What to repeat")
                .returns::<String>()
                .handler(|mut inv| async move {
                    let text: String = inv.arg()?;
                    if text.trim().is_empty() {
                        return Err(HandlerError::signal("There is nothing to repeat!"));
                    }
                    Ok(Some(Output::text(text)))
                }),
        )
        .build()
}

fn notify() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("notify")
        .help("Mention a user, optionally with a message.")
        .responder(
            ResponderDescriptor::builder("mention")
                .param_with_help::<UserId>("user", "Who to notify")
                .returns::<String>()
                .handler(|mut inv| async move {
                    let user: UserId = inv.arg()?;
                    Ok(Some(Output::text(format!("{}, you have been notified!", user.mention()))))
                }),
        )
        .responder(
            ResponderDescriptor::builder("message")
                .param_with_help::<UserId>("user", "Who to notify")
                .param_with_help::<String>("message", "What to tell them")
                .returns::<String>()
                .handler(|mut inv| async move {
                    let user: UserId = inv.arg()?;
                    let message: String = inv.arg()?;
                    Ok(Some(Output::text(format!("{}: {message}", user.mention()))))
                }),
        )
        .build()
}

fn whoami() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("whoami")
        .help("Mention yourself.")
        .responder(
            ResponderDescriptor::builder("respond")
                .with_context()
                .returns::<UserId>()
                .handler(|inv| async move {
                    let ctx = inv.require_context()?;
                    Ok(Some(Output::new(ctx.author_id)))
                }),
        )
        .build()
}

fn announce() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("announce")
        .help("Post an announcement embed.")
        .only_in(ChannelScope::Server)
        .require_permission("MANAGE_MESSAGES")
        .responder(
            ResponderDescriptor::builder("respond")
                .param_with_help::<String>("text", "The announcement")
                .with_context()
                .returns::<Embed>()
                .handler(|mut inv| async move {
                    let text: String = inv.arg()?;
                    let ctx = inv.require_context()?;
                    Ok(Some(Output::new(
                        Embed::new()
                            .title("Announcement")
                            .description(text)
                            .footer(format!("Posted by {}", ctx.event.author.name)),
                    )))
                }),
        )
        .build()
}

fn exit_command(
    name: &str,
    about: &str,
    signal: ExitSignal,
    control: mpsc::Sender<ExitSignal>,
) -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder(name)
        .help(about)
        .owner_only()
        .responder(
            ResponderDescriptor::builder("respond")
                .with_context()
                .returns::<OutgoingAction>()
                .handler(move |inv| {
                    let control = control.clone();
                    async move {
                        let ctx = inv.require_context()?;
                        info!(signal = %signal, author = %ctx.author_id, "Exit requested");
                        // A full channel means an exit is already pending.
                        let _ = control.try_send(signal);
                        Ok(Some(Output::new(OutgoingAction::Reaction {
                            channel_id: ctx.channel_id,
                            message_id: ctx.event.id,
                            emoji: "👋".to_string(),
                        })))
                    }
                }),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cmdbot_commands::{CommandEngine, CommandManifest, CommandRegistry, EngineOptions, StaticPermissions};
    use cmdbot_core::{Author, ChannelId, MessageEvent, RecordingClient};

    fn engine(control: mpsc::Sender<ExitSignal>) -> CommandEngine {
        let manifest = CommandManifest::parse(BUNDLED_MANIFEST);
        let registry = CommandRegistry::from_manifest(&manifest, &catalog(control), false).unwrap();
        CommandEngine::builder(Arc::new(RecordingClient::new()), Arc::new(registry))
            .options(EngineOptions {
                owner_id: Some(UserId(1)),
                ..Default::default()
            })
            .permissions(Arc::new(StaticPermissions::new().grant(UserId(1), "MANAGE_MESSAGES")))
            .build()
            .unwrap()
    }

    fn guild(author: u64, content: &str) -> MessageEvent {
        MessageEvent::in_guild(10, 2, 3, Author::new(author, "ann"), content)
    }

    fn text(content: &str) -> OutgoingAction {
        OutgoingAction::text(ChannelId(3), content)
    }

    #[test]
    fn test_bundled_manifest_matches_catalog() {
        let (tx, _rx) = mpsc::channel(1);
        let catalog = catalog(tx);
        let manifest = CommandManifest::parse(BUNDLED_MANIFEST);
        for id in manifest.identifiers() {
            assert!(catalog.contains(id), "missing {id}");
        }
        assert_eq!(manifest.len(), catalog.identifiers().len());
    }

    #[tokio::test]
    async fn test_demo_replies() {
        let (tx, _rx) = mpsc::channel(1);
        let e = engine(tx);

        assert_eq!(e.respond(guild(5, "!ping")).await, vec![text("pong")]);
        assert_eq!(e.respond(guild(5, "!say hi there")).await, vec![text("hi there")]);
        assert_eq!(
            e.respond(guild(5, "!notify <@!8>")).await,
            vec![text("<@8>, you have been notified!")]
        );
        assert_eq!(
            e.respond(guild(5, "!notify 8 lunch is ready")).await,
            vec![text("<@8>: lunch is ready")]
        );
        assert_eq!(e.respond(guild(5, "!whoami")).await, vec![text("<@5>")]);
    }

    #[tokio::test]
    async fn test_announce_needs_permission() {
        let (tx, _rx) = mpsc::channel(1);
        let e = engine(tx);

        let denied = e.respond(guild(5, "!announce hello")).await;
        assert!(matches!(&denied[..], [OutgoingAction::Text { content, .. }] if content.contains("MANAGE_MESSAGES")));

        let posted = e.respond(guild(1, "!announce hello")).await;
        assert!(matches!(&posted[..], [OutgoingAction::Embed { embed, .. }] if embed.description.as_deref() == Some("hello")));

        let dm = MessageEvent::direct(11, 3, Author::new(1, "ann"), "!announce hello");
        assert!(e.respond(dm).await.is_empty());
    }

    #[tokio::test]
    async fn test_restart_is_owner_only_and_signals() {
        let (tx, mut rx) = mpsc::channel(1);
        let e = engine(tx);

        let refused = e.respond(guild(5, "!restart")).await;
        assert_eq!(refused, vec![text("🚫 Only the bot owner can run this command! 🚫")]);
        assert!(rx.try_recv().is_err());

        let accepted = e.respond(guild(1, "!restart")).await;
        assert!(matches!(&accepted[..], [OutgoingAction::Reaction { emoji, .. }] if emoji == "👋"));
        assert_eq!(rx.try_recv().unwrap(), ExitSignal::Restart);
    }
}
