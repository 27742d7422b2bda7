/// Built-in commands.
///
/// Currently just `help` (alias `man`), which renders registry metadata as
/// embeds. Owner-only commands are hidden from everyone but the owner.
use std::sync::Arc;

use cmdbot_core::Embed;

use crate::context::CommandContext;
use crate::descriptor::{CommandDescriptor, ResponderDescriptor};
use crate::error::{ConfigError, HandlerError};
use crate::types::Output;

pub const HELP_COLOR: u32 = 0x5865F2;

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

pub fn help_command() -> Result<CommandDescriptor, ConfigError> {
    CommandDescriptor::builder("help")
        .alias("man")
        .help("Shows the available commands and how to use them.")
        .responder(
            ResponderDescriptor::builder("list")
                .help("List every command.")
                .with_context()
                .returns::<Embed>()
                .handler(|inv| async move {
                    let ctx = inv.require_context()?;
                    Ok(Some(Output::new(list_commands(ctx))))
                }),
        )
        .responder(
            ResponderDescriptor::builder("describe")
                .help("Describe one command and its variants.")
                .param_with_help::<String>("command", "The command name or alias")
                .with_context()
                .returns::<Embed>()
                .handler(|mut inv| async move {
                    let name: String = inv.arg()?;
                    let ctx = inv.require_context()?;
                    Ok(Some(Output::new(describe_command(ctx, &name)?)))
                }),
        )
        .responder(
            ResponderDescriptor::builder("variant")
                .help("Show the parameters of one variant of a command.")
                .param_with_help::<String>("command", "The command name or alias")
                .param_with_help::<i64>("variant", "Variant number, starting at 1")
                .with_context()
                .returns::<Embed>()
                .handler(|mut inv| async move {
                    let name: String = inv.arg()?;
                    let selector: i64 = inv.arg()?;
                    let ctx = inv.require_context()?;
                    Ok(Some(Output::new(describe_variant(ctx, &name, selector)?)))
                }),
        )
        .build()
}

fn visible(ctx: &CommandContext, command: &CommandDescriptor) -> bool {
    !command.owner_only || ctx.is_owner()
}

fn find_visible(ctx: &CommandContext, name: &str) -> Result<Arc<CommandDescriptor>, HandlerError> {
    ctx.registry
        .lookup(name)
        .filter(|c| visible(ctx, c))
        .cloned()
        .ok_or_else(|| HandlerError::signal(format!("There is no command named `{name}`!")))
}

fn list_commands(ctx: &CommandContext) -> Embed {
    let mut embed = Embed::new()
        .title("Commands")
        .description(format!("Use `{} <command>` for details.", ctx.command))
        .color(HELP_COLOR);
    for command in ctx.registry.all().iter().filter(|c| visible(ctx, c)) {
        let about = command.description.as_deref().unwrap_or("No description.");
        embed = embed.field(command.name.clone(), about, false);
    }
    embed
}

fn describe_command(ctx: &CommandContext, name: &str) -> Result<Embed, HandlerError> {
    let command = find_visible(ctx, name)?;

    let aliases = if command.aliases.is_empty() {
        "None".to_string()
    } else {
        command.aliases.join(", ")
    };
    let variants: Vec<String> = command
        .responders
        .iter()
        .enumerate()
        .map(|(i, r)| match &r.description {
            Some(about) => format!("{}. `{}`: {}", i + 1, r.usage(&command.name), about),
            None => format!("{}. `{}`", i + 1, r.usage(&command.name)),
        })
        .collect();

    let mut embed = Embed::new()
        .title(command.name.clone())
        .description(command.description.clone().unwrap_or_else(|| "No description.".into()))
        .color(HELP_COLOR)
        .field("Aliases", aliases, true)
        .field("Usable in", command.scope.to_string(), true);
    if !command.permissions.is_empty() {
        let required: Vec<&str> = command.permissions.iter().map(String::as_str).collect();
        embed = embed.field("Permissions", required.join(", "), true);
    }
    if command.owner_only {
        embed = embed.field("Owner only", "yes", true);
    }
    Ok(embed
        .field("Variants", variants.join("\n"), false)
        .footer(format!("Use `{} {} <variant>` for parameters.", ctx.command, command.name)))
}

fn describe_variant(ctx: &CommandContext, name: &str, selector: i64) -> Result<Embed, HandlerError> {
    let command = find_visible(ctx, name)?;
    let count = command.responders.len();
    let index = (selector.max(1) as usize).min(count) - 1;
    let responder = &command.responders[index];

    let mut embed = Embed::new()
        .title(format!("{} ({}/{})", command.name, index + 1, count))
        .description(format!("`{}`", responder.usage(&command.name)))
        .color(HELP_COLOR);
    if let Some(about) = &responder.description {
        embed = embed.field("About", about.clone(), false);
    }
    if responder.params.is_empty() {
        embed = embed.field("Parameters", "None", false);
    }
    for param in &responder.params {
        embed = embed.field(
            format!("{}: {}", param.name, param.key.short_name()),
            param.description.clone().unwrap_or_else(|| "No description.".into()),
            false,
        );
    }
    Ok(embed)
}
