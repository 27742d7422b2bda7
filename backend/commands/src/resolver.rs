/// Resolver: find the command a message invokes and strip prefix and name
/// from its token stream.
use std::sync::Arc;

use tracing::debug;

use crate::context::CommandContext;
use crate::descriptor::CommandDescriptor;
use crate::prefix::PrefixProvider;
use crate::registry::CommandRegistry;
use crate::tokenizer::Tokens;
use crate::typo::TypoChecker;

/// Outcome of resolving one message.
#[derive(Debug)]
pub enum Resolution {
    /// A registered command. The context carries the canonical command name
    /// and the tokens left after the name.
    Matched {
        descriptor: Arc<CommandDescriptor>,
        context: CommandContext,
    },
    /// Not a command invocation.
    NotFound,
    /// Not a command, but the typo checker proposed a registered one.
    Suggested { attempted: String, suggestion: String },
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

pub struct Resolver {
    registry: Arc<CommandRegistry>,
    prefixes: Arc<dyn PrefixProvider>,
    typo: Option<Arc<dyn TypoChecker>>,
    mention_as_prefix: bool,
}

impl Resolver {
    pub fn new(registry: Arc<CommandRegistry>, prefixes: Arc<dyn PrefixProvider>) -> Self {
        Self {
            registry,
            prefixes,
            typo: None,
            mention_as_prefix: false,
        }
    }

    pub fn with_typo_checker(mut self, checker: Arc<dyn TypoChecker>) -> Self {
        self.typo = Some(checker);
        self
    }

    /// Accept the bot's own mention in place of the configured prefix.
    pub fn mention_as_prefix(mut self, enabled: bool) -> Self {
        self.mention_as_prefix = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The prefix expected for this invocation, if any.
    fn expected_prefix(&self, ctx: &CommandContext, first: &str) -> Option<String> {
        if self.mention_as_prefix {
            if let Some(me) = ctx.client.self_id() {
                for mention in [me.mention(), me.nick_mention()] {
                    if first.starts_with(&mention) {
                        return Some(mention);
                    }
                }
            }
        }

        let prefix = match ctx.guild_id {
            Some(guild) => self.prefixes.guild_prefix(guild, ctx.channel_id),
            None => self.prefixes.dm_prefix(ctx.author_id),
        };
        prefix.filter(|p| !p.is_empty())
    }

    pub async fn resolve(&self, ctx: CommandContext, mut tokens: Tokens) -> Resolution {
        let Some(first) = tokens.peek().map(str::to_string) else {
            return Resolution::NotFound;
        };

        let prefixed = match self.expected_prefix(&ctx, &first) {
            Some(prefix) => {
                let Some(rest) = first.strip_prefix(prefix.as_str()) else {
                    return Resolution::NotFound;
                };
                if rest.is_empty() {
                    // `! ping`: the name is the next token.
                    tokens.pop_front();
                } else {
                    tokens.replace_front(rest);
                }
                true
            }
            None => false,
        };

        let Some(attempted) = tokens.pop_front() else {
            return Resolution::NotFound;
        };

        if let Some(descriptor) = self.registry.lookup(&attempted) {
            let descriptor = Arc::clone(descriptor);
            debug!(attempted = %attempted, command = %descriptor.name, remaining = tokens.len(), "Resolved command");
            let context = ctx.with_command(descriptor.name.clone(), tokens);
            return Resolution::Matched {
                descriptor,
                context,
            };
        }

        if !prefixed {
            return Resolution::NotFound;
        }
        let Some(checker) = &self.typo else {
            return Resolution::NotFound;
        };
        match checker.suggest(&ctx, &attempted).await {
            Some(suggestion) if self.registry.lookup(&suggestion).is_some() => {
                debug!(attempted = %attempted, suggestion = %suggestion, "Unknown command, suggesting correction");
                Resolution::Suggested {
                    attempted,
                    suggestion,
                }
            }
            _ => Resolution::NotFound,
        }
    }
}
