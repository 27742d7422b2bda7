/// Command engine: the per-message pipeline and the inbound message loop.
///
/// `handle` runs filter -> tokenize -> resolve -> dispatch -> render for one
/// event and sends the resulting actions. `run` drives `handle` concurrently,
/// one task per inbound event.
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use cmdbot_core::{ChannelId, ChatClient, MessageEvent, OutgoingAction, UserId};

use crate::arguments::ArgumentMapperRegistry;
use crate::context::CommandContext;
use crate::dispatch::Dispatcher;
use crate::error::{ConfigError, DispatchError};
use crate::permission::{AllowAll, PermissionChecker};
use crate::prefix::{NoPrefix, PrefixProvider, StaticPrefix};
use crate::registry::CommandRegistry;
use crate::resolver::{Resolution, Resolver};
use crate::results::ResultMapperRegistry;
use crate::tokenizer::tokenize;
use crate::typo::{JaroWinklerTypoChecker, MIN_SIMILARITY, TypoChecker};

pub const DEFAULT_GENERIC_FAILURE: &str = "Something went wrong while running that command.";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Prefix used everywhere unless a custom provider is installed.
    /// `None` means commands are invoked unprefixed.
    pub prefix: Option<String>,
    pub mention_as_prefix: bool,
    pub case_insensitive: bool,
    pub owner_id: Option<UserId>,
    pub typo_checking: bool,
    pub min_similarity: f64,
    /// Shown for defects and bare error signals.
    pub generic_failure: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prefix: Some("!".to_string()),
            mention_as_prefix: true,
            case_insensitive: false,
            owner_id: None,
            typo_checking: true,
            min_similarity: MIN_SIMILARITY,
            generic_failure: DEFAULT_GENERIC_FAILURE.to_string(),
        }
    }
}

/// Wrap a user-facing failure message.
pub fn render_failure(message: &str) -> String {
    format!("🚫 {message} 🚫")
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct EngineBuilder {
    client: Arc<dyn ChatClient>,
    registry: Arc<CommandRegistry>,
    options: EngineOptions,
    prefixes: Option<Arc<dyn PrefixProvider>>,
    arguments: ArgumentMapperRegistry,
    results: ResultMapperRegistry,
    permissions: Arc<dyn PermissionChecker>,
    typo: Option<Arc<dyn TypoChecker>>,
}

impl EngineBuilder {
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the prefix derived from [`EngineOptions::prefix`].
    pub fn prefixes(mut self, prefixes: Arc<dyn PrefixProvider>) -> Self {
        self.prefixes = Some(prefixes);
        self
    }

    pub fn arguments(mut self, arguments: ArgumentMapperRegistry) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn results(mut self, results: ResultMapperRegistry) -> Self {
        self.results = results;
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Replace the default Jaro–Winkler checker.
    pub fn typo_checker(mut self, checker: Arc<dyn TypoChecker>) -> Self {
        self.typo = Some(checker);
        self
    }

    /// Validate the wiring and build the engine.
    pub fn build(self) -> Result<CommandEngine, ConfigError> {
        let options = self.options;

        let prefixes: Arc<dyn PrefixProvider> = match (self.prefixes, &options.prefix) {
            (Some(custom), _) => custom,
            (None, Some(prefix)) => Arc::new(StaticPrefix::new(prefix.clone())),
            (None, None) => Arc::new(NoPrefix),
        };

        let mut resolver = Resolver::new(Arc::clone(&self.registry), prefixes)
            .mention_as_prefix(options.mention_as_prefix);
        if options.typo_checking {
            let checker: Arc<dyn TypoChecker> = match self.typo {
                Some(custom) => custom,
                None => Arc::new(JaroWinklerTypoChecker::new(options.min_similarity)),
            };
            resolver = resolver.with_typo_checker(checker);
        }

        let dispatcher = Dispatcher::new(Arc::new(self.arguments), Arc::new(self.results), self.permissions);
        dispatcher.validate(&self.registry)?;

        info!(
            client = self.client.name(),
            commands = self.registry.len(),
            prefix = ?options.prefix,
            "Command engine ready"
        );

        Ok(CommandEngine {
            client: self.client,
            registry: self.registry,
            resolver,
            dispatcher,
            options,
        })
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct CommandEngine {
    client: Arc<dyn ChatClient>,
    registry: Arc<CommandRegistry>,
    resolver: Resolver,
    dispatcher: Dispatcher,
    options: EngineOptions,
}

impl CommandEngine {
    pub fn builder(client: Arc<dyn ChatClient>, registry: Arc<CommandRegistry>) -> EngineBuilder {
        EngineBuilder {
            client,
            registry,
            options: EngineOptions::default(),
            prefixes: None,
            arguments: ArgumentMapperRegistry::with_defaults(),
            results: ResultMapperRegistry::with_defaults(),
            permissions: Arc::new(AllowAll),
            typo: None,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compute the actions answering `event` without sending them.
    pub async fn respond(&self, event: MessageEvent) -> Vec<OutgoingAction> {
        if event.author.bot {
            debug!(author = %event.author.id, "Ignoring message from bot");
            return Vec::new();
        }
        if event.content.trim().is_empty() {
            return Vec::new();
        }

        let channel_id = event.channel_id;
        let tokens = tokenize(&event.content);
        let ctx = CommandContext::new(Arc::new(event), Arc::clone(&self.client), Arc::clone(&self.registry))
            .with_owner(self.options.owner_id);

        match self.resolver.resolve(ctx, tokens).await {
            Resolution::NotFound => Vec::new(),
            Resolution::Suggested {
                attempted,
                suggestion,
            } => vec![OutgoingAction::text(
                channel_id,
                format!("Command `{attempted}` not found. Did you mean `{suggestion}`?"),
            )],
            Resolution::Matched {
                descriptor,
                context,
            } => match self.dispatcher.dispatch(&descriptor, context).await {
                Ok(outcome) => outcome.into_actions(),
                Err(err) => vec![self.failure(channel_id, &descriptor.name, &err)],
            },
        }
    }

    fn failure(&self, channel_id: ChannelId, command: &str, err: &DispatchError) -> OutgoingAction {
        if err.is_defect() {
            error!(command, error = %err, "Command failed");
        } else {
            info!(command, error = %err, "Command rejected");
        }
        let message = err.user_message(&self.options.generic_failure);
        OutgoingAction::text(channel_id, render_failure(&message))
    }

    /// Handle one inbound event end to end. Returns the number of actions sent.
    pub async fn handle(&self, event: MessageEvent) -> usize {
        let span = info_span!("dispatch", id = %Uuid::new_v4(), message = %event.id, channel = %event.channel_id);
        async move {
            let actions = self.respond(event).await;
            let mut sent = 0;
            for action in actions {
                match self.client.send(action).await {
                    Ok(()) => sent += 1,
                    Err(err) => warn!(client = self.client.name(), error = %err, "Failed to send action"),
                }
            }
            sent
        }
        .instrument(span)
        .await
    }

    /// Handle events until `events` closes, then wait for in-flight dispatches.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<MessageEvent>) -> Result<()> {
        let mut in_flight = JoinSet::new();
        info!(client = self.client.name(), "Command loop started");

        loop {
            tokio::select! {
                next = events.recv() => match next {
                    Some(event) => {
                        let engine = Arc::clone(&self);
                        in_flight.spawn(async move { engine.handle(event).await });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        error!(error = %err, "Dispatch task failed");
                    }
                }
            }
        }

        debug!(pending = in_flight.len(), "Event source closed, draining dispatches");
        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Dispatch task failed");
            }
        }
        info!("Command loop stopped");
        Ok(())
    }
}
