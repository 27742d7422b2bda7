/// Command dispatch: policy filters, overload selection, argument mapping,
/// invocation and result mapping for one resolved command.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info};

use cmdbot_core::OutgoingAction;

use crate::arguments::ArgumentMapperRegistry;
use crate::context::CommandContext;
use crate::descriptor::{CommandDescriptor, Invocation, ResponderDescriptor, ResponderKey};
use crate::error::{ConfigError, DispatchError, HandlerError};
use crate::permission::PermissionChecker;
use crate::registry::CommandRegistry;
use crate::results::ResultMapperRegistry;

pub const OWNER_ONLY_MESSAGE: &str = "Only the bot owner can run this command!";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a dispatch ended without a response and without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// The command is restricted to guilds or to direct messages.
    WrongScope,
    /// The command is limited to an allowlist of guilds.
    ServerNotAllowed,
}

/// A dispatch that did not fail.
#[derive(Debug)]
pub enum Outcome {
    Filtered(FilterReason),
    /// The responder ran; `actions` is empty when it returned nothing.
    Completed {
        responder: ResponderKey,
        actions: Vec<OutgoingAction>,
    },
}

impl Outcome {
    pub fn into_actions(self) -> Vec<OutgoingAction> {
        match self {
            Self::Filtered(_) => Vec::new(),
            Self::Completed { actions, .. } => actions,
        }
    }
}

// ---------------------------------------------------------------------------
// Responder selection
// ---------------------------------------------------------------------------

/// Pick the responder for `token_count` remaining tokens.
///
/// Exact arity wins. Failing that, a responder whose last parameter is a
/// `String` may absorb the surplus; the one with the most parameters wins.
/// Responders are visited in key order, so ties go to the lowest key.
pub fn select_responder(
    descriptor: &CommandDescriptor,
    token_count: usize,
) -> Result<&ResponderDescriptor, DispatchError> {
    if let Some(exact) = descriptor.responders.iter().find(|r| r.arity() == token_count) {
        return Ok(exact);
    }

    let mut capturing: Option<&ResponderDescriptor> = None;
    for responder in &descriptor.responders {
        if responder.captures_rest() && responder.arity() < token_count {
            if capturing.is_none_or(|best| responder.arity() > best.arity()) {
                capturing = Some(responder);
            }
        }
    }

    capturing.ok_or_else(|| DispatchError::ArgumentCountMismatch {
        command: descriptor.name.clone(),
        expected: expected_counts(descriptor),
        got: token_count,
    })
}

/// Human-readable accepted argument counts, e.g. `0, 1 or 2+`.
fn expected_counts(descriptor: &CommandDescriptor) -> String {
    let mut shapes: Vec<(usize, bool)> = descriptor
        .responders
        .iter()
        .map(|r| (r.arity(), r.captures_rest()))
        .collect();
    shapes.sort_unstable();
    shapes.dedup();

    let mut parts: Vec<String> = shapes
        .into_iter()
        .map(|(n, rest)| if rest { format!("{n}+") } else { n.to_string() })
        .collect();
    match parts.len() {
        0 => String::new(),
        1 => parts.remove(0),
        _ => {
            let last = parts.pop().unwrap_or_default();
            format!("{} or {}", parts.join(", "), last)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn mapper_panic(kind: &str, payload: Box<dyn Any + Send>) -> DispatchError {
    DispatchError::HandlerFault(format!("{kind} mapper panicked: {}", panic_message(payload.as_ref())))
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    arguments: Arc<ArgumentMapperRegistry>,
    results: Arc<ResultMapperRegistry>,
    permissions: Arc<dyn PermissionChecker>,
}

impl Dispatcher {
    pub fn new(
        arguments: Arc<ArgumentMapperRegistry>,
        results: Arc<ResultMapperRegistry>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            arguments,
            results,
            permissions,
        }
    }

    /// Check that every parameter of every registered responder has an
    /// argument mapper and every declared return type has a result mapper.
    pub fn validate(&self, registry: &CommandRegistry) -> Result<(), ConfigError> {
        for command in registry.all() {
            for responder in &command.responders {
                if let Some(param) = responder.params.iter().find(|p| !self.arguments.accepts(&p.key)) {
                    return Err(ConfigError::MissingArgumentMapper {
                        command: command.name.clone(),
                        type_name: param.key.name(),
                    });
                }
                if let Some(ret) = responder.returns.filter(|r| self.results.get(r).is_none()) {
                    return Err(ConfigError::MissingResultMapper {
                        command: command.name.clone(),
                        type_name: ret.name(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run one resolved command to completion.
    ///
    /// Arguments are all mapped before the handler runs and the handler
    /// finishes before its result is mapped, so a failure at any step leaves
    /// no partial effects behind.
    pub async fn dispatch(
        &self,
        descriptor: &CommandDescriptor,
        mut ctx: CommandContext,
    ) -> Result<Outcome, DispatchError> {
        let command = descriptor.name.as_str();

        if !descriptor.scope.allows(ctx.is_direct()) {
            debug!(command, scope = %descriptor.scope, "Command not available in this channel");
            return Ok(Outcome::Filtered(FilterReason::WrongScope));
        }

        if descriptor.owner_only && !ctx.is_owner() {
            info!(command, author = %ctx.author_id, "Owner-only command refused");
            return Err(DispatchError::InsufficientPermission(OWNER_ONLY_MESSAGE.to_string()));
        }

        if ctx.guild_id.is_some()
            && !descriptor.permissions.is_empty()
            && !self.permissions.has_permissions(&ctx, &descriptor.permissions).await
        {
            info!(command, author = %ctx.author_id, required = ?descriptor.permissions, "Missing permissions");
            let required: Vec<&str> = descriptor.permissions.iter().map(String::as_str).collect();
            return Err(DispatchError::InsufficientPermission(format!(
                "You need the following permission(s) to run `{command}`: {}",
                required.join(", ")
            )));
        }

        if let Some(servers) = &descriptor.servers {
            if !ctx.guild_id.is_some_and(|g| servers.contains(&g)) {
                debug!(command, guild = ?ctx.guild_id, "Guild not in command allowlist");
                return Ok(Outcome::Filtered(FilterReason::ServerNotAllowed));
            }
        }

        let responder = select_responder(descriptor, ctx.tokens.len())?;
        debug!(command, responder = %responder.key, arity = responder.arity(), "Selected responder");

        let arity = responder.arity();
        let mut args = Vec::with_capacity(arity);
        for (index, param) in responder.params.iter().enumerate() {
            let token = if index + 1 == arity && responder.captures_rest() {
                ctx.tokens.take_rest()
            } else {
                ctx.tokens.pop_front().ok_or_else(|| DispatchError::ArgumentCountMismatch {
                    command: command.to_string(),
                    expected: expected_counts(descriptor),
                    got: index,
                })?
            };
            let mapper = self.arguments.get(&param.key).ok_or_else(|| ConfigError::MissingArgumentMapper {
                command: command.to_string(),
                type_name: param.key.name(),
            })?;
            let value = AssertUnwindSafe(mapper.map(&ctx, &token))
                .catch_unwind()
                .await
                .map_err(|payload| mapper_panic("argument", payload))?
                .map_err(DispatchError::UnmappableArgument)?;
            args.push(value);
        }

        let invocation = Invocation::new(responder.consumes_context.then(|| ctx.clone()), args);
        let result = AssertUnwindSafe(async { responder.call(invocation).await })
            .catch_unwind()
            .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(HandlerError::Signal(signal))) => return Err(DispatchError::Signal(signal)),
            Ok(Err(HandlerError::Fault(err))) => return Err(DispatchError::HandlerFault(format!("{err:#}"))),
            Err(payload) => return Err(DispatchError::HandlerFault(panic_message(payload.as_ref()))),
        };

        let Some(output) = output else {
            debug!(command, "Responder returned no value");
            return Ok(Outcome::Completed {
                responder: responder.key,
                actions: Vec::new(),
            });
        };

        let key = output.key();
        let mapper = self
            .results
            .get(&key)
            .ok_or(DispatchError::UnhandledResultType(key.name()))?;
        let actions = AssertUnwindSafe(mapper.map(ctx.client.as_ref(), &ctx.event, output))
            .catch_unwind()
            .await
            .map_err(|payload| mapper_panic("result", payload))?
            .map_err(DispatchError::ResultMapping)?;

        debug!(command, actions = actions.len(), "Dispatch completed");
        Ok(Outcome::Completed {
            responder: responder.key,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cmdbot_core::{Author, ChannelId, GuildId, MessageEvent, RecordingClient, UserId};

    use crate::descriptor::{ChannelScope, ResponderBuilder};
    use crate::error::ErrorSignal;
    use crate::permission::{AllowAll, StaticPermissions};
    use crate::tokenizer::tokenize;
    use crate::types::Output;

    const OWNER: u64 = 1;

    fn dispatcher_with(permissions: Arc<dyn PermissionChecker>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(ArgumentMapperRegistry::with_defaults()),
            Arc::new(ResultMapperRegistry::with_defaults()),
            permissions,
        )
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(Arc::new(AllowAll))
    }

    fn guild_ctx(author: u64, args: &str) -> CommandContext {
        ctx(MessageEvent::in_guild(1, 2, 3, Author::new(author, "ann"), args), args)
    }

    fn dm_ctx(author: u64, args: &str) -> CommandContext {
        ctx(MessageEvent::direct(1, 3, Author::new(author, "ann"), args), args)
    }

    fn ctx(event: MessageEvent, args: &str) -> CommandContext {
        CommandContext::new(
            Arc::new(event),
            Arc::new(RecordingClient::new()),
            Arc::new(CommandRegistry::default()),
        )
        .with_owner(Some(UserId(OWNER)))
        .with_command("cmd", tokenize(args))
    }

    fn respond() -> ResponderBuilder {
        ResponderDescriptor::builder("respond")
    }

    fn texts(outcome: Outcome) -> Vec<String> {
        outcome
            .into_actions()
            .into_iter()
            .map(|a| match a {
                OutgoingAction::Text { content, .. } => content,
                other => panic!("unexpected action {other:?}"),
            })
            .collect()
    }

    fn counted(calls: &Arc<AtomicUsize>) -> ResponderDescriptor {
        let calls = Arc::clone(calls);
        respond().param::<i64>("n").handler(move |mut inv| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let n: i64 = inv.arg()?;
                Ok(Some(Output::new(n * 2)))
            }
        })
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let ping = CommandDescriptor::builder("ping")
            .responder(respond().handler(|_| async { Ok(Some(Output::text("pong"))) }))
            .build()
            .unwrap();

        let outcome = dispatcher().dispatch(&ping, guild_ctx(5, "")).await.unwrap();
        let actions = outcome.into_actions();
        assert_eq!(actions, vec![OutgoingAction::text(ChannelId(3), "pong")]);
    }

    #[tokio::test]
    async fn test_owner_only_refuses_others_without_invoking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cmd = CommandDescriptor::builder("restart")
            .owner_only()
            .responder(counted(&calls))
            .build()
            .unwrap();

        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "2")).await.unwrap_err();
        assert!(matches!(err, DispatchError::InsufficientPermission(ref m) if m == OWNER_ONLY_MESSAGE));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let outcome = dispatcher().dispatch(&cmd, guild_ctx(OWNER, "2")).await.unwrap();
        assert_eq!(texts(outcome), vec!["4"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_arity_selects_responder() {
        let cmd = CommandDescriptor::builder("greet")
            .responder(respond().handler(|_| async { Ok(Some(Output::text("hello"))) }))
            .responder(respond().param::<String>("name").handler(|mut inv| async move {
                let name: String = inv.arg()?;
                Ok(Some(Output::text(format!("hello {name}"))))
            }))
            .build()
            .unwrap();

        let d = dispatcher();
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(5, "")).await.unwrap()), vec!["hello"]);
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(5, "bob")).await.unwrap()), vec!["hello bob"]);
        // Surplus tokens fold into the trailing String.
        assert_eq!(
            texts(d.dispatch(&cmd, guild_ctx(5, "bob and  alice")).await.unwrap()),
            vec!["hello bob and alice"]
        );
    }

    #[tokio::test]
    async fn test_exact_arity_beats_capture() {
        let cmd = CommandDescriptor::builder("pair")
            .responder(respond().param::<String>("all").handler(|mut inv| async move {
                let all: String = inv.arg()?;
                Ok(Some(Output::text(format!("one:{all}"))))
            }))
            .responder(
                respond()
                    .param::<String>("a")
                    .param::<String>("b")
                    .handler(|mut inv| async move {
                        let a: String = inv.arg()?;
                        let b: String = inv.arg()?;
                        Ok(Some(Output::text(format!("two:{a}|{b}"))))
                    }),
            )
            .build()
            .unwrap();

        let d = dispatcher();
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(5, "x")).await.unwrap()), vec!["one:x"]);
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(5, "x y")).await.unwrap()), vec!["two:x|y"]);
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(5, "x y z")).await.unwrap()), vec!["two:x|y z"]);
    }

    #[tokio::test]
    async fn test_tie_break_is_independent_of_registration_order() {
        let a = || respond().handler(|_| async { Ok(Some(Output::text("a"))) });
        let b = || {
            ResponderDescriptor::builder("other")
                .handler(|_| async { Ok(Some(Output::text("b"))) })
        };
        let first = CommandDescriptor::builder("t").responder(a()).responder(b()).build().unwrap();
        let second = CommandDescriptor::builder("t").responder(b()).responder(a()).build().unwrap();

        let d = dispatcher();
        let x = texts(d.dispatch(&first, guild_ctx(5, "")).await.unwrap());
        let y = texts(d.dispatch(&second, guild_ctx(5, "")).await.unwrap());
        assert_eq!(x, y);
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cmd = CommandDescriptor::builder("double").responder(counted(&calls)).build().unwrap();

        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap_err();
        match err {
            DispatchError::ArgumentCountMismatch { expected, got, .. } => {
                assert_eq!(expected, "1");
                assert_eq!(got, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(dispatcher().dispatch(&cmd, guild_ctx(5, "1 2")).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmappable_argument_never_invokes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cmd = CommandDescriptor::builder("cmd").responder(counted(&calls)).build().unwrap();

        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "abc")).await.unwrap_err();
        match err {
            DispatchError::UnmappableArgument(e) => assert_eq!(e.token, "abc"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_signal_surfaces() {
        let cmd = CommandDescriptor::builder("find")
            .responder(respond().handler(|_| async { Err(HandlerError::signal("No such user")) }))
            .build()
            .unwrap();
        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Signal(ErrorSignal { message: Some(ref m) }) if m == "No such user"));
        assert!(!err.is_defect());
    }

    #[tokio::test]
    async fn test_unhandled_result_type_is_defect() {
        struct Opaque;
        let cmd = CommandDescriptor::builder("odd")
            .responder(respond().handler(|_| async { Ok(Some(Output::new(Opaque))) }))
            .build()
            .unwrap();
        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnhandledResultType(_)));
        assert!(err.is_defect());
    }

    #[tokio::test]
    async fn test_panic_becomes_fault() {
        let cmd = CommandDescriptor::builder("boom")
            .responder(respond().handler(|_| async {
                let v: Vec<u8> = Vec::new();
                Ok(Some(Output::new(i64::from(v[3]))))
            }))
            .build()
            .unwrap();
        let err = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerFault(_)));
    }

    #[tokio::test]
    async fn test_no_value_completes_without_actions() {
        let cmd = CommandDescriptor::builder("quiet")
            .responder(respond().handler(|_| async { Ok(None) }))
            .build()
            .unwrap();
        let outcome = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap();
        assert!(matches!(outcome, Outcome::Completed { ref actions, .. } if actions.is_empty()));
    }

    #[tokio::test]
    async fn test_scope_and_allowlist_are_silent() {
        let server_only = CommandDescriptor::builder("s")
            .only_in(ChannelScope::Server)
            .responder(respond().handler(|_| async { Ok(Some(Output::text("x"))) }))
            .build()
            .unwrap();
        let outcome = dispatcher().dispatch(&server_only, dm_ctx(5, "")).await.unwrap();
        assert!(matches!(outcome, Outcome::Filtered(FilterReason::WrongScope)));

        let pinned = CommandDescriptor::builder("p")
            .servers([GuildId(50)])
            .responder(respond().handler(|_| async { Ok(Some(Output::text("x"))) }))
            .build()
            .unwrap();
        let outcome = dispatcher().dispatch(&pinned, guild_ctx(5, "")).await.unwrap();
        assert!(matches!(outcome, Outcome::Filtered(FilterReason::ServerNotAllowed)));
        let outcome = dispatcher().dispatch(&pinned, dm_ctx(5, "")).await.unwrap();
        assert!(matches!(outcome, Outcome::Filtered(FilterReason::ServerNotAllowed)));
    }

    #[tokio::test]
    async fn test_permissions_checked_in_guilds_only() {
        let cmd = CommandDescriptor::builder("ban")
            .require_permission("BAN_MEMBERS")
            .responder(respond().handler(|_| async { Ok(Some(Output::text("banned"))) }))
            .build()
            .unwrap();
        let d = dispatcher_with(Arc::new(StaticPermissions::new().grant(UserId(7), "BAN_MEMBERS")));

        let err = d.dispatch(&cmd, guild_ctx(5, "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::InsufficientPermission(ref m) if m.contains("BAN_MEMBERS")));
        assert_eq!(texts(d.dispatch(&cmd, guild_ctx(7, "")).await.unwrap()), vec!["banned"]);
        assert_eq!(texts(d.dispatch(&cmd, dm_ctx(5, "")).await.unwrap()), vec!["banned"]);
    }

    #[tokio::test]
    async fn test_context_consuming_responder() {
        let cmd = CommandDescriptor::builder("whoami")
            .responder(respond().with_context().handler(|inv| async move {
                let ctx = inv.require_context()?;
                Ok(Some(Output::new(ctx.author_id)))
            }))
            .build()
            .unwrap();
        let outcome = dispatcher().dispatch(&cmd, guild_ctx(5, "")).await.unwrap();
        assert_eq!(texts(outcome), vec!["<@5>"]);
    }

    #[test]
    fn test_validate_requires_argument_mappers() {
        struct Unmapped;
        let mut registry = CommandRegistry::default();
        registry
            .register(
                CommandDescriptor::builder("odd")
                    .responder(respond().param::<Unmapped>("x").handler(|_| async { Ok(None) }))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let err = dispatcher().validate(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::MissingArgumentMapper { ref command, .. } if command == "odd"));
    }

    #[test]
    fn test_validate_requires_result_mappers() {
        struct Opaque;
        let mut registry = CommandRegistry::default();
        registry
            .register(
                CommandDescriptor::builder("odd")
                    .responder(respond().returns::<Opaque>().handler(|_| async { Ok(None) }))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let err = dispatcher().validate(&registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingResultMapper { ref command, type_name } if command == "odd" && type_name.ends_with("Opaque")
        ));
    }

    #[test]
    fn test_validate_accepts_mapped_return_types() {
        let mut registry = CommandRegistry::default();
        registry
            .register(
                CommandDescriptor::builder("ping")
                    .responder(respond().returns::<String>().handler(|_| async { Ok(None) }))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert!(dispatcher().validate(&registry).is_ok());
    }

    #[tokio::test]
    async fn test_mapper_panics_become_faults() {
        struct Touchy;
        struct TouchyMapper;

        #[async_trait::async_trait]
        impl crate::arguments::ArgumentMapper for TouchyMapper {
            fn accepts(&self) -> crate::types::TypeKey {
                crate::types::TypeKey::of::<Touchy>()
            }

            async fn map(
                &self,
                _ctx: &CommandContext,
                token: &str,
            ) -> Result<crate::types::ArgValue, crate::error::MappingError> {
                panic!("cannot map {token}");
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let cmd = CommandDescriptor::builder("touchy")
            .responder(respond().param::<Touchy>("t").handler(move |_| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            }))
            .build()
            .unwrap();

        let mut arguments = ArgumentMapperRegistry::with_defaults();
        arguments.register(Arc::new(TouchyMapper)).unwrap();
        let mut results = ResultMapperRegistry::with_defaults();
        results
            .register_fn(|_, _: u8| -> Vec<OutgoingAction> { panic!("no bytes") })
            .unwrap();
        let d = Dispatcher::new(Arc::new(arguments), Arc::new(results), Arc::new(AllowAll));

        let err = d.dispatch(&cmd, guild_ctx(5, "x")).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerFault(ref m) if m.contains("cannot map x")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let bytes = CommandDescriptor::builder("bytes")
            .responder(respond().handler(|_| async { Ok(Some(Output::new(7u8))) }))
            .build()
            .unwrap();
        let err = d.dispatch(&bytes, guild_ctx(5, "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerFault(ref m) if m.contains("no bytes")));
    }

    #[test]
    fn test_expected_counts_text() {
        let cmd = CommandDescriptor::builder("help")
            .responder(respond().handler(|_| async { Ok(None) }))
            .responder(respond().param::<String>("c").handler(|_| async { Ok(None) }))
            .responder(respond().param::<String>("c").param::<i64>("n").handler(|_| async { Ok(None) }))
            .build()
            .unwrap();
        assert_eq!(expected_counts(&cmd), "0, 1+ or 2");
    }
}
