/// Command and responder descriptors.
///
/// A command is a name, its aliases, invocation policy (scope, permissions,
/// owner-only, server allowlist), help text and one or more responders. Each
/// responder is a plain async callable with a fixed calling convention:
/// ordered typed arguments, an optional context, an optional return value.
use std::any::Any;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use cmdbot_core::GuildId;

use crate::context::CommandContext;
use crate::error::{ConfigError, HandlerError};
use crate::types::{ArgValue, Output, TypeKey};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Where a command may be invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelScope {
    #[default]
    All,
    /// Guild channels only.
    Server,
    /// Direct messages only.
    Direct,
}

impl ChannelScope {
    pub fn allows(self, is_direct: bool) -> bool {
        match self {
            Self::All => true,
            Self::Server => !is_direct,
            Self::Direct => is_direct,
        }
    }
}

impl fmt::Display for ChannelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Server => "server",
            Self::Direct => "direct message",
        };
        write!(f, "{}", s)
    }
}

/// Named platform permissions a command requires. Opaque to the engine.
pub type PermissionSet = BTreeSet<String>;

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// The mapped arguments (and optionally the context) passed to a responder.
pub struct Invocation {
    context: Option<CommandContext>,
    args: VecDeque<ArgValue>,
    taken: usize,
}

impl Invocation {
    pub fn new(context: Option<CommandContext>, args: Vec<ArgValue>) -> Self {
        Self {
            context,
            args: args.into(),
            taken: 0,
        }
    }

    /// Take the next argument, in declaration order.
    pub fn arg<T: Any>(&mut self) -> Result<T, HandlerError> {
        let index = self.taken;
        let value = self
            .args
            .pop_front()
            .ok_or_else(|| anyhow!("responder asked for argument {index} but none is left"))?;
        self.taken += 1;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            HandlerError::Fault(anyhow!(
                "argument {index} is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// The invocation context. Only present for context-consuming responders.
    pub fn context(&self) -> Option<&CommandContext> {
        self.context.as_ref()
    }

    /// The invocation context, or a fault if the responder did not declare it.
    pub fn require_context(&self) -> Result<&CommandContext, HandlerError> {
        self.context
            .as_ref()
            .ok_or_else(|| HandlerError::Fault(anyhow!("responder did not declare a context parameter")))
    }

    pub fn remaining(&self) -> usize {
        self.args.len()
    }
}

pub type HandlerFuture = BoxFuture<'static, Result<Option<Output>, HandlerError>>;
pub type HandlerFn = Arc<dyn Fn(Invocation) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

/// One declared parameter of a responder.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub description: Option<String>,
    pub key: TypeKey,
}

/// Stable overload ordering key: the first 8 bytes of a SHA-256 over the
/// responder name, return type and parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponderKey(pub u64);

impl ResponderKey {
    pub fn compute(name: &str, returns: Option<TypeKey>, params: &[TypeKey]) -> Self {
        let ret = returns.map(|k| k.name()).unwrap_or("()");
        let params: Vec<&str> = params.iter().map(|k| k.name()).collect();
        let raw = format!("{}|{}|{}", name, ret, params.join(","));
        let digest = Sha256::digest(raw.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for ResponderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0.to_be_bytes()))
    }
}

/// One overload of a command.
#[derive(Clone)]
pub struct ResponderDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<ParamInfo>,
    pub consumes_context: bool,
    pub returns: Option<TypeKey>,
    pub key: ResponderKey,
    handler: HandlerFn,
}

impl ResponderDescriptor {
    pub fn builder(name: impl Into<String>) -> ResponderBuilder {
        ResponderBuilder::new(name)
    }

    /// Number of token-consuming parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether surplus tokens can be folded into a trailing `String` parameter.
    pub fn captures_rest(&self) -> bool {
        self.params.last().is_some_and(|p| p.key.is::<String>())
    }

    pub fn param_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.params.iter().map(|p| p.key)
    }

    /// Run the handler.
    pub fn call(&self, invocation: Invocation) -> HandlerFuture {
        (self.handler)(invocation)
    }

    /// One-line usage, e.g. `echo <message: String>`.
    pub fn usage(&self, command: &str) -> String {
        let mut parts = vec![command.to_string()];
        parts.extend(
            self.params
                .iter()
                .map(|p| format!("<{}: {}>", p.name, p.key.short_name())),
        );
        parts.join(" ")
    }
}

impl fmt::Debug for ResponderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponderDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("consumes_context", &self.consumes_context)
            .field("returns", &self.returns)
            .field("key", &self.key)
            .finish()
    }
}

/// Builder for [`ResponderDescriptor`].
pub struct ResponderBuilder {
    name: String,
    description: Option<String>,
    params: Vec<ParamInfo>,
    consumes_context: bool,
    returns: Option<TypeKey>,
}

impl ResponderBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
            consumes_context: false,
            returns: None,
        }
    }

    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare the next positional parameter.
    pub fn param<T: Any>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamInfo {
            name: name.into(),
            description: None,
            key: TypeKey::of::<T>(),
        });
        self
    }

    /// Declare the next positional parameter with help text.
    pub fn param_with_help<T: Any>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamInfo {
            name: name.into(),
            description: Some(description.into()),
            key: TypeKey::of::<T>(),
        });
        self
    }

    /// The responder receives the invocation context.
    pub fn with_context(mut self) -> Self {
        self.consumes_context = true;
        self
    }

    /// Declare the return type. Only feeds the overload key.
    pub fn returns<T: Any>(mut self) -> Self {
        self.returns = Some(TypeKey::of::<T>());
        self
    }

    pub fn handler<F, Fut>(self, f: F) -> ResponderDescriptor
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Output>, HandlerError>> + Send + 'static,
    {
        let keys: Vec<TypeKey> = self.params.iter().map(|p| p.key).collect();
        let key = ResponderKey::compute(&self.name, self.returns, &keys);
        ResponderDescriptor {
            name: self.name,
            description: self.description,
            params: self.params,
            consumes_context: self.consumes_context,
            returns: self.returns,
            key,
            handler: Arc::new(move |inv| -> HandlerFuture { Box::pin(f(inv)) }),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A registered command. Immutable once built.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub permissions: PermissionSet,
    pub scope: ChannelScope,
    pub owner_only: bool,
    /// When set, only these guilds may invoke the command.
    pub servers: Option<HashSet<GuildId>>,
    /// Sorted by [`ResponderKey`], ascending.
    pub responders: Vec<ResponderDescriptor>,
}

impl CommandDescriptor {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// The name followed by every alias.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Builder for [`CommandDescriptor`]; validation happens in [`CommandBuilder::build`].
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    permissions: PermissionSet,
    scope: ChannelScope,
    owner_only: bool,
    servers: Option<HashSet<GuildId>>,
    responders: Vec<ResponderDescriptor>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            permissions: PermissionSet::new(),
            scope: ChannelScope::All,
            owner_only: false,
            servers: None,
            responders: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn require_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn only_in(mut self, scope: ChannelScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    /// Restrict the command to the given guilds.
    pub fn servers(mut self, servers: impl IntoIterator<Item = GuildId>) -> Self {
        self.servers = Some(servers.into_iter().collect());
        self
    }

    pub fn responder(mut self, responder: ResponderDescriptor) -> Self {
        self.responders.push(responder);
        self
    }

    pub fn build(self) -> Result<CommandDescriptor, ConfigError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.responders.is_empty() {
            return Err(ConfigError::NoResponders(name));
        }

        let mut aliases: Vec<String> = Vec::new();
        for alias in self.aliases {
            let alias = alias.trim().to_string();
            if alias.is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if alias != name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let mut responders = self.responders;
        responders.sort_by_key(|r| r.key);
        // Equal keys would make selection depend on registration order.
        if let Some(pair) = responders.windows(2).find(|w| w[0].key == w[1].key) {
            return Err(ConfigError::DuplicateResponder {
                command: name,
                key: pair[0].key,
            });
        }

        Ok(CommandDescriptor {
            name,
            aliases,
            description: self.description,
            permissions: self.permissions,
            scope: self.scope,
            owner_only: self.owner_only,
            servers: self.servers,
            responders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> ResponderBuilder {
        ResponderDescriptor::builder(name)
    }

    #[test]
    fn test_scope_filter() {
        assert!(ChannelScope::All.allows(true));
        assert!(ChannelScope::All.allows(false));
        assert!(ChannelScope::Server.allows(false));
        assert!(!ChannelScope::Server.allows(true));
        assert!(ChannelScope::Direct.allows(true));
        assert!(!ChannelScope::Direct.allows(false));
    }

    #[test]
    fn test_responder_key_is_deterministic_and_shape_sensitive() {
        let a = ResponderKey::compute("respond", None, &[TypeKey::of::<String>()]);
        let b = ResponderKey::compute("respond", None, &[TypeKey::of::<String>()]);
        let c = ResponderKey::compute("respond", None, &[TypeKey::of::<i64>()]);
        let d = ResponderKey::compute("respond", Some(TypeKey::of::<String>()), &[TypeKey::of::<String>()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.to_string().len(), 16);
    }

    #[test]
    fn test_build_requires_name_and_responder() {
        assert_eq!(CommandDescriptor::builder("  ").build().unwrap_err(), ConfigError::EmptyName);
        assert_eq!(
            CommandDescriptor::builder("ping").build().unwrap_err(),
            ConfigError::NoResponders("ping".into())
        );
    }

    #[test]
    fn test_build_dedupes_aliases_and_sorts_responders() {
        let cmd = CommandDescriptor::builder("help")
            .alias("man")
            .alias("man")
            .alias("help")
            .responder(noop("respond").param::<String>("command").handler(|_| async { Ok(None) }))
            .responder(noop("respond").handler(|_| async { Ok(None) }))
            .responder(
                noop("respond")
                    .param::<String>("command")
                    .param::<i64>("selector")
                    .handler(|_| async { Ok(None) }),
            )
            .build()
            .unwrap();

        assert_eq!(cmd.aliases, vec!["man".to_string()]);
        assert_eq!(cmd.all_names().collect::<Vec<_>>(), vec!["help", "man"]);
        let keys: Vec<ResponderKey> = cmd.responders.iter().map(|r| r.key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_identical_responders_rejected_in_either_order() {
        let a = || noop("respond").handler(|_| async { Ok(Some(Output::text("a"))) });
        let b = || noop("respond").handler(|_| async { Ok(Some(Output::text("b"))) });
        let expected = ResponderKey::compute("respond", None, &[]);

        for cmd in [
            CommandDescriptor::builder("t").responder(a()).responder(b()),
            CommandDescriptor::builder("t").responder(b()).responder(a()),
        ] {
            assert_eq!(
                cmd.build().unwrap_err(),
                ConfigError::DuplicateResponder {
                    command: "t".into(),
                    key: expected,
                }
            );
        }
    }

    #[test]
    fn test_responder_shape() {
        let r = noop("respond")
            .param::<i64>("count")
            .param_with_help::<String>("text", "What to say")
            .with_context()
            .returns::<String>()
            .handler(|_| async { Ok(None) });
        assert_eq!(r.arity(), 2);
        assert!(r.captures_rest());
        assert!(r.consumes_context);
        assert_eq!(r.usage("say"), "say <count: i64> <text: String>");
    }

    #[tokio::test]
    async fn test_invocation_hands_out_typed_args_in_order() {
        let r = noop("respond")
            .param::<i64>("a")
            .param::<String>("b")
            .handler(|mut inv| async move {
                let a: i64 = inv.arg()?;
                let b: String = inv.arg()?;
                Ok(Some(Output::text(format!("{b}{a}"))))
            });

        let inv = Invocation::new(None, vec![Box::new(3i64), Box::new("x".to_string())]);
        let out = r.call(inv).await.unwrap().unwrap();
        assert_eq!(out.downcast::<String>().unwrap(), "x3");
    }

    #[test]
    fn test_invocation_wrong_type_is_fault() {
        let mut inv = Invocation::new(None, vec![Box::new(3i64)]);
        assert!(matches!(inv.arg::<String>(), Err(HandlerError::Fault(_))));
        assert!(matches!(inv.arg::<i64>(), Err(HandlerError::Fault(_))));
        assert!(inv.require_context().is_err());
    }
}
