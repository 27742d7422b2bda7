/// Argument mappers: convert one token into a typed responder argument.
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use cmdbot_core::{ChannelId, GuildId, RoleId, UserId};

use crate::context::CommandContext;
use crate::error::{ConfigError, MappingError};
use crate::types::{ArgValue, TypeKey};

static USER_MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>$").unwrap());
static CHANNEL_MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<#(\d+)>$").unwrap());
static ROLE_MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@&(\d+)>$").unwrap());

// ---------------------------------------------------------------------------
// Mapper trait
// ---------------------------------------------------------------------------

/// Converts a single token into a value of the type returned by `accepts`.
///
/// Mappers receive the invocation context so they can consult the event or
/// the chat client (e.g. to resolve a name into an id).
#[async_trait]
pub trait ArgumentMapper: Send + Sync {
    /// The type this mapper produces.
    fn accepts(&self) -> TypeKey;

    async fn map(&self, ctx: &CommandContext, token: &str) -> Result<ArgValue, MappingError>;
}

// ---------------------------------------------------------------------------
// Built-in mappers
// ---------------------------------------------------------------------------

/// Passes the token through unchanged.
pub struct StringMapper;

#[async_trait]
impl ArgumentMapper for StringMapper {
    fn accepts(&self) -> TypeKey {
        TypeKey::of::<String>()
    }

    async fn map(&self, _ctx: &CommandContext, token: &str) -> Result<ArgValue, MappingError> {
        Ok(Box::new(token.to_string()))
    }
}

/// Maps via the type's `FromStr` implementation. Covers numbers and
/// user-defined enums alike.
pub struct ParseMapper<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParseMapper<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ParseMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> ArgumentMapper for ParseMapper<T>
where
    T: FromStr + Any + Send + 'static,
{
    fn accepts(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    async fn map(&self, _ctx: &CommandContext, token: &str) -> Result<ArgValue, MappingError> {
        token
            .parse::<T>()
            .map(|value| Box::new(value) as ArgValue)
            .map_err(|_| MappingError::new(token, self.accepts().short_name()))
    }
}

/// Case-insensitive `true` / `false`.
pub struct BoolMapper;

#[async_trait]
impl ArgumentMapper for BoolMapper {
    fn accepts(&self) -> TypeKey {
        TypeKey::of::<bool>()
    }

    async fn map(&self, _ctx: &CommandContext, token: &str) -> Result<ArgValue, MappingError> {
        if token.eq_ignore_ascii_case("true") {
            Ok(Box::new(true))
        } else if token.eq_ignore_ascii_case("false") {
            Ok(Box::new(false))
        } else {
            Err(MappingError::new(token, "bool"))
        }
    }
}

/// Accepts either a raw numeric id or, when a pattern is given, its mention
/// markup (`<@123>`, `<#123>`, ...).
pub struct SnowflakeMapper<T> {
    mention: Option<&'static Lazy<Regex>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SnowflakeMapper<T> {
    fn with_mention(mention: Option<&'static Lazy<Regex>>) -> Self {
        Self {
            mention,
            _marker: PhantomData,
        }
    }
}

/// Extract the numeric id from a token, honoring an optional mention pattern.
fn parse_snowflake(token: &str, mention: Option<&Regex>) -> Option<u64> {
    if let Some(caps) = mention.and_then(|re| re.captures(token)) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    token.parse().ok()
}

#[async_trait]
impl<T> ArgumentMapper for SnowflakeMapper<T>
where
    T: From<u64> + Any + Send + 'static,
{
    fn accepts(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    async fn map(&self, _ctx: &CommandContext, token: &str) -> Result<ArgValue, MappingError> {
        let mention = self.mention.map(|re| &**re);
        parse_snowflake(token, mention)
            .map(|raw| Box::new(T::from(raw)) as ArgValue)
            .ok_or_else(|| MappingError::new(token, self.accepts().short_name()))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Argument mappers keyed by the exact type they produce. At most one per type.
#[derive(Default)]
pub struct ArgumentMapperRegistry {
    mappers: HashMap<TypeKey, Arc<dyn ArgumentMapper>>,
}

impl ArgumentMapperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in mappers.
    pub fn with_defaults() -> Self {
        let defaults: Vec<Arc<dyn ArgumentMapper>> = vec![
            Arc::new(StringMapper),
            Arc::new(BoolMapper),
            Arc::new(ParseMapper::<i32>::new()),
            Arc::new(ParseMapper::<i64>::new()),
            Arc::new(ParseMapper::<u64>::new()),
            Arc::new(ParseMapper::<f64>::new()),
            Arc::new(SnowflakeMapper::<UserId>::with_mention(Some(&USER_MENTION_RE))),
            Arc::new(SnowflakeMapper::<ChannelId>::with_mention(Some(&CHANNEL_MENTION_RE))),
            Arc::new(SnowflakeMapper::<RoleId>::with_mention(Some(&ROLE_MENTION_RE))),
            Arc::new(SnowflakeMapper::<GuildId>::with_mention(None)),
        ];
        let mappers = defaults.into_iter().map(|m| (m.accepts(), m)).collect();
        Self { mappers }
    }

    /// Add a mapper. Fails if a mapper for the same type already exists.
    pub fn register(&mut self, mapper: Arc<dyn ArgumentMapper>) -> Result<(), ConfigError> {
        let key = mapper.accepts();
        if self.mappers.contains_key(&key) {
            return Err(ConfigError::DuplicateMapper(key.name()));
        }
        debug!(type_name = key.name(), "Registered argument mapper");
        self.mappers.insert(key, mapper);
        Ok(())
    }

    /// Register a [`ParseMapper`] for `T`, typically a user enum.
    pub fn register_parsed<T>(&mut self) -> Result<(), ConfigError>
    where
        T: FromStr + Any + Send + 'static,
    {
        self.register(Arc::new(ParseMapper::<T>::new()))
    }

    pub fn get(&self, key: &TypeKey) -> Option<&Arc<dyn ArgumentMapper>> {
        self.mappers.get(key)
    }

    pub fn accepts(&self, key: &TypeKey) -> bool {
        self.mappers.contains_key(key)
    }

    /// Every type a mapper is registered for.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.mappers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}
