/// Result mappers: turn a responder's return value into outgoing chat actions.
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use cmdbot_core::{ChannelId, ChatClient, Embed, GuildId, MessageEvent, OutgoingAction, RoleId, UserId};

use crate::error::{ConfigError, MappingError};
use crate::types::{Output, TypeKey};

/// Converts values of one runtime type into zero or more outgoing actions.
#[async_trait]
pub trait ResultMapper: Send + Sync {
    fn accepts(&self) -> TypeKey;

    async fn map(
        &self,
        client: &dyn ChatClient,
        event: &MessageEvent,
        value: Output,
    ) -> Result<Vec<OutgoingAction>, MappingError>;
}

/// A result mapper backed by a plain function of the event and the value.
pub struct FnResultMapper<T, F> {
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, F> FnResultMapper<T, F>
where
    F: Fn(&MessageEvent, T) -> Vec<OutgoingAction> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> ResultMapper for FnResultMapper<T, F>
where
    T: Any + Send + 'static,
    F: Fn(&MessageEvent, T) -> Vec<OutgoingAction> + Send + Sync,
{
    fn accepts(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    async fn map(
        &self,
        _client: &dyn ChatClient,
        event: &MessageEvent,
        value: Output,
    ) -> Result<Vec<OutgoingAction>, MappingError> {
        let expected = self.accepts().short_name();
        let value = value
            .downcast::<T>()
            .map_err(|other| MappingError::new(other.key().short_name(), expected))?;
        Ok((self.f)(event, value))
    }
}

fn text_reply(event: &MessageEvent, text: impl Into<String>) -> Vec<OutgoingAction> {
    vec![OutgoingAction::text(event.channel_id, text)]
}

/// Result mappers keyed by the exact runtime type they accept.
#[derive(Default)]
pub struct ResultMapperRegistry {
    mappers: HashMap<TypeKey, Arc<dyn ResultMapper>>,
}

impl ResultMapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text-like primitives, ids and mentions, embeds and raw actions.
    ///
    /// Covers every type the default argument mappers produce.
    pub fn with_defaults() -> Self {
        let defaults: Vec<Arc<dyn ResultMapper>> = vec![
            Arc::new(FnResultMapper::new(|e, s: String| text_reply(e, s))),
            Arc::new(FnResultMapper::new(|e, s: &'static str| text_reply(e, s))),
            Arc::new(FnResultMapper::new(|e, n: i32| text_reply(e, n.to_string()))),
            Arc::new(FnResultMapper::new(|e, n: i64| text_reply(e, n.to_string()))),
            Arc::new(FnResultMapper::new(|e, n: u64| text_reply(e, n.to_string()))),
            Arc::new(FnResultMapper::new(|e, n: f64| text_reply(e, n.to_string()))),
            Arc::new(FnResultMapper::new(|e, b: bool| text_reply(e, b.to_string()))),
            Arc::new(FnResultMapper::new(|e, id: UserId| text_reply(e, id.mention()))),
            Arc::new(FnResultMapper::new(|e, id: ChannelId| text_reply(e, id.mention()))),
            Arc::new(FnResultMapper::new(|e, id: RoleId| text_reply(e, id.mention()))),
            Arc::new(FnResultMapper::new(|e, id: GuildId| text_reply(e, id.to_string()))),
            Arc::new(FnResultMapper::new(|e: &MessageEvent, embed: Embed| {
                vec![OutgoingAction::Embed {
                    channel_id: e.channel_id,
                    embed,
                }]
            })),
            Arc::new(FnResultMapper::new(|_, action: OutgoingAction| vec![action])),
            Arc::new(FnResultMapper::new(|_, actions: Vec<OutgoingAction>| actions)),
        ];
        let mappers = defaults.into_iter().map(|m| (m.accepts(), m)).collect();
        Self { mappers }
    }

    /// Add a mapper. Fails if one for the same type already exists.
    pub fn register(&mut self, mapper: Arc<dyn ResultMapper>) -> Result<(), ConfigError> {
        let key = mapper.accepts();
        if self.mappers.contains_key(&key) {
            return Err(ConfigError::DuplicateMapper(key.name()));
        }
        debug!(type_name = key.name(), "Registered result mapper");
        self.mappers.insert(key, mapper);
        Ok(())
    }

    /// Register a function-backed mapper for `T`.
    pub fn register_fn<T, F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        T: Any + Send + 'static,
        F: Fn(&MessageEvent, T) -> Vec<OutgoingAction> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnResultMapper::new(f)))
    }

    pub fn get(&self, key: &TypeKey) -> Option<&Arc<dyn ResultMapper>> {
        self.mappers.get(key)
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}
