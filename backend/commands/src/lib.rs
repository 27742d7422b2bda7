pub mod arguments;
pub mod context;
pub mod descriptor;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod manifest;
pub mod permission;
pub mod prefix;
pub mod registry;
pub mod resolver;
pub mod results;
pub mod tokenizer;
pub mod types;
pub mod typo;

pub use arguments::{ArgumentMapper, ArgumentMapperRegistry};
pub use context::CommandContext;
pub use descriptor::{
    ChannelScope, CommandBuilder, CommandDescriptor, Invocation, PermissionSet, ResponderBuilder,
    ResponderDescriptor, ResponderKey,
};
pub use dispatch::{Dispatcher, FilterReason, Outcome};
pub use engine::{CommandEngine, EngineBuilder, EngineOptions};
pub use error::{ConfigError, DispatchError, ErrorSignal, HandlerError, MappingError};
pub use handlers::help_command;
pub use manifest::CommandManifest;
pub use permission::{AllowAll, PermissionChecker, StaticPermissions};
pub use prefix::{GuildPrefixes, NoPrefix, PrefixProvider, StaticPrefix};
pub use registry::{CommandCatalog, CommandRegistry};
pub use resolver::{Resolution, Resolver};
pub use results::{ResultMapper, ResultMapperRegistry};
pub use tokenizer::{Tokens, tokenize};
pub use types::{ArgValue, Output, TypeKey};
pub use typo::{JaroWinklerTypoChecker, TypoChecker};

/// The built-in commands, ready to add to a catalog.
pub fn register_builtins(catalog: &mut CommandCatalog) {
    catalog.add("cmdbot.builtin.Help", help_command);
}
