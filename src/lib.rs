//! Pagemodel: Declarative Page Content and Module Composition
//!
//! Page and module classes declare named content once. Content is resolved
//! lazily against a document, memoized per instance, and composed from
//! reusable modules scoped to their own base.

pub mod args;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod module;
pub mod navigator;
pub mod session;
pub mod wait;

pub use args::{Arg, Args, Params};
pub use config::{ConfigLoader, PageModelConfig};
pub use content::{
    BaseExpr, ClassInfo, Content, ContentClass, ContentContext, ContentDsl, StaticBase, Template,
};
pub use error::{ConfigurationError, ContentError, DefinitionError, WaitError};
pub use module::{ContentOwner, Instance, Module, Page};
pub use navigator::{Document, Navigator, NavigatorRef};
pub use session::{Session, SessionBuilder};
pub use wait::{PollingWaiter, Wait, WaitPolicy, Waiter};
