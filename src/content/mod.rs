//! Content definitions and their resolution
//!
//! A class declares named [`Template`]s once; the engine turns a template into
//! [`Content`] on first access and memoizes it on the owning instance.

pub mod base;
pub mod definitions;
pub mod resolve;
pub mod template;

pub use definitions::{
    definitions_for, AtChecker, ClassDefinition, ClassInfo, ContentClass, ContentDefinitionSet,
    ContentDsl, Definition,
};
pub use resolve::ContentContext;
pub use template::{BaseExpr, StaticBase, Template, TemplateOptions};

use crate::module::{Instance, Module};
use crate::navigator::NavigatorRef;
use std::fmt;
use std::sync::Arc;

/// A resolved content value
#[derive(Clone)]
pub enum Content {
    /// Raw query result
    Handle(NavigatorRef),
    /// Module instance bound to its base
    Module(Arc<Instance>),
    /// Repeating content, one independently based entry per matched element
    List(Vec<Content>),
    /// Marker for non-required content with no matches
    Absent,
}

impl Content {
    /// Short description of the variant for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Handle(_) => "a handle",
            Content::Module(_) => "a module",
            Content::List(_) => "a list",
            Content::Absent => "absent",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Content::Absent)
    }

    /// Number of matched elements (list length for repeating content)
    pub fn count(&self) -> anyhow::Result<usize> {
        match self {
            Content::Handle(handle) => handle.size(),
            Content::Module(module) => module.base().size(),
            Content::List(items) => Ok(items.len()),
            Content::Absent => Ok(0),
        }
    }

    /// View handles and modules as navigators
    pub fn as_navigator(&self) -> Option<NavigatorRef> {
        match self {
            Content::Handle(handle) => Some(handle.clone()),
            Content::Module(module) => Some(module.clone() as NavigatorRef),
            Content::List(_) | Content::Absent => None,
        }
    }

    /// Typed view of a module value; `None` for other variants or classes
    pub fn as_module<C: ContentClass>(&self) -> Option<Module<C>> {
        match self {
            Content::Module(instance) => Module::from_instance(instance.clone()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Content]> {
        match self {
            Content::List(items) => Some(items),
            _ => None,
        }
    }

    /// Identity comparison: true when both values share the same underlying
    /// handles and instances
    pub fn same_as(&self, other: &Content) -> bool {
        match (self, other) {
            (Content::Handle(a), Content::Handle(b)) => Arc::ptr_eq(a, b),
            (Content::Module(a), Content::Module(b)) => Arc::ptr_eq(a, b),
            (Content::List(a), Content::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Content::Absent, Content::Absent) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Handle(_) => f.write_str("Handle(..)"),
            Content::Module(module) => write!(f, "Module({})", module.class_name()),
            Content::List(items) => f.debug_list().entries(items).finish(),
            Content::Absent => f.write_str("Absent"),
        }
    }
}
