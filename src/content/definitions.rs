//! Content Definition Sets
//!
//! Each page or module class declares its own templates through
//! [`ContentClass::define`]. The first time a class is used its declarations are
//! merged over its ancestor's set and the result is memoized process-wide, keyed
//! by the class's `TypeId`. Later lookups are a read lock and a map probe.

use crate::content::template::{StaticBase, Template};
use crate::error::{ContentError, DefinitionError};
use crate::module::Instance;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Checks that the document currently shows a given page
pub type AtChecker = fn(&Instance) -> Result<bool, ContentError>;

/// A page or module class
///
/// Implemented on a marker type. Rust has no class inheritance, so a subclass
/// names its parent through [`ContentClass::extends`].
pub trait ContentClass: Send + Sync + 'static {
    /// Declare this class's own content
    fn define(content: &mut ContentDsl);

    /// Parent class whose content is inherited
    fn extends() -> Option<ClassInfo> {
        None
    }

    /// Static base, evaluated relative to wherever the module is mounted
    fn base() -> Option<StaticBase> {
        None
    }

    /// Page verification used by [`Page::verify_at`](crate::Page::verify_at)
    fn at_checker() -> Option<AtChecker> {
        None
    }
}

/// Runtime identity of a [`ContentClass`]
#[derive(Clone, Copy)]
pub struct ClassInfo {
    type_id: TypeId,
    name: &'static str,
    define: fn(&mut ContentDsl),
    extends: fn() -> Option<ClassInfo>,
    base: fn() -> Option<StaticBase>,
    at_checker: fn() -> Option<AtChecker>,
}

impl ClassInfo {
    pub fn of<C: ContentClass>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: short_type_name(std::any::type_name::<C>()),
            define: C::define,
            extends: C::extends,
            base: C::base,
            at_checker: C::at_checker,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassInfo {}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassInfo").field(&self.name).finish()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Declaration surface handed to [`ContentClass::define`]
///
/// Problems are recorded and reported when the class is prepared, so
/// declarations can be chained.
pub struct ContentDsl {
    class: &'static str,
    entries: Vec<(String, Template)>,
    errors: Vec<DefinitionError>,
}

impl ContentDsl {
    pub(crate) fn new(class: &'static str) -> Self {
        Self {
            class,
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Declare a named content item
    pub fn item(&mut self, name: impl Into<String>, template: Template) -> &mut Self {
        let name = name.into();
        if name.is_empty() {
            self.errors.push(DefinitionError::EmptyName(self.class));
        } else if self.entries.iter().any(|(existing, _)| *existing == name) {
            self.errors.push(DefinitionError::DuplicateContent {
                class: self.class,
                name,
            });
        } else if let Err(err) = template.validate(self.class, &name) {
            self.errors.push(err);
        } else {
            self.entries.push((name, template));
        }
        self
    }

    pub(crate) fn finish(self) -> Result<Vec<(String, Template)>, DefinitionError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.entries),
        }
    }
}

/// One template in a definition set, with the class that declared it
#[derive(Clone, Debug)]
pub struct Definition {
    name: String,
    declared_by: &'static str,
    template: Arc<Template>,
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class whose declaration is in effect
    pub fn declared_by(&self) -> &'static str {
        self.declared_by
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// Ordered `name → template` mapping for one class
#[derive(Clone, Debug, Default)]
pub struct ContentDefinitionSet {
    order: Vec<String>,
    definitions: HashMap<String, Definition>,
}

impl ContentDefinitionSet {
    /// Merge a class's own declarations over its ancestor's set
    ///
    /// An own declaration replaces the inherited one entirely and takes over
    /// its position; new names are appended in declaration order.
    pub fn merge(
        class: &'static str,
        own: Vec<(String, Template)>,
        ancestor: Option<&ContentDefinitionSet>,
    ) -> Self {
        let mut set = ancestor.cloned().unwrap_or_default();
        for (name, template) in own {
            let definition = Definition {
                name: name.clone(),
                declared_by: class,
                template: Arc::new(template),
            };
            if set.definitions.insert(name.clone(), definition).is_none() {
                set.order.push(name);
            }
        }
        set
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Content names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Everything prepared once per class
pub struct ClassDefinition {
    info: ClassInfo,
    content: ContentDefinitionSet,
    base: Option<StaticBase>,
    at_checker: Option<AtChecker>,
}

impl ClassDefinition {
    pub fn info(&self) -> ClassInfo {
        self.info
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn content(&self) -> &ContentDefinitionSet {
        &self.content
    }

    /// Static base declared by the class or inherited from an ancestor
    pub fn base(&self) -> Option<&StaticBase> {
        self.base.as_ref()
    }

    pub fn at_checker(&self) -> Option<AtChecker> {
        self.at_checker
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("class", &self.info.name)
            .field("content", &self.content.order)
            .field("base", &self.base)
            .field("at_checker", &self.at_checker.is_some())
            .finish()
    }
}

static DEFINITIONS: Lazy<RwLock<HashMap<TypeId, Arc<ClassDefinition>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Prepared definitions for a class, built on first use
pub fn definitions_for(info: ClassInfo) -> Result<Arc<ClassDefinition>, DefinitionError> {
    build(info, &mut Vec::new())
}

fn build(
    info: ClassInfo,
    chain: &mut Vec<ClassInfo>,
) -> Result<Arc<ClassDefinition>, DefinitionError> {
    if let Some(prepared) = DEFINITIONS.read().get(&info.type_id) {
        return Ok(prepared.clone());
    }

    if chain.contains(&info) {
        let mut names: Vec<&str> = chain.iter().map(|class| class.name).collect();
        names.push(info.name);
        return Err(DefinitionError::InheritanceCycle(names.join(" -> ")));
    }

    chain.push(info);
    let ancestor = match (info.extends)() {
        Some(parent) => Some(build(parent, chain)?),
        None => None,
    };
    chain.pop();

    let mut dsl = ContentDsl::new(info.name);
    (info.define)(&mut dsl);
    let own = dsl.finish()?;

    let content = ContentDefinitionSet::merge(
        info.name,
        own,
        ancestor.as_deref().map(ClassDefinition::content),
    );
    let base = (info.base)().or_else(|| ancestor.as_ref().and_then(|a| a.base.clone()));
    let at_checker = (info.at_checker)().or_else(|| ancestor.as_ref().and_then(|a| a.at_checker));

    debug!(
        class = info.name,
        templates = content.len(),
        inherits = ancestor.as_ref().map(|a| a.name()).unwrap_or("-"),
        "Prepared content definitions"
    );

    let definition = ClassDefinition {
        info,
        content,
        base,
        at_checker,
    };
    let mut prepared = DEFINITIONS.write();
    Ok(prepared
        .entry(info.type_id)
        .or_insert_with(|| Arc::new(definition))
        .clone())
}
