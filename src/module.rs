//! Owning instances: pages, modules and the lookup surface they share
//!
//! An [`Instance`] is a class's prepared definition set bound to a base. It
//! owns the cache for its content and is itself a [`Navigator`] that delegates
//! to that base. [`Page`] and [`Module`] are typed views over an instance.

use crate::args::{Args, Params};
use crate::content::resolve::resolve;
use crate::content::{base, definitions_for, ClassDefinition, ClassInfo, Content, ContentClass};
use crate::error::{ContentError, WaitError};
use crate::navigator::{Navigator, NavigatorRef};
use crate::session::Session;
use crate::wait::{UnknownPreset, Wait};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// A page or module class bound to its base
pub struct Instance {
    definition: Arc<ClassDefinition>,
    base: NavigatorRef,
    params: Params,
    session: Session,
    cache: Mutex<HashMap<String, Content>>,
    resolving: Mutex<Vec<String>>,
}

impl Instance {
    pub fn class_name(&self) -> &'static str {
        self.definition.name()
    }

    pub fn class_info(&self) -> ClassInfo {
        self.definition.info()
    }

    /// Navigator this instance is permanently scoped to
    pub fn base(&self) -> &NavigatorRef {
        &self.base
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn definition(&self) -> &ClassDefinition {
        &self.definition
    }

    pub(crate) fn cached(&self, name: &str) -> Option<Content> {
        self.cache.lock().get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, content: Content) {
        self.cache.lock().insert(name.to_string(), content);
    }

    pub(crate) fn is_cached(&self, name: &str) -> bool {
        self.cache.lock().contains_key(name)
    }

    /// Mark `name` as in progress; false when it already is
    pub(crate) fn begin_resolving(&self, name: &str) -> bool {
        let mut resolving = self.resolving.lock();
        if resolving.iter().any(|active| active == name) {
            return false;
        }
        resolving.push(name.to_string());
        true
    }

    pub(crate) fn end_resolving(&self, name: &str) {
        let mut resolving = self.resolving.lock();
        if let Some(position) = resolving.iter().rposition(|active| active == name) {
            resolving.remove(position);
        }
    }
}

impl Navigator for Instance {
    fn find(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.base.find(selector)
    }

    fn filter(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.base.filter(selector)
    }

    fn at(&self, index: usize) -> anyhow::Result<NavigatorRef> {
        self.base.at(index)
    }

    fn size(&self) -> anyhow::Result<usize> {
        self.base.size()
    }

    fn as_sequence(&self) -> anyhow::Result<Vec<NavigatorRef>> {
        self.base.as_sequence()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class_name())
            .field("params", &self.params)
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

/// Bind a prepared class to a resolved base
pub(crate) fn bind(
    definition: Arc<ClassDefinition>,
    base: NavigatorRef,
    params: Params,
    session: &Session,
) -> Arc<Instance> {
    debug!(class = definition.name(), params = params.len(), "Instantiated module");
    Arc::new(Instance {
        definition,
        base,
        params,
        session: session.clone(),
        cache: Mutex::new(HashMap::new()),
        resolving: Mutex::new(Vec::new()),
    })
}

/// Create an instance of `class` bound to an already resolved base
pub fn instantiate(
    class: ClassInfo,
    base: NavigatorRef,
    params: Params,
    session: &Session,
) -> Result<Arc<Instance>, ContentError> {
    let definition = definitions_for(class)?;
    Ok(bind(definition, base, params, session))
}

/// Mount a module, composing its static base inside `context` (or the
/// document root when no context is given)
pub(crate) fn mount<M: ContentClass>(
    context: Option<NavigatorRef>,
    params: Params,
    session: &Session,
) -> Result<Module<M>, ContentError> {
    let definition = definitions_for(ClassInfo::of::<M>())?;
    let base = base::compose(&definition, context, session).map_err(|source| {
        ContentError::Query {
            class: definition.name(),
            name: "base".to_string(),
            source,
        }
    })?;
    Ok(Module {
        instance: bind(definition, base, params, session),
        class: PhantomData,
    })
}

/// Typed handle onto a module instance
pub struct Module<C> {
    instance: Arc<Instance>,
    class: PhantomData<fn() -> C>,
}

impl<C: ContentClass> Module<C> {
    /// Typed view of an instance; `None` when it belongs to another class
    pub fn from_instance(instance: Arc<Instance>) -> Option<Self> {
        if instance.class_info() != ClassInfo::of::<C>() {
            return None;
        }
        Some(Self {
            instance,
            class: PhantomData,
        })
    }

    pub fn into_instance(self) -> Arc<Instance> {
        self.instance
    }

    pub fn as_navigator(&self) -> NavigatorRef {
        self.instance.clone()
    }
}

impl<C> Clone for Module<C> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            class: PhantomData,
        }
    }
}

impl<C> fmt::Debug for Module<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Module").field(&self.instance).finish()
    }
}

impl<C: ContentClass> Navigator for Module<C> {
    fn find(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.instance.find(selector)
    }

    fn filter(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.instance.filter(selector)
    }

    fn at(&self, index: usize) -> anyhow::Result<NavigatorRef> {
        self.instance.at(index)
    }

    fn size(&self) -> anyhow::Result<usize> {
        self.instance.size()
    }

    fn as_sequence(&self) -> anyhow::Result<Vec<NavigatorRef>> {
        self.instance.as_sequence()
    }
}

/// A page: an instance based on the document root
pub struct Page<C> {
    instance: Arc<Instance>,
    class: PhantomData<fn() -> C>,
}

impl<C: ContentClass> Page<C> {
    pub(crate) fn open(session: &Session) -> Result<Self, ContentError> {
        let instance = instantiate(ClassInfo::of::<C>(), session.root(), Params::new(), session)?;
        Ok(Self {
            instance,
            class: PhantomData,
        })
    }

    /// Run the class's at-check, waiting per `waiting.at_check` when set
    ///
    /// Classes without an at-check always pass. Required content missing
    /// during the check counts as "not at this page".
    pub fn verify_at(&self) -> Result<(), ContentError> {
        let instance: &Instance = &self.instance;
        let class = instance.class_name();
        let Some(checker) = instance.definition().at_checker() else {
            return Ok(());
        };

        let check = |instance: &Instance| match checker(instance) {
            Err(ContentError::RequiredAbsent { .. }) => Ok(false),
            outcome => outcome,
        };

        let waiting = &instance.session().config().waiting;
        let wait = waiting.at_check.as_ref().map(Wait::from).unwrap_or_default();
        let policy = waiting
            .policy(&wait)
            .map_err(|UnknownPreset(preset)| ContentError::UnknownWaitPreset {
                class,
                name: "at".to_string(),
                preset,
            })?;

        let at = match policy {
            None => check(instance)?,
            Some(policy) => {
                let outcome = instance
                    .session()
                    .waiter()
                    .wait_until(&policy, &mut || check(instance));
                match outcome {
                    Ok(()) => true,
                    Err(WaitError::TimedOut { elapsed, .. }) => {
                        warn!(class, ?elapsed, "At-check did not pass before timeout");
                        false
                    }
                    Err(WaitError::Failed(err)) => return Err(*err),
                }
            }
        };

        if at {
            debug!(class, "At-check passed");
            Ok(())
        } else {
            Err(ContentError::AtCheckFailed { class })
        }
    }
}

impl<C> fmt::Debug for Page<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Page").field(&self.instance).finish()
    }
}

impl<C: ContentClass> Navigator for Page<C> {
    fn find(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.instance.find(selector)
    }

    fn filter(&self, selector: &str) -> anyhow::Result<NavigatorRef> {
        self.instance.filter(selector)
    }

    fn at(&self, index: usize) -> anyhow::Result<NavigatorRef> {
        self.instance.at(index)
    }

    fn size(&self) -> anyhow::Result<usize> {
        self.instance.size()
    }

    fn as_sequence(&self) -> anyhow::Result<Vec<NavigatorRef>> {
        self.instance.as_sequence()
    }
}

/// Content lookup on pages and modules
pub trait ContentOwner {
    fn instance(&self) -> &Instance;

    /// Resolve named content
    fn content(&self, name: &str) -> Result<Content, ContentError> {
        resolve(self.instance(), name, &Args::new())
    }

    /// Resolve named content with call-site arguments; never cached
    fn content_with(&self, name: &str, args: Args) -> Result<Content, ContentError> {
        resolve(self.instance(), name, &args)
    }

    /// Content that resolves to a navigator (a handle or a module)
    fn handle(&self, name: &str) -> Result<NavigatorRef, ContentError> {
        let content = self.content(name)?;
        content
            .as_navigator()
            .ok_or_else(|| mismatch(self.instance(), name, "a handle", &content))
    }

    /// Repeating content of raw handles; empty when absent
    fn handles(&self, name: &str) -> Result<Vec<NavigatorRef>, ContentError> {
        let content = self.content(name)?;
        match &content {
            Content::Absent => Ok(Vec::new()),
            Content::List(items) => items
                .iter()
                .map(|item| {
                    item.as_navigator()
                        .ok_or_else(|| mismatch(self.instance(), name, "a list of handles", item))
                })
                .collect(),
            _ => Err(mismatch(self.instance(), name, "a list of handles", &content)),
        }
    }

    /// Module content of class `M`
    fn module<M: ContentClass>(&self, name: &str) -> Result<Module<M>, ContentError> {
        let content = self.content(name)?;
        content
            .as_module::<M>()
            .ok_or_else(|| mismatch(self.instance(), name, ClassInfo::of::<M>().name(), &content))
    }

    /// Repeating module content of class `M`; empty when absent
    fn modules<M: ContentClass>(&self, name: &str) -> Result<Vec<Module<M>>, ContentError> {
        let content = self.content(name)?;
        match &content {
            Content::Absent => Ok(Vec::new()),
            Content::List(items) => items
                .iter()
                .map(|item| {
                    item.as_module::<M>().ok_or_else(|| {
                        mismatch(self.instance(), name, ClassInfo::of::<M>().name(), item)
                    })
                })
                .collect(),
            _ => Err(mismatch(self.instance(), name, "a list of modules", &content)),
        }
    }

    /// `None` instead of the absent marker
    fn optional(&self, name: &str) -> Result<Option<Content>, ContentError> {
        let content = self.content(name)?;
        Ok((!content.is_absent()).then_some(content))
    }

    /// Whether `name` holds a memoized value
    fn is_cached(&self, name: &str) -> bool {
        self.instance().is_cached(name)
    }

    /// Constructor parameters of this instance
    fn params(&self) -> &Params {
        self.instance().params()
    }

    /// Mount a module inside `context`, or the document root
    fn mount<M: ContentClass>(
        &self,
        context: Option<NavigatorRef>,
        params: Params,
    ) -> Result<Module<M>, ContentError> {
        mount(context, params, self.instance().session())
    }
}

fn mismatch(owner: &Instance, name: &str, expected: &'static str, found: &Content) -> ContentError {
    let found = match found {
        Content::Module(module) => module.class_name(),
        other => other.kind(),
    };
    ContentError::TypeMismatch {
        class: owner.class_name(),
        name: name.to_string(),
        expected,
        found,
    }
}

impl ContentOwner for Instance {
    fn instance(&self) -> &Instance {
        self
    }
}

impl<C: ContentClass> ContentOwner for Module<C> {
    fn instance(&self) -> &Instance {
        &self.instance
    }
}

impl<C: ContentClass> ContentOwner for Page<C> {
    fn instance(&self) -> &Instance {
        &self.instance
    }
}
