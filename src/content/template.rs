//! Content templates: immutable descriptions of how to produce one named item.

use crate::args::Params;
use crate::config::TemplateDefaults;
use crate::content::definitions::{ClassInfo, ContentClass};
use crate::content::resolve::ContentContext;
use crate::content::Content;
use crate::error::{ContentError, DefinitionError};
use crate::navigator::NavigatorRef;
use crate::wait::Wait;
use std::fmt;
use std::sync::Arc;

pub(crate) type QueryFn =
    Arc<dyn Fn(&ContentContext<'_>) -> Result<NavigatorRef, ContentError> + Send + Sync>;
pub(crate) type ValueFn =
    Arc<dyn Fn(&ContentContext<'_>) -> Result<Content, ContentError> + Send + Sync>;
pub(crate) type ParamsFn =
    Arc<dyn Fn(&ContentContext<'_>, Option<usize>) -> Result<Params, ContentError> + Send + Sync>;
pub(crate) type WaitCondition = Arc<dyn Fn(&Content) -> Result<bool, ContentError> + Send + Sync>;

/// Expression producing an alternate base, evaluated against the owner
#[derive(Clone)]
pub struct BaseExpr(QueryFn);

impl BaseExpr {
    pub fn new<F>(expr: F) -> Self
    where
        F: Fn(&ContentContext<'_>) -> Result<NavigatorRef, ContentError> + Send + Sync + 'static,
    {
        Self(Arc::new(expr))
    }

    /// Query relative to the owner's base
    pub fn find(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::new(move |ctx| ctx.find(&selector))
    }

    /// Another named content item of the owner
    pub fn content(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |ctx| {
            let content = ctx.content(&name)?;
            content
                .as_navigator()
                .ok_or_else(|| ContentError::TypeMismatch {
                    class: ctx.owner().class_name(),
                    name: name.clone(),
                    expected: "a handle or module",
                    found: content.kind(),
                })
        })
    }

    /// The owning page's or module's own base
    pub fn owner() -> Self {
        Self::new(|ctx| Ok(ctx.owner().base().clone()))
    }

    /// The document root
    pub fn root() -> Self {
        Self::new(|ctx| Ok(ctx.root()))
    }

    pub(crate) fn evaluate(&self, ctx: &ContentContext<'_>) -> Result<NavigatorRef, ContentError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for BaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BaseExpr(..)")
    }
}

/// Base a module class declares for itself
///
/// Always evaluated relative to the context the module is mounted in.
#[derive(Clone)]
pub enum StaticBase {
    Selector(String),
    Query(Arc<dyn Fn(&NavigatorRef) -> anyhow::Result<NavigatorRef> + Send + Sync>),
}

impl StaticBase {
    pub fn selector(selector: impl Into<String>) -> Self {
        StaticBase::Selector(selector.into())
    }

    pub fn query<F>(query: F) -> Self
    where
        F: Fn(&NavigatorRef) -> anyhow::Result<NavigatorRef> + Send + Sync + 'static,
    {
        StaticBase::Query(Arc::new(query))
    }

    pub(crate) fn relative_to(&self, context: &NavigatorRef) -> anyhow::Result<NavigatorRef> {
        match self {
            StaticBase::Selector(selector) => context.find(selector),
            StaticBase::Query(query) => query(context),
        }
    }
}

impl fmt::Debug for StaticBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticBase::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            StaticBase::Query(_) => f.write_str("Query(..)"),
        }
    }
}

/// What a template produces
#[derive(Clone)]
pub(crate) enum Factory {
    Element(QueryFn),
    Value(ValueFn),
    Module(ClassInfo),
    Repeating {
        elements: QueryFn,
        module: Option<ClassInfo>,
    },
}

impl Factory {
    fn produces_module(&self) -> bool {
        matches!(
            self,
            Factory::Module(_)
                | Factory::Repeating {
                    module: Some(_),
                    ..
                }
        )
    }
}

/// Declared options; unset options fall back to configured defaults
#[derive(Clone, Default)]
pub struct TemplateOptions {
    pub cache: Option<bool>,
    pub required: Option<bool>,
    pub wait: Option<Wait>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub(crate) wait_condition: Option<WaitCondition>,
}

impl TemplateOptions {
    pub(crate) fn effective(&self, defaults: &TemplateDefaults) -> EffectiveOptions {
        let wait = self
            .wait
            .clone()
            .or_else(|| defaults.wait.as_ref().map(Wait::from))
            .unwrap_or_default();

        EffectiveOptions {
            cache: self.cache.unwrap_or(defaults.cache),
            required: self.required.unwrap_or(defaults.required),
            wait,
            min: self.min.or(defaults.min).unwrap_or(1),
            max: self.max.or(defaults.max),
            wait_condition: self.wait_condition.clone(),
        }
    }
}

impl fmt::Debug for TemplateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateOptions")
            .field("cache", &self.cache)
            .field("required", &self.required)
            .field("wait", &self.wait)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("wait_condition", &self.wait_condition.is_some())
            .finish()
    }
}

/// Options after applying configured defaults
#[derive(Clone)]
pub(crate) struct EffectiveOptions {
    pub cache: bool,
    pub required: bool,
    pub wait: Wait,
    pub min: usize,
    pub max: Option<usize>,
    pub wait_condition: Option<WaitCondition>,
}

/// How to produce one named content item
///
/// ```ignore
/// content
///     .item("heading", Template::find("h1"))
///     .item("banner", Template::find(".banner").required(false))
///     .item("form", Template::module::<LoginForm>().within(BaseExpr::find("#main")))
///     .item("rows", Template::repeating("tr.item").each_module::<Row>().indexed());
/// ```
#[derive(Clone)]
pub struct Template {
    pub(crate) factory: Factory,
    pub(crate) options: TemplateOptions,
    pub(crate) base: Option<BaseExpr>,
    pub(crate) within: Option<BaseExpr>,
    pub(crate) params: Option<ParamsFn>,
    misuse: Option<&'static str>,
}

impl Template {
    fn with_factory(factory: Factory) -> Self {
        Self {
            factory,
            options: TemplateOptions::default(),
            base: None,
            within: None,
            params: None,
            misuse: None,
        }
    }

    /// Elements matching `selector` below the base
    pub fn find(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::query(move |ctx| ctx.find(&selector))
    }

    /// Elements produced by an arbitrary query against the base
    pub fn query<F>(query: F) -> Self
    where
        F: Fn(&ContentContext<'_>) -> Result<NavigatorRef, ContentError> + Send + Sync + 'static,
    {
        Self::with_factory(Factory::Element(Arc::new(query)))
    }

    /// Any content value, typically derived from other content
    pub fn value<F>(value: F) -> Self
    where
        F: Fn(&ContentContext<'_>) -> Result<Content, ContentError> + Send + Sync + 'static,
    {
        Self::with_factory(Factory::Value(Arc::new(value)))
    }

    /// An instance of module class `C`
    ///
    /// Without `within` the module's static base composes against the
    /// document root, not the enclosing module's base, so a module nested in
    /// another module is not scoped to it. Use `within(BaseExpr::owner())` to
    /// keep it inside the owner.
    pub fn module<C: ContentClass>() -> Self {
        Self::with_factory(Factory::Module(ClassInfo::of::<C>()))
    }

    /// One raw handle per element matching `selector`
    pub fn repeating(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::repeating_query(move |ctx| ctx.find(&selector))
    }

    /// One raw handle per element produced by `query`
    pub fn repeating_query<F>(query: F) -> Self
    where
        F: Fn(&ContentContext<'_>) -> Result<NavigatorRef, ContentError> + Send + Sync + 'static,
    {
        Self::with_factory(Factory::Repeating {
            elements: Arc::new(query),
            module: None,
        })
    }

    /// Materialize a module of class `C` per element instead of raw handles
    pub fn each_module<C: ContentClass>(mut self) -> Self {
        if let Factory::Repeating { module, .. } = &mut self.factory {
            *module = Some(ClassInfo::of::<C>());
        } else {
            self.misuse = Some("`each_module` only applies to repeating content");
        }
        self
    }

    /// Base expression; wins over the call-site context and any static base
    pub fn base(mut self, base: BaseExpr) -> Self {
        self.base = Some(base);
        self
    }

    /// Call-site context for a module; the module's own base composes inside it
    pub fn within(mut self, context: BaseExpr) -> Self {
        self.within = Some(context);
        self
    }

    /// Constructor parameters for the produced module
    pub fn params<F>(mut self, params: F) -> Self
    where
        F: Fn(&ContentContext<'_>) -> Result<Params, ContentError> + Send + Sync + 'static,
    {
        self.params = Some(Arc::new(
            move |ctx: &ContentContext<'_>, _: Option<usize>| params(ctx),
        ));
        self
    }

    /// Constructor parameters for each repeated module, given its position
    pub fn params_indexed<F>(mut self, params: F) -> Self
    where
        F: Fn(&ContentContext<'_>, usize) -> Result<Params, ContentError> + Send + Sync + 'static,
    {
        self.params = Some(Arc::new(
            move |ctx: &ContentContext<'_>, index: Option<usize>| params(ctx, index.unwrap_or(0)),
        ));
        self
    }

    /// Pass each repeated module its position as the `index` parameter
    pub fn indexed(self) -> Self {
        self.params_indexed(|_, index| Ok(Params::new().with("index", index)))
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.options.cache = Some(cache);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.options.required = Some(required);
        self
    }

    pub fn wait(mut self, wait: impl Into<Wait>) -> Self {
        self.options.wait = Some(wait.into());
        self
    }

    /// Replace the "non-empty" wait predicate
    pub fn wait_until<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Content) -> Result<bool, ContentError> + Send + Sync + 'static,
    {
        self.options.wait_condition = Some(Arc::new(condition));
        if self.options.wait.is_none() {
            self.options.wait = Some(Wait::Default);
        }
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.options.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.options.max = Some(max);
        self
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Reject option combinations that cannot be honoured
    pub(crate) fn validate(&self, class: &'static str, name: &str) -> Result<(), DefinitionError> {
        let invalid = |reason: &str| DefinitionError::InvalidOption {
            class,
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if let Some(reason) = self.misuse {
            return Err(invalid(reason));
        }
        if self.params.is_some() && !self.factory.produces_module() {
            return Err(invalid("parameters given for content that is not a module"));
        }
        if self.within.is_some() {
            match &self.factory {
                Factory::Module(_) => {}
                Factory::Repeating { module: Some(_), .. } => {
                    return Err(invalid(
                        "repeated modules are mounted on their own elements, `within` does not apply",
                    ))
                }
                _ => return Err(invalid("`within` only applies to modules")),
            }
        }
        if let (Some(min), Some(max)) = (self.options.min, self.options.max) {
            if min > max {
                return Err(invalid(&format!("min ({}) is greater than max ({})", min, max)));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.factory {
            Factory::Element(_) => "element".to_string(),
            Factory::Value(_) => "value".to_string(),
            Factory::Module(class) => format!("module {}", class.name()),
            Factory::Repeating { module: None, .. } => "repeating".to_string(),
            Factory::Repeating {
                module: Some(class),
                ..
            } => format!("repeating module {}", class.name()),
        };
        f.debug_struct("Template")
            .field("kind", &kind)
            .field("options", &self.options)
            .field("base", &self.base.is_some())
            .field("within", &self.within.is_some())
            .finish()
    }
}
