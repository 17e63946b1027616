//! Content Resolution Engine
//!
//! Turns a named template into [`Content`] for one owning instance:
//!
//! 1. serve from the owner's cache when caching applies;
//! 2. resolve the base and run the factory, polling through the session's
//!    [`Waiter`](crate::wait::Waiter) when the template waits;
//! 3. apply the required / min / max checks;
//! 4. store the outcome on the owner.
//!
//! Only lookups without arguments are cached. Lookups with arguments always
//! run the factory and never touch the cache.

use crate::args::{Arg, Args, Params};
use crate::content::base;
use crate::content::definitions::{definitions_for, ContentClass};
use crate::content::template::{EffectiveOptions, Factory, Template};
use crate::content::Content;
use crate::error::{ContentError, WaitError};
use crate::module::{self, Instance, Module};
use crate::navigator::NavigatorRef;
use crate::wait::{UnknownPreset, WaitPolicy};
use tracing::{debug, instrument, trace, warn};

/// What a factory sees while producing content
pub struct ContentContext<'a> {
    owner: &'a Instance,
    name: &'a str,
    base: NavigatorRef,
    args: &'a Args,
}

impl<'a> ContentContext<'a> {
    pub(crate) fn new(owner: &'a Instance, name: &'a str, base: NavigatorRef, args: &'a Args) -> Self {
        Self {
            owner,
            name,
            base,
            args,
        }
    }

    fn rebased(&self, base: NavigatorRef) -> ContentContext<'a> {
        ContentContext {
            owner: self.owner,
            name: self.name,
            base,
            args: self.args,
        }
    }

    /// Page or module the content belongs to
    pub fn owner(&self) -> &'a Instance {
        self.owner
    }

    /// Name of the content being produced
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Effective base for this content
    pub fn base(&self) -> &NavigatorRef {
        &self.base
    }

    /// Call-site arguments
    pub fn args(&self) -> &'a Args {
        self.args
    }

    pub fn root(&self) -> NavigatorRef {
        self.owner.session().root()
    }

    /// Query below the effective base
    pub fn find(&self, selector: &str) -> Result<NavigatorRef, ContentError> {
        self.query(self.base.find(selector))
    }

    /// Attach this content's name and owner to a navigator failure
    pub fn query<T>(&self, result: anyhow::Result<T>) -> Result<T, ContentError> {
        result.map_err(|source| query_error(self.owner, self.name, source))
    }

    /// Another content item of the same owner
    pub fn content(&self, name: &str) -> Result<Content, ContentError> {
        resolve(self.owner, name, &Args::new())
    }

    pub fn content_with(&self, name: &str, args: &Args) -> Result<Content, ContentError> {
        resolve(self.owner, name, args)
    }

    /// Constructor parameter of the owning module
    pub fn param(&self, key: &str) -> Result<&'a Arg, ContentError> {
        self.owner
            .params()
            .get(key)
            .ok_or_else(|| ContentError::MissingParam {
                class: self.owner.class_name(),
                param: key.to_string(),
            })
    }

    /// Mount a module, composing its static base inside `context`
    /// (or the document root)
    pub fn mount<M: ContentClass>(
        &self,
        context: Option<NavigatorRef>,
        params: Params,
    ) -> Result<Module<M>, ContentError> {
        module::mount(context, params, self.owner.session())
    }
}

fn query_error(owner: &Instance, name: &str, source: anyhow::Error) -> ContentError {
    ContentError::Query {
        class: owner.class_name(),
        name: name.to_string(),
        source,
    }
}

/// Clears the in-progress marker when resolution ends
struct ResolvingGuard<'a> {
    owner: &'a Instance,
    name: &'a str,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(owner: &'a Instance, name: &'a str) -> Result<Self, ContentError> {
        if !owner.begin_resolving(name) {
            return Err(ContentError::RecursiveContent {
                class: owner.class_name(),
                name: name.to_string(),
            });
        }
        Ok(Self { owner, name })
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.owner.end_resolving(self.name);
    }
}

/// Resolve named content on an owning instance
#[instrument(level = "debug", skip(owner, args), fields(class = owner.class_name(), args = args.len()))]
pub(crate) fn resolve(owner: &Instance, name: &str, args: &Args) -> Result<Content, ContentError> {
    let class = owner.class_name();
    let definition =
        owner
            .definition()
            .content()
            .get(name)
            .ok_or_else(|| ContentError::UnknownContent {
                class,
                name: name.to_string(),
            })?;
    let template = definition.template();
    let config = owner.session().config();
    let options = template.options.effective(&config.defaults);
    let cacheable = options.cache && args.is_empty();

    if cacheable {
        if let Some(cached) = owner.cached(name) {
            debug!("Content served from cache");
            return Ok(cached);
        }
    }

    let _guard = ResolvingGuard::enter(owner, name)?;

    let policy = config
        .waiting
        .policy(&options.wait)
        .map_err(|UnknownPreset(preset)| ContentError::UnknownWaitPreset {
            class,
            name: name.to_string(),
            preset,
        })?;

    let content = match policy {
        Some(policy) => wait_for(owner, name, template, args, &options, &policy)?,
        None => produce(owner, name, template, args)?,
    };
    let content = check_matches(owner, name, &options, content)?;

    if cacheable {
        owner.store(name, content.clone());
        debug!(kind = content.kind(), "Content resolved and cached");
    } else {
        debug!(kind = content.kind(), "Content resolved");
    }
    Ok(content)
}

/// Run the template factory once against a freshly resolved base
fn produce(
    owner: &Instance,
    name: &str,
    template: &Template,
    args: &Args,
) -> Result<Content, ContentError> {
    let scope = ContentContext::new(owner, name, owner.base().clone(), args);

    match &template.factory {
        Factory::Element(query) => {
            let ctx = scope.rebased(base::content_base(template, &scope)?);
            Ok(Content::Handle(query(&ctx)?))
        }
        Factory::Value(value) => {
            let ctx = scope.rebased(base::content_base(template, &scope)?);
            value(&ctx)
        }
        Factory::Module(class) => {
            let definition = definitions_for(*class)?;
            let base = base::module_base(template, &definition, &scope)?;
            let params = module_params(template, &scope, None)?;
            Ok(Content::Module(module::bind(
                definition,
                base,
                params,
                owner.session(),
            )))
        }
        Factory::Repeating { elements, module: each } => {
            let ctx = scope.rebased(base::content_base(template, &scope)?);
            let matched = elements(&ctx)?;
            let sequence = ctx.query(matched.as_sequence())?;

            let Some(class) = each else {
                return Ok(Content::List(
                    sequence.into_iter().map(Content::Handle).collect(),
                ));
            };

            // every element gets its own base and its own instance
            let definition = definitions_for(*class)?;
            let mut items = Vec::with_capacity(sequence.len());
            for (index, element) in sequence.into_iter().enumerate() {
                let base = ctx.query(base::compose(&definition, Some(element), owner.session()))?;
                let params = module_params(template, &ctx, Some(index))?;
                items.push(Content::Module(module::bind(
                    definition.clone(),
                    base,
                    params,
                    owner.session(),
                )));
            }
            trace!(
                count = items.len(),
                module = definition.name(),
                "Materialized repeated modules"
            );
            Ok(Content::List(items))
        }
    }
}

fn module_params(
    template: &Template,
    ctx: &ContentContext<'_>,
    index: Option<usize>,
) -> Result<Params, ContentError> {
    match &template.params {
        Some(params) => params(ctx, index),
        None => Ok(Params::new()),
    }
}

/// Re-run the factory until the content is present (or satisfies the
/// template's wait condition) or the policy times out
///
/// Required content missing while producing counts as "not yet there".
fn wait_for(
    owner: &Instance,
    name: &str,
    template: &Template,
    args: &Args,
    options: &EffectiveOptions,
    policy: &WaitPolicy,
) -> Result<Content, ContentError> {
    let mut last: Option<Content> = None;
    let mut observed = String::from("nothing resolved");

    let mut check = || -> Result<bool, ContentError> {
        // content this item depends on may not have appeared yet
        let content = match produce(owner, name, template, args) {
            Err(ContentError::RequiredAbsent { name: missing, .. }) => {
                observed = format!("required content '{}' absent", missing);
                return Ok(false);
            }
            outcome => outcome?,
        };
        let count = content
            .count()
            .map_err(|source| query_error(owner, name, source))?;
        let satisfied = match &options.wait_condition {
            Some(condition) => condition(&content)?,
            None => count > 0,
        };
        observed = match (&options.wait_condition, satisfied) {
            (Some(_), false) => format!(
                "condition unsatisfied on {} with {} match(es)",
                content.kind(),
                count
            ),
            _ => format!("{} with {} match(es)", content.kind(), count),
        };
        last = Some(content);
        Ok(satisfied)
    };

    match owner.session().waiter().wait_until(policy, &mut check) {
        Ok(()) => match last {
            Some(content) => Ok(content),
            None => produce(owner, name, template, args),
        },
        Err(WaitError::TimedOut { elapsed, attempts }) => {
            warn!(
                class = owner.class_name(),
                content = name,
                ?elapsed,
                attempts,
                last_observed = %observed,
                "Timed out waiting for content"
            );
            Err(ContentError::WaitTimeout {
                class: owner.class_name(),
                name: name.to_string(),
                elapsed,
                last_observed: observed,
            })
        }
        Err(WaitError::Failed(err)) => Err(*err),
    }
}

/// Apply required / min / max to a produced value
fn check_matches(
    owner: &Instance,
    name: &str,
    options: &EffectiveOptions,
    content: Content,
) -> Result<Content, ContentError> {
    let count = content
        .count()
        .map_err(|source| query_error(owner, name, source))?;

    if count == 0 {
        if options.required {
            return Err(ContentError::RequiredAbsent {
                class: owner.class_name(),
                name: name.to_string(),
            });
        }
        debug!(content = name, "Optional content absent");
        return Ok(Content::Absent);
    }

    if count < options.min || options.max.map_or(false, |max| count > max) {
        return Err(ContentError::CountOutOfBounds {
            class: owner.class_name(),
            name: name.to_string(),
            count,
            min: options.min,
            max: options.max,
        });
    }

    Ok(content)
}
