//! Base/Context resolution
//!
//! Decides which navigator a template is scoped to. Three sources compete:
//!
//! 1. a template base expression, which wins outright;
//! 2. a static base declared by the module class, composed inside the
//!    call-site context (or the document root when no context was given);
//! 3. the call-site context itself, or the document root.
//!
//! Plain content has no call-site context of its own: it is scoped to the
//! owning instance's base, which is the document root for a page.

use crate::content::definitions::ClassDefinition;
use crate::content::resolve::ContentContext;
use crate::content::template::Template;
use crate::error::ContentError;
use crate::navigator::NavigatorRef;
use crate::session::Session;
use tracing::trace;

/// Base for element, value and repeating templates
pub(crate) fn content_base(
    template: &Template,
    scope: &ContentContext<'_>,
) -> Result<NavigatorRef, ContentError> {
    match &template.base {
        Some(expr) => {
            trace!(content = scope.name(), "Using template base expression");
            expr.evaluate(scope)
        }
        None => Ok(scope.base().clone()),
    }
}

/// Base for a module template
pub(crate) fn module_base(
    template: &Template,
    module: &ClassDefinition,
    scope: &ContentContext<'_>,
) -> Result<NavigatorRef, ContentError> {
    if let Some(expr) = &template.base {
        trace!(
            content = scope.name(),
            module = module.name(),
            "Template base expression overrides module base"
        );
        return expr.evaluate(scope);
    }

    let context = match &template.within {
        Some(expr) => Some(expr.evaluate(scope)?),
        None => None,
    };
    scope.query(compose(module, context, scope.owner().session()))
}

/// Compose a module's static base inside a call-site context
///
/// Without a context the document root is used. A module without a static
/// base is based on the context itself.
pub(crate) fn compose(
    module: &ClassDefinition,
    context: Option<NavigatorRef>,
    session: &Session,
) -> anyhow::Result<NavigatorRef> {
    let context = context.unwrap_or_else(|| session.root());
    match module.base() {
        Some(base) => base.relative_to(&context),
        None => Ok(context),
    }
}
