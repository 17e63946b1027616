//! Session: the document, waiter and configuration shared by one tree of
//! pages and modules.

use crate::args::Params;
use crate::config::PageModelConfig;
use crate::content::ContentClass;
use crate::error::{ConfigurationError, ContentError};
use crate::module::{self, Module, Page};
use crate::navigator::{Document, NavigatorRef};
use crate::wait::{PollingWaiter, Waiter};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Cheap-to-clone handle; every instance keeps one
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    document: Arc<dyn Document>,
    waiter: Arc<dyn Waiter>,
    config: PageModelConfig,
}

impl Session {
    /// Session with the polling waiter and default configuration
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self::assemble(document, Arc::new(PollingWaiter), PageModelConfig::default())
    }

    fn assemble(
        document: Arc<dyn Document>,
        waiter: Arc<dyn Waiter>,
        config: PageModelConfig,
    ) -> Self {
        debug!(
            timeout = config.waiting.timeout,
            retry_interval = config.waiting.retry_interval,
            presets = config.waiting.presets.len(),
            "Session created"
        );
        Session {
            inner: Arc::new(SessionInner {
                document,
                waiter,
                config,
            }),
        }
    }

    pub fn builder(document: Arc<dyn Document>) -> SessionBuilder {
        SessionBuilder {
            document,
            waiter: None,
            config: None,
        }
    }

    /// Current document root
    pub fn root(&self) -> NavigatorRef {
        self.inner.document.root()
    }

    pub fn config(&self) -> &PageModelConfig {
        &self.inner.config
    }

    pub fn waiter(&self) -> &dyn Waiter {
        self.inner.waiter.as_ref()
    }

    /// Open a page of class `C` based on the document root
    pub fn page<C: ContentClass>(&self) -> Result<Page<C>, ContentError> {
        Page::open(self)
    }

    /// Mount a module inside `context`, or the document root
    pub fn mount<C: ContentClass>(
        &self,
        context: Option<NavigatorRef>,
        params: Params,
    ) -> Result<Module<C>, ContentError> {
        module::mount(context, params, self)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

pub struct SessionBuilder {
    document: Arc<dyn Document>,
    waiter: Option<Arc<dyn Waiter>>,
    config: Option<PageModelConfig>,
}

impl SessionBuilder {
    pub fn waiter(mut self, waiter: Arc<dyn Waiter>) -> Self {
        self.waiter = Some(waiter);
        self
    }

    pub fn config(mut self, config: PageModelConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validates the configuration; hand-built configs get the same checks
    /// as loaded ones.
    pub fn build(self) -> Result<Session, ConfigurationError> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(ConfigurationError::Invalid)?;
        Ok(Session::assemble(
            self.document,
            self.waiter.unwrap_or_else(|| Arc::new(PollingWaiter)),
            config,
        ))
    }
}
