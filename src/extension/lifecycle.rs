//! Build lifecycle participation
//!
//! The [`BuildExtension`] is the host-facing entry point set: session open
//! at build start, the one-shot reactor rewrite at project discovery, the
//! module report once all projects are read, and session close at build end.
//! All entry points key the registry by the canonical build root, so
//! re-entrant invocations from nested builds land on the same session.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ConfigurationProvider;
use crate::descriptor::{DescriptorInterceptor, ReactorRewriter, DESCRIPTOR_FILE_NAME};
use crate::extension::context::BuildContext;
use crate::extension::opener::SessionOpener;
use crate::session::{
    get_session_registry, registry_key, ConcurrencyGuard, ExecutionContext, NoContext,
    SessionError, SessionRegistry, SessionResult,
};

pub struct BuildExtension {
    registry: Arc<SessionRegistry>,
    configuration: Arc<dyn ConfigurationProvider>,
    opener: SessionOpener,
    guard: ConcurrencyGuard,
    rewriter: ReactorRewriter,
}

impl BuildExtension {
    /// Extension bound to the process-wide session registry.
    pub fn new(configuration: Arc<dyn ConfigurationProvider>, opener: SessionOpener) -> Self {
        Self::with_registry(get_session_registry(), configuration, opener)
    }

    /// Extension bound to an explicit registry, for hosts embedding several
    /// independent cores and for tests.
    pub fn with_registry(
        registry: Arc<SessionRegistry>,
        configuration: Arc<dyn ConfigurationProvider>,
        opener: SessionOpener,
    ) -> Self {
        Self {
            registry,
            configuration,
            opener,
            guard: ConcurrencyGuard::new(),
            rewriter: ReactorRewriter::new(),
        }
    }

    /// Interceptor wired to this extension's registry and configuration, to
    /// be installed into the host's descriptor reading path.
    pub fn interceptor(&self) -> DescriptorInterceptor {
        DescriptorInterceptor::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.configuration),
        )
    }

    /// Build start: open (or skip) the session for the build root.
    ///
    /// A user skip request records a memoized skip entry so every later
    /// entry point sees a settled "no session" decision.
    pub fn after_session_start(&self, context: &BuildContext) -> SessionResult<()> {
        self.after_session_start_in(context, &NoContext)
    }

    /// Like [`after_session_start`](Self::after_session_start) but running
    /// the opener under a host-provided execution context.
    pub fn after_session_start_in<C: ExecutionContext + ?Sized>(
        &self,
        context: &BuildContext,
        execution: &C,
    ) -> SessionResult<()> {
        let root_key = registry_key(context.root_directory());

        if context.should_skip() {
            log::info!("version handling is skipped by request");
            self.registry.open(&root_key, || Ok(None))?;
            return Ok(());
        }

        self.guard.serialized_with_context(execution, || {
            self.registry
                .open(&root_key, || self.opener.open(context).map(Some))
        })?;
        Ok(())
    }

    /// Project discovery: materialize the rewritten descriptor tree once.
    ///
    /// Returns the root auxiliary descriptor path on the run that performs
    /// the rewrite, `None` when no session exists or the rewrite already ran.
    pub fn on_project_discovery(&self, context: &BuildContext) -> SessionResult<Option<PathBuf>> {
        let root_key = registry_key(context.root_directory());
        let Some(session) = self.registry.lookup(&root_key) else {
            return Ok(None);
        };

        let root_descriptor = session.root_directory().join(DESCRIPTOR_FILE_NAME);
        self.rewriter
            .rewrite(&session, &root_descriptor)
            .map_err(|e| SessionError::Io {
                message: e.to_string(),
            })
    }

    /// All projects read: make sure a session exists (hosts may enter here
    /// without having run the start hook) and report the discovered modules.
    pub fn after_projects_read<C: ExecutionContext + ?Sized>(
        &self,
        context: &BuildContext,
        execution: &C,
    ) -> SessionResult<()> {
        self.after_session_start_in(context, execution)?;

        let root_key = registry_key(context.root_directory());
        if let Some(session) = self.registry.lookup(&root_key) {
            let modules = session.modules()?;
            if !modules.is_empty() {
                log::info!(
                    "changing version of {} module(s) to {}",
                    modules.len(),
                    session.resolved_version()
                );
                for gav in modules {
                    log::info!("    {} -> {}", gav, session.resolved_version());
                }
            }
        }
        Ok(())
    }

    /// Build end: release the session for this root and re-arm the reactor
    /// rewriter so a subsequent build in the same process rewrites again.
    /// Idempotent.
    pub fn after_session_end(&self, context: &BuildContext) -> SessionResult<()> {
        self.registry
            .close(&registry_key(context.root_directory()))?;
        self.rewriter.reset();
        Ok(())
    }
}
