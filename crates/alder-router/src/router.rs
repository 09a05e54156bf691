//! The router facade and transition engine.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use crate::error::{Result, RouterError};
use crate::location::{HandlerId, Location, MemoryLocation};
use crate::matcher::{Match, Matcher, Params};
use crate::middleware::{
    self, DispatchOutcome, FnMiddleware, IntoHookOutcome, Middleware, MiddlewareHandle,
    MiddlewareStack,
};
use crate::query::Query;
use crate::routes::RouteMapBuilder;
use crate::transition::{RouterState, Transition, TransitionState, TransitionTarget};

/// Router configuration.
pub struct RouterOptions {
    /// Use push-state history instead of hash-fragment addressing. The
    /// concrete mechanism is the [`Location`] adapter's concern; this flag
    /// is forwarded to adapters that honor it.
    pub push_state: bool,
    /// Base path prefix when `push_state` is in effect.
    pub root: String,
    /// Whether in-page link clicks should be routed internally. Link
    /// delegation itself happens in the environment's location adapter; the
    /// engine only records the preference.
    pub intercept_links: bool,
    /// Custom location adapter. Defaults to an in-memory one.
    pub location: Option<Rc<dyn Location>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            push_state: false,
            root: "/".to_string(),
            intercept_links: true,
            location: None,
        }
    }
}

pub(crate) struct RouterInner {
    weak_self: Weak<RouterInner>,
    push_state: bool,
    root: String,
    intercept_links: bool,
    location: Rc<dyn Location>,
    matcher: RefCell<Matcher>,
    middleware: RefCell<MiddlewareStack>,
    state: RefCell<Option<RouterState>>,
    active: RefCell<Option<Transition>>,
    next_id: Cell<u64>,
    listening: Cell<bool>,
    change_handler: Cell<Option<HandlerId>>,
}

impl RouterInner {
    /// Starts a transition towards `target`.
    ///
    /// Deduplicates against an equivalent in-flight transition, short-
    /// circuits to a completed noop when the target equals committed state,
    /// and otherwise supersedes any Pending transition (establishing
    /// redirect linkage from it to the new one) before dispatching.
    pub(crate) fn transition_to(
        self: &Rc<Self>,
        target: TransitionTarget,
    ) -> Result<Transition> {
        let path = self.resolve_target(&target)?;
        let resolved = self.matcher.borrow().match_path(&path);

        // An equivalent Pending transition is reused rather than restarted,
        // unless it has already been flagged cancelled; a cancelled
        // transition stays Pending until its dispatch observes the flag, and
        // reusing it would hand back a dying handle.
        if let Some(active) = self.active.borrow().as_ref() {
            if active.state() == TransitionState::Pending
                && !active.is_cancelled()
                && same_intent(active.resolved(), &resolved)
            {
                debug!(id = active.id(), path = %path, "reusing active transition");
                return Ok(active.clone());
            }
        }

        let prev = self.state.borrow().clone();

        // Navigating to exactly the committed state dispatches nothing.
        if let Some(state) = &prev {
            if same_state(state, &resolved) {
                let id = self.allocate_id();
                debug!(id, path = %path, "noop transition");
                return Ok(Transition::noop(
                    id,
                    target,
                    Some(state.clone()),
                    resolved,
                    path,
                    self.weak_self.clone(),
                ));
            }
        }

        let id = self.allocate_id();
        let transition = Transition::new(
            id,
            target,
            prev,
            resolved,
            path.clone(),
            self.weak_self.clone(),
        );

        // A later navigation intent supersedes the Pending one; the
        // superseded transition observes this at its next hook boundary.
        if let Some(active) = self.active.borrow().as_ref() {
            if active.state() == TransitionState::Pending {
                info!(superseded = active.id(), by = id, "transition superseded");
                active.link_redirect(&transition);
            }
        }
        *self.active.borrow_mut() = Some(transition.clone());

        info!(id, path = %path, "transition started");
        let inner = Rc::clone(self);
        let running = transition.clone();
        tokio::task::spawn_local(async move {
            inner.run(&running).await;
        });

        Ok(transition)
    }

    async fn run(&self, transition: &Transition) {
        let entries = self.middleware.borrow().snapshot();
        let outcome = middleware::dispatch(&entries, transition).await;

        match outcome {
            DispatchOutcome::Completed => {
                self.commit(transition);
                transition.settle(TransitionState::Completed, Ok(()));
                info!(id = transition.id(), path = transition.path(), "transition completed");
            }
            DispatchOutcome::Cancelled => {
                self.restore_url(transition);
                transition.settle(
                    TransitionState::Cancelled,
                    Err(RouterError::TransitionCancelled),
                );
                warn!(id = transition.id(), path = transition.path(), "transition cancelled");
            }
            DispatchOutcome::Redirected => {
                // The superseding transition owns the address from here on.
                transition.settle(
                    TransitionState::Redirected,
                    Err(RouterError::TransitionCancelled),
                );
                debug!(id = transition.id(), "transition redirected");
            }
            DispatchOutcome::Failed(err) => {
                self.restore_url(transition);
                error!(id = transition.id(), error = %err, "transition failed");
                transition.settle(TransitionState::Failed, Err(err));
            }
        }

        let mut active = self.active.borrow_mut();
        if active.as_ref().is_some_and(|a| a.id() == transition.id()) {
            *active = None;
        }
    }

    /// Replaces committed state from the transition's privately held
    /// resolved match, never from the middleware-visible copies.
    fn commit(&self, transition: &Transition) {
        let resolved = transition.resolved().clone();
        *self.state.borrow_mut() = Some(RouterState {
            routes: resolved.routes,
            params: resolved.params,
            query: resolved.query,
            path: transition.path().to_string(),
            pathname: resolved.pathname,
        });
        if self.location.get_url() != transition.path() {
            self.location.push(transition.path());
        }
    }

    /// Reverts the address when it reflects an abandoned target.
    fn restore_url(&self, transition: &Transition) {
        if self.location.get_url() != transition.path() {
            return;
        }
        if let Some(state) = self.state.borrow().as_ref() {
            self.location.replace(&state.path);
        }
    }

    fn resolve_target(&self, target: &TransitionTarget) -> Result<String> {
        match target {
            TransitionTarget::Path(path) => Ok(path.clone()),
            TransitionTarget::Named {
                name,
                params,
                query,
            } => self.matcher.borrow().generate(name, params, query),
        }
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

fn same_intent(a: &Match, b: &Match) -> bool {
    a.pathname == b.pathname && a.query == b.query
}

fn same_state(state: &RouterState, resolved: &Match) -> bool {
    resolved.is_matched()
        && state.routes.len() == resolved.routes.len()
        && state
            .routes
            .iter()
            .zip(&resolved.routes)
            .all(|(a, b)| a.name == b.name)
        && state.params == resolved.params
        && state.query == resolved.query
}

/// The router: composes the route tree, matcher, middleware pipeline and
/// transition engine behind one facade.
///
/// State is per-instance; nothing is process-global. The engine is single-
/// threaded and cooperatively scheduled: transitions are driven with
/// `tokio::task::spawn_local`, so a router must live inside a
/// `tokio::task::LocalSet` (or any current-thread context providing local
/// tasks).
///
/// # Example
///
/// ```ignore
/// let router = Router::new();
/// router.map(|map| {
///     map.route("application", RouteOptions::new(), |map| {
///         map.route("messages", RouteOptions::new(), |_| {});
///     });
/// })?;
/// router.use_fn(|transition| async move {
///     render(&transition.routes());
/// });
/// router.listen()?.completed().await?;
/// ```
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("listening", &self.inner.listening.get())
            .field("middleware", &self.inner.middleware.borrow().len())
            .field("state", &self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a router with default options and an in-memory location.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Creates a router with the given options.
    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        let location = options.location.unwrap_or_else(|| {
            if options.push_state && options.root != "/" {
                Rc::new(MemoryLocation::default().with_root(options.root.clone()))
            } else {
                Rc::new(MemoryLocation::default())
            }
        });
        let inner = Rc::new_cyclic(|weak| RouterInner {
            weak_self: weak.clone(),
            push_state: options.push_state,
            root: options.root,
            intercept_links: options.intercept_links,
            location,
            matcher: RefCell::new(Matcher::default()),
            middleware: RefCell::new(MiddlewareStack::default()),
            state: RefCell::new(None),
            active: RefCell::new(None),
            next_id: Cell::new(0),
            listening: Cell::new(false),
            change_handler: Cell::new(None),
        });
        Self { inner }
    }

    /// Registers the route map.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateRouteName`] if a route name is
    /// declared more than once.
    pub fn map(&self, map: impl FnOnce(&mut RouteMapBuilder)) -> Result<&Self> {
        let tree = RouteMapBuilder::build(map)?;
        *self.inner.matcher.borrow_mut() = Matcher::compile(tree);
        Ok(self)
    }

    /// Appends a middleware entry; registration order is dispatch order.
    pub fn use_middleware(&self, mw: impl Middleware + 'static) -> MiddlewareHandle {
        self.inner.middleware.borrow_mut().add(Rc::new(mw))
    }

    /// Registers a bare async closure as a `next`-only middleware.
    pub fn use_fn<F, Fut, O>(&self, f: F) -> MiddlewareHandle
    where
        F: Fn(Transition) -> Fut + 'static,
        Fut: std::future::Future<Output = O> + 'static,
        O: IntoHookOutcome,
    {
        self.use_middleware(FnMiddleware::new(f))
    }

    /// Removes a previously registered middleware entry.
    pub fn remove_middleware(&self, handle: MiddlewareHandle) -> bool {
        self.inner.middleware.borrow_mut().remove(handle)
    }

    /// Number of registered middleware entries.
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.inner.middleware.borrow().len()
    }

    /// Starts listening to the location and performs the first resolution
    /// from the current address; the returned transition settles when that
    /// resolution does.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvariantViolation`] when already listening.
    pub fn listen(&self) -> Result<Transition> {
        if self.inner.listening.get() {
            return Err(RouterError::InvariantViolation(
                "already listening".to_string(),
            ));
        }
        self.inner.listening.set(true);

        let weak = self.inner.weak_self.clone();
        let handler = Rc::new(move |path: &str| {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = RouterInner::transition_to(
                    &inner,
                    TransitionTarget::Path(path.to_string()),
                ) {
                    error!(%err, path, "url change could not start a transition");
                }
            }
        });
        let id = self.inner.location.on_change(handler);
        self.inner.change_handler.set(Some(id));

        let url = self.inner.location.get_url();
        RouterInner::transition_to(&self.inner, TransitionTarget::Path(url))
    }

    /// Starts a transition to a path target.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownRoute`] for an unresolvable named
    /// target (including abstract routes without an index child).
    pub fn transition_to(&self, target: impl Into<TransitionTarget>) -> Result<Transition> {
        RouterInner::transition_to(&self.inner, target.into())
    }

    /// Starts a transition to a named route with params and query.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownRoute`] if `name` does not resolve to
    /// a concrete route.
    pub fn transition_to_route(
        &self,
        name: &str,
        params: Params,
        query: Query,
    ) -> Result<Transition> {
        self.transition_to(TransitionTarget::named(name, params, query))
    }

    /// Matches a path (with optional query string) against the route map.
    /// Never fails; an unmatched path yields an empty route chain with the
    /// query still parsed.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Match {
        self.inner.matcher.borrow().match_path(path)
    }

    /// Generates a URL for a named route, formatted by the location
    /// adapter.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvariantViolation`] before [`Self::listen`],
    /// [`RouterError::UnknownRoute`] for an unresolvable name, or
    /// [`RouterError::MissingParam`] for a dynamic segment without a value.
    pub fn generate(&self, name: &str, params: &Params, query: &Query) -> Result<String> {
        if !self.inner.listening.get() {
            return Err(RouterError::InvariantViolation(
                "call .listen() before using .generate()".to_string(),
            ));
        }
        let path = self.inner.matcher.borrow().generate(name, params, query)?;
        Ok(self.inner.location.format_url(&path))
    }

    /// Whether the committed route chain contains `name` and every supplied
    /// param and query value matches the committed one.
    #[must_use]
    pub fn is_active(&self, name: &str, params: &Params, query: &Query) -> bool {
        let state = self.inner.state.borrow();
        let Some(state) = state.as_ref() else {
            return false;
        };
        state.routes.iter().any(|r| r.name == name)
            && params
                .iter()
                .all(|(k, v)| state.params.get(k).is_some_and(|sv| sv == v))
            && query
                .iter()
                .all(|(k, v)| state.query.get(k).is_some_and(|sv| sv == v))
    }

    /// The last successfully committed state, if any transition completed.
    #[must_use]
    pub fn state(&self) -> Option<RouterState> {
        self.inner.state.borrow().clone()
    }

    /// The location adapter in use.
    #[must_use]
    pub fn location(&self) -> Rc<dyn Location> {
        Rc::clone(&self.inner.location)
    }

    /// Whether push-state addressing was requested.
    #[must_use]
    pub fn push_state(&self) -> bool {
        self.inner.push_state
    }

    /// Base path prefix in effect when push-state addressing is used.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    /// Whether in-page link clicks should be routed internally. The actual
    /// click delegation is the environment adapter's responsibility.
    #[must_use]
    pub fn intercepts_links(&self) -> bool {
        self.inner.intercept_links
    }

    /// Tears down the location subscription and cancels in-flight work.
    pub fn destroy(&self) {
        if let Some(id) = self.inner.change_handler.take() {
            self.inner.location.off(id);
        }
        self.inner.listening.set(false);
        if let Some(active) = self.inner.active.borrow().as_ref() {
            active.cancel();
        }
    }
}
