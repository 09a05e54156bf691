//! Transitions: one attempted navigation from committed state to a new
//! resolved match.
//!
//! A [`Transition`] is a shared handle. The engine keeps the resolved match
//! privately; middleware sees interior-mutable copies of the route chain,
//! params and query, so nothing a middleware mutates ever aliases committed
//! router state. The completion contract settles exactly once and can be
//! awaited by any number of callers.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use serde::Serialize;

use crate::error::{Result, RouterError};
use crate::matcher::{Match, Params, RouteMatch};
use crate::query::Query;
use crate::router::RouterInner;

/// Terminal and non-terminal states of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// Dispatch has not settled yet.
    Pending,
    /// The transition committed new router state.
    Completed,
    /// The transition was cancelled before completing.
    Cancelled,
    /// The transition was superseded by another transition.
    Redirected,
    /// A middleware hook failed.
    Failed,
}

/// A navigation target: either a raw path or a named route with params and
/// query.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionTarget {
    /// A path, optionally carrying a query string.
    Path(String),
    /// A named route.
    Named {
        /// Route name.
        name: String,
        /// Params for the route chain's dynamic segments.
        params: Params,
        /// Query parameters.
        query: Query,
    },
}

impl TransitionTarget {
    /// Named target with params and query.
    #[must_use]
    pub fn named(name: impl Into<String>, params: Params, query: Query) -> Self {
        Self::Named {
            name: name.into(),
            params,
            query,
        }
    }
}

impl From<&str> for TransitionTarget {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for TransitionTarget {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// The last successfully committed navigation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterState {
    /// Committed route chain, root first.
    pub routes: Vec<RouteMatch>,
    /// Merged params.
    pub params: Params,
    /// Query parameters.
    pub query: Query,
    /// Full path including the query string.
    pub path: String,
    /// Pathname without the query string.
    pub pathname: String,
}

/// Settles exactly once; every clone of the future observes the same result.
#[derive(Clone, Default)]
pub(crate) struct Completion {
    inner: Rc<RefCell<CompletionCell>>,
}

#[derive(Default)]
struct CompletionCell {
    result: Option<Result<()>>,
    wakers: Vec<Waker>,
}

impl Completion {
    pub(crate) fn settle(&self, result: Result<()>) {
        let mut cell = self.inner.borrow_mut();
        if cell.result.is_some() {
            return;
        }
        cell.result = Some(result);
        for waker in cell.wakers.drain(..) {
            waker.wake();
        }
    }

    pub(crate) fn settled(result: Result<()>) -> Self {
        let completion = Self::default();
        completion.inner.borrow_mut().result = Some(result);
        completion
    }

    pub(crate) fn future(&self) -> CompletionFuture {
        CompletionFuture {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Future resolving with the transition's terminal result.
pub struct CompletionFuture {
    inner: Rc<RefCell<CompletionCell>>,
}

impl Future for CompletionFuture {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut cell = self.inner.borrow_mut();
        if let Some(result) = &cell.result {
            return Poll::Ready(result.clone());
        }
        if !cell.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            cell.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

/// Per-dispatch mutable copies handed to middleware.
#[derive(Debug, Clone)]
struct TransitionView {
    routes: Vec<RouteMatch>,
    params: Params,
    query: Query,
}

pub(crate) struct TransitionInner {
    id: u64,
    target: TransitionTarget,
    noop: bool,
    prev: Option<RouterState>,
    resolved: Match,
    path: String,
    view: RefCell<TransitionView>,
    state: Cell<TransitionState>,
    cancelled: Cell<bool>,
    redirected_to: RefCell<Option<Transition>>,
    completion: Completion,
    router: Weak<RouterInner>,
}

/// One attempted navigation, with an identity and a terminal outcome.
#[derive(Clone)]
pub struct Transition {
    inner: Rc<TransitionInner>,
}

impl Transition {
    pub(crate) fn new(
        id: u64,
        target: TransitionTarget,
        prev: Option<RouterState>,
        resolved: Match,
        path: String,
        router: Weak<RouterInner>,
    ) -> Self {
        Self::build(id, target, prev, resolved, path, router, false)
    }

    /// An already-completed transition for a target identical to committed
    /// state; the pipeline never runs for it.
    pub(crate) fn noop(
        id: u64,
        target: TransitionTarget,
        prev: Option<RouterState>,
        resolved: Match,
        path: String,
        router: Weak<RouterInner>,
    ) -> Self {
        Self::build(id, target, prev, resolved, path, router, true)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: u64,
        target: TransitionTarget,
        prev: Option<RouterState>,
        resolved: Match,
        path: String,
        router: Weak<RouterInner>,
        noop: bool,
    ) -> Self {
        let view = TransitionView {
            routes: resolved.routes.clone(),
            params: resolved.params.clone(),
            query: resolved.query.clone(),
        };
        let (state, completion) = if noop {
            (TransitionState::Completed, Completion::settled(Ok(())))
        } else {
            (TransitionState::Pending, Completion::default())
        };
        Self {
            inner: Rc::new(TransitionInner {
                id,
                target,
                noop,
                prev,
                resolved,
                path,
                view: RefCell::new(view),
                state: Cell::new(state),
                cancelled: Cell::new(false),
                redirected_to: RefCell::new(None),
                completion,
                router,
            }),
        }
    }

    /// Monotonically increasing per-router transition id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The target this transition was started with.
    #[must_use]
    pub fn target(&self) -> &TransitionTarget {
        &self.inner.target
    }

    /// Whether this transition short-circuited because the target equals
    /// committed state.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.inner.noop
    }

    /// Committed state before this transition started, if any.
    #[must_use]
    pub fn prev(&self) -> Option<&RouterState> {
        self.inner.prev.as_ref()
    }

    /// Full target path including the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Target pathname without the query string.
    #[must_use]
    pub fn pathname(&self) -> &str {
        &self.inner.resolved.pathname
    }

    /// Current state of the transition.
    #[must_use]
    pub fn state(&self) -> TransitionState {
        self.inner.state.get()
    }

    /// The matched route chain as seen by middleware. Mutations are visible
    /// to later middleware in the same dispatch but never to committed
    /// router state.
    #[must_use]
    pub fn routes(&self) -> Ref<'_, Vec<RouteMatch>> {
        Ref::map(self.inner.view.borrow(), |view| &view.routes)
    }

    /// Mutable access to the middleware-visible route chain.
    #[must_use]
    pub fn routes_mut(&self) -> RefMut<'_, Vec<RouteMatch>> {
        RefMut::map(self.inner.view.borrow_mut(), |view| &mut view.routes)
    }

    /// Merged params as seen by middleware.
    #[must_use]
    pub fn params(&self) -> Ref<'_, Params> {
        Ref::map(self.inner.view.borrow(), |view| &view.params)
    }

    /// Mutable access to the middleware-visible params.
    #[must_use]
    pub fn params_mut(&self) -> RefMut<'_, Params> {
        RefMut::map(self.inner.view.borrow_mut(), |view| &mut view.params)
    }

    /// Query parameters as seen by middleware.
    #[must_use]
    pub fn query(&self) -> Ref<'_, Query> {
        Ref::map(self.inner.view.borrow(), |view| &view.query)
    }

    /// Mutable access to the middleware-visible query.
    #[must_use]
    pub fn query_mut(&self) -> RefMut<'_, Query> {
        RefMut::map(self.inner.view.borrow_mut(), |view| &mut view.query)
    }

    /// Whether `name` appears in the transition's route chain.
    #[must_use]
    pub fn contains_route(&self, name: &str) -> bool {
        self.inner.view.borrow().routes.iter().any(|r| r.name == name)
    }

    /// Marks the transition cancelled. Observed by the pipeline at the next
    /// hook boundary; the completion contract then rejects with
    /// [`RouterError::TransitionCancelled`].
    pub fn cancel(&self) {
        if self.state() == TransitionState::Pending {
            self.inner.cancelled.set(true);
        }
    }

    /// Supersedes this transition with a new one for `target`.
    ///
    /// The new transition's `prev` is the committed state from before this
    /// transition, not this transition's abandoned target. This transition's
    /// own completion rejects with [`RouterError::TransitionCancelled`];
    /// [`Self::follow_redirects`] chases the replacement.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownRoute`] for an unresolvable named
    /// target, or [`RouterError::InvariantViolation`] if the router was
    /// destroyed.
    pub fn redirect_to(&self, target: impl Into<TransitionTarget>) -> Result<Self> {
        let router = self.router()?;
        let next = RouterInner::transition_to(&router, target.into())?;
        // Deduplication can hand back this very transition; redirecting a
        // transition to itself must not establish linkage.
        if next.id() != self.id() {
            self.link_redirect(&next);
        }
        Ok(next)
    }

    /// Re-issues the exact same target as a fresh transition with a new id.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvariantViolation`] if the router was
    /// destroyed.
    pub fn retry(&self) -> Result<Self> {
        let router = self.router()?;
        RouterInner::transition_to(&router, self.inner.target.clone())
    }

    /// Future settling with this transition's own terminal result.
    #[must_use]
    pub fn completed(&self) -> CompletionFuture {
        self.inner.completion.future()
    }

    /// Follows redirect linkage until the chain terminates.
    ///
    /// Resolves once the final transition in the redirect chain starting
    /// from this one completes, or rejects with that transition's failure.
    /// A cancellation without a successor rejects with
    /// [`RouterError::TransitionCancelled`].
    pub async fn follow_redirects(&self) -> Result<()> {
        let mut current = self.clone();
        loop {
            let result = current.completed().await;
            match result {
                Err(RouterError::TransitionCancelled) => {
                    let next = current.redirected_to();
                    match next {
                        Some(next) => current = next,
                        None => return Err(RouterError::TransitionCancelled),
                    }
                }
                other => return other,
            }
        }
    }

    /// The transition that superseded this one, if any.
    #[must_use]
    pub fn redirected_to(&self) -> Option<Self> {
        self.inner.redirected_to.borrow().clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    pub(crate) fn is_redirected(&self) -> bool {
        self.inner.redirected_to.borrow().is_some()
    }

    pub(crate) fn link_redirect(&self, next: &Self) {
        let mut link = self.inner.redirected_to.borrow_mut();
        if link.is_none() {
            *link = Some(next.clone());
        }
    }

    pub(crate) fn resolved(&self) -> &Match {
        &self.inner.resolved
    }

    pub(crate) fn settle(&self, state: TransitionState, result: Result<()>) {
        if self.state() != TransitionState::Pending {
            return;
        }
        self.inner.state.set(state);
        self.inner.completion.settle(result);
    }

    fn router(&self) -> Result<Rc<RouterInner>> {
        self.inner.router.upgrade().ok_or_else(|| {
            RouterError::InvariantViolation("router has been destroyed".to_string())
        })
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("state", &self.inner.state.get())
            .field("noop", &self.inner.noop)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_settles_once() {
        let completion = Completion::default();
        completion.settle(Ok(()));
        completion.settle(Err(RouterError::TransitionCancelled));

        let mut future = completion.future();
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(
            Pin::new(&mut future).poll(&mut cx),
            Poll::Ready(Ok(()))
        );
    }

    #[test]
    fn test_completion_fans_out() {
        let completion = Completion::default();
        let mut a = completion.future();
        let mut b = completion.future();
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        assert_eq!(Pin::new(&mut a).poll(&mut cx), Poll::Pending);
        completion.settle(Err(RouterError::TransitionCancelled));
        assert_eq!(
            Pin::new(&mut a).poll(&mut cx),
            Poll::Ready(Err(RouterError::TransitionCancelled))
        );
        assert_eq!(
            Pin::new(&mut b).poll(&mut cx),
            Poll::Ready(Err(RouterError::TransitionCancelled))
        );
    }
}
