//! Middleware registration and dispatch.
//!
//! A middleware is polymorphic over four hooks: `next` (awaited, runs once
//! per transition in registration order), plus `done`, `error` and `cancel`
//! notifications. A bare async closure registers as a `next`-only entry.

use std::future::Future;
use std::rc::Rc;

use tracing::debug;

use crate::error::RouterError;
use crate::transition::Transition;

/// A boxed future for middleware hooks.
///
/// The engine is single-threaded and cooperatively scheduled, so hook
/// futures are not required to be `Send`.
pub type LocalBoxFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;

/// Error type middleware hooks may fail with.
pub type HookError = Box<dyn std::error::Error>;

/// Resolved value of a `next` hook.
pub enum NextResult {
    /// Proceed to the following middleware.
    Continue,
    /// A transition handle was returned by mistake. Awaiting a transition
    /// from inside its own pipeline can never settle, so dispatch fails
    /// with [`RouterError::MiddlewareDeadlock`] instead of hanging.
    Transition(Transition),
}

/// Trait for transition middleware.
///
/// All hooks have no-op defaults; implement the ones you need.
///
/// # Example
///
/// ```ignore
/// struct AuthGuard;
///
/// impl Middleware for AuthGuard {
///     fn name(&self) -> &str {
///         "auth-guard"
///     }
///
///     fn next<'a>(
///         &'a self,
///         transition: &'a Transition,
///     ) -> LocalBoxFuture<'a, Result<NextResult, HookError>> {
///         Box::pin(async move {
///             if transition.contains_route("admin") && !logged_in() {
///                 transition.redirect_to("/login")?;
///             }
///             Ok(NextResult::Continue)
///         })
///     }
/// }
/// ```
pub trait Middleware {
    /// Name used in diagnostics and error messages.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Called with the transition's view; awaited before the next entry
    /// runs.
    fn next<'a>(
        &'a self,
        transition: &'a Transition,
    ) -> LocalBoxFuture<'a, Result<NextResult, HookError>> {
        let _ = transition;
        Box::pin(async { Ok(NextResult::Continue) })
    }

    /// Called after every entry's `next` hook completed successfully.
    fn done(&self, transition: &Transition) {
        let _ = transition;
    }

    /// Called when the transition failed, for every entry whose `next` hook
    /// had been invoked.
    fn error(&self, transition: &Transition, error: &RouterError) {
        let _ = (transition, error);
    }

    /// Called when the transition was cancelled or redirected, for every
    /// entry whose `next` hook had been invoked.
    fn cancel(&self, transition: &Transition) {
        let _ = transition;
    }
}

/// Conversion of bare-closure return values into a `next` hook result.
///
/// Lets function middleware return `()`, a [`NextResult`], a [`Transition`]
/// (the deadlock case) or a `Result` of either.
pub trait IntoHookOutcome {
    /// Converts into the canonical hook result.
    fn into_hook_outcome(self) -> Result<NextResult, HookError>;
}

impl IntoHookOutcome for () {
    fn into_hook_outcome(self) -> Result<NextResult, HookError> {
        Ok(NextResult::Continue)
    }
}

impl IntoHookOutcome for NextResult {
    fn into_hook_outcome(self) -> Result<NextResult, HookError> {
        Ok(self)
    }
}

impl IntoHookOutcome for Transition {
    fn into_hook_outcome(self) -> Result<NextResult, HookError> {
        Ok(NextResult::Transition(self))
    }
}

impl IntoHookOutcome for Result<(), HookError> {
    fn into_hook_outcome(self) -> Result<NextResult, HookError> {
        self.map(|()| NextResult::Continue)
    }
}

impl IntoHookOutcome for Result<NextResult, HookError> {
    fn into_hook_outcome(self) -> Result<NextResult, HookError> {
        self
    }
}

/// Adapter turning a bare async closure into a `next`-only [`Middleware`].
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut, O> Middleware for FnMiddleware<F>
where
    F: Fn(Transition) -> Fut,
    Fut: Future<Output = O> + 'static,
    O: IntoHookOutcome,
{
    fn next<'a>(
        &'a self,
        transition: &'a Transition,
    ) -> LocalBoxFuture<'a, Result<NextResult, HookError>> {
        let fut = (self.f)(transition.clone());
        Box::pin(async move { fut.await.into_hook_outcome() })
    }
}

/// Handle returned by registration, usable for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiddlewareHandle(pub(crate) u64);

/// One registered entry.
#[derive(Clone)]
pub(crate) struct RegisteredMiddleware {
    pub(crate) id: u64,
    pub(crate) mw: Rc<dyn Middleware>,
}

/// Ordered registry of middleware entries. Registration order is dispatch
/// order.
#[derive(Clone, Default)]
pub(crate) struct MiddlewareStack {
    next_id: u64,
    entries: Vec<RegisteredMiddleware>,
}

impl MiddlewareStack {
    pub(crate) fn add(&mut self, mw: Rc<dyn Middleware>) -> MiddlewareHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(RegisteredMiddleware { id, mw });
        MiddlewareHandle(id)
    }

    pub(crate) fn remove(&mut self, handle: MiddlewareHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != handle.0);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of the registry taken at dispatch start; registrations made
    /// while a transition is in flight affect only later transitions.
    pub(crate) fn snapshot(&self) -> Vec<RegisteredMiddleware> {
        self.entries.clone()
    }
}

/// Terminal outcome of dispatching a transition through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Completed,
    Cancelled,
    Redirected,
    Failed(RouterError),
}

/// Runs the transition through the entries sequentially.
///
/// Each `next` hook is awaited before the following entry runs; cancellation
/// and redirection are observed only at these hook boundaries, never by
/// preempting a hook that is already executing.
pub(crate) async fn dispatch(
    entries: &[RegisteredMiddleware],
    transition: &Transition,
) -> DispatchOutcome {
    let mut invoked = 0;
    let mut outcome = None;

    for entry in entries {
        if let Some(interrupted) = interruption(transition) {
            outcome = Some(interrupted);
            break;
        }

        let result = entry.mw.next(transition).await;
        invoked += 1;

        match result {
            Ok(NextResult::Continue) => {}
            Ok(NextResult::Transition(_)) => {
                outcome = Some(DispatchOutcome::Failed(RouterError::MiddlewareDeadlock {
                    name: entry.mw.name().to_string(),
                }));
                break;
            }
            Err(err) => {
                outcome = Some(DispatchOutcome::Failed(RouterError::MiddlewareError {
                    name: entry.mw.name().to_string(),
                    message: err.to_string(),
                }));
                break;
            }
        }

        if let Some(interrupted) = interruption(transition) {
            outcome = Some(interrupted);
            break;
        }
    }

    // An empty pipeline still observes a cancellation or supersession that
    // was flagged before dispatch ran.
    let outcome = outcome
        .or_else(|| interruption(transition))
        .unwrap_or(DispatchOutcome::Completed);
    debug!(id = transition.id(), ?outcome, "pipeline settled");

    match &outcome {
        DispatchOutcome::Completed => {
            for entry in entries {
                entry.mw.done(transition);
            }
        }
        DispatchOutcome::Cancelled | DispatchOutcome::Redirected => {
            for entry in &entries[..invoked] {
                entry.mw.cancel(transition);
            }
        }
        DispatchOutcome::Failed(err) => {
            for entry in &entries[..invoked] {
                entry.mw.error(transition, err);
            }
        }
    }

    outcome
}

fn interruption(transition: &Transition) -> Option<DispatchOutcome> {
    if transition.is_redirected() {
        Some(DispatchOutcome::Redirected)
    } else if transition.is_cancelled() {
        Some(DispatchOutcome::Cancelled)
    } else {
        None
    }
}
