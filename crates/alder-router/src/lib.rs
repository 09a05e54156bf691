//! # alder-router
//!
//! A client-side navigation engine for single-page applications.
//!
//! This crate provides:
//! - Declarative, hierarchical route maps with abstract and index routes
//! - An ordered matcher with `:param` dynamic segments and reverse URL
//!   generation
//! - An asynchronous transition engine with cancellation, redirection,
//!   retry and deduplication
//! - An ordered middleware pipeline with `next`/`done`/`error`/`cancel`
//!   hooks
//! - Pluggable location adapters (an in-memory one is included)
//!
//! ## Quick Start
//!
//! ```ignore
//! use alder_router::{Router, RouteOptions};
//!
//! let router = Router::new();
//! router.map(|map| {
//!     map.route("application", RouteOptions::new(), |map| {
//!         map.route("messages", RouteOptions::new(), |_| {});
//!         map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
//!     });
//! })?;
//!
//! router.use_fn(|transition| async move {
//!     render_outlet(&transition.routes());
//! });
//!
//! // Resolve the current address and start reacting to address changes.
//! router.listen()?.completed().await?;
//!
//! // Navigate programmatically, by path or by route name.
//! router.transition_to("/application/messages")?.completed().await?;
//! ```
//!
//! ## Route Maps
//!
//! Routes nest; a route's path pattern defaults to its name. A route with
//! `abstract` set is excluded from direct matching unless it declares an
//! index child (a child with an empty path), which is activated
//! transparently when the abstract route is targeted.
//!
//! ## Transitions
//!
//! Each navigation attempt is a [`Transition`] with a monotonically
//! increasing id. At most one transition is in flight per router; starting
//! a new one supersedes the previous, which then rejects with
//! [`RouterError::TransitionCancelled`] while its
//! [`Transition::follow_redirects`] future chases the replacement chain to
//! its final outcome.
//!
//! ## Middleware
//!
//! ```ignore
//! router.use_fn(|transition| async move {
//!     if transition.contains_route("admin") && !session.logged_in() {
//!         transition.redirect_to("/login")?;
//!     }
//!     Ok(())
//! });
//! ```
//!
//! Middleware runs strictly sequentially; each `next` hook is awaited
//! before the following entry runs. Cancellation and redirection are
//! observed at hook boundaries only.

mod error;
mod location;
mod matcher;
mod middleware;
mod path;
mod query;
mod routes;
mod router;
mod transition;

pub use error::{Result, RouterError};
pub use location::{ChangeHandler, HandlerId, Location, LocationSnapshot, MemoryLocation};
pub use matcher::{Match, Matcher, MatcherEntry, Params, RouteMatch};
pub use middleware::{
    FnMiddleware, HookError, IntoHookOutcome, LocalBoxFuture, Middleware, MiddlewareHandle,
    NextResult,
};
pub use path::{PathPattern, PathSegment};
pub use query::Query;
pub use routes::{RouteMapBuilder, RouteNode, RouteOptions, RouteTree};
pub use router::{Router, RouterOptions};
pub use transition::{
    CompletionFuture, RouterState, Transition, TransitionState, TransitionTarget,
};
