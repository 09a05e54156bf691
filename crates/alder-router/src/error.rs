//! Error types for routing and transitions.

use thiserror::Error;

/// Router-specific errors.
///
/// Settled transition results are fanned out to every awaiter of the
/// completion future, so the error type is `Clone`; middleware failures are
/// captured as their display message for the same reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    /// Programmer misuse of the API.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The same route name was declared more than once in the route map.
    #[error("route names must be unique, but route \"{0}\" is declared multiple times")]
    DuplicateRouteName(String),

    /// No concrete route resolves to this name.
    #[error("no route is named {0}")]
    UnknownRoute(String),

    /// A dynamic segment had no corresponding param during URL generation.
    #[error("missing param \"{param}\" when generating a URL for route \"{route}\"")]
    MissingParam {
        /// Route being generated.
        route: String,
        /// Name of the dynamic segment without a value.
        param: String,
    },

    /// The transition was cancelled or superseded before completing.
    #[error("transition cancelled")]
    TransitionCancelled,

    /// A middleware `next` hook failed or its future rejected.
    #[error("middleware {name} failed: {message}")]
    MiddlewareError {
        /// Name of the failing middleware.
        name: String,
        /// Display message of the underlying error.
        message: String,
    },

    /// A middleware returned the transition it was handling.
    ///
    /// Awaiting the transition from inside its own pipeline can never
    /// settle, so the dispatch fails instead of hanging.
    #[error("middleware {name} returned a transition which resulted in a deadlock")]
    MiddlewareDeadlock {
        /// Name of the offending middleware.
        name: String,
    },
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RouterError::DuplicateRouteName("foo".into()).to_string(),
            "route names must be unique, but route \"foo\" is declared multiple times"
        );
        assert_eq!(
            RouterError::UnknownRoute("foo".into()).to_string(),
            "no route is named foo"
        );
        assert_eq!(
            RouterError::MiddlewareDeadlock {
                name: "anonymous".into()
            }
            .to_string(),
            "middleware anonymous returned a transition which resulted in a deadlock"
        );
    }
}
