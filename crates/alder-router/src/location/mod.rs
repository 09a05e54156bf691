//! Location adapters.
//!
//! A [`Location`] maps the engine's abstract navigate/URL operations onto a
//! concrete address mechanism (hash fragment, push-state history, or an
//! in-memory cell) and notifies the engine of externally-triggered address
//! changes. DOM concerns such as link-click delegation belong to the adapter
//! implementation, not to this crate.

mod memory;

pub use memory::MemoryLocation;

use std::rc::Rc;

/// Pathname and search components of the current address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationSnapshot {
    /// Path component.
    pub pathname: String,
    /// Raw query string, without the leading `?`. Empty when absent.
    pub search: String,
}

/// Callback invoked with the new path on externally-triggered changes.
pub type ChangeHandler = Rc<dyn Fn(&str)>;

/// Identifies a subscribed change handler for unsubscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(pub(crate) u64);

/// Address mechanism consumed by the router.
pub trait Location {
    /// Current address as a path (with query string when present).
    fn get_url(&self) -> String;

    /// Current address split into pathname and search.
    fn get_location(&self) -> LocationSnapshot;

    /// Writes the address, adding a history entry. Must be an idempotent
    /// no-op when the address already equals `path`.
    fn push(&self, path: &str);

    /// Writes the address without adding a history entry. Must be an
    /// idempotent no-op when the address already equals `path`.
    fn replace(&self, path: &str);

    /// Formats an internal path as a user-visible URL (e.g. prefixing a
    /// root or a hash fragment marker).
    fn format_url(&self, path: &str) -> String;

    /// Subscribes to externally-triggered address changes.
    fn on_change(&self, handler: ChangeHandler) -> HandlerId;

    /// Unsubscribes a previously registered handler.
    fn off(&self, id: HandlerId);
}
