//! In-memory location adapter.

use std::cell::{Cell, RefCell};

use super::{ChangeHandler, HandlerId, Location, LocationSnapshot};
use crate::query;

/// A [`Location`] backed by a plain in-memory cell.
///
/// Useful for headless environments and tests. [`MemoryLocation::set_url`]
/// simulates an externally-triggered address change (the equivalent of the
/// user editing the address bar or using back/forward) and notifies
/// subscribed handlers; `push`/`replace` write silently, as a browser does
/// for programmatic history writes.
pub struct MemoryLocation {
    root: String,
    path: RefCell<String>,
    next_handler: Cell<u64>,
    handlers: RefCell<Vec<(u64, ChangeHandler)>>,
}

impl MemoryLocation {
    /// Creates a location at the given initial path.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            root: String::new(),
            path: RefCell::new(initial.into()),
            next_handler: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Sets a base path prefix used by [`Location::format_url`].
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Simulates an external address change, notifying subscribers when the
    /// address actually changes.
    pub fn set_url(&self, path: &str) {
        {
            let mut current = self.path.borrow_mut();
            if *current == path {
                return;
            }
            *current = path.to_string();
        }
        let handlers: Vec<ChangeHandler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(path);
        }
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Location for MemoryLocation {
    fn get_url(&self) -> String {
        self.path.borrow().clone()
    }

    fn get_location(&self) -> LocationSnapshot {
        let url = self.get_url();
        let (pathname, search) = query::split_path(&url);
        LocationSnapshot {
            pathname: pathname.to_string(),
            search: search.unwrap_or("").to_string(),
        }
    }

    fn push(&self, path: &str) {
        let mut current = self.path.borrow_mut();
        if *current != path {
            *current = path.to_string();
        }
    }

    fn replace(&self, path: &str) {
        let mut current = self.path.borrow_mut();
        if *current != path {
            *current = path.to_string();
        }
    }

    fn format_url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    fn on_change(&self, handler: ChangeHandler) -> HandlerId {
        let id = self.next_handler.get() + 1;
        self.next_handler.set(id);
        self.handlers.borrow_mut().push((id, handler));
        HandlerId(id)
    }

    fn off(&self, id: HandlerId) {
        self.handlers.borrow_mut().retain(|(h, _)| *h != id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_push_and_get() {
        let location = MemoryLocation::default();
        location.push("/a/b?x=1");
        assert_eq!(location.get_url(), "/a/b?x=1");
        let snapshot = location.get_location();
        assert_eq!(snapshot.pathname, "/a/b");
        assert_eq!(snapshot.search, "x=1");
    }

    #[test]
    fn test_set_url_notifies_handlers() {
        let location = MemoryLocation::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = location.on_change(Rc::new(move |path: &str| {
            sink.borrow_mut().push(path.to_string());
        }));

        location.set_url("/about");
        // same address again is a no-op
        location.set_url("/about");
        location.off(id);
        location.set_url("/faq");

        assert_eq!(*seen.borrow(), vec!["/about".to_string()]);
    }

    #[test]
    fn test_push_does_not_notify() {
        let location = MemoryLocation::default();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        location.on_change(Rc::new(move |_: &str| {
            sink.set(sink.get() + 1);
        }));
        location.push("/about");
        location.replace("/faq");
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_format_url_with_root() {
        let location = MemoryLocation::new("/").with_root("/foo/bar");
        assert_eq!(location.format_url("/about"), "/foo/bar/about");
    }
}
