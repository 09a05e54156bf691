//! Declarative route maps.
//!
//! A route map is a tree of uniquely named route descriptors built through
//! [`RouteMapBuilder`]. The builder tracks the current parent with an
//! explicit index stack: each [`RouteMapBuilder::route`] call pushes a
//! cursor, runs the children closure, and pops it again, so nesting depth is
//! data rather than call-stack structure.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Result, RouterError};

/// Per-route configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteOptions {
    /// Path pattern segment; defaults to the route name when absent. An
    /// explicit empty string declares an index route.
    pub path: Option<String>,
    /// Abstract routes are excluded from direct matching and generation
    /// unless they have an index child.
    #[serde(rename = "abstract")]
    pub abstract_route: bool,
    /// Opaque consumer data carried on the descriptor.
    pub data: serde_json::Value,
}

impl RouteOptions {
    /// Creates empty options (path defaults to the route name).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path pattern segment for this route.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Marks this route abstract.
    #[must_use]
    pub fn abstract_route(mut self) -> Self {
        self.abstract_route = true;
        self
    }

    /// Attaches opaque consumer data.
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// A named node in the declared route tree.
#[derive(Debug, Clone)]
pub struct RouteNode {
    name: String,
    options: RouteOptions,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl RouteNode {
    /// Route name, unique across the tree.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route options as declared.
    #[must_use]
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    /// Path pattern segment, defaulting to the route name.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.options.path.as_deref().unwrap_or(&self.name)
    }

    /// Whether this is an index route (explicit empty path).
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.options.path.as_deref() == Some("")
    }

    /// Whether this route is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.options.abstract_route
    }

    /// Parent node index, if any.
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Child node indices in declared order.
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// The built route tree: descriptors with parent/child links and a name
/// index. Sibling order is declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
    roots: Vec<usize>,
    by_name: HashMap<String, usize>,
}

impl RouteTree {
    /// Node by index.
    #[must_use]
    pub fn node(&self, index: usize) -> &RouteNode {
        &self.nodes[index]
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level node indices in declared order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Looks up a node index by route name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the chain of node indices from the root down to `index`.
    #[must_use]
    pub fn chain(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

/// Builds a [`RouteTree`] from nested `route` calls.
///
/// # Example
///
/// ```
/// use alder_router::{RouteMapBuilder, RouteOptions};
///
/// let tree = RouteMapBuilder::build(|map| {
///     map.route("application", RouteOptions::new(), |map| {
///         map.route("notifications", RouteOptions::new(), |_| {});
///         map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
///     });
/// })
/// .unwrap();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct RouteMapBuilder {
    tree: RouteTree,
    stack: Vec<usize>,
    error: Option<RouterError>,
}

impl RouteMapBuilder {
    /// Runs a builder callback and returns the finished tree.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateRouteName`] if any route name is
    /// declared more than once anywhere in the tree.
    pub fn build(map: impl FnOnce(&mut Self)) -> Result<RouteTree> {
        let mut builder = Self::default();
        map(&mut builder);
        match builder.error {
            Some(err) => Err(err),
            None => Ok(builder.tree),
        }
    }

    /// Declares a route under the current parent and recurses into its
    /// children with this route as the parent cursor.
    pub fn route(
        &mut self,
        name: impl Into<String>,
        options: RouteOptions,
        children: impl FnOnce(&mut Self),
    ) {
        if self.error.is_some() {
            return;
        }

        let name = name.into();
        if self.tree.by_name.contains_key(&name) {
            self.error = Some(RouterError::DuplicateRouteName(name));
            return;
        }

        let parent = self.stack.last().copied();
        let index = self.tree.nodes.len();
        self.tree.nodes.push(RouteNode {
            name: name.clone(),
            options,
            parent,
            children: Vec::new(),
        });
        self.tree.by_name.insert(name, index);
        match parent {
            Some(p) => self.tree.nodes[p].children.push(index),
            None => self.tree.roots.push(index),
        }

        self.stack.push(index);
        children(self);
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_nested_tree() {
        let tree = RouteMapBuilder::build(|map| {
            map.route("application", RouteOptions::new(), |map| {
                map.route("notifications", RouteOptions::new(), |_| {});
                map.route("messages", RouteOptions::new(), |_| {});
                map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
            });
        })
        .unwrap();

        assert_eq!(tree.len(), 4);
        let app = tree.find("application").unwrap();
        assert_eq!(tree.node(app).children().len(), 3);
        let status = tree.find("status").unwrap();
        assert_eq!(tree.node(status).pattern(), ":user/status/:id");
        assert_eq!(tree.chain(status), vec![app, status]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = RouteMapBuilder::build(|map| {
            map.route("foo", RouteOptions::new(), |map| {
                map.route("foo", RouteOptions::new(), |_| {});
            });
        })
        .unwrap_err();
        assert_eq!(err, RouterError::DuplicateRouteName("foo".into()));
    }

    #[test]
    fn test_pattern_defaults_to_name() {
        let tree = RouteMapBuilder::build(|map| {
            map.route("about", RouteOptions::new(), |_| {});
        })
        .unwrap();
        assert_eq!(tree.node(tree.find("about").unwrap()).pattern(), "about");
    }

    #[test]
    fn test_index_route_flag() {
        let tree = RouteMapBuilder::build(|map| {
            map.route("foo", RouteOptions::new().abstract_route(), |map| {
                map.route("bar", RouteOptions::new().path(""), |_| {});
            });
        })
        .unwrap();
        let bar = tree.find("bar").unwrap();
        assert!(tree.node(bar).is_index());
        assert!(tree.node(tree.find("foo").unwrap()).is_abstract());
    }
}
