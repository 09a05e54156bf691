//! Compiling a route tree into an ordered matcher.
//!
//! The matcher flattens the tree depth-first, parents before children,
//! preserving declared sibling order. That order is the tie-break for
//! ambiguous matches (first match wins) and the precedence for reverse URL
//! generation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, RouterError};
use crate::path::{self, PathPattern};
use crate::query::{self, Query};
use crate::routes::{RouteOptions, RouteTree};

/// Merged path parameters.
pub type Params = HashMap<String, String>;

/// One matched route descriptor in a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatch {
    /// Route name.
    pub name: String,
    /// Path pattern segment of this route.
    pub path: String,
    /// Params extracted by this segment's dynamic parts only.
    pub params: Params,
    /// Options as declared on the route.
    pub options: RouteOptions,
}

/// The result of matching a path.
///
/// Matching never fails: an unmatched path yields an empty `routes` chain
/// with the query still parsed, distinguishing "no route" from "no query".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Matched route chain, root first. Empty when nothing matched.
    pub routes: Vec<RouteMatch>,
    /// Merged params across the whole chain.
    pub params: Params,
    /// Normalized pathname that was matched.
    pub pathname: String,
    /// Parsed query parameters.
    pub query: Query,
}

impl Match {
    /// Whether any route matched.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        !self.routes.is_empty()
    }

    /// Whether `name` appears anywhere in the matched chain.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.iter().any(|r| r.name == name)
    }
}

/// A segment of a compiled entry's route chain.
#[derive(Debug, Clone)]
struct ChainLink {
    node: usize,
    param_names: Vec<String>,
}

/// A compiled, matchable path pattern derived from a concrete route's full
/// chain.
#[derive(Debug, Clone)]
pub struct MatcherEntry {
    path: String,
    pattern: PathPattern,
    chain: Vec<ChainLink>,
}

impl MatcherEntry {
    /// Full `/`-joined path pattern from the root to this route.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dynamic segment names along the full pattern.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        self.pattern.param_names()
    }
}

/// An ordered list of compiled path patterns derived from a [`RouteTree`].
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    tree: RouteTree,
    entries: Vec<MatcherEntry>,
    by_name: HashMap<String, usize>,
}

impl Matcher {
    /// Compiles a route tree into an ordered matcher.
    ///
    /// One entry is emitted per concrete route; abstract routes produce no
    /// entry of their own, but an abstract route with an index child (empty
    /// path) is reachable through that child's entry, so targeting the
    /// abstract name transparently activates the index child.
    #[must_use]
    pub fn compile(tree: RouteTree) -> Self {
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();

        let mut stack: Vec<usize> = tree.roots().iter().rev().copied().collect();
        let mut visit_order = Vec::with_capacity(tree.len());
        while let Some(index) = stack.pop() {
            visit_order.push(index);
            for &child in tree.node(index).children().iter().rev() {
                stack.push(child);
            }
        }

        for index in visit_order {
            let node = tree.node(index);
            if node.is_abstract() {
                continue;
            }

            let chain_indices = tree.chain(index);
            let mut parts = Vec::new();
            let mut chain = Vec::with_capacity(chain_indices.len());
            for &i in &chain_indices {
                let segment = tree.node(i).pattern();
                let seg_pattern = PathPattern::new(segment);
                chain.push(ChainLink {
                    node: i,
                    param_names: seg_pattern.param_names().to_vec(),
                });
                if !segment.is_empty() {
                    parts.push(segment);
                }
            }
            let full = format!("/{}", parts.join("/"));

            let entry_index = entries.len();
            by_name.insert(node.name().to_string(), entry_index);
            // An index child answers for its abstract parent's name.
            if node.is_index() {
                if let Some(parent) = node.parent() {
                    let parent_node = tree.node(parent);
                    if parent_node.is_abstract() {
                        by_name.insert(parent_node.name().to_string(), entry_index);
                    }
                }
            }

            debug!(path = %full, route = node.name(), "compiled matcher entry");
            entries.push(MatcherEntry {
                pattern: PathPattern::new(&full),
                path: full,
                chain,
            });
        }

        Self {
            tree,
            entries,
            by_name,
        }
    }

    /// The route tree this matcher was compiled from.
    #[must_use]
    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Compiled entries in match precedence order.
    #[must_use]
    pub fn entries(&self) -> &[MatcherEntry] {
        &self.entries
    }

    /// Matches a path (with optional query string) against the compiled
    /// entries, first match wins.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Match {
        let (raw_pathname, raw_query) = query::split_path(path);
        let parsed_query = raw_query.map(query::parse).unwrap_or_default();
        let pathname = path::normalize(raw_pathname);

        for entry in &self.entries {
            let Some(params) = entry.pattern.match_path(&pathname) else {
                continue;
            };

            let routes = entry
                .chain
                .iter()
                .map(|link| {
                    let node = self.tree.node(link.node);
                    let segment_params = link
                        .param_names
                        .iter()
                        .filter_map(|name| {
                            params.get(name).map(|v| (name.clone(), v.clone()))
                        })
                        .collect();
                    RouteMatch {
                        name: node.name().to_string(),
                        path: node.pattern().to_string(),
                        params: segment_params,
                        options: node.options().clone(),
                    }
                })
                .collect();

            return Match {
                routes,
                params,
                pathname,
                query: parsed_query,
            };
        }

        Match {
            routes: Vec::new(),
            params: Params::new(),
            pathname,
            query: parsed_query,
        }
    }

    /// Generates a path for a named route with params interpolated and the
    /// query appended.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownRoute`] if no concrete route resolves
    /// to `name` (including abstract routes without an index child), or
    /// [`RouterError::MissingParam`] if a dynamic segment has no value.
    pub fn generate(&self, name: &str, params: &Params, query: &Query) -> Result<String> {
        let entry = self
            .by_name
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

        let mut path = entry.pattern.interpolate(name, params)?;
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query::serialize(query));
        }
        Ok(path)
    }

    /// Whether `name` resolves to a concrete matcher entry.
    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
