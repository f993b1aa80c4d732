//! Prefix tree over `/`-delimited path segments.
//!
//! # Responsibilities
//! - Store handlers per (route template, method)
//! - Resolve a concrete path to a handler plus captured parameters
//!
//! # Design Decisions
//! - Empty segments (leading or trailing slash) map to a root marker
//! - At most one wildcard child per node; it remembers its parameter name
//! - A differently named parameter at an existing wildcard is a conflict
//! - Lookup prefers the literal child, falls back to the wildcard, and never
//!   backtracks: O(segment count)

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::http::method::Method;
use crate::routing::error::RegistrationError;
use crate::routing::handler::HandlerRef;

/// Literal child key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum SegmentKey {
    Root,
    Literal(String),
}

impl SegmentKey {
    fn for_segment(segment: &str) -> Self {
        if segment.is_empty() {
            SegmentKey::Root
        } else {
            SegmentKey::Literal(segment.to_string())
        }
    }
}

/// One parsed segment of a route template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSegment<'a> {
    Root,
    Literal(&'a str),
    Param(&'a str),
}

/// Split a route template into segments, validating `{name}` parameters.
pub fn parse_template(template: &str) -> Result<Vec<TemplateSegment<'_>>, RegistrationError> {
    let invalid = |reason: &str| RegistrationError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    template
        .split('/')
        .map(|segment| {
            if segment.is_empty() {
                Ok(TemplateSegment::Root)
            } else if let Some(rest) = segment.strip_prefix('{') {
                let name = rest
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("parameter segment must end with `}`"))?;
                if name.is_empty() {
                    return Err(invalid("parameter name must not be empty"));
                }
                if name.contains(['{', '}']) {
                    return Err(invalid("nested braces in parameter name"));
                }
                Ok(TemplateSegment::Param(name))
            } else {
                Ok(TemplateSegment::Literal(segment))
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct Wildcard {
    name: String,
    node: RouteTrieNode,
}

/// A node of the route trie.
#[derive(Debug, Default)]
pub struct RouteTrieNode {
    children: HashMap<SegmentKey, RouteTrieNode>,
    wildcard: Option<Box<Wildcard>>,
    is_terminal: bool,
    handlers: HashMap<Method, HandlerRef>,
}

impl RouteTrieNode {
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().copied().collect();
        methods.sort();
        methods
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub handler: HandlerRef,
    /// Parameter name → captured segment, never coerced.
    pub params: HashMap<String, String>,
}

/// Route table built at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct RouteTrie {
    root: RouteTrieNode,
    routes: usize,
}

impl RouteTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `(template, method)`.
    ///
    /// Returns the handler previously registered for the same pair, which is
    /// replaced. Fails without modifying the trie if the template is invalid or
    /// names a wildcard position differently from an earlier registration.
    pub fn insert(
        &mut self,
        template: &str,
        method: Method,
        handler: HandlerRef,
    ) -> Result<Option<HandlerRef>, RegistrationError> {
        let segments = parse_template(template)?;
        self.check_wildcard_names(template, &segments)?;

        let mut node = &mut self.root;
        for segment in &segments {
            node = match *segment {
                TemplateSegment::Root => node.children.entry(SegmentKey::Root).or_default(),
                TemplateSegment::Literal(lit) => node
                    .children
                    .entry(SegmentKey::Literal(lit.to_string()))
                    .or_default(),
                TemplateSegment::Param(name) => {
                    &mut node
                        .wildcard
                        .get_or_insert_with(|| {
                            Box::new(Wildcard {
                                name: name.to_string(),
                                node: RouteTrieNode::default(),
                            })
                        })
                        .node
                }
            };
        }

        node.is_terminal = true;
        let previous = node.handlers.insert(method, handler);
        if previous.is_none() {
            self.routes += 1;
        }
        Ok(previous)
    }

    /// Walk the existing nodes and reject a parameter whose name differs from
    /// the one stored at that wildcard position.
    fn check_wildcard_names(
        &self,
        template: &str,
        segments: &[TemplateSegment<'_>],
    ) -> Result<(), RegistrationError> {
        let mut node = &self.root;
        for segment in segments {
            let next = match *segment {
                TemplateSegment::Root => node.children.get(&SegmentKey::Root),
                TemplateSegment::Literal(lit) => {
                    node.children.get(&SegmentKey::Literal(lit.to_string()))
                }
                TemplateSegment::Param(name) => match node.wildcard.as_deref() {
                    Some(w) if w.name != name => {
                        return Err(RegistrationError::WildcardConflict {
                            template: template.to_string(),
                            existing: w.name.clone(),
                            requested: name.to_string(),
                        });
                    }
                    Some(w) => Some(&w.node),
                    None => None,
                },
            };
            match next {
                Some(n) => node = n,
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Resolve `path` for `method`.
    pub fn search(&self, path: &str, method: Method) -> Option<RouteMatch> {
        let mut node = &self.root;
        let mut params = HashMap::new();

        for segment in path.split('/') {
            if let Some(child) = node.children.get(&SegmentKey::for_segment(segment)) {
                node = child;
                continue;
            }
            match node.wildcard.as_deref() {
                Some(w) if !segment.is_empty() => {
                    params.insert(w.name.clone(), segment.to_string());
                    node = &w.node;
                }
                _ => return None,
            }
        }

        if !node.is_terminal {
            return None;
        }
        node.handlers.get(&method).map(|handler| RouteMatch {
            handler: handler.clone(),
            params,
        })
    }

    /// Number of registered (template, method) pairs.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Indented tree listing, children sorted, wildcards last.
    pub fn render(&self) -> String {
        fn walk(node: &RouteTrieNode, depth: usize, out: &mut String) {
            let mut keys: Vec<&SegmentKey> = node.children.keys().collect();
            keys.sort();
            let entries = keys
                .into_iter()
                .map(|k| {
                    let label = match k {
                        SegmentKey::Root => "/".to_string(),
                        SegmentKey::Literal(s) => s.clone(),
                    };
                    (label, &node.children[k])
                })
                .chain(
                    node.wildcard
                        .as_deref()
                        .map(|w| (format!("{{{}}}", w.name), &w.node)),
                );

            for (label, child) in entries {
                let _ = write!(out, "{}|__ {}", "    ".repeat(depth), label);
                if child.is_terminal {
                    let methods: Vec<&str> = child.methods().iter().map(Method::as_str).collect();
                    let _ = write!(out, " [{}]", methods.join(", "));
                }
                out.push('\n');
                walk(child, depth + 1, out);
            }
        }

        let mut out = String::new();
        walk(&self.root, 0, &mut out);
        out
    }
}
