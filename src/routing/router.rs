//! Route table: URL pattern → handler.
//!
//! # Responsibilities
//! - Store registered handlers by pattern
//! - Reject duplicate or unroutable registrations at setup time
//! - Expand patterns into the HTTP router's path syntax
//!
//! # Design Decisions
//! - Mutated only during setup, read-only once the server starts
//! - A pattern ending in `/` also serves the subtree below it
//! - Patterns are literal: router placeholder syntax (`{id}`, `{*rest}`,
//!   `:id`, `*rest`) is rejected, so two distinct patterns never expand to
//!   overlapping router paths
//! - Registration mistakes panic immediately instead of failing per request

use std::collections::HashMap;
use std::sync::Arc;

use crate::webhook::Handler;

/// A registered route.
#[derive(Clone)]
pub struct Route {
    pattern: String,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    /// Router paths this pattern serves.
    pub fn paths(&self) -> Vec<String> {
        if self.pattern.ends_with('/') {
            vec![self.pattern.clone(), format!("{}{{*rest}}", self.pattern)]
        } else {
            vec![self.pattern.clone()]
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("pattern", &self.pattern).finish()
    }
}

/// Handlers in registration order.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `pattern`.
    ///
    /// # Panics
    /// If the pattern is already registered, does not start with `/`, or
    /// uses path placeholder syntax.
    pub fn register(&mut self, pattern: impl Into<String>, handler: Arc<dyn Handler>) {
        let pattern = pattern.into();
        assert!(
            pattern.starts_with('/'),
            "route pattern {:?} must start with '/'",
            pattern
        );
        assert!(
            !pattern.contains(['{', '}']),
            "route pattern {:?} must not contain path placeholders",
            pattern
        );
        assert!(
            !pattern.split('/').any(|segment| segment.starts_with([':', '*'])),
            "route pattern {:?} must not contain path placeholders",
            pattern
        );
        assert!(
            !self.index.contains_key(&pattern),
            "handler already registered for pattern {:?}",
            pattern
        );

        tracing::debug!(pattern = %pattern, "Handler registered");
        self.index.insert(pattern.clone(), self.routes.len());
        self.routes.push(Route { pattern, handler });
    }

    pub fn get(&self, pattern: &str) -> Option<&Route> {
        self.index.get(pattern).map(|&i| &self.routes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::{HandlerResult, WebhookRequest, WebhookResponse};

    fn noop(_res: &mut WebhookResponse, _req: &WebhookRequest) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn registers_in_order() {
        let mut table = RouteTable::new();
        table.register("/confirm", Arc::new(noop));
        table.register("/hello", Arc::new(noop));

        let patterns: Vec<&str> = table.iter().map(Route::pattern).collect();
        assert_eq!(patterns, vec!["/confirm", "/hello"]);
        assert!(table.get("/hello").is_some());
        assert!(table.get("/missing").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_pattern_panics() {
        let mut table = RouteTable::new();
        table.register("/confirm", Arc::new(noop));
        table.register("/confirm", Arc::new(noop));
    }

    #[test]
    #[should_panic(expected = "must start with '/'")]
    fn relative_pattern_panics() {
        RouteTable::new().register("confirm", Arc::new(noop));
    }

    #[test]
    #[should_panic(expected = "must not contain path placeholders")]
    fn catch_all_overlapping_subtree_panics() {
        let mut table = RouteTable::new();
        table.register("/", Arc::new(noop));
        table.register("/{*rest}", Arc::new(noop));
    }

    #[test]
    #[should_panic(expected = "must not contain path placeholders")]
    fn colon_segment_panics() {
        RouteTable::new().register("/users/:id", Arc::new(noop));
    }

    #[test]
    #[should_panic(expected = "must not contain path placeholders")]
    fn star_segment_panics() {
        RouteTable::new().register("/files/*path", Arc::new(noop));
    }

    #[test]
    #[should_panic(expected = "must not contain path placeholders")]
    fn stray_brace_panics() {
        RouteTable::new().register("/cx/}", Arc::new(noop));
    }

    #[test]
    fn colon_inside_segment_is_literal() {
        let mut table = RouteTable::new();
        table.register("/v1/agents:fulfill", Arc::new(noop));
        assert_eq!(table.get("/v1/agents:fulfill").unwrap().paths(), vec!["/v1/agents:fulfill"]);
    }

    #[test]
    fn trailing_slash_serves_subtree() {
        let mut table = RouteTable::new();
        table.register("/", Arc::new(noop));
        table.register("/cx/", Arc::new(noop));
        table.register("/exact", Arc::new(noop));

        assert_eq!(table.get("/").unwrap().paths(), vec!["/", "/{*rest}"]);
        assert_eq!(table.get("/cx/").unwrap().paths(), vec!["/cx/", "/cx/{*rest}"]);
        assert_eq!(table.get("/exact").unwrap().paths(), vec!["/exact"]);
    }
}
