// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in middleware.
//!
//! The default chain is `tracing → group-auto-resize → edge-routing`; user
//! middleware is appended after it and sees a fully laid-out draft.

use crate::config::RoutingConfig;
use crate::error::MiddlewareError;
use crate::grouping;
use crate::pipeline::{Middleware, Next, PipelineContext};
use crate::semaphore::Semaphore;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace};
use trellis_graph::geometry::routing::{polyline_path, route};
use trellis_graph::{Anchor, EdgeId, ModelState, Point, Routing, RoutingOptions, TemporaryEdge};

type HandleResult = Result<(), MiddlewareError>;

/// Logs every command as it passes through the chain
#[derive(Debug, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, HandleResult> {
        Box::pin(async move {
            let command = ctx.command.name();
            debug!(command, gesture = ?ctx.gesture, remaining = next.remaining(), "Dispatching");
            let result = next.run(&mut *ctx).await;
            match &result {
                Ok(()) => trace!(command, "Chain finished"),
                Err(e) => debug!(command, "Chain failed: {}", e),
            }
            result
        })
    }
}

/// Refits groups around their children after children move, resize,
/// rotate, join or leave
#[derive(Debug, Default)]
pub struct GroupAutoResizeMiddleware;

impl Middleware for GroupAutoResizeMiddleware {
    fn name(&self) -> &str {
        "group-auto-resize"
    }

    fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, HandleResult> {
        Box::pin(async move {
            let settings = &ctx.config.grouping;
            if settings.allow_group_auto_resize && ctx.command.records_history() {
                let groups = grouping::groups_to_resize(&ctx.prior, &ctx.draft);
                if !groups.is_empty() {
                    trace!(groups = groups.len(), "Refitting groups");
                    let padding = settings.group_padding;
                    grouping::fit_groups(&mut ctx.draft, &groups, padding);
                }
            }
            next.run(ctx).await
        })
    }
}

/// Recomputes points and path data of auto-routed edges and the link preview
#[derive(Debug, Default)]
pub struct EdgeRoutingMiddleware;

impl Middleware for EdgeRoutingMiddleware {
    fn name(&self) -> &str {
        "edge-routing"
    }

    fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, HandleResult> {
        Box::pin(async move {
            let routing = ctx.config.routing.clone();
            route_edges(&mut ctx.draft, &routing);
            next.run(ctx).await
        })
    }
}

/// Bring every edge's geometry and the link preview up to date
pub fn route_edges(state: &mut ModelState, config: &RoutingConfig) {
    let options = config.options();
    let mut updates: Vec<(EdgeId, Vec<Point>, String)> = Vec::new();

    for edge in state.edges() {
        if edge.is_auto_routed() {
            let routing = effective_routing(edge.routing, config);
            let Some((source, target)) = state.edge_anchors(edge) else {
                continue;
            };
            if let Some(routed) = route(routing, source, target, &options) {
                if routed.points != edge.points || routed.path != edge.path {
                    updates.push((edge.id.clone(), routed.points, routed.path));
                }
            }
        } else {
            let path = polyline_path(&edge.points);
            if path != edge.path {
                updates.push((edge.id.clone(), edge.points.clone(), path));
            }
        }
    }

    for (id, points, path) in updates {
        if let Some(edge) = state.edge_mut(&id) {
            edge.points = points;
            edge.path = path;
        }
    }

    if let Some(preview) = state.metadata.temporary_edge.clone() {
        let routed = route_preview(state, &preview, config, &options);
        if let (Some(edge), Some((points, path))) = (state.metadata.temporary_edge.as_mut(), routed) {
            edge.points = points;
            edge.path = path;
        }
    }
}

/// An auto-routed edge may not resolve to manual routing
fn effective_routing(routing: Option<Routing>, config: &RoutingConfig) -> Routing {
    match routing.unwrap_or(config.default_routing) {
        Routing::Manual => Routing::Straight,
        other => other,
    }
}

fn route_preview(
    state: &ModelState,
    preview: &TemporaryEdge,
    config: &RoutingConfig,
    options: &RoutingOptions,
) -> Option<(Vec<Point>, String)> {
    let source_node = state.node(&preview.source)?;
    let target_anchor = preview.target.as_ref().and_then(|id| {
        let node = state.node(id)?;
        preview.target_port.as_ref().and_then(|p| node.port_anchor(p))
    });
    let toward = target_anchor.map_or(preview.target_position, |a| a.point);
    let source = preview
        .source_port
        .as_ref()
        .and_then(|p| source_node.port_anchor(p))
        .unwrap_or_else(|| source_node.floating_anchor(toward));
    let target = target_anchor.unwrap_or_else(|| Anchor::new(preview.target_position, source.side.opposite()));
    let routed = route(effective_routing(None, config), source, target, options)?;
    Some((routed.points, routed.path))
}

/// Runs the wrapped middleware's body only while holding a permit of a
/// shared [`Semaphore`], bounding how many bodies run at once.
///
/// The permit covers the work done before `next.run`; it is released as the
/// rest of the chain is entered, so several `Bounded` links may share one
/// semaphore.
pub struct Bounded<M> {
    inner: M,
    semaphore: Arc<Semaphore>,
}

impl<M> Bounded<M> {
    /// Wrap `inner`, gating it with `semaphore`
    pub fn new(inner: M, semaphore: Arc<Semaphore>) -> Self {
        Self { inner, semaphore }
    }

    /// The shared semaphore
    pub fn semaphore(&self) -> &Arc<Semaphore> {
        &self.semaphore
    }
}

impl<M: Middleware> Middleware for Bounded<M> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, HandleResult> {
        Box::pin(async move {
            let permit = self.semaphore.permit().await;
            self.inner.handle(ctx, next.holding(permit)).await
        })
    }
}

impl<M> std::fmt::Debug for Bounded<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bounded")
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

/// The chain every engine starts with
pub fn default_chain() -> Vec<Arc<dyn Middleware>> {
    vec![
        Arc::new(TracingMiddleware),
        Arc::new(GroupAutoResizeMiddleware),
        Arc::new(EdgeRoutingMiddleware),
    ]
}
