//! Gateway application state.
//!
//! This module defines the shared state that is available to all request
//! handlers and the WebSocket loop.

use std::sync::Arc;

use quayside_routing::ChatRouter;
use quayside_store::Store;

use crate::config::GatewayConfig;
use crate::connections::ConnectionRegistry;

/// Shared application state for the gateway.
///
/// The routing engine owns all session mutation; the store handle is used
/// for the read-only REST surface only.
pub struct GatewayState<R, S>
where
    R: ChatRouter,
    S: Store,
{
    /// The routing engine for chat events.
    pub router: Arc<R>,
    /// Direct store access for read-only session queries.
    pub store: Arc<S>,
    /// Live connection registry, shared with the engine as its outbox.
    pub connections: Arc<ConnectionRegistry>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<R, S> GatewayState<R, S>
where
    R: ChatRouter,
    S: Store,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        router: Arc<R>,
        store: Arc<S>,
        connections: Arc<ConnectionRegistry>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            router,
            store,
            connections,
            config,
        }
    }
}

impl<R, S> Clone for GatewayState<R, S>
where
    R: ChatRouter,
    S: Store,
{
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            store: Arc::clone(&self.store),
            connections: Arc::clone(&self.connections),
            config: self.config.clone(),
        }
    }
}
