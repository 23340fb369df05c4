//! Shared Axum application state.
//!
//! A small, cheaply cloneable bundle of handles handlers pull from, rather
//! than a god-object service.

use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::pipeline::QueuedAccess;
use crate::queue;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub queue: queue::Sender<QueuedAccess>,
    pub store: Arc<dyn Store>,
    pub broadcaster: Broadcaster,
}
