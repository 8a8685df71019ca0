//! # Pageflow
//!
//! Pageflow is a lightweight logic-graph execution engine for interactive
//! content. It interprets event → condition → action node graphs authored
//! against a page of placed items, driving item visibility, animation,
//! variables, page transitions, and network calls.
//!
//! ## Core Features
//!
//! - **Single-task interpretation**: all traversal and state mutation are
//!   serialized onto one dispatcher task, so observers never see torn state
//! - **Suspension protocol**: timers, animations, click-waits,
//!   confirmations, and network calls park their branch and re-enter the
//!   dispatcher when they complete
//! - **Injectable boundaries**: hosts supply the state storage and the
//!   effect functions; the engine never owns presentation or persistence
//! - **Telemetry channel**: glob-filtered pub/sub over every traversal step
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pageflow::{EngineBuilder, PageModel};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.launch();
//!
//! let page = PageModel::from_json(json_str)?;
//! engine.load_page(page)?;
//! engine.dispatch("click", "button-1")?;
//!
//! engine.shutdown();
//! ```

mod builder;
mod common;
mod config;
mod dispatcher;
mod engine;
mod error;
mod events;
mod graph;
mod model;
mod runtime;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use common::Vars;
pub use config::Config;
pub use engine::Engine;
pub use error::PageflowError;
pub use events::{Event, Log, Message, TelemetryEvent};
pub use graph::{
    Graph,
    node::{EventSpec, NodeKind, TargetRef},
};
pub use model::*;
pub use runtime::{
    Channel, ChannelEvent, ChannelOptions, ConfirmationChoice, ConfirmationModal, Effects,
    FetchOptions, HttpEffects, ItemState, MemoryStateHost, PreviewState, StateHost,
};

/// Result type alias for Pageflow operations.
pub type Result<T> = std::result::Result<T, PageflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
