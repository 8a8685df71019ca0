//! Logic-graph engine - the main entry point for Pageflow.
//!
//! The engine owns the interpreter session and its single dispatcher
//! task. Hosts feed it pages and UI events and observe the results
//! through the injected state host, the effects boundary, and the
//! telemetry channel.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, PageflowError, Result,
    common::{MemCache, Queue, Shutdown},
    dispatcher::Dispatcher,
    graph::Graph,
    model::PageModel,
    runtime::{
        Channel, ConfirmationChoice, Effects, HttpEffects, MemoryStateHost, RuntimeCommand,
        Session, StateHost,
    },
};

/// Size of the runtime command queue.
const COMMAND_QUEUE_SIZE: usize = 1024;
/// Maximum number of compiled graphs to keep cached.
const GRAPH_CACHE_SIZE: usize = 256;

/// The logic-graph engine.
///
/// Engine is the central coordinator for Pageflow, responsible for:
/// - Managing the tokio runtime for async execution
/// - Serializing all interpretation onto one dispatcher task
/// - Caching compiled graphs across page loads
/// - Broadcasting telemetry on the event channel
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// engine.launch();
///
/// // Load a page and feed it events
/// let page = PageModel::from_json(json_str)?;
/// engine.load_page(page)?;
/// engine.dispatch("click", "button-1")?;
///
/// // Shutdown when done
/// engine.shutdown();
/// ```
pub struct Engine {
    /// Event channel for broadcasting interpreter telemetry.
    channel: Arc<Channel>,
    /// Shared interpreter session.
    session: Arc<Session>,
    /// Command stream consumed by the dispatcher task.
    commands: Arc<Queue<RuntimeCommand>>,
    /// Compiled-graph cache keyed by content fingerprint.
    graph_cache: Arc<MemCache<String, Arc<Graph>>>,

    /// Flag indicating if the engine is running.
    running: Arc<AtomicBool>,
    /// Tokio runtime for async task execution.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator for graceful termination.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        config: &Config,
        state: Arc<dyn StateHost>,
        effects: Arc<dyn Effects>,
    ) -> Self {
        let channel = Arc::new(Channel::new(runtime.clone()));
        let commands = Queue::new(COMMAND_QUEUE_SIZE);
        let session = Arc::new(Session::new(
            state,
            effects,
            commands.clone(),
            channel.clone(),
            Duration::from_millis(config.animate_safety_margin_ms),
        ));

        Self {
            channel,
            session,
            commands,
            graph_cache: Arc::new(MemCache::new(GRAPH_CACHE_SIZE)),
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Creates a new engine with the given configuration and default
    /// state/effects backends.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let runtime = Arc::new(
            Builder::new_multi_thread()
                .worker_threads(config.async_worker_thread_number.into())
                .enable_all()
                .build()
                .map_err(|e| PageflowError::Engine(e.to_string()))?,
        );
        let effects = Arc::new(HttpEffects::new(&config)?);
        Ok(Self::new(runtime, &config, Arc::new(MemoryStateHost::new()), effects))
    }

    /// Starts the engine: the telemetry channel begins listening and the
    /// dispatcher task starts consuming commands.
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }

        // Register handlers first, then start listening
        // This ensures no events are missed
        self.channel.listen();

        Arc::new(Dispatcher::new(
            self.session.clone(),
            self.commands.clone(),
            self.graph_cache.clone(),
            self.runtime.clone(),
            self.shutdown.clone(),
        ))
        .start();
    }

    /// Gracefully shuts down the engine.
    ///
    /// In-flight timers and listeners are invalidated through the
    /// generation counter before the dispatcher stops.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        self.session.bump_generation();
        let _ = self.commands.send(RuntimeCommand::Shutdown);
        self.shutdown.shutdown();
        self.channel.shutdown();
    }

    /// Loads a page: its logic graphs are compiled (or fetched from the
    /// compile cache), preview state is reinitialized, and every
    /// outstanding suspension from the previous page is invalidated.
    pub fn load_page(
        &self,
        page: PageModel,
    ) -> Result<()> {
        self.ensure_running()?;
        self.commands.send(RuntimeCommand::LoadPage(Box::new(page)))
    }

    /// Routes one external UI event originating from `origin`.
    pub fn dispatch(
        &self,
        event: &str,
        origin: &str,
    ) -> Result<()> {
        self.ensure_running()?;
        self.commands.send(RuntimeCommand::Dispatch {
            event: event.to_string(),
            origin: origin.to_string(),
        })
    }

    /// Resolves an open confirmation modal.
    pub fn resolve_confirmation(
        &self,
        node_id: &str,
        choice: ConfirmationChoice,
    ) -> Result<()> {
        self.ensure_running()?;
        self.commands.send(RuntimeCommand::ResolveConfirmation {
            node_id: node_id.to_string(),
            choice,
        })
    }

    /// Reinitializes the current page's preview state and drops every
    /// outstanding suspension. Variables survive a reset.
    pub fn reset(&self) -> Result<()> {
        self.ensure_running()?;
        self.commands.send(RuntimeCommand::Reset)
    }

    /// Returns a reference to the host's state accessors.
    pub fn state(&self) -> Arc<dyn StateHost> {
        self.session.state().clone()
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Dump a human-readable representation of every loaded graph.
    pub fn schema(&self) -> String {
        self.session
            .all_graphs()
            .iter()
            .map(|(owner, graph)| format!("owner: {}\n{}", owner, graph.schema()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn ensure_running(&self) -> Result<()> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(PageflowError::Engine("Engine is not running".to_string()));
        }
        Ok(())
    }
}
