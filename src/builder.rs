use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, Engine, PageflowError, Result,
    runtime::{Effects, HttpEffects, MemoryStateHost, StateHost},
};

/// Builder for an [`Engine`] with injectable state and effects backends.
pub struct EngineBuilder {
    async_worker_thread_number: u16,
    rt: Option<Arc<Runtime>>,
    config: Option<Config>,
    state: Option<Arc<dyn StateHost>>,
    effects: Option<Arc<dyn Effects>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            async_worker_thread_number: 4,
            rt: None,
            config: None,
            state: None,
            effects: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.async_worker_thread_number = n;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = Some(config);
        self
    }

    /// Host-supplied state accessors; defaults to an in-memory host.
    pub fn state(
        mut self,
        state: Arc<dyn StateHost>,
    ) -> Self {
        self.state = Some(state);
        self
    }

    /// Host-supplied effect functions; defaults to the reqwest-backed
    /// implementation.
    pub fn effects(
        mut self,
        effects: Arc<dyn Effects>,
    ) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        let mut config = self.config.clone().unwrap_or_default();
        if self.config.is_none() {
            config.async_worker_thread_number = self.async_worker_thread_number;
        }

        let runtime = match &self.rt {
            Some(rt) => rt.clone(),
            None => Arc::new(
                Builder::new_multi_thread()
                    .worker_threads(config.async_worker_thread_number.into())
                    .enable_all()
                    .build()
                    .map_err(|e| PageflowError::Engine(e.to_string()))?,
            ),
        };

        let state: Arc<dyn StateHost> = match &self.state {
            Some(state) => state.clone(),
            None => Arc::new(MemoryStateHost::new()),
        };
        let effects: Arc<dyn Effects> = match &self.effects {
            Some(effects) => effects.clone(),
            None => Arc::new(HttpEffects::new(&config)?),
        };

        Ok(Engine::new(runtime, &config, state, effects))
    }
}
