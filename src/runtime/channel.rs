//! Telemetry channel: broadcast pub/sub for interpreter events and
//! structured debug logs, with glob-filtered subscriptions per owner
//! and node id.

use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use tokio::runtime::Runtime;

use crate::{
    ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{Event, Log, Message},
};

const EVENT_QUEUE_SIZE: usize = 2048;
const LOG_QUEUE_SIZE: usize = 4096;

pub type TelemetryHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;
pub type TelemetryLogHandle = Arc<dyn Fn(&Event<Log>) + Send + Sync>;
pub type TelemetryHandleAsync = Arc<dyn Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync>;
pub type TelemetryLogHandleAsync = Arc<dyn Fn(&Event<Log>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Subscription scope for a [`ChannelEvent`].
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// glob pattern matched against the logic-owner id, e.g. `item-*`
    pub owner: String,

    /// glob pattern matched against the node id
    pub nid: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            owner: "*".to_string(),
            nid: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn new(
        owner: String,
        nid: String,
    ) -> Self {
        Self {
            owner,
            nid,
        }
    }

    pub fn with_owner(owner: String) -> Self {
        Self {
            owner,
            ..Default::default()
        }
    }

    pub fn with_nid(nid: String) -> Self {
        Self {
            nid,
            ..Default::default()
        }
    }
}

/// Compiled owner/node glob pair shared by every handler of one
/// subscription.
#[derive(Clone)]
struct ScopeFilter {
    owner: globset::GlobMatcher,
    nid: globset::GlobMatcher,
}

impl ScopeFilter {
    fn new(options: &ChannelOptions) -> Self {
        Self {
            owner: globset::Glob::new(&options.owner).unwrap().compile_matcher(),
            nid: globset::Glob::new(&options.nid).unwrap().compile_matcher(),
        }
    }

    fn matches(
        &self,
        owner: &str,
        nid: &str,
    ) -> bool {
        self.owner.is_match(owner) && self.nid.is_match(nid)
    }
}

/// Run every registered sync handler against one event.
fn fan_out<T, H>(
    handles: &ShareLock<Vec<Arc<H>>>,
    event: &Event<T>,
) where
    T: std::fmt::Debug + Clone,
    H: Fn(&Event<T>) + Send + Sync + ?Sized,
{
    let handlers = handles.read().unwrap();
    for handle in handlers.iter() {
        (handle)(event);
    }
}

/// Run every registered async handler against one event on its own task,
/// so a slow subscriber never stalls the channel loop.
fn fan_out_async<T, H>(
    handles: &ShareLock<Vec<Arc<H>>>,
    event: Event<T>,
) where
    T: std::fmt::Debug + Clone + Send + Sync + 'static,
    H: Fn(&Event<T>) -> BoxFuture<'static, ()> + Send + Sync + ?Sized + 'static,
{
    let handles = handles.clone();
    tokio::spawn(async move {
        let handlers = handles.read().unwrap().clone();
        for handle in handlers.iter() {
            (handle)(&event).await;
        }
    });
}

#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    log_queue: Arc<BroadcastQueue<Event<Log>>>,

    events: ShareLock<Vec<TelemetryHandle>>,
    logs: ShareLock<Vec<TelemetryLogHandle>>,
    events_async: ShareLock<Vec<TelemetryHandleAsync>>,
    logs_async: ShareLock<Vec<TelemetryLogHandleAsync>>,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Channel {
    pub(crate) fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            log_queue: BroadcastQueue::new(LOG_QUEUE_SIZE),
            events: Arc::new(RwLock::new(Vec::new())),
            logs: Arc::new(RwLock::new(Vec::new())),
            events_async: Arc::new(RwLock::new(Vec::new())),
            logs_async: Arc::new(RwLock::new(Vec::new())),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub(crate) fn event_queue(&self) -> Arc<BroadcastQueue<Event<Message>>> {
        self.event_queue.clone()
    }

    pub(crate) fn log_queue(&self) -> Arc<BroadcastQueue<Event<Log>>> {
        self.log_queue.clone()
    }

    /// Spawn the fan-out loop bridging the broadcast queues to the
    /// registered handlers.
    pub(crate) fn listen(&self) {
        let mut event_queue = self.event_queue.subscribe();
        let mut log_queue = self.log_queue.subscribe();
        let events = self.events.clone();
        let logs = self.logs.clone();
        let events_async = self.events_async.clone();
        let logs_async = self.logs_async.clone();

        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Ok(event) = event_queue.recv() => {
                        fan_out(&events, &event);
                        fan_out_async(&events_async, event);
                    }
                    Ok(log) = log_queue.recv() => {
                        fan_out(&logs, &log);
                        fan_out_async(&logs_async, log);
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }
}

/// Glob-filtered subscription handle on a [`Channel`].
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,
    filter: ScopeFilter,
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Self {
        Self {
            channel,
            filter: ScopeFilter::new(&options),
        }
    }

    /// Every telemetry event within this subscription's scope.
    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let filter = self.filter.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if filter.matches(&e.owner, &e.nid) {
                f(e);
            }
        }));
    }

    /// Only executor-failure events.
    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let filter = self.filter.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if e.event.is_error() && filter.matches(&e.owner, &e.nid) {
                f(e);
            }
        }));
    }

    /// Entries on the structured debug-log stream.
    pub fn on_log(
        &self,
        f: impl Fn(&Event<Log>) + Send + Sync + 'static,
    ) {
        let filter = self.filter.clone();

        self.channel.logs.write().unwrap().push(Arc::new(move |e| {
            if filter.matches(&e.owner, &e.nid) {
                f(e);
            }
        }));
    }

    pub fn on_event_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let filter = self.filter.clone();

        self.channel.events_async.write().unwrap().push(Arc::new(move |e| {
            if filter.matches(&e.owner, &e.nid) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }

    pub fn on_log_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<Log>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let filter = self.filter.clone();

        self.channel.logs_async.write().unwrap().push(Arc::new(move |e| {
            if filter.matches(&e.owner, &e.nid) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }
}
