//! Graph sources and per-context overview state

use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

use dtview_core::{BoardInfo, BoardLookup, HardwareGraph};
use tracing::{debug, info};

use crate::assembler::Assembler;
use crate::error::OverviewError;
use crate::synth::SynthInput;
use crate::tree::OverviewTree;

/// Anything that can hand out a stable graph snapshot
pub trait GraphSource: Send + Sync {
    /// Block until a snapshot is stable, at most `timeout`
    fn wait_stable(&self, timeout: Duration) -> Result<Arc<HardwareGraph>, OverviewError>;
}

/// A fixed snapshot is always stable
impl GraphSource for Arc<HardwareGraph> {
    fn wait_stable(&self, _timeout: Duration) -> Result<Arc<HardwareGraph>, OverviewError> {
        Ok(Arc::clone(self))
    }
}

#[derive(Debug, Default)]
struct StoreState {
    graph: Option<Arc<HardwareGraph>>,
    updating: bool,
    generation: u64,
}

/// Snapshot slot shared between a graph producer and the overview host
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: Mutex<StoreState>,
    stable: Condvar,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the current snapshot as being replaced
    pub fn begin_update(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.updating = true;
    }

    /// Install a new snapshot and wake any waiters
    pub fn publish(&self, graph: HardwareGraph) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.graph = Some(Arc::new(graph));
        state.updating = false;
        state.generation += 1;
        debug!(generation = state.generation, "Published graph snapshot");
        self.stable.notify_all();
    }

    /// Number of snapshots published so far
    pub fn generation(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).generation
    }
}

impl GraphSource for SnapshotStore {
    fn wait_stable(&self, timeout: Duration) -> Result<Arc<HardwareGraph>, OverviewError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        loop {
            if !state.updating {
                if let Some(graph) = &state.graph {
                    return Ok(Arc::clone(graph));
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(OverviewError::Unstable(timeout));
            }
            state = self
                .stable
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }
}

/// One board build: a graph source plus the board it targets
pub struct OverviewContext {
    name: String,
    board_id: Option<String>,
    source: Arc<dyn GraphSource>,
    boards: Arc<dyn BoardLookup>,
    board: OnceLock<Option<BoardInfo>>,
    assembler: Arc<Assembler>,
}

impl OverviewContext {
    pub fn new(
        name: impl Into<String>,
        board_id: Option<String>,
        source: Arc<dyn GraphSource>,
        boards: Arc<dyn BoardLookup>,
    ) -> Self {
        Self {
            name: name.into(),
            board_id,
            source,
            boards,
            board: OnceLock::new(),
            assembler: Arc::new(Assembler::new()),
        }
    }

    pub fn with_assembler(mut self, assembler: Arc<Assembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn board_id(&self) -> Option<&str> {
        self.board_id.as_deref()
    }

    /// Board record, looked up on first use only
    pub fn board(&self) -> Option<&BoardInfo> {
        self.board
            .get_or_init(|| {
                let id = self.board_id.as_deref()?;
                let info = self.boards.lookup(id);
                if info.is_none() {
                    debug!(context = %self.name, board = id, "Board not in database");
                }
                info
            })
            .as_ref()
    }

    pub fn graph(&self, timeout: Duration) -> Result<Arc<HardwareGraph>, OverviewError> {
        self.source.wait_stable(timeout)
    }

    /// Synthesize and freeze the overview of the current snapshot
    pub fn overview(&self, timeout: Duration) -> Result<Option<(Arc<HardwareGraph>, OverviewTree)>, OverviewError> {
        let graph = self.source.wait_stable(timeout)?;
        let input = SynthInput::new(&graph).with_board(self.board());
        let Some(root) = self.assembler.assemble(&input) else {
            info!(context = %self.name, "No overview available");
            return Ok(None);
        };
        let tree = OverviewTree::from_root(root);
        debug!(context = %self.name, items = tree.len(), "Overview synthesized");
        Ok(Some((graph, tree)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtview_core::{BoardDatabase, GraphSnapshot};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn graph(json: &str) -> HardwareGraph {
        GraphSnapshot::from_json(json).unwrap().link().unwrap()
    }

    const GPIO: &str = r#"{ "root": { "name": "/", "children": [
        { "name": "gpio@0", "labels": ["gpio0"], "properties": [{ "name": "gpio-controller" }] }
    ] } }"#;

    struct CountingLookup {
        calls: AtomicUsize,
    }

    impl BoardLookup for CountingLookup {
        fn lookup(&self, board: &str) -> Option<BoardInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(BoardInfo {
                id: board.to_string(),
                name: Some("Counted".to_string()),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_store_times_out_without_snapshot() {
        let store = SnapshotStore::new();
        let err = store.wait_stable(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, OverviewError::Unstable(_)));
    }

    #[test]
    fn test_store_waits_for_publish() {
        let store = Arc::new(SnapshotStore::new());
        store.begin_update();

        let producer = Arc::clone(&store);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.publish(graph(GPIO));
        });

        let snapshot = store.wait_stable(Duration::from_secs(5)).unwrap();
        assert!(snapshot.find("/gpio@0").is_some());
        assert_eq!(store.generation(), 1);
        handle.join().unwrap();
    }

    #[test]
    fn test_store_hides_snapshot_while_updating() {
        let store = SnapshotStore::new();
        store.publish(graph(GPIO));
        store.begin_update();
        assert!(store.wait_stable(Duration::from_millis(10)).is_err());
        store.publish(graph(GPIO));
        assert!(store.wait_stable(Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_board_resolved_once() {
        let lookup = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let source: Arc<dyn GraphSource> = Arc::new(Arc::new(graph(GPIO)));
        let context = OverviewContext::new("app", Some("demo".to_string()), source, lookup.clone());

        for _ in 0..3 {
            let (_, tree) = context.overview(Duration::from_secs(1)).unwrap().unwrap();
            let top = tree.children(tree.root());
            assert_eq!(tree.name(top[0]), Some("Board"));
        }
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_overview_for_empty_graph() {
        let source: Arc<dyn GraphSource> = Arc::new(Arc::new(graph(r#"{ "root": { "name": "/" } }"#)));
        let boards: Arc<dyn BoardLookup> = Arc::new(BoardDatabase::empty());
        let context = OverviewContext::new("empty", None, source, boards);
        assert!(context.board().is_none());
        assert!(context.overview(Duration::from_secs(1)).unwrap().is_none());
    }
}
