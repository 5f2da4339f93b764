use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use harvest_logging::{clear_run_id, harvest_error, harvest_info, set_run_id};

use crate::client::PageClientFactory;
use crate::gate::PauseGate;
use crate::harvest::HarvestController;
use crate::render::{render_document, RenderError};
use crate::settings::EngineConfig;
use crate::sink::{ChannelProgressSink, ProgressSink};
use crate::store::StoryStore;
use crate::{EngineEvent, HarvestError, RunId};

/// Front-end facing handle. Runs harvests on a background thread and
/// reports back through [`EngineHandle::try_recv`].
///
/// At most one harvest is active at a time; the store and pause gate are
/// shared with that run.
pub struct EngineHandle {
    config: EngineConfig,
    factory: Arc<dyn PageClientFactory>,
    gate: PauseGate,
    store: StoryStore,
    active: Arc<AtomicBool>,
    next_run_id: AtomicU64,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let factory = config.backend.factory();
        Self::with_factory(config, factory)
    }

    /// Uses `factory` instead of the one described by `config.backend`.
    pub fn with_factory(config: EngineConfig, factory: Arc<dyn PageClientFactory>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            config,
            factory,
            gate: PauseGate::new(),
            store: StoryStore::new(),
            active: Arc::new(AtomicBool::new(false)),
            next_run_id: AtomicU64::new(1),
            event_tx,
            event_rx,
        }
    }

    /// Starts a harvest on a dedicated thread and returns its run id, or
    /// `None` (with a [`EngineEvent::StartRejected`]) if one is already running.
    pub fn start_harvest(
        &self,
        metadata_url: impl Into<String>,
        first_chapter_url: impl Into<String>,
    ) -> Option<RunId> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            harvest_info!("Start requested while a harvest is running");
            let _ = self.event_tx.send(EngineEvent::StartRejected);
            return None;
        }

        // A pause that arrived after the previous run's cleanup must not
        // carry over; later pauses for this run still reach the gate.
        self.gate.set_paused(false);
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let metadata_url = metadata_url.into();
        let first_chapter_url = first_chapter_url.into();
        let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(self.event_tx.clone()));
        let controller = HarvestController::new(
            self.factory.clone(),
            self.config.harvest.clone(),
            self.gate.clone(),
            self.store.clone(),
            sink,
        );
        let active = self.active.clone();
        let event_tx = self.event_tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("harvest-{run_id}"))
            .spawn(move || {
                set_run_id(run_id);
                let result = run_blocking(&controller, &metadata_url, &first_chapter_url);
                clear_run_id();
                active.store(false, Ordering::Release);
                let _ = event_tx.send(EngineEvent::HarvestFinished { run_id, result });
            });

        if let Err(err) = spawned {
            harvest_error!("Could not spawn harvest thread: {}", err);
            self.active.store(false, Ordering::Release);
            let _ = self.event_tx.send(EngineEvent::HarvestFinished {
                run_id,
                result: Err(HarvestError::Runtime(err)),
            });
            return None;
        }
        Some(run_id)
    }

    /// Closes or opens the pause gate. Only the next loop iteration of an
    /// active harvest observes it.
    pub fn set_paused(&self, paused: bool) {
        self.gate.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Renders a snapshot of the store into `output_dir` on the calling
    /// thread. Safe to call while a harvest is still appending.
    pub fn render(&self, output_dir: &Path) -> Result<PathBuf, RenderError> {
        let entries = self.store.snapshot();
        render_document(&entries, output_dir, self.config.output_layout)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn store(&self) -> &StoryStore {
        &self.store
    }

    pub fn gate(&self) -> &PauseGate {
        &self.gate
    }
}

fn run_blocking(
    controller: &HarvestController,
    metadata_url: &str,
    first_chapter_url: &str,
) -> Result<crate::HarvestReport, HarvestError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err: io::Error| {
            harvest_error!("Could not build harvest runtime: {}", err);
            HarvestError::Runtime(err)
        })?;
    runtime.block_on(controller.run(metadata_url, first_chapter_url))
}
