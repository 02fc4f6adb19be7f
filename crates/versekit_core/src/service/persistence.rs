//! Background persistence for Bible documents.
//!
//! # Responsibility
//! - Define the `BibleStore` seam used by the editor for save/save-as.
//! - Run store calls on a dedicated worker thread so the editing thread
//!   never blocks on I/O.
//!
//! # Invariants
//! - Every submitted job yields exactly one completion, in submission order.
//! - The worker owns only snapshots; it never sees the live document.

use crate::db::open_db;
use crate::model::bible::Bible;
use crate::repo::bible_repo::{
    BibleRepository, BibleSummary, SqliteBibleRepository, StoreError, StoreResult,
};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use uuid::Uuid;

/// Persistence seam for whole documents.
pub trait BibleStore: Send + Sync + 'static {
    /// Stores `bible` under its document id, replacing any previous version.
    fn save(&self, bible: Bible) -> StoreResult<Bible>;
    /// Stores `bible` as a new document. Fails when the id is taken.
    fn create_copy(&self, bible: Bible) -> StoreResult<Bible>;
    fn load(&self, id: Uuid) -> StoreResult<Bible>;
    fn list(&self) -> StoreResult<Vec<BibleSummary>>;
}

/// SQLite-backed store opening one connection per call.
#[derive(Debug, Clone)]
pub struct SqliteBibleStore {
    path: PathBuf,
}

impl SqliteBibleStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&SqliteBibleRepository<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let conn = open_db(&self.path)?;
        let repo = SqliteBibleRepository::try_new(&conn)?;
        f(&repo)
    }
}

impl BibleStore for SqliteBibleStore {
    fn save(&self, bible: Bible) -> StoreResult<Bible> {
        self.with_repo(|repo| repo.save_bible(&bible))?;
        Ok(bible)
    }

    fn create_copy(&self, bible: Bible) -> StoreResult<Bible> {
        self.with_repo(|repo| repo.create_bible(&bible))?;
        Ok(bible)
    }

    fn load(&self, id: Uuid) -> StoreResult<Bible> {
        self.with_repo(|repo| repo.load_bible(id))?
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> StoreResult<Vec<BibleSummary>> {
        self.with_repo(|repo| repo.list_bibles())
    }
}

/// Kind of background persistence request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceKind {
    Save,
    CreateCopy,
}

impl PersistenceKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::CreateCopy => "create_copy",
        }
    }
}

/// Opaque identifier for an in-flight persistence request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersistenceTicket(u64);

/// Outcome of one persistence request.
#[derive(Debug)]
pub struct PersistenceCompletion {
    pub ticket: PersistenceTicket,
    pub kind: PersistenceKind,
    pub result: StoreResult<Bible>,
}

struct PersistenceJob {
    ticket: PersistenceTicket,
    kind: PersistenceKind,
    bible: Bible,
}

/// Single background thread executing store calls in order.
pub struct PersistenceWorker {
    jobs: Option<Sender<PersistenceJob>>,
    completions: Receiver<PersistenceCompletion>,
    handle: Option<JoinHandle<()>>,
    next_ticket: u64,
}

impl PersistenceWorker {
    /// Spawns the worker thread.
    pub fn start(store: Arc<dyn BibleStore>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<PersistenceJob>();
        let (done_tx, done_rx) = mpsc::channel::<PersistenceCompletion>();
        let handle = thread::Builder::new()
            .name("versekit-persistence".into())
            .spawn(move || persistence_loop(store.as_ref(), job_rx, done_tx))?;

        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            handle: Some(handle),
            next_ticket: 0,
        })
    }

    /// Queues a snapshot for persistence.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` when the worker thread has exited.
    pub fn submit(&mut self, kind: PersistenceKind, bible: Bible) -> StoreResult<PersistenceTicket> {
        let ticket = PersistenceTicket(self.next_ticket);
        self.next_ticket += 1;
        let sender = self
            .jobs
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("persistence worker stopped".to_string()))?;
        sender
            .send(PersistenceJob {
                ticket,
                kind,
                bible,
            })
            .map_err(|_| StoreError::Unavailable("persistence worker exited".to_string()))?;
        Ok(ticket)
    }

    /// Returns the next finished request without blocking.
    pub fn try_completion(&self) -> Option<PersistenceCompletion> {
        self.completions.try_recv().ok()
    }

    /// Blocks until the next request finishes.
    ///
    /// Returns `None` when the worker has exited.
    pub fn wait_completion(&self) -> Option<PersistenceCompletion> {
        self.completions.recv().ok()
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the loop after queued jobs finish.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=persistence_stop module=persistence status=error error=worker_panicked");
            }
        }
    }
}

fn persistence_loop(
    store: &dyn BibleStore,
    jobs: Receiver<PersistenceJob>,
    completions: Sender<PersistenceCompletion>,
) {
    debug!("event=persistence_start module=persistence status=ok");
    while let Ok(job) = jobs.recv() {
        let started_at = Instant::now();
        let document_id = job.bible.meta.document_id;
        let result = match job.kind {
            PersistenceKind::Save => store.save(job.bible),
            PersistenceKind::CreateCopy => store.create_copy(job.bible),
        };
        match &result {
            Ok(_) => info!(
                "event=persist module=persistence status=ok kind={} document_id={} duration_ms={}",
                job.kind.as_str(),
                document_id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=persist module=persistence status=error kind={} document_id={} duration_ms={} error={}",
                job.kind.as_str(),
                document_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        let completion = PersistenceCompletion {
            ticket: job.ticket,
            kind: job.kind,
            result,
        };
        if completions.send(completion).is_err() {
            break;
        }
    }
    debug!("event=persistence_stop module=persistence status=ok");
}
