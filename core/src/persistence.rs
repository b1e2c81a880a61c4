use crate::snapshot::{ProgressRecord, ProgressSnapshot};

pub const DEBOUNCE_MS_DEFAULT: u64 = 750;
pub const CHECKPOINT_MS_DEFAULT: u64 = 10_000;

type SnapshotFn<'a> = Box<dyn FnMut() -> Option<ProgressSnapshot> + 'a>;
type SaveFn<'a> = Box<dyn FnMut(&ProgressRecord) -> Result<(), String> + 'a>;
type ErrorFn<'a> = Box<dyn FnMut(&str) + 'a>;

/// Debounced progress writer. Change notifications arm a debounce timer;
/// a periodic checkpoint catches anything the debounce missed. All timing
/// is driven by caller-supplied millisecond timestamps through [`tick`],
/// so the driver is deterministic under test.
///
/// [`tick`]: ProgressPersistence::tick
pub struct ProgressPersistence<'a> {
    puzzle_id: String,
    get_snapshot: SnapshotFn<'a>,
    save: SaveFn<'a>,
    on_error: ErrorFn<'a>,
    debounce_ms: u64,
    checkpoint_ms: u64,
    change_token: u64,
    last_saved_token: u64,
    saving: bool,
    pending: bool,
    debounce_deadline: Option<u64>,
    next_checkpoint: u64,
    disposed: bool,
}

impl<'a> ProgressPersistence<'a> {
    pub fn new(
        puzzle_id: impl Into<String>,
        now_ms: u64,
        get_snapshot: impl FnMut() -> Option<ProgressSnapshot> + 'a,
        save: impl FnMut(&ProgressRecord) -> Result<(), String> + 'a,
    ) -> Self {
        Self {
            puzzle_id: puzzle_id.into(),
            get_snapshot: Box::new(get_snapshot),
            save: Box::new(save),
            on_error: Box::new(|_| {}),
            debounce_ms: DEBOUNCE_MS_DEFAULT,
            checkpoint_ms: CHECKPOINT_MS_DEFAULT,
            change_token: 0,
            last_saved_token: 0,
            saving: false,
            pending: false,
            debounce_deadline: None,
            next_checkpoint: now_ms + CHECKPOINT_MS_DEFAULT,
            disposed: false,
        }
    }

    pub fn with_timing(mut self, now_ms: u64, debounce_ms: u64, checkpoint_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self.checkpoint_ms = checkpoint_ms;
        self.next_checkpoint = now_ms + checkpoint_ms;
        self
    }

    pub fn with_error_handler(mut self, on_error: impl FnMut(&str) + 'a) -> Self {
        self.on_error = Box::new(on_error);
        self
    }

    /// Marks the state dirty and (re)arms the debounce timer.
    pub fn notify_change(&mut self, now_ms: u64) {
        if self.disposed {
            return;
        }
        self.change_token += 1;
        self.debounce_deadline = Some(now_ms + self.debounce_ms);
    }

    /// Advances the clock: fires a due debounce save and the periodic
    /// checkpoint.
    pub fn tick(&mut self, now_ms: u64) {
        if self.disposed {
            return;
        }
        if let Some(deadline) = self.debounce_deadline {
            if now_ms >= deadline {
                self.debounce_deadline = None;
                self.persist(now_ms);
            }
        }
        if now_ms >= self.next_checkpoint {
            if self.has_unsaved_changes() {
                self.persist(now_ms);
            }
            self.next_checkpoint = now_ms + self.checkpoint_ms;
        }
    }

    /// Immediate save, bypassing the debounce. Used on visibility loss
    /// and shutdown.
    pub fn flush(&mut self, now_ms: u64) {
        if self.disposed {
            return;
        }
        self.debounce_deadline = None;
        self.persist(now_ms);
    }

    /// The page-hidden hook: same urgency as a flush.
    pub fn on_hide(&mut self, now_ms: u64) {
        self.flush(now_ms);
    }

    pub fn dispose(&mut self) {
        self.debounce_deadline = None;
        self.disposed = true;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.change_token != self.last_saved_token
    }

    fn persist(&mut self, now_ms: u64) {
        if self.saving {
            // A save arrived while one is in flight; run another pass
            // as soon as the current one returns.
            self.pending = true;
            return;
        }
        if self.change_token == self.last_saved_token {
            return;
        }
        let token = self.change_token;
        let Some(snapshot) = (self.get_snapshot)() else {
            return;
        };
        self.saving = true;
        let record = ProgressRecord {
            puzzle_id: self.puzzle_id.clone(),
            pieces: snapshot.pieces,
            clusters: snapshot.clusters,
            view: snapshot.view,
            last_saved_at: now_ms,
            completed_at: snapshot.completed_at,
        };
        let outcome = (self.save)(&record);
        self.saving = false;
        match outcome {
            Ok(()) => {
                self.last_saved_token = token;
            }
            Err(message) => {
                // Failed saves keep the dirty token so a later debounce
                // or checkpoint retries.
                (self.on_error)(&message);
            }
        }
        if self.pending {
            self.pending = false;
            if self.has_unsaved_changes() {
                self.debounce_deadline = Some(now_ms + self.debounce_ms);
            }
        }
    }
}
