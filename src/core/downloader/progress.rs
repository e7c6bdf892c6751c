// ─── Progress Aggregation ───
// Tasks report over a channel; a single aggregator task folds the reports
// into one phase-weighted fraction and is the only caller of the sink.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Smallest change in the overall fraction worth emitting mid-phase.
const EMIT_STEP: f64 = 0.0005;

/// Install phases and their fixed slice of the overall progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Client,
    Libraries,
    Assets,
}

impl Phase {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Phase::Client => (0.0, 0.2),
            Phase::Libraries => (0.2, 0.8),
            Phase::Assets => (0.8, 1.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Client => "client",
            Phase::Libraries => "libraries",
            Phase::Assets => "assets",
        }
    }
}

/// One update delivered to the progress sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallProgress {
    pub phase: Phase,
    /// Overall fraction in `[0, 1]`, never decreasing.
    pub overall: f64,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug)]
enum ProgressMessage {
    Begin { phase: Phase, total: usize },
    Task { index: usize, fraction: f64 },
    Finished { index: usize },
    End { phase: Phase },
}

/// Cheap, cloneable sender used from concurrent tasks.
#[derive(Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

impl ProgressHandle {
    pub fn begin_phase(&self, phase: Phase, total: usize) {
        let _ = self.tx.send(ProgressMessage::Begin { phase, total });
    }

    pub fn task_progress(&self, index: usize, fraction: f64) {
        let _ = self.tx.send(ProgressMessage::Task { index, fraction });
    }

    pub fn task_finished(&self, index: usize) {
        let _ = self.tx.send(ProgressMessage::Finished { index });
    }

    pub fn end_phase(&self, phase: Phase) {
        let _ = self.tx.send(ProgressMessage::End { phase });
    }
}

/// Owns the aggregator task. Call [`ProgressReporter::finish`] to flush.
pub struct ProgressReporter {
    handle: ProgressHandle,
    worker: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn spawn<F>(sink: F) -> Self
    where
        F: FnMut(InstallProgress) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(aggregate(rx, sink));
        Self {
            handle: ProgressHandle { tx },
            worker,
        }
    }

    pub fn handle(&self) -> ProgressHandle {
        self.handle.clone()
    }

    /// Wait until every update sent so far has reached the sink.
    ///
    /// Clones of the handle still alive elsewhere keep the aggregator open.
    pub async fn finish(self) {
        drop(self.handle);
        let _ = self.worker.await;
    }
}

struct PhaseState {
    phase: Phase,
    fractions: Vec<f64>,
    finished: Vec<bool>,
    sum: f64,
    completed: usize,
}

impl PhaseState {
    fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            fractions: vec![0.0; total],
            finished: vec![false; total],
            sum: 0.0,
            completed: 0,
        }
    }

    fn set(&mut self, index: usize, fraction: f64) {
        if let Some(slot) = self.fractions.get_mut(index) {
            let fraction = fraction.clamp(0.0, 1.0);
            self.sum += fraction - *slot;
            *slot = fraction;
        }
    }

    fn finish(&mut self, index: usize) {
        if let Some(done) = self.finished.get_mut(index) {
            if !*done {
                *done = true;
                self.completed += 1;
            }
        }
        self.set(index, 1.0);
    }

    fn overall(&self) -> f64 {
        let (start, end) = self.phase.bounds();
        let total = self.fractions.len();
        if total == 0 {
            return start;
        }
        let ratio = (self.sum / total as f64).clamp(0.0, 1.0);
        start * (1.0 - ratio) + end * ratio
    }

    fn snapshot(&self, overall: f64) -> InstallProgress {
        InstallProgress {
            phase: self.phase,
            overall,
            completed: self.completed,
            total: self.fractions.len(),
        }
    }
}

async fn aggregate<F>(mut rx: mpsc::UnboundedReceiver<ProgressMessage>, mut sink: F)
where
    F: FnMut(InstallProgress),
{
    let mut state: Option<PhaseState> = None;
    let mut last_emitted = 0.0_f64;

    while let Some(message) = rx.recv().await {
        match message {
            ProgressMessage::Begin { phase, total } => {
                let current = PhaseState::new(phase, total);
                last_emitted = last_emitted.max(phase.bounds().0);
                sink(current.snapshot(last_emitted));
                state = Some(current);
            }
            ProgressMessage::Task { index, fraction } => {
                if let Some(current) = state.as_mut() {
                    current.set(index, fraction);
                    let overall = current.overall();
                    if overall - last_emitted >= EMIT_STEP {
                        last_emitted = overall;
                        sink(current.snapshot(overall));
                    }
                }
            }
            ProgressMessage::Finished { index } => {
                if let Some(current) = state.as_mut() {
                    current.finish(index);
                    let overall = current.overall();
                    if overall - last_emitted >= EMIT_STEP || current.completed == current.fractions.len() {
                        last_emitted = last_emitted.max(overall);
                        sink(current.snapshot(last_emitted));
                    }
                }
            }
            ProgressMessage::End { phase } => {
                let end = phase.bounds().1;
                last_emitted = last_emitted.max(end);
                let snapshot = match state.take() {
                    Some(current) if current.phase == phase => current.snapshot(last_emitted),
                    _ => InstallProgress {
                        phase,
                        overall: last_emitted,
                        completed: 0,
                        total: 0,
                    },
                };
                sink(snapshot);
            }
        }
    }
}
