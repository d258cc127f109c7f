/// Run phase definitions for the pipeline coordinator
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Coordinator constructed, nothing fetched yet
    Start,

    /// Fetching the index page and extracting entity references
    ResolvingIndex,

    /// Partitioning the entity list into batches
    Batching,

    /// Processing the batch with the given 1-based index
    ProcessingBatch(usize),

    /// Every batch has been processed
    Done,

    /// The index could not be resolved; no work was possible
    Failed,
}

impl RunPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Batches are strictly sequential: batch `n` may only be followed by
    /// batch `n + 1` or by `Done`.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        match (*self, next) {
            (Self::Start, Self::ResolvingIndex) => true,
            (Self::ResolvingIndex, Self::Batching | Self::Failed) => true,
            (Self::Batching, Self::ProcessingBatch(1) | Self::Done) => true,
            (Self::ProcessingBatch(current), Self::ProcessingBatch(n)) => n == current + 1,
            (Self::ProcessingBatch(_), Self::Done) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ResolvingIndex => "resolving_index",
            Self::Batching => "batching",
            Self::ProcessingBatch(_) => "processing_batch",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessingBatch(n) => write!(f, "{} {}", self.as_str(), n),
            _ => f.write_str(self.as_str()),
        }
    }
}
