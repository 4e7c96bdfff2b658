//! Shared domain types: the enums and durable entities that C1–C5 all
//! refer to. Transient entities (`Session`, `Operation`, `ResultPage`,
//! `JobDescriptor`) live next to the component that owns their lifecycle
//! (`gateway`/`cluster`); what's here is shared vocabulary plus the two
//! durable rows (`Snapshot`, `ResumeEvent`).

mod resume_event;
mod snapshot;
mod types;

pub use resume_event::ResumeEvent;
pub use snapshot::Snapshot;
pub use types::{
    ChangeKind, JobState, OperationStatus, RUNNING_JOB_PLACEHOLDER, ResultType, ResumeStatus,
    SnapshotStatus, SnapshotType,
};
