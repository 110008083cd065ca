// Process module - Child launch, exit classification and the restart loop

pub mod output;
pub mod restart;
pub mod spawner;
pub mod supervisor;
pub mod terminate;
mod types;

pub use restart::{BackoffStrategy, RestartPolicy};
pub use spawner::{spawn_process, SpawnedProcess};
pub use supervisor::Supervisor;
pub use types::{
    Decision, ExitOutcome, RestartSession, SessionReport, StopReason, SupervisorState,
};
