//! chatex: export orchestration and recovery for on-device chat archives
//!
//! Drives a chat app's UI through an automation server, one conversation at a
//! time, exporting each to cloud storage and surviving dropped sessions across
//! long batches.
//!
//! # Example
//!
//! ```ignore
//! use chatex::{BatchRunner, ChatList, EngineContext, ExportTask, ExportWorkflow, ScanLimits, SessionManager, SortOrder};
//!
//! let ctx = EngineContext::default();
//! let mut session = SessionManager::new(factory, device, ctx.clone());
//! session.connect().await?;
//!
//! let chats = ChatList::new(ctx.clone(), ScanLimits::default());
//! let names = chats.full_scan(session.automation()?.as_ref(), Some(10), SortOrder::Alphabetical).await?;
//! let tasks: Vec<_> = names.into_iter().map(|n| ExportTask::new(n, true)).collect();
//!
//! let runner = BatchRunner::new(chats, ExportWorkflow::new(ctx));
//! let report = runner.run(&mut session, &tasks, 0).await;
//! ```

pub mod automation;
pub mod batch;
pub mod checkpoint;
pub mod classify;
pub mod clock;
pub mod context;
pub mod device;
pub mod discovery;
pub mod error;
pub mod hook;
pub mod navigation;
pub mod profile;
pub mod remote;
pub mod resolver;
pub mod resume;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use automation::{Automation, Query, SessionFactory, TextMatch, UiElement};
pub use batch::{BatchReport, BatchRunner, BatchSummary, ExportOutcome, ExportStatus, TimingStats};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use classify::{ErrorClass, classify};
pub use clock::{Clock, TokioClock, backoff};
pub use context::EngineContext;
pub use device::{AdbDevice, Device, Transport};
pub use discovery::{ChatList, ScanLimits, SortOrder};
pub use error::{Error, Result};
pub use hook::{HookOutcome, PostExportHook};
pub use profile::{AppProfile, Timings};
pub use remote::{RemoteAutomation, RemoteSessionFactory};
pub use resolver::{Locator, Resolver, Role};
pub use resume::{ResumeFolder, validate_resume_dir};
pub use session::{DEFAULT_MAX_RETRIES, Health, LockState, SessionManager, SessionStatus};
pub use workflow::{ExportState, ExportTask, ExportWorkflow, SkipReason, Terminal};
