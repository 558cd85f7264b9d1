//! Release-time grabbing and slot watching for the tee sheet, plus the run
//! manager that keeps at most one of them alive at a time.

pub mod cancel;
pub mod controller;
pub mod error;
pub mod manager;
pub mod notify;
pub mod request;
pub mod status;

pub use cancel::CancelFlag;
pub use controller::{GrabPhase, RunOutcome, ScanSession, Timing};
pub use error::StartError;
pub use manager::RunManager;
pub use notify::{Notifier, NotifyError, PushoverNotifier};
pub use request::{Credentials, GrabPlan, ScanPlan};
pub use status::StatusChannel;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod support;
