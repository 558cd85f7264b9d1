use std::{future::Future, sync::Arc};

use chrono::Utc;
use chrono_tz::Tz;
use parking_lot::Mutex;
use shared::{
    protocol::{
        ContinuousScanRequest, ContinuousScanStarted, InstantGrabRequest, InstantGrabStarted,
        StatusResponse, StopResponse, TimesResponse,
    },
    time::time_bank,
};
use site_driver::DriverFactory;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    cancel::CancelFlag,
    controller::{RunOutcome, ScanSession, Timing},
    error::StartError,
    notify::Notifier,
    request::{GrabPlan, ScanPlan},
    status::StatusChannel,
};

struct ActiveRun {
    cancel: CancelFlag,
    handle: JoinHandle<RunOutcome>,
}

impl ActiveRun {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Owns the single run slot. Start requests are refused while a run is live;
/// each accepted request gets a fresh browser session and a fresh
/// notification history.
pub struct RunManager {
    factory: Arc<dyn DriverFactory>,
    notifier: Option<Arc<dyn Notifier>>,
    status: Arc<StatusChannel>,
    zone: Tz,
    timing: Timing,
    active: Mutex<Option<ActiveRun>>,
}

impl RunManager {
    pub fn new(factory: Arc<dyn DriverFactory>, zone: Tz) -> Self {
        Self {
            factory,
            notifier: None,
            status: Arc::new(StatusChannel::new()),
            zone,
            timing: Timing::default(),
            active: Mutex::new(None),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn status_channel(&self) -> Arc<StatusChannel> {
        Arc::clone(&self.status)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().as_ref().is_some_and(ActiveRun::is_live)
    }

    pub fn start_instant_grab(
        &self,
        req: InstantGrabRequest,
    ) -> Result<InstantGrabStarted, StartError> {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(ActiveRun::is_live) {
            return Err(StartError::AlreadyRunning);
        }

        let plan = GrabPlan::from_request(req, self.zone, Utc::now())?;
        let started = InstantGrabStarted {
            message: "Instant grab started".into(),
            wait_until: plan.wait_until.fixed_offset(),
            target_date: plan.target_date.to_string(),
            reservation_time: plan.reservation_time,
        };
        info!(
            target_date = %plan.target_date,
            reservation_time = %plan.reservation_time,
            wait_until = %started.wait_until,
            "starting instant grab"
        );

        *active = Some(self.spawn_run(move |session| session.run_instant_grab(plan)));
        Ok(started)
    }

    pub fn start_continuous_scan(
        &self,
        req: ContinuousScanRequest,
    ) -> Result<ContinuousScanStarted, StartError> {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(ActiveRun::is_live) {
            return Err(StartError::AlreadyRunning);
        }

        let plan = ScanPlan::from_request(req)?;
        let started = ContinuousScanStarted {
            message: "Continuous scan started".into(),
            target_date: plan.target_date.to_string(),
            time_range: plan.range.to_string(),
        };
        info!(
            target_date = %plan.target_date,
            range = %plan.range,
            interval_secs = plan.scan_interval_secs,
            policy = ?plan.policy,
            "starting continuous scan"
        );

        *active = Some(self.spawn_run(move |session| session.run_continuous_scan(plan)));
        Ok(started)
    }

    /// Asks the live run, if any, to wind down at its next checkpoint.
    pub fn stop(&self) -> StopResponse {
        if let Some(run) = self.active.lock().as_ref().filter(|run| run.is_live()) {
            run.cancel.cancel();
            self.status.publish("Stopping scanner...");
        }
        StopResponse {
            message: "Stop signal sent".into(),
        }
    }

    /// Snapshot for pollers. Drains the pending status lines.
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            status: self.status.current_status(),
            is_running: self.is_running(),
            messages: self.status.drain_all(),
        }
    }

    pub fn times(&self) -> TimesResponse {
        TimesResponse { times: time_bank() }
    }

    fn spawn_run<F, Fut>(&self, protocol: F) -> ActiveRun
    where
        F: FnOnce(ScanSession) -> Fut + Send + 'static,
        Fut: Future<Output = RunOutcome> + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let session_cancel = cancel.clone();
        let factory = Arc::clone(&self.factory);
        let notifier = self.notifier.clone();
        let status = Arc::clone(&self.status);
        let timing = self.timing;

        let handle = tokio::spawn(async move {
            status.publish("Starting browser...");
            let driver = match factory.open().await {
                Ok(driver) => driver,
                Err(err) => {
                    status.publish(format!("Error: {err}"));
                    return RunOutcome::Failed(err.to_string());
                }
            };

            let mut session = ScanSession::new(driver, status, session_cancel, timing);
            if let Some(notifier) = notifier {
                session = session.with_notifier(notifier);
            }
            let outcome = protocol(session).await;
            info!(?outcome, "run finished");
            outcome
        });

        ActiveRun { cancel, handle }
    }
}

#[cfg(test)]
#[path = "tests/manager_tests.rs"]
mod tests;
