//! Radio session state machine
//!
//! A [`RadioSession`] owns one radio for its lifetime and moves through
//!
//! ```text
//! Created -> Opened -> Synced -> Reconfigured -> Flushed -> Closed
//! ```
//!
//! with `Failed` reachable from any non-terminal state. Device I/O only
//! happens when opening, in [`RadioSession::sync_in`] and in
//! [`RadioSession::sync_out`]; reconfiguration edits the downloaded image.
//! The transport is closed on every exit path, including failures.

use std::fmt;
use std::time::Duration;

use rad_model::{
    program, reconcile, AppliedSetting, ConfigError, MemoryRecord, ModelAdapter, ModelRegistry,
    SettingsGroup, TransposedProfile,
};
use tracing::{debug, info, warn};

use crate::driver::{Backend, DriverCatalog, DriverError, RadioDriver};
use crate::error::SessionError;
use crate::transport::{Connector, LinkGuard};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    Opened,
    Synced,
    Reconfigured,
    Flushed,
    Closed,
    Failed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Opened => "opened",
            Self::Synced => "synced",
            Self::Reconfigured => "reconfigured",
            Self::Flushed => "flushed",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a session should do between reading and closing
#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    profile: Option<TransposedProfile>,
    memories: Option<Vec<MemoryRecord>>,
    write: bool,
    verbose: bool,
}

impl SessionPlan {
    /// Read the radio and report its settings without writing anything
    pub fn inspect() -> Self {
        Self::default()
    }

    /// Read, edit and write back the radio's image
    pub fn reconfigure(
        profile: Option<TransposedProfile>,
        memories: Option<Vec<MemoryRecord>>,
    ) -> Self {
        Self {
            profile,
            memories,
            write: true,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn profile(&self) -> Option<&TransposedProfile> {
        self.profile.as_ref()
    }

    pub fn memories(&self) -> Option<&[MemoryRecord]> {
        self.memories.as_deref()
    }

    /// Whether the image is written back
    pub fn writes(&self) -> bool {
        self.write
    }
}

/// Outcome of a completed session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub model: String,
    pub port: String,
    pub applied: Vec<AppliedSetting>,
    pub programmed: usize,
    /// Settings as stored in the image when the session finished
    pub settings: SettingsGroup,
    pub flushed: bool,
}

/// One radio, one port, one pass through the state machine
pub struct RadioSession {
    port: String,
    adapter: ModelAdapter,
    connector: Box<dyn Connector>,
    driver: Box<dyn RadioDriver>,
    link: Option<LinkGuard>,
    settings: Option<SettingsGroup>,
    state: SessionState,
    pause: Box<dyn FnMut(Duration)>,
}

impl RadioSession {
    /// Resolve `model_id` and pick a backend for `port`
    ///
    /// The model is resolved before the catalog is consulted, so an unknown
    /// model never reaches the transport.
    pub fn new(
        registry: &ModelRegistry,
        model_id: &str,
        port: impl Into<String>,
        catalog: &dyn DriverCatalog,
    ) -> Result<Self, SessionError> {
        let adapter = registry.resolve(model_id)?.clone();
        let port = port.into();
        let backend = catalog.backend_for(&adapter, &port)?;
        Ok(Self::with_backend(adapter, port, backend))
    }

    pub fn with_backend(adapter: ModelAdapter, port: impl Into<String>, backend: Backend) -> Self {
        Self {
            port: port.into(),
            adapter,
            connector: backend.connector,
            driver: backend.driver,
            link: None,
            settings: None,
            state: SessionState::Created,
            pause: Box::new(std::thread::sleep),
        }
    }

    /// Replace the blocking sleep used for the reset wait
    pub fn with_pause(mut self, pause: impl FnMut(Duration) + 'static) -> Self {
        self.pause = Box::new(pause);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Settings snapshot of the downloaded image
    pub fn settings(&self) -> Option<&SettingsGroup> {
        self.settings.as_ref()
    }

    /// Check caller input against the model before touching the device
    pub fn validate(&self, plan: &SessionPlan) -> Result<(), SessionError> {
        if let Some(profile) = plan.profile() {
            self.check_profile(profile)?;
        }
        if let Some(records) = plan.memories() {
            let capacity = self.adapter.capacity();
            if records.len() > capacity {
                return Err(ConfigError::MemoryRangeExceeded {
                    count: records.len(),
                    capacity,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Run `plan` from start to finish
    ///
    /// The transport is closed before this returns, whether or not the plan
    /// succeeded.
    pub fn execute(mut self, plan: SessionPlan) -> Result<SessionReport, SessionError> {
        if let Err(e) = self.validate(&plan) {
            return Err(self.fail(e));
        }
        let result = self.run(plan);
        self.close();
        result
    }

    fn run(&mut self, plan: SessionPlan) -> Result<SessionReport, SessionError> {
        let SessionPlan {
            profile,
            memories,
            write,
            verbose,
        } = plan;

        self.open()?;
        // Inspection ends with close, so the radio is left to reset on its own
        self.sync_in(write)?;

        let applied = match &profile {
            Some(profile) => self.apply_profile(profile, verbose)?,
            None => Vec::new(),
        };
        let programmed = match memories {
            Some(records) => self.program_memories(records, verbose)?,
            None => 0,
        };

        if write {
            self.sync_out()?;
        }

        let settings = self.settings.clone().ok_or(SessionError::NotSynced)?;
        Ok(SessionReport {
            model: self.adapter.id().to_string(),
            port: self.port.clone(),
            applied,
            programmed,
            settings,
            flushed: write,
        })
    }

    /// Open the transport with the model's link parameters
    pub fn open(&mut self) -> Result<(), SessionError> {
        self.expect_state(&[SessionState::Created], SessionState::Opened)?;

        info!("Opening {} for {}", self.port, self.adapter.display_name());
        let link = self
            .connector
            .open(&self.port, self.adapter.link())
            .map_err(|e| self.fail(e))?;

        self.link = Some(LinkGuard::new(link));
        self.transition(SessionState::Opened);
        Ok(())
    }

    /// Download the radio's image
    ///
    /// With `wait_for_reset` the call blocks for the model's reset delay
    /// afterwards, since the radio reboots after a clone read and ignores
    /// the link until it is back.
    pub fn sync_in(&mut self, wait_for_reset: bool) -> Result<(), SessionError> {
        self.expect_state(&[SessionState::Opened], SessionState::Synced)?;

        info!("Reading image from {}", self.adapter.display_name());
        let result = self.read_image();
        let settings = result.map_err(|e| self.fail(e))?;
        self.settings = Some(settings);
        self.transition(SessionState::Synced);

        if wait_for_reset {
            let delay = self.adapter.reset_delay();
            info!("Waiting {:.1}s for radio to reset", delay.as_secs_f64());
            (self.pause)(delay);
        }
        Ok(())
    }

    fn read_image(&mut self) -> Result<SettingsGroup, SessionError> {
        let guard = self.link.as_mut().ok_or(SessionError::NotOpen)?;
        self.driver
            .sync_in(guard.link())
            .map_err(|e| SessionError::SyncRead(e.to_string()))?;
        self.driver
            .settings()
            .map_err(|e| SessionError::SyncRead(e.to_string()))
    }

    /// Reconcile the image's settings with `profile`
    pub fn apply_profile(
        &mut self,
        profile: &TransposedProfile,
        verbose: bool,
    ) -> Result<Vec<AppliedSetting>, SessionError> {
        self.expect_state(
            &[SessionState::Synced, SessionState::Reconfigured],
            SessionState::Reconfigured,
        )?;

        let result = self.reconcile_settings(profile, verbose);
        let applied = result.map_err(|e| self.fail(e))?;
        info!("Applied {} of {} profile settings", applied.len(), profile.len());
        self.transition(SessionState::Reconfigured);
        Ok(applied)
    }

    fn reconcile_settings(
        &mut self,
        profile: &TransposedProfile,
        verbose: bool,
    ) -> Result<Vec<AppliedSetting>, SessionError> {
        self.check_profile(profile)?;

        let mut settings = self.settings.clone().ok_or(SessionError::NotSynced)?;
        let applied = reconcile::apply(&mut settings, profile, verbose)?;

        self.driver
            .set_settings(&settings)
            .map_err(rejected_or(SessionError::Driver))?;
        self.settings = Some(self.driver.settings()?);
        Ok(applied)
    }

    /// Replace the image's memory bank with `records`
    pub fn program_memories(
        &mut self,
        records: Vec<MemoryRecord>,
        verbose: bool,
    ) -> Result<usize, SessionError> {
        self.expect_state(
            &[SessionState::Synced, SessionState::Reconfigured],
            SessionState::Reconfigured,
        )?;

        let range = self.adapter.memory_range();
        let result = self
            .driver
            .memory_bank()
            .map_err(SessionError::from)
            .and_then(|bank| Ok(program::program(bank, range, records, verbose)?));
        let count = result.map_err(|e| self.fail(e))?;

        self.transition(SessionState::Reconfigured);
        Ok(count)
    }

    /// Upload the edited image
    pub fn sync_out(&mut self) -> Result<(), SessionError> {
        self.expect_state(
            &[SessionState::Synced, SessionState::Reconfigured],
            SessionState::Flushed,
        )?;

        info!("Writing image to {}", self.adapter.display_name());
        let result = match self.link.as_mut() {
            Some(guard) => self
                .driver
                .sync_out(guard.link())
                .map_err(rejected_or(|e| SessionError::SyncWrite(e.to_string()))),
            None => Err(SessionError::NotOpen),
        };
        result.map_err(|e| self.fail(e))?;

        self.transition(SessionState::Flushed);
        Ok(())
    }

    /// Close the transport
    ///
    /// Safe to call in any state; the link is only ever closed once.
    pub fn close(&mut self) {
        self.release_link();
        if self.state != SessionState::Failed {
            self.transition(SessionState::Closed);
        }
    }

    fn release_link(&mut self) {
        if let Some(guard) = self.link.take() {
            let port = guard.port_name().to_string();
            match guard.close() {
                Ok(()) => info!("Closed {}", port),
                Err(e) => warn!("Error closing {}: {}", port, e),
            }
        }
    }

    fn check_profile(&self, profile: &TransposedProfile) -> Result<(), ConfigError> {
        if profile.model() != self.adapter.id() {
            return Err(ConfigError::ProfileFormat(format!(
                "profile was transposed for '{}' but the radio is '{}'",
                profile.model(),
                self.adapter.id()
            )));
        }
        Ok(())
    }

    fn expect_state(
        &mut self,
        allowed: &[SessionState],
        to: SessionState,
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            let err = SessionError::InvalidTransition {
                from: self.state,
                to,
            };
            Err(self.fail(err))
        }
    }

    fn transition(&mut self, to: SessionState) {
        debug!("Session {}: {} -> {}", self.port, self.state, to);
        self.state = to;
    }

    /// Move to `Failed`, release the transport and hand back `err`
    fn fail(&mut self, err: SessionError) -> SessionError {
        if !self.state.is_terminal() {
            warn!("Session on {} failed while {}: {}", self.port, self.state, err);
            self.transition(SessionState::Failed);
        }
        self.release_link();
        err
    }
}

/// Map a driver rejection to [`SessionError::DeviceRejectedSettings`] and
/// anything else through `other`
fn rejected_or(
    other: impl Fn(DriverError) -> SessionError,
) -> impl Fn(DriverError) -> SessionError {
    move |e| match e {
        DriverError::Rejected(msg) => SessionError::DeviceRejectedSettings(msg),
        e => other(e),
    }
}
