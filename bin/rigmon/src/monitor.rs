use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, trace};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::event::PowerCycleEvent;
use crate::journal::Logger;
use crate::notifier::Notifier;
use crate::plug::{PlugState, SmartPlug};
use crate::settings::MonitorSettings;

/// Time between two samples.
pub const TICK: Duration = Duration::from_secs(1);
/// Longest a wait goes without looking at the stop signal.
pub const WAIT_STEP: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Monitoring,
    BelowThreshold,
    PoweringOff,
    WaitingToPowerOn,
    CooldownAfterPowerOn,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// Mutable loop state, owned by the monitor and never shared.
#[derive(Debug)]
pub struct MonitorSession {
    state: MonitorState,
    below_since: Option<Instant>,
    quit_requested: bool,
}

impl MonitorSession {
    fn new() -> Self {
        Self {
            state: MonitorState::Monitoring,
            below_since: None,
            quit_requested: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn below_threshold(&self) -> bool {
        self.below_since.is_some()
    }

    pub fn elapsed_below_threshold(&self) -> Duration {
        self.below_since
            .map(|since| since.elapsed())
            .unwrap_or_default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn start_decline_timer(&mut self) {
        self.state = MonitorState::BelowThreshold;
        self.below_since = Some(Instant::now());
    }

    fn reset_decline_timer(&mut self) {
        self.state = MonitorState::Monitoring;
        self.below_since = None;
    }

    fn stop(&mut self, quit_requested: bool) {
        self.state = MonitorState::Stopped;
        self.below_since = None;
        self.quit_requested |= quit_requested;
    }
}

/// Cloneable handle that asks a running monitor to stop.
#[derive(Debug, Clone)]
pub struct StopHandle(CancellationToken);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.cancel();
    }
}

pub struct PowerMonitor {
    settings: MonitorSettings,
    plug: Box<dyn SmartPlug>,
    logger: Arc<dyn Logger>,
    notifier: Option<Box<dyn Notifier>>,
    stop: CancellationToken,
    session: MonitorSession,
    plug_name: String,
}

impl PowerMonitor {
    pub fn new(
        settings: MonitorSettings,
        plug: Box<dyn SmartPlug>,
        logger: Arc<dyn Logger>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            settings,
            plug,
            logger,
            notifier,
            stop: CancellationToken::new(),
            session: MonitorSession::new(),
            plug_name: "Smart plug".to_string(),
        }
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop.clone())
    }

    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Samples until the plug is found off, a stop is requested or a power
    /// cycle fails. Only the last case is an error.
    pub async fn run(&mut self) -> Result<(), Error> {
        if let Err(err) = self.resolve_name().await {
            self.logger.error(&format!("ERROR: {err}"));
            self.session.stop(false);
            return Err(err);
        }

        self.log_summary();
        self.logger.info("Monitoring started.");

        let result = loop {
            if self.stop.is_cancelled() {
                break Ok(());
            }

            match self.tick().await {
                Ok(Tick::Continue) => {}
                Ok(Tick::Stop) => break Ok(()),
                Err(err) => {
                    self.logger.error(&format!("ERROR: {err}"));
                    break Err(err);
                }
            }

            if !self.wait(TICK).await {
                break Ok(());
            }
        };

        self.session.stop(self.stop.is_cancelled());
        self.logger.info("Monitoring stopped.");

        result
    }

    /// Takes one sample and advances the state machine. Sampling failures
    /// are logged and skipped, failures inside a power cycle are returned.
    pub async fn tick(&mut self) -> Result<Tick, Error> {
        let state = match self.plug.state().await {
            Ok(state) => state,
            Err(err) => {
                self.logger.error(&format!("ERROR: {err}"));
                return Ok(Tick::Continue);
            }
        };

        match state {
            PlugState::Unknown => {
                self.logger
                    .error("Could not determine the state of the smart plug.");
                return Ok(Tick::Continue);
            }
            PlugState::Off => {
                self.logger
                    .warning(&format!("{} is OFF.", self.plug_name));
                self.session.stop(false);
                return Ok(Tick::Stop);
            }
            PlugState::On => {}
        }

        let power = match self.plug.power_watts().await {
            Ok(power) => power,
            Err(err) => {
                self.logger.error(&format!("ERROR: {err}"));
                return Ok(Tick::Continue);
            }
        };

        let threshold = self.settings.threshold_watts;
        let wait = self.settings.wait_after_decline;
        let reading = format!("Power: {} W.", power.round());

        let current = self.session.state;
        trace!("{current:?}, {power} W");

        match current {
            MonitorState::BelowThreshold if power >= threshold => {
                self.session.reset_decline_timer();
                self.logger.info(&format!(
                    "{reading} Power consumption is back up over threshold. Powering off cancelled."
                ));
            }
            MonitorState::BelowThreshold if self.session.elapsed_below_threshold() >= wait => {
                self.logger.info("Monitoring paused.");

                if !self.power_cycle(power).await? {
                    self.session.stop(true);
                    return Ok(Tick::Stop);
                }

                self.logger.info("Monitoring resumed.");
                self.session.reset_decline_timer();
            }
            MonitorState::BelowThreshold => {
                let remaining = wait.saturating_sub(self.session.elapsed_below_threshold());
                self.logger.info(&format!(
                    "{reading} Power consumption below threshold. Powering off in {}.",
                    clock(remaining)
                ));
            }
            _ if power < threshold => {
                self.session.start_decline_timer();
                self.logger.info(&format!(
                    "{reading} Power consumption below threshold. Powering off in {}.",
                    clock(wait)
                ));
            }
            _ => self.logger.info(&reading),
        }

        Ok(Tick::Continue)
    }

    /// Returns `false` when a stop request interrupted the sequence.
    async fn power_cycle(&mut self, trigger_watts: f64) -> Result<bool, Error> {
        self.session.state = MonitorState::PoweringOff;
        self.logger.info("Powering off.");
        self.switch(false).await?;
        let powered_off = Local::now();
        self.logger
            .info(&format!("{} successfully switched off.", self.plug_name));

        self.session.state = MonitorState::WaitingToPowerOn;
        if !self
            .countdown(self.settings.wait_before_power_on, "Powering back on in")
            .await
        {
            return Ok(false);
        }

        self.logger.info("Powering on.");
        self.switch(true).await?;
        let powered_on = Local::now();
        self.logger
            .info(&format!("{} successfully switched on.", self.plug_name));

        self.session.state = MonitorState::CooldownAfterPowerOn;
        if !self
            .countdown(self.settings.wait_after_decline, "Resuming monitoring in")
            .await
        {
            return Ok(false);
        }

        let event = PowerCycleEvent {
            plug: self.plug.identity(),
            plug_name: self.plug_name.clone(),
            trigger_watts,
            threshold_watts: self.settings.threshold_watts,
            below_for: self.settings.wait_after_decline,
            powered_off,
            powered_on,
        };

        self.logger.power_cycled(&event);
        self.notify(&event).await;

        Ok(true)
    }

    async fn switch(&self, on: bool) -> Result<(), Error> {
        let accepted = self.plug.set_state(on).await?;

        if accepted {
            Ok(())
        } else {
            Err(Error::Rejected {
                plug: self.plug.identity(),
                on,
            })
        }
    }

    async fn notify(&self, event: &PowerCycleEvent) {
        let notifier = match &self.notifier {
            Some(notifier) => notifier,
            None => return,
        };

        let message = event.summary();

        let result = tokio::select! {
            result = notifier.send_text(&message) => result,
            _ = self.stop.cancelled() => {
                debug!("stop requested, text notification abandoned");
                return;
            }
        };

        match result {
            Ok(quota) => self.logger.info(&format!(
                "Text notification sent via Textbelt.com. Quota remaining: {quota}"
            )),
            Err(err) => self
                .logger
                .error(&format!("Failed to send text message: {err}")),
        }
    }

    /// Logs the remaining time once per tick. Returns `false` when stopped.
    async fn countdown(&self, total: Duration, label: &str) -> bool {
        let started = Instant::now();

        loop {
            let remaining = total.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return true;
            }

            self.logger
                .info(&format!("{label} {}.", clock(remaining)));

            if !self.wait(remaining.min(TICK)).await {
                return false;
            }
        }
    }

    /// Sleeps for `duration` in steps of at most [`WAIT_STEP`]. Returns
    /// `false` as soon as a stop is requested.
    async fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;

        loop {
            if self.stop.is_cancelled() {
                debug!("stop requested");
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                return true;
            }

            let step = (deadline - now).min(WAIT_STEP);

            tokio::select! {
                _ = self.stop.cancelled() => {}
                _ = time::sleep(step) => {}
            }
        }
    }

    async fn resolve_name(&mut self) -> Result<(), Error> {
        let name = self.plug.name().await?;

        if !name.trim().is_empty() {
            self.plug_name = name;
        }

        Ok(())
    }

    fn log_summary(&self) {
        let settings = &self.settings;

        self.logger
            .info(&format!("Connected to: {} ({}).", self.plug_name, settings.ip));
        self.logger
            .info(&format!("Plug type: {}", settings.vendor));
        self.logger.info(&format!(
            "Min. power consumption threshold: {} W.",
            settings.threshold_watts
        ));
        self.logger.info(&format!(
            "Wait time before power off: {} seconds.",
            settings.wait_after_decline.as_secs()
        ));
        self.logger.info(&format!(
            "Wait time before power back on: {} seconds.",
            settings.wait_before_power_on.as_secs()
        ));
    }
}

fn clock(duration: Duration) -> String {
    let seconds = duration.as_secs_f64().ceil() as u64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
