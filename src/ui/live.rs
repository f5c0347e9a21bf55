/// When the dashboard polls instead of waiting for pushes
use crate::config::Settings;

/// What to do with the polling timer after a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start(u32),
    Stop,
    Keep,
}

/// Push-port and auto-refresh state of one dashboard.
///
/// There is no reconnect: once the port drops, polling is the only live source
/// until the page is reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRefresh {
    port_open: bool,
    auto_refresh: bool,
    poll_interval_ms: u32,
    fallback_poll_interval_ms: u32,
    timer: Option<u32>,
}

impl LiveRefresh {
    pub fn new(settings: &Settings) -> Self {
        LiveRefresh {
            port_open: false,
            auto_refresh: settings.auto_refresh,
            poll_interval_ms: settings.poll_interval_ms,
            fallback_poll_interval_ms: settings.fallback_poll_interval_ms,
            timer: None,
        }
    }

    pub fn port_opened(&mut self) -> TimerAction {
        self.port_open = true;
        self.stop()
    }

    /// The port disconnected or could not be opened
    pub fn port_lost(&mut self) -> TimerAction {
        self.port_open = false;
        if self.auto_refresh && self.timer.is_none() {
            self.start(self.fallback_poll_interval_ms)
        } else {
            TimerAction::Keep
        }
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) -> TimerAction {
        self.auto_refresh = enabled;
        match (enabled, self.port_open, self.timer) {
            (true, false, None) => self.start(self.poll_interval_ms),
            (false, _, Some(_)) => self.stop(),
            _ => TimerAction::Keep,
        }
    }

    pub fn is_port_open(&self) -> bool {
        self.port_open
    }

    /// Interval of the running timer, if any
    pub fn polling_interval(&self) -> Option<u32> {
        self.timer
    }

    fn start(&mut self, interval_ms: u32) -> TimerAction {
        self.timer = Some(interval_ms);
        TimerAction::Start(interval_ms)
    }

    fn stop(&mut self) -> TimerAction {
        match self.timer.take() {
            Some(_) => TimerAction::Stop,
            None => TimerAction::Keep,
        }
    }
}

impl Default for LiveRefresh {
    fn default() -> Self {
        LiveRefresh::new(&Settings::default())
    }
}
