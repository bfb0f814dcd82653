//! Hangar gates.
//!
//! A hangar only cares about the reported [`GateState`]. Parts with doors
//! get an [`AnimatedGate`] that takes time and charge to move; parts
//! without get a [`StaticGate`] that is always open.

use hangar_logic::config::{GateConfig, HangarConfig};
use hangar_logic::state::GateState;

/// Gate behaviour seen by a hangar.
pub trait Gate: Send + std::fmt::Debug {
    fn state(&self) -> GateState;

    fn open(&mut self);

    fn close(&mut self);

    fn toggle(&mut self) {
        match self.state() {
            GateState::Opened | GateState::Opening => self.close(),
            GateState::Closed | GateState::Closing => self.open(),
        }
    }

    /// Electric charge needed to keep moving for `dt` seconds.
    fn energy_demand(&self, dt: f64) -> f64;

    /// Move for `dt` seconds; `supplied` is the fraction of the demanded
    /// charge that was actually available.
    fn advance(&mut self, dt: f64, supplied: f64);

    /// Jump straight to `state`, as when restoring a saved flight.
    fn force(&mut self, state: GateState);
}

/// Pick the gate implementation a hangar's config asks for.
pub fn gate_for(config: &HangarConfig) -> Box<dyn Gate> {
    match config.gate {
        Some(g) => Box::new(AnimatedGate::new(g)),
        None => Box::new(StaticGate),
    }
}

// ── Animated ────────────────────────────────────────────────────────────

/// Doors that swing over `duration` seconds.
#[derive(Debug, Clone)]
pub struct AnimatedGate {
    state: GateState,
    /// 0 is closed, 1 is open.
    progress: f64,
    config: GateConfig,
}

impl AnimatedGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            state: GateState::Closed,
            progress: 0.0,
            config,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}

impl Gate for AnimatedGate {
    fn state(&self) -> GateState {
        self.state
    }

    fn open(&mut self) {
        if self.state != GateState::Opened {
            self.state = GateState::Opening;
        }
    }

    fn close(&mut self) {
        if self.state != GateState::Closed {
            self.state = GateState::Closing;
        }
    }

    fn energy_demand(&self, dt: f64) -> f64 {
        if self.state.is_moving() {
            self.config.energy * dt
        } else {
            0.0
        }
    }

    fn advance(&mut self, dt: f64, supplied: f64) {
        let step = if self.config.duration > 0.0 {
            dt * supplied.clamp(0.0, 1.0) / self.config.duration
        } else {
            1.0
        };
        match self.state {
            GateState::Opening => {
                self.progress = (self.progress + step).min(1.0);
                if self.progress >= 1.0 {
                    self.state = GateState::Opened;
                }
            }
            GateState::Closing => {
                self.progress = (self.progress - step).max(0.0);
                if self.progress <= 0.0 {
                    self.state = GateState::Closed;
                }
            }
            _ => {}
        }
    }

    fn force(&mut self, state: GateState) {
        self.state = state;
        self.progress = match state {
            GateState::Opened => 1.0,
            GateState::Closed => 0.0,
            _ => self.progress,
        };
    }
}

// ── Static ──────────────────────────────────────────────────────────────

/// No doors at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGate;

impl Gate for StaticGate {
    fn state(&self) -> GateState {
        GateState::Opened
    }

    fn open(&mut self) {}

    fn close(&mut self) {}

    fn energy_demand(&self, _dt: f64) -> f64 {
        0.0
    }

    fn advance(&mut self, _dt: f64, _supplied: f64) {}

    fn force(&mut self, _state: GateState) {}
}
