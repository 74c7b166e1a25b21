//! Simulation lifecycle observer (`spec.md` §4.9, `original_source/model/observer.hpp`).
//!
//! The source models observers as a singly-linked list, each forwarding a
//! message to `next` after doing its own work, with a mutual pointer back
//! into the simulation. Rather than replicate the cycle, lifecycle messages
//! are published by value: each hook receives a `&Simulation` borrow that
//! is only valid for the duration of the call, and [`ObserverChain`] plays
//! the role of the linked list as an ordered `Vec` of trait objects.

use crate::sim::Simulation;

/// Callbacks invoked by [`Simulation`] at the four lifecycle points named
/// in `spec.md` §6 (`Tick=0`, `PreTick=1`, `Initialized=2`, `Finished=3`).
///
/// All methods have default no-op implementations so implementors only
/// need to override what they care about. An `AnalysisObserver`-style
/// implementation (buffered row accumulation with a flush threshold) lives
/// in `escape-output`, built on top of this trait rather than on a direct
/// file-I/O callback.
pub trait SimObserver {
    /// Called once, right after initial placement, before any tick runs.
    fn on_initialized(&mut self, _sim: &Simulation) {}

    /// Called at the very start of each tick, before any phase runs.
    fn on_pre_tick(&mut self, _sim: &Simulation) {}

    /// Called at the end of each tick, after the tick counter has advanced.
    fn on_tick(&mut self, _sim: &Simulation) {}

    /// Called once after the final tick completes (`Tmax` reached or
    /// cooperative termination observed).
    fn on_finished(&mut self, _sim: &Simulation) {}
}

/// A [`SimObserver`] that does nothing. Use when a call site needs an
/// observer but has no progress callbacks to run.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// An ordered list of observers, each notified in turn — the non-cyclic
/// stand-in for the source's linked list (see module docs).
#[derive(Default)]
pub struct ObserverChain {
    observers: Vec<Box<dyn SimObserver>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        ObserverChain { observers: Vec::new() }
    }

    pub fn push(&mut self, observer: Box<dyn SimObserver>) {
        self.observers.push(observer);
    }
}

impl SimObserver for ObserverChain {
    fn on_initialized(&mut self, sim: &Simulation) {
        for o in &mut self.observers {
            o.on_initialized(sim);
        }
    }

    fn on_pre_tick(&mut self, sim: &Simulation) {
        for o in &mut self.observers {
            o.on_pre_tick(sim);
        }
    }

    fn on_tick(&mut self, sim: &Simulation) {
        for o in &mut self.observers {
            o.on_tick(sim);
        }
    }

    fn on_finished(&mut self, sim: &Simulation) {
        for o in &mut self.observers {
            o.on_finished(sim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        pre_ticks: u32,
        ticks: u32,
    }

    impl SimObserver for Counter {
        fn on_pre_tick(&mut self, _sim: &Simulation) {
            self.pre_ticks += 1;
        }
        fn on_tick(&mut self, _sim: &Simulation) {
            self.ticks += 1;
        }
    }

    #[test]
    fn chain_forwards_to_every_member() {
        let mut chain = ObserverChain::new();
        chain.push(Box::new(Counter { pre_ticks: 0, ticks: 0 }));
        chain.push(Box::new(Counter { pre_ticks: 0, ticks: 0 }));
        assert_eq!(chain.observers.len(), 2);
    }
}
