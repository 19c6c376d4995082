use gloo_timers::callback::Timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopToken(u64);

#[derive(Debug, Default)]
pub struct LoopGate {
    generation: u64,
    running: bool,
    in_flight: bool,
}

impl LoopGate {
    pub fn start(&mut self) -> LoopToken {
        self.generation += 1;
        self.running = true;
        // A fetch from the previous generation may still be outstanding; its
        // result is rejected by `finish`, so the new run need not wait for it.
        self.in_flight = false;
        LoopToken(self.generation)
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        self.running = false;
        self.in_flight = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_current(&self, token: LoopToken) -> bool {
        self.running && token.0 == self.generation
    }

    // At most one fetch per generation is in flight.
    pub fn try_begin(&mut self, token: LoopToken) -> bool {
        if !self.is_current(token) || self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    // False means the loop was stopped or restarted: drop the result.
    pub fn finish(&mut self, token: LoopToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.in_flight = false;
        true
    }
}

// The next tick is armed only after the previous one completed. Dropping
// the pending timer clears it in the browser.
pub struct PollingLoop {
    name: &'static str,
    interval_ms: u32,
    gate: LoopGate,
    pending: Option<Timeout>,
}

impl PollingLoop {
    pub fn new(name: &'static str, interval_ms: u32) -> Self {
        Self {
            name,
            interval_ms,
            gate: LoopGate::default(),
            pending: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn start(&mut self) -> LoopToken {
        self.pending = None;
        self.gate.start()
    }

    pub fn stop(&mut self) {
        if self.gate.is_running() {
            log::debug!("{} loop stopped", self.name);
        }
        self.pending = None;
        self.gate.stop();
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    pub fn is_current(&self, token: LoopToken) -> bool {
        self.gate.is_current(token)
    }

    pub fn try_begin(&mut self, token: LoopToken) -> bool {
        self.gate.try_begin(token)
    }

    pub fn finish(&mut self, token: LoopToken) -> bool {
        self.gate.finish(token)
    }

    pub fn park(&mut self, token: LoopToken, timeout: Timeout) {
        if self.gate.is_current(token) {
            self.pending = Some(timeout);
        }
    }
}
