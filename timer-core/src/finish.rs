use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Delivered to every consumer when a run reaches zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FinishEvent {
    /// 1-based number of the run that finished.
    pub run: u64,
    /// Clock reading at the Running -> Finished transition.
    pub finished_at_ms: u64,
    /// Laps recorded during the run.
    pub laps: usize,
}

/// Handle returned by [`FinishSignal::subscribe`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConsumerId(usize);

type Consumer = Box<dyn FnMut(&FinishEvent)>;

/// One-shot fan-out of the finish event.
///
/// Fires at most once between calls to [`arm`](Self::arm). Consumers run in
/// registration order; a consumer that panics is logged and skipped, the rest
/// still run.
pub struct FinishSignal {
    consumers: Vec<(ConsumerId, Consumer)>,
    next_id: usize,
    armed: bool,
}

impl FinishSignal {
    pub fn new() -> Self {
        Self {
            consumers: Vec::new(),
            next_id: 0,
            armed: true,
        }
    }

    pub fn subscribe<F>(&mut self, consumer: F) -> ConsumerId
    where
        F: FnMut(&FinishEvent) + 'static,
    {
        let id = ConsumerId(self.next_id);
        self.next_id += 1;
        self.consumers.push((id, Box::new(consumer)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ConsumerId) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|(cid, _)| *cid != id);
        self.consumers.len() != before
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Deliver `event` if armed, then disarm. Returns whether it was delivered.
    pub fn fire(&mut self, event: FinishEvent) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;

        for (id, consumer) in self.consumers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| consumer(&event)));
            if outcome.is_err() {
                log::error!("finish consumer {} panicked during run {}", id.0, event.run);
            }
        }
        true
    }
}

impl Default for FinishSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FinishSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishSignal")
            .field("consumers", &self.consumers.len())
            .field("armed", &self.armed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(run: u64) -> FinishEvent {
        FinishEvent { run, finished_at_ms: 0, laps: 0 }
    }

    #[test]
    fn test_fires_once_until_rearmed() {
        let count = Rc::new(RefCell::new(0));
        let mut signal = FinishSignal::new();
        let c = count.clone();
        signal.subscribe(move |_| *c.borrow_mut() += 1);

        assert!(signal.fire(event(1)));
        assert!(!signal.fire(event(1)));
        assert_eq!(*count.borrow(), 1);

        signal.arm();
        assert!(signal.fire(event(2)));
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = FinishSignal::new();
        for tag in ["sound", "vibrate", "title"] {
            let s = seen.clone();
            signal.subscribe(move |_| s.borrow_mut().push(tag));
        }
        signal.fire(event(1));
        assert_eq!(*seen.borrow(), vec!["sound", "vibrate", "title"]);
    }

    #[test]
    fn test_panicking_consumer_isolated() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = FinishSignal::new();
        signal.subscribe(|_| panic!("sink failed"));
        let s = seen.clone();
        signal.subscribe(move |e| s.borrow_mut().push(e.run));

        assert!(signal.fire(event(7)));
        assert_eq!(*seen.borrow(), vec![7]);
        assert!(!signal.is_armed());
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut signal = FinishSignal::new();
        let c = count.clone();
        let id = signal.subscribe(move |_| *c.borrow_mut() += 1);
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        assert_eq!(signal.consumer_count(), 0);
        signal.fire(event(1));
        assert_eq!(*count.borrow(), 0);
    }
}
