use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use crate::{clock, command::button::Trigger};

/// Bindings polled once per scheduler run, in the order they were bound.
#[derive(Default)]
pub struct EventLoop {
    bindings: Vec<Box<dyn FnMut()>>,
}

impl EventLoop {
    pub fn bind(&mut self, binding: impl FnMut() + 'static) {
        self.bindings.push(Box::new(binding));
    }

    pub fn poll(&mut self) {
        self.bindings.iter_mut().for_each(|binding| binding());
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A signal sampled once per poll of its event loop. Derived events sample
/// their parents, so bind parents first.
pub struct BooleanEvent {
    event_loop: Rc<RefCell<EventLoop>>,
    state: Rc<Cell<bool>>,
}

impl BooleanEvent {
    pub fn new(
        event_loop: Rc<RefCell<EventLoop>>,
        mut signal: impl FnMut() -> bool + 'static,
    ) -> Self {
        let state = Rc::new(Cell::new(signal()));
        let sampled = state.clone();
        event_loop
            .borrow_mut()
            .bind(move || sampled.set(signal()));
        Self { event_loop, state }
    }

    fn derive(&self, mut map: impl FnMut(bool) -> bool + 'static) -> Self {
        let parent = self.state.clone();
        Self::new(self.event_loop.clone(), move || map(parent.get()))
    }

    fn edge(&self, detect: fn(bool, bool) -> bool) -> Self {
        let mut previous = self.state.get();
        self.derive(move |present| {
            let edge = detect(previous, present);
            previous = present;
            edge
        })
    }

    fn combine(&self, other: &Self, op: fn(bool, bool) -> bool) -> Self {
        let other = other.state.clone();
        self.derive(move |state| op(state, other.get()))
    }

    pub fn current_state(&self) -> bool {
        self.state.get()
    }

    /// Runs `action` on every poll that finds the signal high.
    pub fn if_high(&self, mut action: impl FnMut() + 'static) {
        let state = self.state.clone();
        self.event_loop.borrow_mut().bind(move || {
            if state.get() {
                action();
            }
        });
    }

    /// High for the single poll on which the signal goes from low to high.
    pub fn rising(&self) -> Self {
        self.edge(|previous, present| !previous && present)
    }

    pub fn falling(&self) -> Self {
        self.edge(|previous, present| previous && !present)
    }

    /// High once the signal has stayed high for `hold`, measured on the
    /// robot clock. Filters out a noisy stick brushing past a threshold.
    pub fn debounce(&self, hold: Duration) -> Self {
        let mut high_since: Option<Duration> = None;
        self.derive(move |present| {
            if !present {
                high_since = None;
                return false;
            }
            let now = clock::now();
            let since = *high_since.get_or_insert(now);
            now.saturating_sub(since) >= hold
        })
    }

    pub fn negate(&self) -> Self {
        self.derive(|state| !state)
    }

    pub fn and(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a || b)
    }

    pub fn as_trigger(&self) -> Trigger {
        let state = self.state.clone();
        Trigger::new_with_loop(self.event_loop.clone(), move || state.get())
    }
}

impl From<BooleanEvent> for Trigger {
    fn from(event: BooleanEvent) -> Self {
        event.as_trigger()
    }
}
