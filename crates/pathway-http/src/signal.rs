//! One-shot notification
//!
//! Descriptors hold a `Signal` instead of inheriting an emitter. Listeners
//! run at most once, outside the lock, in subscription order.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub type Listener<T> = Box<dyn FnOnce(&T) + Send>;

struct SignalState<T> {
    fired: bool,
    listeners: Vec<Listener<T>>,
}

pub struct Signal<T> {
    state: Arc<Mutex<SignalState<T>>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState {
                fired: false,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener.
    ///
    /// Once the signal has fired there is nothing left to wait for, so the
    /// listener is handed back for the caller to run with its own value.
    pub fn subscribe<F>(&self, listener: F) -> Result<(), Listener<T>>
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.fired {
            return Err(Box::new(listener));
        }
        state.listeners.push(Box::new(listener));
        Ok(())
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn emit(&self, value: &T) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if state.fired {
                return false;
            }
            state.fired = true;
            std::mem::take(&mut state.listeners)
        };

        for listener in listeners {
            listener(value);
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.state.lock().fired
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Signal")
            .field("fired", &state.fired)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
