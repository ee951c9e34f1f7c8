//! Non-blocking completion for external resource loads
//!
//! Operations that depend on an external resource (a layer's data becoming
//! ready, an extent being computed remotely) get a promise/future pair
//! instead of a spin-wait. The producer completes or fails the promise
//! whenever it finishes, possibly many ticks later, and the consumer polls
//! once per tick or registers a completion callback. Cancellation and
//! caller-supplied timeouts leave dependent state simply not updated.
//!
//! Single-threaded by design, matching the cooperative tick model; the pair
//! shares state through `Rc` and is not `Send`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Observable state of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Still waiting on the producer
    Pending,
    /// Completed; the value can be taken
    Ready,
    /// The producer reported failure
    Failed,
    /// The consumer gave up
    Cancelled,
    /// The caller-supplied deadline passed before completion
    TimedOut,
}

impl LoadStatus {
    /// Whether no further transitions can happen
    pub fn is_terminal(self) -> bool {
        self != LoadStatus::Pending
    }
}

struct Shared<T> {
    status: LoadStatus,
    value: Option<T>,
    error: Option<String>,
    deadline: Option<Instant>,
    callback: Option<Box<dyn FnOnce(LoadStatus)>>,
}

/// Producer half: completes or fails the load
pub struct LoadPromise<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

/// Consumer half: polls, takes the value, cancels
pub struct LoadFuture<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

/// Create a connected promise/future pair
pub fn load_channel<T>() -> (LoadPromise<T>, LoadFuture<T>) {
    let shared = Rc::new(RefCell::new(Shared {
        status: LoadStatus::Pending,
        value: None,
        error: None,
        deadline: None,
        callback: None,
    }));

    (
        LoadPromise {
            shared: Rc::clone(&shared),
        },
        LoadFuture { shared },
    )
}

impl<T> LoadPromise<T> {
    /// Deliver the value; ignored if the load already reached a terminal
    /// state (e.g. the consumer cancelled first)
    pub fn complete(&self, value: T) {
        let callback = {
            let mut shared = self.shared.borrow_mut();
            if shared.status.is_terminal() {
                return;
            }
            shared.value = Some(value);
            shared.status = LoadStatus::Ready;
            shared.callback.take()
        };
        if let Some(callback) = callback {
            callback(LoadStatus::Ready);
        }
    }

    /// Report failure; ignored if already terminal
    pub fn fail(&self, reason: impl Into<String>) {
        let callback = {
            let mut shared = self.shared.borrow_mut();
            if shared.status.is_terminal() {
                return;
            }
            shared.error = Some(reason.into());
            shared.status = LoadStatus::Failed;
            shared.callback.take()
        };
        if let Some(callback) = callback {
            callback(LoadStatus::Failed);
        }
    }

    /// Whether the consumer has cancelled, so the producer can stop working
    pub fn is_cancelled(&self) -> bool {
        self.shared.borrow().status == LoadStatus::Cancelled
    }
}

impl<T> LoadFuture<T> {
    /// Current status, applying the deadline if one is set
    pub fn poll(&self) -> LoadStatus {
        let callback = {
            let mut shared = self.shared.borrow_mut();
            if shared.status == LoadStatus::Pending {
                if let Some(deadline) = shared.deadline {
                    if Instant::now() >= deadline {
                        shared.status = LoadStatus::TimedOut;
                        shared.callback.take()
                    } else {
                        None
                    }
                } else {
                    None
                }
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback(LoadStatus::TimedOut);
        }
        self.shared.borrow().status
    }

    /// Give up on the load; ignored if already terminal
    pub fn cancel(&self) {
        let callback = {
            let mut shared = self.shared.borrow_mut();
            if shared.status.is_terminal() {
                return;
            }
            shared.status = LoadStatus::Cancelled;
            shared.callback.take()
        };
        if let Some(callback) = callback {
            callback(LoadStatus::Cancelled);
        }
    }

    /// Arm a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.shared.borrow_mut().deadline = Some(Instant::now() + timeout);
        self
    }

    /// Take the value once ready; `None` otherwise (or if already taken)
    pub fn try_take(&self) -> Option<T> {
        let mut shared = self.shared.borrow_mut();
        if shared.status == LoadStatus::Ready {
            shared.value.take()
        } else {
            None
        }
    }

    /// The failure reason, if the load failed
    pub fn error(&self) -> Option<String> {
        self.shared.borrow().error.clone()
    }

    /// Register a completion callback, invoked exactly once with the
    /// terminal status; fires immediately if already terminal
    ///
    /// No internal borrow is held while the callback runs.
    pub fn on_complete(&self, callback: impl FnOnce(LoadStatus) + 'static) {
        let status = {
            let mut shared = self.shared.borrow_mut();
            if shared.status.is_terminal() {
                shared.status
            } else {
                shared.callback = Some(Box::new(callback));
                return;
            }
        };
        callback(status);
    }
}
