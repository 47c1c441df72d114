//! Enumeration protocol shared by service, service-type and attribute queries
//!
//! A directory agent pushes results one at a time into a sink and reads back
//! a [`Continuation`] after each one. [`Enumeration`] is the adapter that
//! sits behind that sink: it accumulates items in delivery order, runs the
//! caller's per-item handler, records failures and decides when delivery
//! must stop.
//!
//! ```text
//! Open --Item/Continue--> Open
//! Open --Item/Stop------> Stopped
//! Open --LastCall-------> Finished
//! Open --Failed---------> Failed
//! Open --handler error--> Aborted
//! ```
//!
//! Every state other than `Open` answers `Stop` and ignores further items.

use tracing::{debug, trace};

use crate::error::{BoxError, StatusExt};
use crate::{Result, SlpError, Status};

/// Answer returned to the directory agent after each delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Request more results
    Continue,
    /// Halt delivery; honoured on a best-effort basis
    Stop,
}

impl Continuation {
    pub fn is_stop(self) -> bool {
        self == Continuation::Stop
    }
}

/// One delivery from a directory agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<T> {
    /// A result item
    Item(T),
    /// The agent failed while producing results
    Failed(Status),
    /// No further results will be delivered
    LastCall,
}

/// Outcome of a per-item handler
pub type HandlerResult = std::result::Result<Continuation, BoxError>;

/// Handler that asks for every item
pub fn continue_all<T>(_item: &T) -> HandlerResult {
    Ok(Continuation::Continue)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Stopped,
    Finished,
    Failed,
    Aborted,
}

/// Accumulating adapter between a directory agent and a per-item handler
pub struct Enumeration<T, H> {
    operation: &'static str,
    handler: H,
    items: Vec<T>,
    state: State,
    failure: Option<SlpError>,
}

impl<T, H> Enumeration<T, H>
where
    H: FnMut(&T) -> HandlerResult,
{
    pub fn new(operation: &'static str, handler: H) -> Self {
        Self {
            operation,
            handler,
            items: Vec::new(),
            state: State::Open,
            failure: None,
        }
    }

    /// Feed one delivery and return the signal for the directory agent
    pub fn deliver(&mut self, delivery: Delivery<T>) -> Continuation {
        if self.state != State::Open {
            trace!("{}: ignoring delivery after stop", self.operation);
            return Continuation::Stop;
        }

        match delivery {
            Delivery::Item(item) => {
                let decision = (self.handler)(&item);
                match decision {
                    Ok(Continuation::Continue) => {
                        self.items.push(item);
                        Continuation::Continue
                    }
                    Ok(Continuation::Stop) => {
                        self.items.push(item);
                        debug!("{}: handler requested stop", self.operation);
                        self.state = State::Stopped;
                        Continuation::Stop
                    }
                    Err(e) => {
                        debug!("{}: handler failed: {}", self.operation, e);
                        self.failure = Some(SlpError::handler(self.operation, e));
                        self.state = State::Aborted;
                        Continuation::Stop
                    }
                }
            }
            Delivery::Failed(status) => {
                debug!("{}: agent reported status {}", self.operation, status);
                self.failure = Some(SlpError::from_status(self.operation, status));
                self.state = State::Failed;
                Continuation::Stop
            }
            Delivery::LastCall => {
                self.state = State::Finished;
                Continuation::Stop
            }
        }
    }

    /// Whether the agent should keep delivering
    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    /// Close the enumeration given the status returned when it was issued
    ///
    /// Any failure discards the accumulated items. A handler failure takes
    /// precedence over agent statuses.
    pub fn finish(self, issued: std::result::Result<(), Status>) -> Result<Vec<T>> {
        if self.state == State::Aborted {
            if let Some(err) = self.failure {
                return Err(err);
            }
        }
        issued.or_slp(self.operation)?;
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.items),
        }
    }
}
