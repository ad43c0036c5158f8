// src/poll/mod.rs

//! Polling of a history until its content settles.
//!
//! The pure core state machine lives in [`core`]; the async shell that
//! actually refreshes and sleeps is [`driver`]. [`backoff`] computes the
//! inter-tick delay, [`clock`] abstracts time, and [`observer`] is how
//! results reach the rendering layer.

pub mod backoff;
pub mod clock;
pub mod core;
pub mod driver;
pub mod observer;

pub use backoff::BackoffPolicy;
pub use clock::{Clock, TokioClock};
pub use self::core::{PollCommand, PollCore, PollSettings, PollState, TickDecision};
pub use driver::{PollOutcome, Poller};
pub use observer::{Callbacks, ChannelObserver, PollEvent, PollObserver, PollUpdate};
