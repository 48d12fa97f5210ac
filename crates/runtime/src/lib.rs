//! Single-threaded reactive runtime: observable cells, deferred effects and a
//! replayable trace of what ran in which frame.

pub mod atom;
pub mod effect;
pub mod event_bus;
pub mod frame;
pub mod job;
pub mod scheduler;

pub use atom::*;
pub use effect::*;
pub use event_bus::*;
pub use frame::*;
pub use job::*;
pub use scheduler::*;
