//! In-memory backends
//!
//! Stand-ins for the browser collaborators so the whole engine can run and be
//! tested natively: an element tree with geometry and attributes, a sequencer
//! whose clock only moves when told to, and a frame scheduler that records
//! requests instead of calling back.
//!
//! Each backend is a cheap handle over shared state (`Rc<RefCell<_>>`): hand
//! one clone to the player and keep another to drive and inspect it.

mod scheduler;
mod sequencer;
mod surface;

pub use scheduler::ManualFrames;
pub use sequencer::ManualSequencer;
pub use surface::HeadlessSurface;
