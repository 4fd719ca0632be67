// Sequencer module - Step clock, step grid and the transport scheduler

pub mod clock;
pub mod grid;
pub mod scheduler;

pub use clock::{StepClock, Tempo};
pub use grid::{StepGrid, StepPattern};
pub use scheduler::{StepFire, StepScheduler, TransportState};
