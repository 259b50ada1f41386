//! Index-windowed evaluation of utilization phases.
//!
//! Windows are expressed in accepted-sample indices. With dmon polling at
//! 1 Hz an index is roughly one second, but rows dropped by the parser shift
//! later samples earlier; timestamps are never consulted.

pub mod analyzer;
pub mod plan;
pub mod window;

pub use analyzer::analyze;
pub use analyzer::evaluate_phase;
pub use analyzer::PhaseResult;
pub use analyzer::PhaseStatus;
pub use plan::Phase;
pub use plan::PhasePlan;
pub use plan::Tolerance;
pub use window::block_averages;
pub use window::BlockSummary;
pub use window::WindowSize;
