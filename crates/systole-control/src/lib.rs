//! # Systole Control
//!
//! The organism's temporal and feedback machinery:
//!
//! - [`PulseGenerator`]: computes the inter-beat delay from the
//!   time-compression formula `(t1 * ln(u)) / (1 - 1/(k*p))` with `u = e^k`.
//! - [`GenomicPID`]: the proportional-integral-derivative controller that
//!   nudges the optimize weight toward the stability target, with
//!   anti-windup clamping, epsilon-reset, and a hard per-beat output bound.

pub mod pid;
pub mod pulse;

pub use pid::{GenomicPID, PidSample};
pub use pulse::PulseGenerator;
