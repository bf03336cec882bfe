/**
 * Step 1: uniform-price merit-order clearing.
 */
mod clearing;
pub use clearing::UniformPriceClearer;

/**
 * The two-step pipeline tying the clearer to a settlement strategy.
 */
mod engine;
pub use engine::{ClearingError, Engine, strategy};

/**
 * Step 2: one settlement strategy per pricing mechanism.
 */
pub mod mechanisms;

/**
 * Exact and sampled Shapley values over an arbitrary welfare function.
 */
mod shapley;
pub use shapley::ShapleyEvaluator;

/**
 * The coalition welfare functions used by the value-based mechanisms.
 */
pub mod welfare;

#[cfg(feature = "io")]
pub mod io;

mod book;
pub(crate) use book::Book;

// Quantities at or below this are treated as exhausted
pub(crate) const QUANTITY_TOLERANCE: f64 = 1e-9;
