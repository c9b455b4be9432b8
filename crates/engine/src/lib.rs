pub mod cycle;
pub mod yahoo;

pub use cycle::{CycleOutcome, SignalEngine};
pub use yahoo::YahooClient;
