pub mod adx;
pub mod atr;
pub mod ema;

pub use adx::Adx;
pub use atr::Atr;
pub use ema::Ema;
