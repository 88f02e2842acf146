mod client;
mod error;
mod insight;
mod soap;

pub use client::{Wemo, PORT};
pub use error::Error;
pub use insight::{BinaryState, InsightParams};
