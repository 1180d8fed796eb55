mod achievement;
mod analytics;
mod catalog;
mod league;
mod streak;

pub use achievement::*;
pub use analytics::*;
pub use catalog::*;
pub use league::*;
pub use streak::*;

pub use strum::IntoEnumIterator;
