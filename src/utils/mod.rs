pub mod constants;
pub mod numeric;
pub mod progress;

pub use constants::*;
pub use numeric::{parse_number, without_sentinel, zero_pad};
pub use progress::ProgressReporter;
