pub mod long_term;
pub mod short_term;

pub use long_term::LongTermMemory;
pub use short_term::ShortTermMemory;
