pub mod report;
pub mod store;

pub use report::compute;
pub use store::Journal;
