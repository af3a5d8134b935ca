pub mod replay;
pub mod yahoo;

pub use replay::ReplayProvider;
pub use yahoo::YahooClient;
