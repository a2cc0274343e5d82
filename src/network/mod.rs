pub mod network;
pub mod spec;
pub mod tape;

pub use network::Network;
pub use spec::NetworkSpec;
pub use tape::{GradientSet, Tape};
