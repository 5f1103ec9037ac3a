pub mod alignment;
pub mod error;
pub mod io;
pub mod logger;
pub mod pairscore;
pub mod report;
pub mod round;
pub mod sched;
pub mod transport;
pub mod wire;
