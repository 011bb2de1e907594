pub mod attempt;
pub mod notification;
pub mod ports;
pub mod run;
pub mod wallet;

pub use attempt::*;
pub use notification::*;
pub use ports::*;
pub use run::*;
pub use wallet::*;
