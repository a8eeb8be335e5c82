pub mod diagnostics;
pub mod error;
pub mod health;
pub mod location;
pub mod messages;
pub mod pin;
pub mod room;
pub mod user;

pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use location::*;
pub use messages::*;
pub use pin::*;
pub use room::*;
pub use user::*;
