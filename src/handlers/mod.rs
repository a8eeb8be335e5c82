pub mod diagnostics;
pub mod health;
pub mod pins;
pub mod rooms;
pub mod users;

pub use diagnostics::*;
pub use health::*;
pub use pins::*;
pub use rooms::*;
pub use users::*;
