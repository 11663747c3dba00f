mod account;
mod money;
mod reference;
mod transaction;
mod user;

pub use account::*;
pub use money::*;
pub use reference::*;
pub use transaction::*;
pub use user::*;
