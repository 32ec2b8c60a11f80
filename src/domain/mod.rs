mod address;
mod category;
mod item;
mod ledger;

pub use address::*;
pub use category::*;
pub use item::*;
pub use ledger::*;
