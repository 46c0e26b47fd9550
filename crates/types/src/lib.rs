pub mod address;
pub mod credential;
pub mod event;
pub mod grade;
pub mod token;

pub use address::*;
pub use credential::*;
pub use event::*;
pub use grade::*;
pub use token::*;
