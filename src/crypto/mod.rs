pub mod keys;
pub mod phi_audit;
pub mod token;

pub use keys::*;
pub use token::*;
