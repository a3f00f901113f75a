pub mod audit;
pub mod document;
pub mod enums;
pub mod filters;
pub mod report;
pub mod request;
pub mod review;
pub mod user;

pub use audit::*;
pub use document::*;
pub use enums::*;
pub use filters::*;
pub use report::*;
pub use request::*;
pub use review::*;
pub use user::*;
