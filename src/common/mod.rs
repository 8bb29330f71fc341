pub mod errors;
pub mod logger;
pub mod title;
pub mod types;

pub use errors::*;
pub use logger::*;
pub use title::*;
pub use types::*;
