mod retriever;
mod types;
mod url;

pub use retriever::*;
pub use types::*;
pub use url::*;
