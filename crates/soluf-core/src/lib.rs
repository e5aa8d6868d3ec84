pub mod error;
pub mod resolve;
pub mod rpc;
pub mod types;
pub mod walker;

#[cfg(test)]
mod test_util;

pub use error::{CoreError, NotFound, TransportError};
pub use resolve::{classify, Identifier, Resolved};
pub use walker::{chain_overview, recent_blocks, ChainOverview};
