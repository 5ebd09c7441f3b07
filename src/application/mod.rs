// Application layer - use cases and orchestration.
// The aggregators live in `domain`; this layer loads the owner's data from
// the repository, runs them, and shapes the results for presentation.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
