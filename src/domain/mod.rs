mod breakdown;
mod category;
mod money;
mod monthly;
mod summary;
mod transaction;
mod validation;

pub use breakdown::*;
pub use category::*;
pub use money::*;
pub use monthly::*;
pub use summary::*;
pub use transaction::*;
pub use validation::*;
