pub mod dag;
pub mod errors;
pub mod model;
pub mod notifications;
pub mod pipeline;
pub mod processes;
pub mod time;

pub use dag::BlockDag;
pub use errors::{ConsensusError, ConsensusResult};
pub use pipeline::BehaviorFlags;
