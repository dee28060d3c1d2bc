mod swarm_error;

pub use swarm_error::{SwarmError, SwarmResult};
