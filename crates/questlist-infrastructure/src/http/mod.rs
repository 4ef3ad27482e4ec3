mod remote_stats;

pub use remote_stats::{HttpRemoteStatsGateway, RetryConfig};
