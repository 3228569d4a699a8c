pub mod metrics;
pub mod state;
pub mod ticker;

pub use metrics::{MockMetrics, PatientRisk, RiskFactor, RiskTier};
pub use state::LiveSimulationState;
pub use ticker::{LiveSimulationTicker, LiveSnapshot};
