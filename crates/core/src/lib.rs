pub mod alert;
pub mod civil;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod state;

pub use alert::{Alert, AlertClass};
pub use civil::{Clock, CivilZone, FixedClock, FixedZone, IanaZone, SystemClock};
pub use config::Config;
pub use error::*;
pub use snapshot::ResourceSnapshot;
pub use state::{PersistedState, UserResponse};
