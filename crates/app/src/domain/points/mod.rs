//! Points

pub mod errors;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod rewards;
pub mod wheel;

pub use errors::PointsError;
pub use ledger::PointsLedger;
pub use models::{NewRedemption, PointsRow, SpinIntent, SpinIntentUpdate, SpinIntentUuid, SpinState};
pub use repository::{MockPointsRepository, PointsRepository, RestPointsRepository};
pub use rewards::{REWARDS, Redemption, Reward, RewardStore, find_reward};
pub use wheel::{PrizeWheel, SEGMENTS, SPIN_STAKE, Spin, SpinOutcome, WheelSegment, resolve};
