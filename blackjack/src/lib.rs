//! A blackjack reward-distribution engine: given the exact multiset of
//! cards remaining in a shoe, the dealer's up-card and the player's hand,
//! computes the full probability distribution over the payout of every
//! legal player action, and derives the optimal action and the
//! Kelly-optimal bet size from it.

pub mod bettor;
pub mod distribution;
pub mod error;
pub mod hasher;
pub mod rule;
pub mod shoe;
pub mod solver;
pub mod strategist;

pub use bettor::KellyBettor;
pub use distribution::Distribution;
pub use error::{ConfigError, PreconditionError};
pub use hasher::Mode;
pub use rule::Rule;
pub use shoe::{card_value, is_ace, Shoe};
pub use solver::RewardDistribution;
pub use strategist::OptimalStrategist;
