use thiserror::Error;

/// Raised once, at [`crate::Rule`] construction, when a rule flag falls
/// outside the envelope this engine's recursion is allowed to assume.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("blackjack_payout must be 1.5, got {0}")]
    InvalidBlackjackPayout(f64),
    #[error("shoe_size must be under 25 decks, got {0}")]
    ShoeTooLarge(u8),
    #[error("dealer_peeks must be true; this engine does not model a no-peek dealer")]
    PeekRequired,
}

/// Raised by the public strategist/bettor entry points before they recurse,
/// when the caller hands them a structurally invalid hand or shoe.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PreconditionError {
    #[error("shoe count for rank {0} would go negative")]
    NegativeShoeCount(u8),
    #[error("player total {0} exceeds the maximum of 31")]
    PlayerTotalTooHigh(u8),
    #[error("dealer total {0} is outside the valid range [2, 11]")]
    DealerTotalOutOfRange(u8),
}
