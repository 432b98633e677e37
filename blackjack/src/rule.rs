use crate::error::ConfigError;

/// Rule-variation flags consumed by the distribution algebra, the state
/// hasher and the solver. Passed by reference into every constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    /// Dealer hits on soft 17.
    pub hit_soft_17: bool,
    /// Dealer peeks for blackjack before players act. Must be `true`.
    pub dealer_peeks: bool,
    /// Player may double on post-split hands.
    pub double_after_split: bool,
    /// Player may draw additional cards after splitting aces.
    pub hit_after_split_aces: bool,
    /// A ten drawn on a split ace pays blackjack rather than plain 21.
    pub blackjack_with_split_aces: bool,
    /// Any two equal-*value* cards may be split, not just identical ranks.
    pub split_any_equal_value: bool,
    /// Must equal 1.5.
    pub blackjack_payout: f64,
    /// Number of decks in the shoe. Must be under 25.
    pub shoe_size: u8,
}

impl Rule {
    pub fn new(
        hit_soft_17: bool,
        dealer_peeks: bool,
        double_after_split: bool,
        hit_after_split_aces: bool,
        blackjack_with_split_aces: bool,
        split_any_equal_value: bool,
        blackjack_payout: f64,
        shoe_size: u8,
    ) -> Result<Self, ConfigError> {
        if !dealer_peeks {
            return Err(ConfigError::PeekRequired);
        }
        if (blackjack_payout - 1.5).abs() > 1e-9 {
            return Err(ConfigError::InvalidBlackjackPayout(blackjack_payout));
        }
        if shoe_size >= 25 {
            return Err(ConfigError::ShoeTooLarge(shoe_size));
        }

        Ok(Rule {
            hit_soft_17,
            dealer_peeks,
            double_after_split,
            hit_after_split_aces,
            blackjack_with_split_aces,
            split_any_equal_value,
            blackjack_payout,
            shoe_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical_args() -> (bool, bool, bool, bool, bool, bool, f64, u8) {
        (true, true, true, true, true, false, 1.5, 6)
    }

    #[test]
    fn accepts_a_typical_configuration() {
        let (a, b, c, d, e, f, g, h) = typical_args();
        assert!(Rule::new(a, b, c, d, e, f, g, h).is_ok());
    }

    #[test]
    fn rejects_no_peek() {
        let (a, _, c, d, e, f, g, h) = typical_args();
        assert_eq!(
            Rule::new(a, false, c, d, e, f, g, h),
            Err(ConfigError::PeekRequired)
        );
    }

    #[test]
    fn rejects_wrong_blackjack_payout() {
        let (a, b, c, d, e, f, _, h) = typical_args();
        assert_eq!(
            Rule::new(a, b, c, d, e, f, 2.0, h),
            Err(ConfigError::InvalidBlackjackPayout(2.0))
        );
    }

    #[test]
    fn rejects_oversized_shoe() {
        let (a, b, c, d, e, f, g, _) = typical_args();
        assert_eq!(
            Rule::new(a, b, c, d, e, f, g, 25),
            Err(ConfigError::ShoeTooLarge(25))
        );
    }
}
