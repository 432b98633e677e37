use crate::shoe::Shoe;

/// Separates cache entries that share a hand shape but differ in meaning
/// (e.g. the first dealer-draw under peek vs. subsequent draws).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Split = 0,
    Double = 1,
    Hit = 2,
    StandFirst = 3,
    StandRest = 4,
    Blackjack = 5,
}

/// Positional decimal packing of `(shoe_counts[1..=13], player_total,
/// dealer_total, aces, mode)` into a 128-bit key: `mode` occupies the low
/// digit, then two decimal digits per shoe count, then two digits each for
/// `player_total`/`dealer_total`, then `aces`. A bijection as long as every
/// shoe count stays under 100, guaranteed by [`crate::Rule`] rejecting
/// `shoe_size >= 25`.
pub fn state_hash(shoe: &Shoe, player_total: u8, dealer_total: u8, aces: u8, mode: Mode) -> u128 {
    let mut hash: u128 = mode as u128;
    let mut mul: u128 = 10;

    for rank in 1..=13u8 {
        hash += shoe.count(rank) as u128 * mul;
        mul *= 100;
    }
    hash += player_total as u128 * mul;
    mul *= 100;
    hash += dealer_total as u128 * mul;
    mul *= 100;
    hash += aces as u128 * mul;

    hash
}
