use std::collections::HashMap;

use crate::distribution::{Distribution, BUCKETS};
use crate::hasher::{state_hash, Mode};
use crate::rule::Rule;
use crate::shoe::{card_value, is_ace, Shoe};

/// Demotes a soft ace whenever `player_total` has busted and an unresolved
/// ace can absorb it: `player_total -= 10; player_aces -= 1`.
fn normalize(mut player_total: u8, mut player_aces: u8) -> (u8, u8) {
    while player_total > 21 && player_aces > 0 {
        player_total -= 10;
        player_aces -= 1;
    }
    (player_total, player_aces)
}

/// The dealer's initial unresolved-ace count for a fresh draw: `1` if the
/// up-card itself is an ace (`dealer_total == 11`), `0` otherwise.
fn initial_dealer_aces(dealer_total: u8) -> u8 {
    (dealer_total == 11) as u8
}

/// Recursive, memoized payout-distribution solver. Release the cache with
/// [`RewardDistribution::free_mem`].
pub struct RewardDistribution<'a> {
    rule: &'a Rule,
    utility: [f64; BUCKETS],

    win: Distribution,
    lose: Distribution,
    tie: Distribution,
    blackjack: Distribution,

    cache: HashMap<u128, Distribution>,
}

impl<'a> RewardDistribution<'a> {
    pub fn new(rule: &'a Rule, utility_fn: impl Fn(f64) -> f64) -> Self {
        let mut utility = [0.0; BUCKETS];
        for (i, u) in utility.iter_mut().enumerate() {
            *u = utility_fn((i as f64 - 8.0) / 2.0);
        }

        RewardDistribution {
            rule,
            utility,
            win: Distribution::constant(1.0),
            lose: Distribution::constant(-1.0),
            tie: Distribution::constant(0.0),
            blackjack: Distribution::constant(rule.blackjack_payout),
            cache: HashMap::new(),
        }
    }

    pub fn free_mem(&mut self) {
        self.cache.clear();
    }

    fn value_of(&self, d: &Distribution) -> f64 {
        d.dot(&self.utility)
    }

    /// Keeps `a` on a tie, so the first operand wins ties deterministically.
    fn better(&self, a: Distribution, b: Distribution) -> Distribution {
        if self.value_of(&b) > self.value_of(&a) {
            b
        } else {
            a
        }
    }

    fn cache_get_or_insert(
        &mut self,
        hash: u128,
        compute: impl FnOnce(&mut Self) -> Distribution,
    ) -> Distribution {
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }
        let d = compute(self);
        self.cache.insert(hash, d);
        d
    }

    /// With `banned_value == 0`, `shoe[card] / total`. Otherwise zeroes every
    /// rank whose *value* equals `banned_value` and normalizes over the rest.
    fn card_probability(shoe: &Shoe, card: u8, banned_value: u8) -> f64 {
        if banned_value == 0 {
            let total = shoe.total();
            if total == 0 {
                return 0.0;
            }
            return shoe.count(card) as f64 / total as f64;
        }

        if card_value(card) == banned_value {
            return 0.0;
        }
        let banned_count: u32 = (1..=13).filter(|&r| card_value(r) == banned_value).map(|r| shoe.count(r)).sum();
        let remaining = shoe.total().saturating_sub(banned_count);
        if remaining == 0 {
            return 0.0;
        }
        shoe.count(card) as f64 / remaining as f64
    }

    /// Distribution assuming the player hits once, then plays optimally.
    pub fn distr_hit(&mut self, shoe: &mut Shoe, player_total: u8, player_aces: u8, dealer_total: u8) -> Distribution {
        if player_total > 21 && player_aces > 0 {
            let (pt, pa) = normalize(player_total, player_aces);
            return self.distr_hit(shoe, pt, pa, dealer_total);
        }
        if player_total > 21 {
            return self.lose;
        }

        let hash = state_hash(shoe, player_total, dealer_total, player_aces, Mode::Hit);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let mut acc = Distribution::empty();
        for card in 1..=13u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let sub = self.distr_hit_stand(
                shoe,
                player_total + v,
                player_aces + is_ace(card) as u8,
                dealer_total,
            );
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        self.cache.insert(hash, acc);
        acc
    }

    /// Distribution assuming the player stands while the dealer draws to
    /// completion. `first_call` selects the peek-aware banned-card rule on
    /// the dealer's first hidden-card draw.
    pub fn distr_stand(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        dealer_aces: u8,
        dealer_total: u8,
        first_call: bool,
    ) -> Distribution {
        if dealer_total > 21 && dealer_aces > 0 {
            return self.distr_stand(shoe, player_total, dealer_aces - 1, dealer_total - 10, false);
        }
        if dealer_total > 21 {
            return self.win;
        }

        let dealer_stands =
            dealer_total > 17 || (dealer_total == 17 && (dealer_aces == 0 || !self.rule.hit_soft_17));
        if dealer_stands {
            return if player_total == dealer_total {
                self.tie
            } else if dealer_total > player_total {
                self.lose
            } else {
                self.win
            };
        }

        let mode = if first_call { Mode::StandFirst } else { Mode::StandRest };
        let hash = state_hash(shoe, player_total, dealer_total, dealer_aces, mode);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let banned_value = if first_call && dealer_total == 10 {
            11
        } else if first_call && dealer_total == 11 {
            10
        } else {
            0
        };

        let mut acc = Distribution::empty();
        for card in 1..=13u8 {
            let p = Self::card_probability(shoe, card, banned_value);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let sub = self.distr_stand(
                shoe,
                player_total,
                dealer_aces + is_ace(card) as u8,
                dealer_total + v,
                false,
            );
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        self.cache.insert(hash, acc);
        acc
    }

    /// Distribution of doubling down: one forced card then a forced stand,
    /// payout doubled.
    pub fn distr_double(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Distribution {
        let hash = state_hash(shoe, player_total, dealer_total, player_aces, Mode::Double);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let mut acc = Distribution::empty();
        for card in 1..=13u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let (pt, _pa) = normalize(player_total + v, player_aces + is_ace(card) as u8);
            let sub = if pt > 21 {
                self.lose
            } else {
                self.distr_stand(shoe, pt, initial_dealer_aces(dealer_total), dealer_total, true)
            };
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        let result = acc.double_payout();
        self.cache.insert(hash, result);
        result
    }

    /// Split of two equal non-ten, non-ace cards.
    pub fn distr_split_general(&mut self, shoe: &mut Shoe, card_value_pair: u8, dealer_total: u8) -> Distribution {
        let hash = state_hash(shoe, card_value_pair, dealer_total, 0, Mode::Split);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let mut acc = Distribution::empty();
        for card in 1..=13u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let pt = card_value_pair + v;
            let pa = is_ace(card) as u8;
            let sub = if self.rule.double_after_split {
                self.distr_hit_stand_double(shoe, pt, pa, dealer_total)
            } else {
                self.distr_hit_stand(shoe, pt, pa, dealer_total)
            };
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        let result = acc.self_convolve();
        self.cache.insert(hash, result);
        result
    }

    /// Split of two ten-valued cards. An ace drawn on a sub-hand yields
    /// blackjack, credited before self-convolution.
    pub fn distr_split_tens(&mut self, shoe: &mut Shoe, dealer_total: u8) -> Distribution {
        let hash = state_hash(shoe, 20, dealer_total, 0, Mode::Split);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let mut acc = Distribution::empty();
        for card in 2..=13u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let pt = 10 + v;
            let sub = if self.rule.double_after_split {
                self.distr_hit_stand_double(shoe, pt, 0, dealer_total)
            } else {
                self.distr_hit_stand(shoe, pt, 0, dealer_total)
            };
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        let p_ace = Self::card_probability(shoe, 1, 0);
        if p_ace > 0.0 {
            acc.add_scaled(&self.blackjack, p_ace);
        }

        let result = acc.self_convolve();
        self.cache.insert(hash, result);
        result
    }

    /// Split of two aces.
    pub fn distr_split_aces(&mut self, shoe: &mut Shoe, dealer_total: u8) -> Distribution {
        let hash = state_hash(shoe, 22, dealer_total, 2, Mode::Split);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let mut acc = Distribution::empty();
        for card in 1..=9u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let v = card_value(card);
            let (pt, pa) = normalize(11 + v, 1 + is_ace(card) as u8);
            let sub = if self.rule.hit_after_split_aces {
                if self.rule.double_after_split {
                    self.distr_hit_stand_double(shoe, pt, pa, dealer_total)
                } else {
                    self.distr_hit_stand(shoe, pt, pa, dealer_total)
                }
            } else {
                self.distr_stand(shoe, pt, initial_dealer_aces(dealer_total), dealer_total, true)
            };
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }
        for card in 10..=13u8 {
            let p = Self::card_probability(shoe, card, 0);
            if p <= 0.0 {
                continue;
            }
            shoe.remove_card(card);
            let sub = if self.rule.blackjack_with_split_aces {
                self.blackjack
            } else {
                self.distr_stand(shoe, 21, initial_dealer_aces(dealer_total), dealer_total, true)
            };
            acc.add_scaled(&sub, p);
            shoe.add_card(card);
        }

        let result = acc.self_convolve();
        self.cache.insert(hash, result);
        result
    }

    /// Dispatches to the right split variant. Precondition: `player_total`
    /// is even whenever `player_aces == 0`.
    pub fn distr_split(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Distribution {
        if player_aces > 0 {
            self.distr_split_aces(shoe, dealer_total)
        } else if player_total == 20 {
            self.distr_split_tens(shoe, dealer_total)
        } else {
            debug_assert!(player_total % 2 == 0, "split requires an even pair total");
            self.distr_split_general(shoe, player_total / 2, dealer_total)
        }
    }

    /// Max-utility choice between hitting and standing.
    pub fn distr_hit_stand(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Distribution {
        let stand = self.distr_stand(shoe, player_total, initial_dealer_aces(dealer_total), dealer_total, true);
        let hit = self.distr_hit(shoe, player_total, player_aces, dealer_total);
        self.better(stand, hit)
    }

    /// Three-way max over stand/hit/double. A two-card 21 is a natural and
    /// is never hit, stood on as an ordinary 21, or doubled.
    pub fn distr_hit_stand_double(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Distribution {
        if player_total == 21 {
            return self.distr_blackjack(shoe, dealer_total);
        }
        let stand = self.distr_stand(shoe, player_total, initial_dealer_aces(dealer_total), dealer_total, true);
        let hit = self.distr_hit(shoe, player_total, player_aces, dealer_total);
        let best_so_far = self.better(stand, hit);
        let double = self.distr_double(shoe, player_total, player_aces, dealer_total);
        self.better(best_so_far, double)
    }

    /// The player holds 21 on the initial two cards.
    pub fn distr_blackjack(&mut self, shoe: &mut Shoe, dealer_total: u8) -> Distribution {
        let hash = state_hash(shoe, 21, dealer_total, 0, Mode::Blackjack);
        if let Some(d) = self.cache.get(&hash) {
            return *d;
        }

        let result = if dealer_total < 10 {
            self.blackjack
        } else {
            let p = if dealer_total == 10 {
                Self::card_probability(shoe, 1, 0)
            } else {
                (10..=13u8).map(|rank| Self::card_probability(shoe, rank, 0)).sum()
            };
            let mut acc = Distribution::empty();
            acc.add_scaled(&self.tie, p);
            acc.add_scaled(&self.blackjack, 1.0 - p);
            acc
        };

        self.cache.insert(hash, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical_rule() -> Rule {
        Rule::new(false, true, true, true, false, false, 1.5, 6).unwrap()
    }

    #[test]
    fn hard_20_beats_splitting_tens_vs_10() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(1);
        shoe.remove_card(10);
        shoe.remove_card(10);
        shoe.remove_card(10);

        let stand_hit_double = solver.distr_hit_stand_double(&mut shoe, 20, 0, 10);
        let split = solver.distr_split_tens(&mut shoe, 10);

        assert!(stand_hit_double.expected_value() > 0.55);
        assert!(stand_hit_double.expected_value() > split.expected_value());
    }

    #[test]
    fn soft_18_vs_6_favors_doubling_on_an_infinite_shoe() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::new({
            let mut c = [0u32; 14];
            for rank in 1..=13 {
                c[rank] = 100;
            }
            c
        });

        let double = solver.distr_double(&mut shoe, 18, 1, 6);
        let hit_stand = solver.distr_hit_stand(&mut shoe, 18, 1, 6);
        assert!(double.expected_value() > hit_stand.expected_value());
    }

    #[test]
    fn pair_of_8s_vs_10_should_split() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(6);
        shoe.remove_card(8);
        shoe.remove_card(8);
        shoe.remove_card(10);

        let split = solver.distr_split(&mut shoe, 16, 0, 10);
        let hit_stand_double = solver.distr_hit_stand_double(&mut shoe, 16, 0, 10);
        assert!(split.expected_value() > hit_stand_double.expected_value());
    }

    #[test]
    fn split_aces_dominates_hitting_on_twelve_for_every_upcard() {
        let rule = typical_rule();
        for dealer_total in 2..=11u8 {
            let mut solver = RewardDistribution::new(&rule, |w| w);
            let mut shoe = Shoe::with_number_of_decks(6);
            shoe.remove_card(1);
            shoe.remove_card(1);
            let dealer_rank = if dealer_total == 11 { 1 } else { dealer_total };
            shoe.remove_card(dealer_rank);

            let split = solver.distr_split_aces(&mut shoe, dealer_total);
            let hit_stand_double = solver.distr_hit_stand_double(&mut shoe, 12, 1, dealer_total);
            assert!(
                split.expected_value() > hit_stand_double.expected_value(),
                "failed for dealer_total = {dealer_total}"
            );
        }
    }

    #[test]
    fn blackjack_vs_dealer_ace_only_ties_or_pays() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(6);
        shoe.remove_card(1);
        shoe.remove_card(1);
        shoe.remove_card(10);

        let d = solver.distr_blackjack(&mut shoe, 11);
        let tie_mass = d.0[8];
        let blackjack_mass = d.0[8 + ((1.5 * 2.0) as usize)];
        assert!((tie_mass + blackjack_mass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hit_and_stand_distributions_are_probabilities() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(2);
        shoe.remove_card(7);
        shoe.remove_card(5);
        shoe.remove_card(9);

        let hit = solver.distr_hit(&mut shoe, 12, 0, 9);
        assert!((hit.sum() - 1.0).abs() < 1e-9);

        let stand = solver.distr_stand(&mut shoe, 12, 0, 9, true);
        assert!((stand.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn doubling_confines_mass_to_even_buckets_of_the_doubled_range() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(4);
        shoe.remove_card(6);
        shoe.remove_card(5);
        shoe.remove_card(10);

        let d = solver.distr_double(&mut shoe, 11, 0, 10);
        assert!((d.sum() - 1.0).abs() < 1e-9);
        for (i, mass) in d.0.iter().enumerate() {
            if *mass > 0.0 {
                assert_eq!(i % 2, 0, "odd bucket {i} carries mass after doubling");
            }
        }
    }

    #[test]
    fn memoization_is_idempotent() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(4);
        shoe.remove_card(6);
        shoe.remove_card(5);
        shoe.remove_card(10);

        let first = solver.distr_hit_stand_double(&mut shoe, 11, 0, 10);
        let second = solver.distr_hit_stand_double(&mut shoe, 11, 0, 10);
        assert_eq!(first.0, second.0);
    }

    #[test]
    fn shoe_is_unchanged_after_a_full_evaluation() {
        let rule = typical_rule();
        let mut solver = RewardDistribution::new(&rule, |w| w);
        let mut shoe = Shoe::with_number_of_decks(3);
        shoe.remove_card(9);
        shoe.remove_card(2);
        shoe.remove_card(10);
        let before = shoe;

        let _ = solver.distr_hit_stand_double(&mut shoe, 11, 0, 10);
        assert_eq!(shoe, before);
    }

    #[test]
    fn double_after_split_never_hurts_split_expectation() {
        let mut shoe = Shoe::with_number_of_decks(6);
        shoe.remove_card(9);
        shoe.remove_card(9);
        shoe.remove_card(7);

        let rule_without = Rule::new(false, true, false, true, false, false, 1.5, 6).unwrap();
        let mut solver_without = RewardDistribution::new(&rule_without, |w| w);
        let without = solver_without.distr_split(&mut shoe, 18, 0, 7);

        let rule_with = Rule::new(false, true, true, true, false, false, 1.5, 6).unwrap();
        let mut solver_with = RewardDistribution::new(&rule_with, |w| w);
        let with = solver_with.distr_split(&mut shoe, 18, 0, 7);

        assert!(with.expected_value() >= without.expected_value() - 1e-9);
    }

    fn generate_random_shoe(number_of_decks: u8) -> Shoe {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut shoe = Shoe::with_number_of_decks(number_of_decks);
        for _ in 0..rng.gen_range(0..=10) {
            let rank = rng.gen_range(1..=13u8);
            if shoe.count(rank) > 0 {
                shoe.remove_card(rank);
            }
        }
        shoe
    }

    #[test]
    fn draw_distributions_stay_probabilities_on_random_shoes() {
        use rand::Rng;
        let rule = typical_rule();
        let mut rng = rand::thread_rng();
        for _turn in 0..30 {
            let mut solver = RewardDistribution::new(&rule, |w| w);
            let mut shoe = generate_random_shoe(6);
            let player_total = rng.gen_range(4..=20u8);
            let dealer_total = rng.gen_range(2..=11u8);

            let hit = solver.distr_hit(&mut shoe, player_total, 0, dealer_total);
            assert!((hit.sum() - 1.0).abs() < 1e-9, "distr_hit mass != 1 for pt={player_total} dt={dealer_total}");

            let stand = solver.distr_stand(&mut shoe, player_total, initial_dealer_aces(dealer_total), dealer_total, true);
            assert!((stand.sum() - 1.0).abs() < 1e-9, "distr_stand mass != 1 for pt={player_total} dt={dealer_total}");
        }
    }
}
