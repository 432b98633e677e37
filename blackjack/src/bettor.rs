use crate::distribution::Distribution;
use crate::rule::Rule;
use crate::shoe::{card_value, is_ace, Shoe};
use crate::solver::RewardDistribution;

/// Integrates over all initial deals to get a pre-deal payout distribution,
/// then solves a 1-D log-utility maximization for bet size.
pub struct KellyBettor<'a> {
    rule: &'a Rule,
}

impl<'a> KellyBettor<'a> {
    pub fn new(rule: &'a Rule) -> Self {
        KellyBettor { rule }
    }

    fn splittable(&self, c1: u8, c2: u8) -> bool {
        c1 == c2 || (self.rule.split_any_equal_value && card_value(c1) == card_value(c2))
    }

    /// `P(dealer's hole card yields blackjack | shown card)`, against the
    /// original, pre-removal shoe — the peek happens immediately after the
    /// deal, before this aggregation's card removals are meaningful.
    fn dealer_blackjack_probability(original_shoe: &Shoe, shown_value: u8) -> f64 {
        let total = original_shoe.total();
        if total == 0 || shown_value < 10 {
            return 0.0;
        }
        if shown_value == 11 {
            let tens: u32 = (10..=13u8).map(|r| original_shoe.count(r)).sum();
            tens as f64 / total as f64
        } else {
            original_shoe.count(1) as f64 / total as f64
        }
    }

    /// For each ordered triple `(player_first, player_second, dealer_shown)`,
    /// weights the best available action's distribution by the sequential
    /// probability of dealing that triple, folding in the dealer's peek
    /// outcome.
    pub fn pre_deal_distribution(&self, shoe: &Shoe) -> Distribution {
        let mut solver = RewardDistribution::new(self.rule, |w| w);
        let original_shoe = *shoe;
        let mut working = *shoe;
        let mut agg = Distribution::empty();

        for c1 in 1..=13u8 {
            if working.count(c1) == 0 {
                continue;
            }
            let n = working.total() as f64;
            let p1 = working.count(c1) as f64 / n;
            working.remove_card(c1);

            for c2 in 1..=13u8 {
                if working.count(c2) == 0 {
                    continue;
                }
                let n1 = working.total() as f64;
                let p2 = working.count(c2) as f64 / n1;
                working.remove_card(c2);

                for c3 in 1..=13u8 {
                    if working.count(c3) == 0 {
                        continue;
                    }
                    let n2 = working.total() as f64;
                    let p3 = working.count(c3) as f64 / n2;
                    let p = p1 * p2 * p3;

                    if p > 0.0 {
                        working.remove_card(c3);

                        let (pt, pa) = normalize_initial(c1, c2);
                        let dealer_shown = card_value(c3);

                        let mut best = solver.distr_hit_stand_double(&mut working, pt, pa, dealer_shown);
                        if self.splittable(c1, c2) {
                            let split = solver.distr_split(&mut working, pt, pa, dealer_shown);
                            if split.expected_value() > best.expected_value() {
                                best = split;
                            }
                        }

                        let q = Self::dealer_blackjack_probability(&original_shoe, dealer_shown);
                        agg.add_scaled(&best, p * (1.0 - q));
                        let fallback = if pt == 21 {
                            Distribution::constant(0.0)
                        } else {
                            Distribution::constant(-1.0)
                        };
                        agg.add_scaled(&fallback, p * q);

                        working.add_card(c3);
                    }
                }

                working.add_card(c2);
            }
            working.add_card(c1);
        }

        solver.free_mem();
        agg
    }

    /// Maximizes `E[log(1 + bankroll + w * x)]` over `x` in `[1, bankroll]`
    /// via golden-section search; also checked against both endpoints.
    pub fn bet_size(&self, bankroll: f64, shoe: &Shoe) -> f64 {
        if bankroll <= 1.0 {
            return 1.0;
        }

        let distribution = self.pre_deal_distribution(shoe);
        let objective = |x: f64| log_utility(&distribution, bankroll, x);

        let mut candidates = vec![1.0, bankroll];
        if let Some(x) = golden_section_maximize(objective, 1.0, bankroll, 200) {
            candidates.push(x);
        }

        candidates
            .into_iter()
            .filter_map(|x| objective(x).map(|value| (x, value)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(x, _)| x)
            .unwrap_or(1.0)
    }
}

fn normalize_initial(c1: u8, c2: u8) -> (u8, u8) {
    let mut pt = card_value(c1) + card_value(c2);
    let mut pa = is_ace(c1) as u8 + is_ace(c2) as u8;
    while pt > 21 && pa > 0 {
        pt -= 10;
        pa -= 1;
    }
    (pt, pa)
}

fn log_utility(d: &Distribution, bankroll: f64, x: f64) -> Option<f64> {
    let mut total = 0.0;
    for (i, mass) in d.0.iter().enumerate() {
        if *mass <= 0.0 {
            continue;
        }
        let w = (i as f64 - 8.0) / 2.0;
        let wealth = 1.0 + bankroll + w * x;
        if wealth <= 0.0 {
            return None;
        }
        total += mass * wealth.ln();
    }
    Some(total)
}

fn golden_section_maximize(f: impl Fn(f64) -> Option<f64>, lo: f64, hi: f64, iterations: usize) -> Option<f64> {
    const RESPHI: f64 = 0.618_033_988_749_895;
    let (mut a, mut b) = (lo, hi);
    if b <= a {
        return None;
    }

    let mut c = b - RESPHI * (b - a);
    let mut d = a + RESPHI * (b - a);
    for _ in 0..iterations {
        match (f(c), f(d)) {
            (Some(fc), Some(fd)) => {
                if fc < fd {
                    a = c;
                } else {
                    b = d;
                }
            }
            (Some(_), None) => b = d,
            (None, Some(_)) => a = c,
            (None, None) => break,
        }
        c = b - RESPHI * (b - a);
        d = a + RESPHI * (b - a);
    }
    Some((a + b) / 2.0)
}
