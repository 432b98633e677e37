use crate::error::PreconditionError;
use crate::rule::Rule;
use crate::shoe::Shoe;
use crate::solver::RewardDistribution;

fn check_hand(player_total: u8, dealer_total: u8) -> Result<(), PreconditionError> {
    if player_total > 31 {
        return Err(PreconditionError::PlayerTotalTooHigh(player_total));
    }
    if !(2..=11).contains(&dealer_total) {
        return Err(PreconditionError::DealerTotalOutOfRange(dealer_total));
    }
    Ok(())
}

/// Thin layer over [`RewardDistribution`] that always maximizes plain
/// expectation (the identity utility function): compares two action
/// distributions and reports whether the first beats the second.
pub struct OptimalStrategist<'a> {
    solver: RewardDistribution<'a>,
}

impl<'a> OptimalStrategist<'a> {
    pub fn new(rule: &'a Rule) -> Self {
        OptimalStrategist {
            solver: RewardDistribution::new(rule, |w| w),
        }
    }

    pub fn free_mem(&mut self) {
        self.solver.free_mem();
    }

    pub fn should_hit(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Result<bool, PreconditionError> {
        check_hand(player_total, dealer_total)?;
        let hit = self.solver.distr_hit(shoe, player_total, player_aces, dealer_total);
        let stand = self
            .solver
            .distr_stand(shoe, player_total, (dealer_total == 11) as u8, dealer_total, true);
        Ok(hit.expected_value() > stand.expected_value())
    }

    pub fn should_double(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Result<bool, PreconditionError> {
        check_hand(player_total, dealer_total)?;
        let double = self.solver.distr_double(shoe, player_total, player_aces, dealer_total);
        let hit_stand = self.solver.distr_hit_stand(shoe, player_total, player_aces, dealer_total);
        Ok(double.expected_value() > hit_stand.expected_value())
    }

    pub fn should_split(
        &mut self,
        shoe: &mut Shoe,
        player_total: u8,
        player_aces: u8,
        dealer_total: u8,
    ) -> Result<bool, PreconditionError> {
        check_hand(player_total, dealer_total)?;
        let split = self.solver.distr_split(shoe, player_total, player_aces, dealer_total);
        let hit_stand_double = self
            .solver
            .distr_hit_stand_double(shoe, player_total, player_aces, dealer_total);
        Ok(split.expected_value() > hit_stand_double.expected_value())
    }
}
