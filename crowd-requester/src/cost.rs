const BASE_FEE: f64 = 0.2;
const LARGE_BATCH_FEE: f64 = 0.4;
const LARGE_BATCH_ASSIGNMENTS: u32 = 10;
const MIN_FEE_PER_ASSIGNMENT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
  pub total: f64,
  pub balance: f64,
}

impl CostEstimate {
  pub fn is_affordable(&self) -> bool {
    self.total <= self.balance
  }

  /// How much more money the account needs, if any
  pub fn shortfall(&self) -> Option<f64> {
    if self.is_affordable() {
      None
    } else {
      Some(round_cents(self.total - self.balance))
    }
  }
}

fn round_cents(amount: f64) -> f64 {
  (amount * 100.0).round() / 100.0
}

/// Reward plus marketplace fee per assignment. Tasks with ten or more assignments pay the higher
/// fee
pub fn cost_per_assignment(reward: f64, max_assignments: u32) -> f64 {
  let fee = if max_assignments < LARGE_BATCH_ASSIGNMENTS {
    BASE_FEE
  } else {
    LARGE_BATCH_FEE
  };

  (fee * reward).max(MIN_FEE_PER_ASSIGNMENT) + reward
}

pub fn estimate(
  item_count: usize,
  reward: f64,
  max_assignments: u32,
  balance: f64,
) -> CostEstimate {
  let total = round_cents(
    f64::from(max_assignments) * cost_per_assignment(reward, max_assignments) * item_count as f64,
  );

  CostEstimate { total, balance }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_applies_the_base_fee() {
    let estimate = estimate(100, 0.5, 3, 1000.0);

    assert_eq!(estimate.total, 180.0);
    assert!(estimate.is_affordable());
    assert_eq!(estimate.shortfall(), None);
  }

  #[test]
  fn it_applies_the_large_batch_fee() {
    assert_eq!(estimate(10, 1.0, 10, 0.0).total, 140.0);
  }

  #[test]
  fn it_charges_a_minimum_fee() {
    assert!((cost_per_assignment(0.02, 1) - 0.03).abs() < 1e-9);
    assert_eq!(estimate(3, 0.02, 1, 0.05).shortfall(), Some(0.04));
  }
}
