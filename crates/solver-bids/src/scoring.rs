//! Bid scoring.

use alloy_primitives::U256;
use solver_types::Amount;

/// `reputation * amount_out / (execution_time + 1)`, floored.
///
/// The product is taken in 256 bits so it never overflows; only the quotient
/// saturates at `u128::MAX`.
pub fn score(reputation: u64, amount_out: Amount, execution_time: u64) -> u128 {
	let product = U256::from(reputation) * U256::from(amount_out);
	let divisor = U256::from(execution_time) + U256::from(1u8);
	u128::try_from(product / divisor).unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_score_examples() {
		assert_eq!(score(100, 100, 0), 10_000);
		assert_eq!(score(50, 1000, 0), 50_000);
		// floor(100 * 10 / 3)
		assert_eq!(score(100, 10, 2), 333);
		assert_eq!(score(0, 1000, 0), 0);
	}

	#[test]
	fn test_score_saturates() {
		assert_eq!(score(1000, u128::MAX, 0), u128::MAX);
		assert_eq!(score(u64::MAX, u128::MAX, 1), u128::MAX);
	}

	#[test]
	fn test_wide_product_is_divided_before_saturating() {
		// 1000 * (u128::MAX / 100) does not fit in 128 bits
		let slow = score(1000, u128::MAX / 100, u64::MAX);
		assert_eq!(slow, 184_467_440_737_095_516_159);
		assert_eq!(score(1000, u128::MAX, u64::MAX), 18_446_744_073_709_551_615_999);

		let fast = score(50, 10u128.pow(30), 0);
		assert_eq!(fast, 50 * 10u128.pow(30));
		assert!(slow < fast);
	}
}
