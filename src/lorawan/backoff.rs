use rand_core::RngCore;

/// Exponential delay between join attempts with up to 25% random jitter.
#[derive(Clone, Debug)]
pub struct JoinBackoff {
	base_ms: u32,
	max_ms: u32,
	attempts: u32,
}

impl JoinBackoff {
	pub const fn new(base_ms: u32, max_ms: u32) -> Self {
		Self {
			base_ms,
			max_ms,
			attempts: 0,
		}
	}

	pub fn attempts(&self) -> u32 { self.attempts }

	pub fn next_delay_ms<R: RngCore>(&mut self, rng: &mut R) -> u32 {
		let delay = self
			.base_ms
			.saturating_mul(1 << self.attempts.min(16))
			.min(self.max_ms);
		self.attempts = self.attempts.saturating_add(1);

		let jitter_span = delay / 4;
		let jitter = match jitter_span {
			0 => 0,
			span => rng.next_u32() % (span + 1),
		};

		let delay = delay.saturating_add(jitter);
		debug!("join attempt {} failed, retry in {} ms", self.attempts, delay);

		delay
	}

	pub fn reset(&mut self) { self.attempts = 0; }
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::{SeedableRng, rngs::StdRng};

	#[test]
	fn delay_doubles_up_to_max() {
		let mut rng = StdRng::seed_from_u64(7);
		let mut backoff = JoinBackoff::new(1_000, 10_000);

		let expected_floor = [1_000, 2_000, 4_000, 8_000, 10_000, 10_000];
		for floor in expected_floor {
			let delay = backoff.next_delay_ms(&mut rng);
			assert!(delay >= floor, "{delay} < {floor}");
			assert!(delay <= floor + floor / 4, "{delay} > {floor} + 25%");
		}
		assert_eq!(backoff.attempts(), 6);
	}

	#[test]
	fn reset_starts_over() {
		let mut rng = StdRng::seed_from_u64(1);
		let mut backoff = JoinBackoff::new(500, 60_000);
		for _ in 0..5 {
			backoff.next_delay_ms(&mut rng);
		}

		backoff.reset();
		assert_eq!(backoff.attempts(), 0);
		assert!(backoff.next_delay_ms(&mut rng) <= 625);
	}

	#[test]
	fn many_attempts_do_not_overflow() {
		let mut rng = StdRng::seed_from_u64(3);
		let mut backoff = JoinBackoff::new(u32::MAX / 2, u32::MAX / 2);
		for _ in 0..40 {
			backoff.next_delay_ms(&mut rng);
		}
		assert_eq!(backoff.attempts(), 40);
	}
}
