use std::time::Duration;

/// A small xorshift PRNG seeded from the failing job's id, so repeated
/// retries of the same job don't all land on the identical instant (thundering
/// herd) without pulling in a general-purpose RNG crate the rest of this
/// workspace doesn't otherwise depend on.
fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

fn seed_from(job_id: &str, attempt: u32) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in job_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash ^ u64::from(attempt).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Deterministic jitter in `[0, max_jitter]`, derived from `job_id` and the
/// attempt number that just failed.
#[must_use]
pub fn jitter_for(job_id: &str, attempt: u32, max_jitter: Duration) -> Duration {
    if max_jitter.is_zero() {
        return Duration::ZERO;
    }
    let seed = seed_from(job_id, attempt).max(1);
    let bounded = xorshift(seed) % (max_jitter.as_millis() as u64 + 1);
    Duration::from_millis(bounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_within_bounds() {
        let max = Duration::from_secs(10);
        for attempt in 1..20 {
            let d = jitter_for("job-abc", attempt, max);
            assert!(d <= max);
        }
    }

    #[test]
    fn jitter_is_deterministic_for_the_same_input() {
        let max = Duration::from_secs(10);
        assert_eq!(jitter_for("job-abc", 2, max), jitter_for("job-abc", 2, max));
    }

    #[test]
    fn jitter_varies_across_attempts() {
        let max = Duration::from_secs(300);
        let a = jitter_for("job-abc", 1, max);
        let b = jitter_for("job-abc", 2, max);
        assert_ne!(a, b);
    }

    #[test]
    fn zero_max_jitter_is_always_zero() {
        assert_eq!(jitter_for("job-abc", 1, Duration::ZERO), Duration::ZERO);
    }
}
