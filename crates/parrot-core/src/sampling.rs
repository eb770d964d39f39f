use rand::Rng;

use crate::model::Candidate;

/// Pick one candidate with probability proportional to its count.
///
/// Zero-count candidates are never chosen. Returns `None` when the pool is
/// empty or carries no weight.
pub fn weighted_choice<'a, R: Rng>(
    rng: &mut R,
    candidates: &'a [Candidate],
) -> Option<&'a Candidate> {
    let total: u64 = candidates.iter().map(|c| c.count).sum();
    if total == 0 {
        return None;
    }

    let target = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for candidate in candidates {
        cumulative += candidate.count;
        if target < cumulative {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidate(token: &str, count: u64) -> Candidate {
        Candidate {
            token: token.to_string(),
            count,
        }
    }

    #[test]
    fn test_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(weighted_choice(&mut rng, &[]).is_none());
        assert!(weighted_choice(&mut rng, &[candidate("x", 0)]).is_none());
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(2);
        let pool = [candidate("x", 0), candidate("y", 3)];
        for _ in 0..100 {
            assert_eq!(weighted_choice(&mut rng, &pool).unwrap().token, "y");
        }
    }

    #[test]
    fn test_weighted_bias() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = [candidate("x", 9), candidate("y", 1)];
        let trials = 10_000;
        let hits = (0..trials)
            .filter(|_| weighted_choice(&mut rng, &pool).unwrap().token == "x")
            .count();
        let ratio = hits as f64 / trials as f64;
        assert!((0.87..=0.93).contains(&ratio), "x chosen {ratio}");
    }
}
