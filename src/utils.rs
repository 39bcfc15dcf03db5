//! Number helpers used by the growth policy of [`TransposeMap`](crate::TransposeMap)

/// Returns true if `n` is prime, by trial division up to its square root
#[must_use]
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }

    let mut divisor: usize = 3;
    while let Some(square) = divisor.checked_mul(divisor) {
        if square > n {
            break;
        }
        if n % divisor == 0 {
            return false;
        }
        divisor = divisor.saturating_add(2);
    }
    true
}

/// Returns the smallest prime strictly greater than `n`, or `None` if it does not fit in `usize`
#[must_use]
pub fn next_prime_after(n: usize) -> Option<usize> {
    let mut candidate = n.checked_add(1)?;
    while !is_prime(candidate) {
        candidate = candidate.checked_add(1)?;
    }
    Some(candidate)
}

/// Capacity the table grows to from `capacity`: the first prime above twice the current size
#[must_use]
pub fn grown_capacity(capacity: usize) -> Option<usize> {
    next_prime_after(capacity.checked_mul(2)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime() {
        let primes: Vec<usize> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
        assert!(is_prime(7919));
        assert!(!is_prime(7917));
    }

    #[test]
    fn test_next_prime_is_strictly_greater() {
        assert_eq!(next_prime_after(0), Some(2));
        assert_eq!(next_prime_after(2), Some(3));
        assert_eq!(next_prime_after(13), Some(17));
        assert_eq!(next_prime_after(32), Some(37));
        assert_eq!(next_prime_after(usize::MAX), None);
    }

    #[test]
    fn test_grown_capacity() {
        assert_eq!(grown_capacity(16), Some(37));
        assert_eq!(grown_capacity(37), Some(79));
        assert_eq!(grown_capacity(2), Some(5));
        assert_eq!(grown_capacity(0), Some(2));
        assert_eq!(grown_capacity(usize::MAX / 2 + 1), None);
    }
}
