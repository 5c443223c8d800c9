use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric string drawn from the thread-local CSPRNG.
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requested_length_and_charset() {
        let s = random_string(64);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn consecutive_values_differ() {
        assert_ne!(random_string(32), random_string(32));
    }
}
