use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// A random lowercase alphanumeric name, safe to use as a filename on any filesystem
pub fn random_name(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod test {
    use super::random_name;

    #[test]
    fn names_are_lowercase_alphanumeric() {
        let name = random_name(64);

        assert_eq!(name.len(), 64);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
