use rand::{distributions::Alphanumeric, Rng};

/// Default length of generated optimistic keys.
pub(crate) const DEFAULT_KEY_LEN: usize = 8;

/// Random key over `[A-Za-z0-9]`.
pub(crate) fn generate(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
