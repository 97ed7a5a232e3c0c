use rand::Rng;

const UID_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UID_ALPHANUMERICS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of identifiers issued by the analytics platform
pub const UID_LENGTH: usize = 11;

/// Generate a platform-style identifier: a letter followed by ten alphanumerics
pub fn generate_uid() -> String {
    let mut rng = rand::rng();
    let mut uid = String::with_capacity(UID_LENGTH);
    uid.push(UID_LETTERS[rng.random_range(0..UID_LETTERS.len())] as char);
    for _ in 1..UID_LENGTH {
        uid.push(UID_ALPHANUMERICS[rng.random_range(0..UID_ALPHANUMERICS.len())] as char);
    }
    uid
}

/// True when the string is empty after trimming
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
