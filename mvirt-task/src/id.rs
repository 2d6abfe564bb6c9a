//! Random task identities.

use uuid::Uuid;

/// Hex characters available from one random token.
const TOKEN_LEN: usize = 64;

/// Generate a random 64-character hex token.
fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Generate a random identity suffix of `len` hex characters.
///
/// Suffixes made only of digits are rejected and regenerated so they can
/// never be confused with a numeric index.
pub fn random_suffix(len: usize) -> String {
    let len = len.clamp(1, TOKEN_LEN);
    loop {
        let mut token = random_token();
        token.truncate(len);
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return token;
        }
    }
}

/// Build a task identity, prefixed by `name` when one is given.
pub fn task_id(name: &str, len: usize) -> String {
    let suffix = random_suffix(len);
    if name.is_empty() {
        suffix
    } else {
        format!("{name}.{suffix}")
    }
}
