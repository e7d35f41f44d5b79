use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Deterministic token for a username: `hex(sha256(username || secret_key))`.
pub fn token_for(username: &str, secret_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Maps a presented token back to the user it belongs to, or `None` when it
/// matches no known user.
pub fn resolve_token<'a>(
    token: &str,
    users: &'a HashMap<String, String>,
    secret_key: &str,
) -> Option<&'a str> {
    users
        .keys()
        .find(|username| token_for(username, secret_key) == token)
        .map(String::as_str)
}
