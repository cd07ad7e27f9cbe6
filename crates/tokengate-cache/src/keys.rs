//! Cache key builders for every entry the application writes.

/// Revocation state of one access token: `user_token:{username}:{token}`.
pub fn user_token(username: &str, token: &str) -> String {
    format!("user_token:{username}:{token}")
}

/// Set of token values registered for a user: `user_tokens:{username}`.
pub fn user_token_index(username: &str) -> String {
    format!("user_tokens:{username}")
}

/// Marker for a signed email link that has been redeemed: `used_link:{id}`.
pub fn used_link(link_id: &str) -> String {
    format!("used_link:{link_id}")
}
