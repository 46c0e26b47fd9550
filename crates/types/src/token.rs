//! Lookup token generation for issuer tooling.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated lookup tokens.
pub const LOOKUP_TOKEN_LENGTH: usize = 10;

/// Generate a random `[A-Za-z0-9]` lookup token using the thread RNG.
pub fn generate_lookup_token() -> String {
    generate_lookup_token_with(&mut rand::thread_rng())
}

/// Generate a lookup token from the supplied RNG.
pub fn generate_lookup_token_with<R: Rng>(rng: &mut R) -> String {
    (0..LOOKUP_TOKEN_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
