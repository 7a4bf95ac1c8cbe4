//! Cryptographically random password and username generation.
//!
//! Every call draws fresh bytes from the operating system RNG
//! ([`rand::rngs::OsRng`]). If the OS randomness source fails, `rand`
//! aborts the process; there is no degraded mode for credential material.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shortest password or username this module will produce.
const MIN_LENGTH: usize = 8;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const PUNCTUATION: &[u8] = b"!@#$%^&*()-_=+[]{}|;:,.<>?";

/// Generates a password of `max(length, 8)` characters.
///
/// The result contains, by construction, at least two uppercase letters,
/// two lowercase letters, two digits, and one punctuation character from
/// `!@#$%^&*()-_=+[]{}|;:,.<>?`. Remaining positions are drawn uniformly
/// from the union of those alphabets, and the whole buffer is shuffled by
/// a cryptographically random permutation so the guaranteed characters are
/// not predictably placed.
///
/// # Example
///
/// ```
/// let password = rotavault::generator::generate_password(16);
/// assert_eq!(password.len(), 16);
/// assert!(password.chars().filter(|c| c.is_ascii_uppercase()).count() >= 2);
/// ```
pub fn generate_password(length: usize) -> String {
    let length = length.max(MIN_LENGTH);
    let mut rng = OsRng;
    let mut chars: Vec<u8> = Vec::with_capacity(length);

    for _ in 0..2 {
        chars.push(UPPERCASE[rng.gen_range(0..UPPERCASE.len())]);
        chars.push(LOWERCASE[rng.gen_range(0..LOWERCASE.len())]);
        chars.push(DIGITS[rng.gen_range(0..DIGITS.len())]);
    }
    chars.push(PUNCTUATION[rng.gen_range(0..PUNCTUATION.len())]);

    let union_len = UPPERCASE.len() + LOWERCASE.len() + DIGITS.len() + PUNCTUATION.len();
    while chars.len() < length {
        let mut i = rng.gen_range(0..union_len);
        for alphabet in [UPPERCASE, LOWERCASE, DIGITS, PUNCTUATION] {
            if i < alphabet.len() {
                chars.push(alphabet[i]);
                break;
            }
            i -= alphabet.len();
        }
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

/// Generates a username of `max(length, 8)` total characters.
///
/// The result starts with `prefix` verbatim (`u` when the prefix is empty)
/// followed by uniformly random alphanumeric characters; punctuation never
/// appears. A prefix longer than the requested length is preserved whole
/// and nothing is appended.
///
/// # Example
///
/// ```
/// let username = rotavault::generator::generate_username("svc", 16);
/// assert_eq!(username.len(), 16);
/// assert!(username.starts_with("svc"));
/// assert!(username.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_username(prefix: &str, length: usize) -> String {
    let length = length.max(MIN_LENGTH);
    let prefix = if prefix.is_empty() { "u" } else { prefix };

    let mut rng = OsRng;
    let mut username = String::with_capacity(length);
    username.push_str(prefix);
    username.extend(
        (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(length.saturating_sub(prefix.len()))
            .map(char::from),
    );
    username
}
