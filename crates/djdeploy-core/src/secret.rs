use rand::Rng;
use secrecy::SecretString;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the generated Django `SECRET_KEY`.
pub const SECRET_KEY_LENGTH: usize = 50;

/// Length of generated database passwords.
pub const PASSWORD_LENGTH: usize = 20;

/// Random lowercase alphanumeric string, wrapped so it never reaches a log.
pub fn random_secret(length: usize) -> SecretString {
    let mut rng = rand::thread_rng();
    let value: String = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    SecretString::from(value)
}
