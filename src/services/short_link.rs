use rand::distributions::Alphanumeric;
use rand::Rng;

pub const SHORT_CODE_LEN: usize = 10;

/// Random code stored on each recipe and resolved by `GET /s/{code}`.
pub fn generate_short_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_CODE_LEN)
        .map(char::from)
        .collect()
}
