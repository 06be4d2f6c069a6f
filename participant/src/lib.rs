//! Participant side of the box workspace: a local mirror, a websocket
//! connection, and the small helpers a client needs to create boxes.

pub mod mirror;
pub mod net;

pub use mirror::Mirror;
pub use net::{ClientError, Connection};

use rand::Rng;
use rand::seq::IndexedRandom;

/// Colors offered to new boxes.
pub const PALETTE: [&str; 6] = ["#FF6B6B", "#4ECDC4", "#FFD166", "#06D6A0", "#118AB2", "#073B4C"];

/// Length of a generated participant label.
pub const USER_ID_LEN: usize = 8;

/// Pick a palette color at random.
#[must_use]
pub fn random_color() -> &'static str {
    PALETTE.choose(&mut rand::rng()).copied().unwrap_or(PALETTE[0])
}

/// Generate an ephemeral participant label. Not unique-enforced anywhere.
#[must_use]
pub fn new_user_id() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(USER_ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
