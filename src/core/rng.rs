//! Seeded randomness for playouts and simulated clients.
//!
//! A `GameRng` is one ChaCha8 stream. Several simulated players can share
//! a seed and still choose independently by taking different streams
//! over the same key. The exact position can be checkpointed, so a
//! playout can be resumed mid-game and continue identically.
//!
//! ```
//! use kalaha_sync::core::GameRng;
//!
//! let mut alice = GameRng::with_stream(42, 0);
//! let mut alice_again = GameRng::with_stream(42, 0);
//! let houses = [0usize, 1, 2, 3, 4, 5];
//! assert_eq!(alice.choose(&houses), alice_again.choose(&houses));
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Stream 0 of `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    /// Stream `stream` of `seed`. Different streams never overlap.
    #[must_use]
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self { inner }
    }

    /// Uniformly pick one element, `None` for an empty slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        options.choose(&mut self.inner)
    }

    /// Shuffle in place, e.g. to scramble delivery order.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Capture the exact position.
    #[must_use]
    pub fn checkpoint(&self) -> RngCheckpoint {
        RngCheckpoint {
            key: self.inner.get_seed(),
            stream: self.inner.get_stream(),
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Continue from a checkpoint.
    #[must_use]
    pub fn resume(checkpoint: &RngCheckpoint) -> Self {
        let mut inner = ChaCha8Rng::from_seed(checkpoint.key);
        inner.set_stream(checkpoint.stream);
        inner.set_word_pos(checkpoint.word_pos);
        Self { inner }
    }
}

/// Serializable RNG position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngCheckpoint {
    /// Expanded ChaCha key.
    pub key: [u8; 32],
    /// Stream number.
    pub stream: u64,
    /// Word position within the stream.
    pub word_pos: u128,
}
