//! SHA-256 hash engine
//!
//! A from-scratch implementation of the FIPS 180-4 secure hash: Merkle–Damgård
//! over 512-bit blocks, a 64-word message schedule and 64 compression rounds
//! over eight 32-bit working registers.
//!
//! The engine is streaming. [`Sha256::update`] may be called any number of
//! times and [`Sha256::finalize`] applies the padding, so the result never
//! depends on how the input was chunked.

use crate::hashing::{Digest, HASH_BYTE_SIZE};
use crate::{CryptoError, Result};

/// Size of one compression block in bytes (512 bits)
pub const BLOCK_SIZE: usize = 64;

/// Largest message, in bytes, whose bit length fits the 64-bit length field
pub const MAX_MESSAGE_BYTES: u64 = u64::MAX / 8;

/// Offset inside the final block where the 64-bit length field starts
const LENGTH_OFFSET: usize = BLOCK_SIZE - 8;

/// Initial hash value H(0): first 32 bits of the fractional parts of the
/// square roots of the first eight primes
const INITIAL_STATE: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// Round constants K: first 32 bits of the fractional parts of the cube roots
/// of the first sixty-four primes
const ROUND_CONSTANTS: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Streaming SHA-256 state
#[derive(Clone)]
pub struct Sha256 {
    state: [u32; 8],
    buffer: [u8; BLOCK_SIZE],
    buffered: usize,
    bytes_processed: u64,
}

impl Sha256 {
    /// Create a hasher in the initial state
    pub fn new() -> Self {
        Self {
            state: INITIAL_STATE,
            buffer: [0u8; BLOCK_SIZE],
            buffered: 0,
            bytes_processed: 0,
        }
    }

    /// Feed more message bytes
    ///
    /// Fails with [`CryptoError::MessageTooLong`] if the total message would
    /// no longer have a bit length representable in 64 bits. The hasher is
    /// left unchanged in that case.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let additional = data.len() as u64;
        match self.bytes_processed.checked_add(additional) {
            Some(total) if total <= MAX_MESSAGE_BYTES => {}
            _ => {
                return Err(CryptoError::MessageTooLong {
                    bytes_processed: self.bytes_processed,
                    additional,
                })
            }
        }
        self.absorb(data);
        Ok(())
    }

    /// Apply the padding and produce the digest
    pub fn finalize(mut self) -> Digest {
        let bit_len = self.bytes_processed.wrapping_mul(8);

        // One `1` bit, zeros up to 448 mod 512, then the 64-bit big-endian length.
        let mut padding = [0u8; BLOCK_SIZE * 2];
        padding[0] = 0x80;
        let zeros_end = if self.buffered < LENGTH_OFFSET {
            LENGTH_OFFSET - self.buffered
        } else {
            BLOCK_SIZE + LENGTH_OFFSET - self.buffered
        };
        padding[zeros_end..zeros_end + 8].copy_from_slice(&bit_len.to_be_bytes());
        self.absorb(&padding[..zeros_end + 8]);
        debug_assert_eq!(self.buffered, 0);

        let mut out = [0u8; HASH_BYTE_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Digest::new(out)
    }

    /// Number of message bytes fed so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Reset to the initial state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Buffer `data` and compress every full block. Callers guarantee the
    /// length precondition.
    pub(crate) fn absorb(&mut self, data: &[u8]) {
        self.bytes_processed = self.bytes_processed.saturating_add(data.len() as u64);
        let mut input = data;

        if self.buffered > 0 {
            let take = (BLOCK_SIZE - self.buffered).min(input.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&input[..take]);
            self.buffered += take;
            input = &input[take..];
            if self.buffered < BLOCK_SIZE {
                return;
            }
            let block = self.buffer;
            compress(&mut self.state, &block);
            self.buffered = 0;
        }

        let mut blocks = input.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            compress(&mut self.state, block);
        }
        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffered = rest.len();
    }
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a complete message in one call
pub fn digest(data: &[u8]) -> Result<Digest> {
    let mut hasher = Sha256::new();
    hasher.update(data)?;
    Ok(hasher.finalize())
}

/// Run the compression function over one 64-byte block
fn compress(state: &mut [u32; 8], block: &[u8]) {
    debug_assert_eq!(block.len(), BLOCK_SIZE);

    let mut schedule = [0u32; 64];
    for (slot, word) in schedule.iter_mut().zip(block.chunks_exact(4)) {
        *slot = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
    }
    for t in 16..64 {
        schedule[t] = small_sigma1(schedule[t - 2])
            .wrapping_add(schedule[t - 7])
            .wrapping_add(small_sigma0(schedule[t - 15]))
            .wrapping_add(schedule[t - 16]);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;
    for (k, w) in ROUND_CONSTANTS.iter().zip(schedule.iter()) {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(choose(e, f, g))
            .wrapping_add(*k)
            .wrapping_add(*w);
        let t2 = big_sigma0(a).wrapping_add(majority(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for (word, register) in state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *word = word.wrapping_add(register);
    }
}

#[inline(always)]
fn choose(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (!x & z)
}

#[inline(always)]
fn majority(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (x & z) ^ (y & z)
}

#[inline(always)]
fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use sha2::Digest as _;

    fn reference(data: &[u8]) -> [u8; 32] {
        sha2::Sha256::digest(data).into()
    }

    #[rstest]
    #[case(b"", "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")]
    #[case(b"abc", "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    #[case(
        b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
        "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
    )]
    #[case(
        b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmnhijklmnoijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu",
        "cf5b16a778af8380036ce59e7b0492370b249b11e8f07a51afac45037afee9d1"
    )]
    fn test_published_vectors(#[case] input: &[u8], #[case] expected: &str) {
        assert_eq!(digest(input).unwrap().to_hex(), expected);
    }

    #[test]
    fn test_million_a() {
        let mut hasher = Sha256::new();
        let chunk = [b'a'; 1000];
        for _ in 0..1000 {
            hasher.update(&chunk).unwrap();
        }
        assert_eq!(
            hasher.finalize().to_hex(),
            "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
        );
    }

    #[rstest]
    #[case("hello world")]
    #[case("1111111111111111111111")]
    #[case("dsichsdchiuhcuiciusdcihsdhsdchs")]
    #[case("csuidhchsacihsiuch ioscioashciojsocijoijicjoicjiodjcwiojcwioqj cwijiojwqiocjq")]
    fn test_matches_reference_engine(#[case] input: &str) {
        assert_eq!(
            *digest(input.as_bytes()).unwrap().as_bytes(),
            reference(input.as_bytes())
        );
    }

    #[test]
    fn test_padding_boundaries() {
        // Lengths around the 55/56/64 byte edges where the length field spills
        // into an extra block.
        for len in [0usize, 1, 55, 56, 57, 63, 64, 65, 119, 120, 127, 128, 129] {
            let data = vec![0x5a; len];
            assert_eq!(
                *digest(&data).unwrap().as_bytes(),
                reference(&data),
                "length {len}"
            );
        }
    }

    #[test]
    fn test_bytes_processed_and_reset() {
        let mut hasher = Sha256::new();
        hasher.update(b"hello ").unwrap();
        hasher.update(b"world").unwrap();
        assert_eq!(hasher.bytes_processed(), 11);

        hasher.reset();
        assert_eq!(hasher.bytes_processed(), 0);
        hasher.update(b"abc").unwrap();
        assert_eq!(hasher.finalize(), digest(b"abc").unwrap());
    }

    #[test]
    fn test_message_too_long_rejected() {
        let mut hasher = Sha256::new();
        hasher.bytes_processed = MAX_MESSAGE_BYTES;

        assert!(hasher.update(b"").is_ok());
        let err = hasher.update(b"x").unwrap_err();
        assert!(matches!(
            err,
            CryptoError::MessageTooLong {
                bytes_processed: MAX_MESSAGE_BYTES,
                additional: 1
            }
        ));
        assert_eq!(hasher.bytes_processed(), MAX_MESSAGE_BYTES);
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_matter(
            data in proptest::collection::vec(any::<u8>(), 0..600),
            split in 0usize..600,
        ) {
            let split = split.min(data.len());
            let mut hasher = Sha256::new();
            hasher.update(&data[..split]).unwrap();
            hasher.update(&data[split..]).unwrap();

            let streamed = hasher.finalize();
            prop_assert_eq!(streamed, digest(&data).unwrap());
            prop_assert_eq!(*streamed.as_bytes(), reference(&data));
        }
    }
}
