use hmac::{Hmac, Mac};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::Sha256;

pub type HmacSha256 = Hmac<Sha256>;

/// Source of uniform floats in `[0, 1)` behind every random decision the game makes.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..n`. `n` must be non-zero.
    fn pick(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let idx = (self.next_f64() * n as f64).floor() as usize;
        idx.min(n - 1)
    }

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Non-reproducible source used in production, backed by `StdRng`.
pub struct EntropySource(StdRng);

impl EntropySource {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

pub fn derive_hash(input: &[u8]) -> [u8; 32] {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    hasher.update(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(derive_hash(input))
}

// server_seed (secret) + client_seed + nonce -> HMAC-SHA256 -> 4-byte chunks -> floats in [0,1)
// The byte stream is extended by hashing the previous block once it runs out.
pub struct HmacSource {
    server_seed: String,
    client_seed: String,
    nonce: u64,
    buffer: [u8; 32],
    cursor: usize,
}

impl HmacSource {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        let server_seed = server_seed.into();
        let client_seed = client_seed.into();
        let buffer = hmac_bytes(&server_seed, &client_seed, nonce);
        Self {
            server_seed,
            client_seed,
            nonce,
            buffer,
            cursor: 0,
        }
    }

    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

fn hmac_bytes(server_seed: &str, client_seed: &str, nonce: u64) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(server_seed.as_bytes()).expect("HMAC key");
    mac.update(format!("{client_seed}:{nonce}").as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

impl RandomSource for HmacSource {
    fn next_f64(&mut self) -> f64 {
        if self.cursor + 4 > self.buffer.len() {
            self.buffer = derive_hash(&self.buffer);
            self.cursor = 0;
        }
        let chunk = &self.buffer[self.cursor..self.cursor + 4];
        let v = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        self.cursor += 4;
        (v as f64) / (u32::MAX as f64 + 1.0)
    }
}

/// Replays a fixed list of floats, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let mut values: Vec<f64> = values.into();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values, cursor: 0 }
    }

    pub fn repeat(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedSequence {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
