use crate::util::{Error, Result};
use hex;
use murmur3::murmur3_32;
use rand::random;
use std::fmt;
use std::io::Cursor;
use std::num::Wrapping;

/// Maximum number of bytes in the bloom filter bit field
pub const BLOOM_FILTER_MAX_FILTER_SIZE: usize = 36000;

/// Maximum number of hash functions for the bloom filter
pub const BLOOM_FILTER_MAX_HASH_FUNCS: usize = 50;

/// Multiplier applied to the hash function index to derive each murmur3 seed (BIP-37)
const SEED_MULTIPLIER: u32 = 0xFBA4C795;

/// Bloom filter loaded into remote nodes so they only relay relevant transactions
#[derive(Default, PartialEq, Eq, Hash, Clone)]
pub struct BloomFilter {
    /// Filter bit field
    pub filter: Vec<u8>,
    /// Number of hash functions used
    pub num_hash_funcs: usize,
    /// Random tweak to generate the hash functions
    pub tweak: u32,
}

impl BloomFilter {
    /// Creates a new bloom filter with a random tweak
    ///
    /// * `insert` - Number of items expected to be inserted into the bloom filter
    /// * `pr_false_pos` - Desired probability of a false positive
    pub fn new(insert: f64, pr_false_pos: f64) -> Result<BloomFilter> {
        BloomFilter::with_tweak(insert, pr_false_pos, random())
    }

    /// Creates a new bloom filter sized the same way as bitcoind, with a caller-chosen tweak
    pub fn with_tweak(insert: f64, pr_false_pos: f64, tweak: u32) -> Result<BloomFilter> {
        if !insert.is_normal() || insert < 0. {
            return Err(Error::BadArgument("insert not valid".to_string()));
        }
        if !pr_false_pos.is_normal() || pr_false_pos < 0. {
            return Err(Error::BadArgument("pr_false_pos not valid".to_string()));
        }
        let ln2 = 2_f64.ln();
        let bits = -1_f64 / ln2.powf(2_f64) * insert * pr_false_pos.ln();
        let size = (bits / 8_f64).min(BLOOM_FILTER_MAX_FILTER_SIZE as f64).max(1.) as usize;
        let num_hash_funcs = (size as f64 * 8_f64 / insert * ln2)
            .min(BLOOM_FILTER_MAX_HASH_FUNCS as f64)
            .max(1.) as usize;
        debug!(
            "Creating bloom filter of size: {}, n_hash funcs: {}, tweak: {}",
            size, num_hash_funcs, tweak
        );
        Ok(BloomFilter {
            filter: vec![0; size],
            num_hash_funcs,
            tweak,
        })
    }

    /// Adds data to the bloom filter
    pub fn add(&mut self, data: &[u8]) {
        trace!("Adding to bloom filter: {:?}", hex::encode(&data));
        if self.filter.is_empty() {
            return;
        }
        for i in 0..self.num_hash_funcs {
            let bit = self.bit_index(i, data);
            self.filter[bit / 8] |= 1 << (bit % 8);
        }
    }

    /// Probabilistically returns whether the bloom filter contains the given data
    ///
    /// There may be false positives, but there won't be false negatives.
    pub fn contains(&self, data: &[u8]) -> bool {
        if self.filter.is_empty() {
            return false;
        }
        (0..self.num_hash_funcs).all(|i| {
            let bit = self.bit_index(i, data);
            self.filter[bit / 8] & 1 << (bit % 8) != 0
        })
    }

    /// Clears every bit while keeping the size, hash count and tweak
    pub fn clear(&mut self) {
        for byte in self.filter.iter_mut() {
            *byte = 0;
        }
    }

    /// Returns whether the BloomFilter is within the limits remote nodes accept
    pub fn validate(&self) -> Result<()> {
        if self.filter.len() > BLOOM_FILTER_MAX_FILTER_SIZE {
            return Err(Error::BadData("Filter too long".to_string()));
        }
        if self.num_hash_funcs > BLOOM_FILTER_MAX_HASH_FUNCS {
            return Err(Error::BadData("Too many hash funcs".to_string()));
        }
        Ok(())
    }

    fn bit_index(&self, i: usize, data: &[u8]) -> usize {
        let seed = Wrapping(i as u32) * Wrapping(SEED_MULTIPLIER) + Wrapping(self.tweak);
        let hash = murmur3_32(&mut Cursor::new(data), seed.0);
        (hash % (self.filter.len() as u32 * 8)) as usize
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("filter", &hex::encode(&self.filter))
            .field("num_hash_funcs", &self.num_hash_funcs)
            .field("tweak", &self.tweak)
            .finish()
    }
}
