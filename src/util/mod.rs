//! Miscellaneous helpers

use std::time::SystemTime;

mod bloom_filter;
mod hash256;
mod result;
mod serdes;
pub(crate) mod var_int;

pub use self::bloom_filter::{
    BloomFilter, BLOOM_FILTER_MAX_FILTER_SIZE, BLOOM_FILTER_MAX_HASH_FUNCS,
};
pub use self::hash256::{sha256d, Hash256};
pub use self::result::{Error, Result};
pub use self::serdes::Serializable;

/// Gets the time in seconds since a time in the past
///
/// Returns 0 if the system clock is set before `time`.
pub fn secs_since(time: SystemTime) -> u32 {
    match SystemTime::now().duration_since(time) {
        Ok(duration) => duration.as_secs() as u32,
        Err(_) => 0,
    }
}
