//! A light client protocol engine for talking to Bitcoin SV full nodes.

extern crate byteorder;
extern crate hex;
#[macro_use]
extern crate log;
extern crate murmur3;
extern crate rand;
extern crate ring;
extern crate snowflake;

pub mod messages;
pub mod network;
pub mod peer;
pub mod util;
