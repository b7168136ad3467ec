//! Hostflake hands out 64-bit unique identifiers without any coordination
//! between processes. Each identifier is built from the time elapsed since a
//! fixed epoch, a machine id and a sequence value.
//!
//! Identifiers issued by one [`Generator`] are strictly increasing and never
//! repeat. Here are key points about ordering:
//! - **Temporal Ordering**: a later time bucket always yields a larger
//!   identifier on the same machine id.
//! - **Same Bucket**: up to 256 identifiers share one bucket, told apart by
//!   the sequence value. The 257th call waits for the next bucket.
//! - **Across Machines**: identifiers from different machine ids are unique
//!   but only roughly ordered. Keeping machine ids distinct is up to the
//!   deployment.
//! - **Clock Skew**: if the clock moves backwards the generator stays in its
//!   current bucket, so identifiers keep increasing.
//!
//! Identifier structure:
//! - **Machine ID**: 24 bits, by default the low two octets of a private IPv4
//!   address followed by the low byte of the process id.
//! - **Time Bucket**: 32 bits, time units (default 1 ms) since the epoch
//!   (default 2017-12-16 00:00:00 local time).
//! - **Sequence**: 8 bits.
//! - **Total**: 64 bits.
//!
//! With one millisecond per bucket the time field covers about 49.7 days
//! after the epoch. Past that the bucket wraps around; pick a recent epoch or
//! a coarser time unit for long-running deployments.
//!
//! # Examples
//!
//! ```
//! use hostflake::{Config, FlakeId, Generator};
//!
//! // Create a new generator with an explicit machine id
//! let config = Config::builder().machine_id(1).build().unwrap();
//! let generator = Generator::new(config);
//!
//! // Generate an id and take it apart again
//! let id = generator.allocate();
//! let parts = FlakeId::from_u64(id);
//! assert_eq!(parts.machine_id, 1);
//! assert_eq!(parts.to_u64(), id);
//! ```
//!
//! The process-wide default generator needs no setup:
//!
//! ```
//! let id = hostflake::generate();
//! assert_ne!(id, hostflake::generate());
//! ```
//!
//! # Errors
//!
//! Generating identifiers never fails. Only [`ConfigBuilder::build`] returns
//! errors:
//!
//! - [`ArgumentError`](FlakeError::ArgumentError): the machine id does not fit
//!   in 24 bits or the time unit is zero or too large.
//! - [`InvalidEpoch`](FlakeError::InvalidEpoch): the epoch lies in the future.
//!
//! # Safety
//!
//! A [`Generator`] may be shared between threads. Allocation takes a lock, so
//! heavily contended callers are better served by one generator per thread,
//! each with its own machine id.

mod clock;
mod config;
mod generator;
mod id;
mod resolver;

use std::sync::OnceLock;

pub use {
    clock::{Clock, SystemClock},
    config::{Config, ConfigBuilder},
    generator::{Allocate, Generator},
    id::{
        FlakeId, MACHINE_ID_BITS, MACHINE_ID_SHIFT, MAX_MACHINE_ID, MAX_SEQUENCE, MAX_TIME_BUCKET,
        SEQUENCE_BITS, TIME_BUCKET_BITS, TIME_BUCKET_SHIFT,
    },
    resolver::{
        find_local_address, find_local_address_in, private_ipv4s, AddressSource, FirstMatch, PrefixMatch,
        RandomSelection, Resolver, SelectionStrategy, SystemAddresses,
    },
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FlakeError {
    #[error("argument error: {0}")]
    ArgumentError(String),
    #[error("epoch must not be later than the current time")]
    InvalidEpoch,
}

static DEFAULT_GENERATOR: OnceLock<Generator> = OnceLock::new();

/// The process-wide generator behind [`generate`].
///
/// Built on first use from [`Config::default`], resolving the machine id from
/// the network interfaces. Tests that need isolated state should construct
/// their own [`Generator`] instead.
pub fn default_generator() -> &'static Generator {
    DEFAULT_GENERATOR.get_or_init(|| Generator::new(Config::default()))
}

/// Issues an identifier from the [`default_generator`].
pub fn generate() -> u64 {
    default_generator().allocate()
}
