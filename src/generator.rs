use {
    crate::{
        clock::{Clock, SystemClock},
        config::Config,
        id::{self, MAX_MACHINE_ID, MAX_SEQUENCE, MAX_TIME_BUCKET},
        resolver::{AddressSource, Resolver, SelectionStrategy},
    },
    parking_lot::Mutex,
    std::{
        sync::Arc,
        time::{Duration, SystemTime},
    },
};

/// Anything that hands out identifiers.
///
/// `None` hands out `0`, which is never a real identifier.
pub trait Allocate {
    fn allocate(&self) -> u64;
}

#[derive(Debug)]
struct State {
    machine_id: u64,   // 24 bits, packed at bit 40
    time_bucket: u64,  // Ticks since the epoch of the last issued id
    last_elapsed: u64, // Nanoseconds since the epoch when the bucket was entered
    sequence: u64,     // Sequence of the last issued id
    primed: bool,      // Set once the first id has been issued
}

/// A thread-safe identifier allocator.
///
/// Every identifier packs the machine id into bits 40–63, the time bucket
/// (elapsed [`Config::time_unit`]s since [`Config::epoch`]) into bits 8–39
/// and a per-bucket sequence into bits 0–7.
///
/// At most 256 identifiers are issued per time bucket. The call that would
/// issue the 257th moves on to the next bucket and sleeps for one time unit
/// while holding the lock, so every other caller on the same instance waits
/// with it.
///
/// # Examples
///
/// ```
/// use hostflake::{Config, FlakeId, Generator};
///
/// let config = Config::builder().machine_id(7).build().unwrap();
/// let generator = Generator::new(config);
///
/// let a = generator.allocate();
/// let b = generator.allocate();
/// assert!(a < b);
/// assert_eq!(FlakeId::from_u64(a).machine_id, 7);
/// ```
#[derive(Debug)]
pub struct Generator<C = SystemClock> {
    epoch: SystemTime,
    time_unit: u64,
    clock: C,
    state: Mutex<State>,
}

impl Generator {
    /// Creates a generator on the system clock. An unset machine id is
    /// resolved from the local private IPv4 addresses.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Generator<C> {
    pub fn with_clock(config: Config, clock: C) -> Self {
        Self::with_resolver(config, clock, &Resolver::new())
    }

    /// Creates a generator that falls back to `resolver` when the config
    /// carries no machine id.
    pub fn with_resolver<S, P>(config: Config, clock: C, resolver: &Resolver<S, P>) -> Self
    where
        S: AddressSource,
        P: SelectionStrategy,
    {
        let machine_id = match config.machine_id() {
            Some(machine_id) => machine_id,
            None => resolver.resolve(),
        };
        tracing::debug!(machine_id, "creating generator");

        let epoch = config.epoch();
        let time_unit = config.time_unit_nanos();
        let elapsed = elapsed_nanos(epoch, clock.now());
        if elapsed / time_unit > MAX_TIME_BUCKET {
            tracing::warn!(
                epoch = ?epoch,
                time_unit = ?config.time_unit(),
                "time bucket no longer fits in 32 bits, ids will wrap around"
            );
        }

        Self {
            epoch,
            time_unit,
            clock,
            state: Mutex::new(State {
                machine_id: u64::from(machine_id) & MAX_MACHINE_ID,
                time_bucket: elapsed / time_unit,
                last_elapsed: elapsed,
                sequence: 0,
                primed: false,
            }),
        }
    }

    /// Issues the next identifier.
    ///
    /// Never fails. Blocks for one time unit when the current bucket has
    /// already issued 256 identifiers.
    pub fn allocate(&self) -> u64 {
        let mut state = self.state.lock();

        let elapsed = elapsed_nanos(self.epoch, self.clock.now());
        // A clock behind `last_elapsed` saturates to zero and keeps the bucket.
        if !state.primed || elapsed.saturating_sub(state.last_elapsed) > self.time_unit {
            state.primed = true;
            state.last_elapsed = elapsed;
            state.time_bucket = elapsed / self.time_unit;
            state.sequence = 0;
        } else {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                state.time_bucket += 1;
                state.last_elapsed = state.time_bucket.saturating_mul(self.time_unit);
                let wait = self.time_unit - state.last_elapsed % self.time_unit;
                tracing::trace!(time_bucket = state.time_bucket, ?wait, "sequence exhausted");
                self.clock.sleep(Duration::from_nanos(wait));
            }
        }

        id::pack(state.machine_id, state.time_bucket, state.sequence)
    }

    /// Replaces the machine id of all identifiers issued from now on.
    ///
    /// Bits above the 24-bit field are dropped.
    pub fn set_machine_id(&self, machine_id: u32) {
        let mut state = self.state.lock();
        state.machine_id = u64::from(machine_id) & MAX_MACHINE_ID;
        tracing::debug!(machine_id = state.machine_id, "machine id reassigned");
    }

    pub fn machine_id(&self) -> u32 {
        self.state.lock().machine_id as u32
    }

    pub fn epoch(&self) -> SystemTime {
        self.epoch
    }

    pub fn time_unit(&self) -> Duration {
        Duration::from_nanos(self.time_unit)
    }
}

impl<C: Clock> Allocate for Generator<C> {
    fn allocate(&self) -> u64 {
        Generator::<C>::allocate(self)
    }
}

impl<A: Allocate + ?Sized> Allocate for &A {
    fn allocate(&self) -> u64 {
        (**self).allocate()
    }
}

impl<A: Allocate + ?Sized> Allocate for Arc<A> {
    fn allocate(&self) -> u64 {
        (**self).allocate()
    }
}

impl<A: Allocate> Allocate for Option<A> {
    fn allocate(&self) -> u64 {
        self.as_ref().map_or(0, |inner| inner.allocate())
    }
}

fn elapsed_nanos(epoch: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(epoch)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
}
