use {
    hostflake::{Allocate, Clock, Config, FirstMatch, FlakeError, FlakeId, Generator, Resolver},
    std::{
        collections::HashSet,
        net::IpAddr,
        sync::{
            mpsc::{self, RecvTimeoutError},
            Arc, Mutex,
        },
        thread,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
};

const EPOCH_SECS: u64 = 1_513_382_400; // 2017-12-16 00:00:00 UTC

#[derive(Clone)]
struct MockClock {
    now: Arc<Mutex<SystemTime>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    fn at(now: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::default(),
        }
    }

    fn set(&self, now: SystemTime) {
        *self.now.lock().unwrap() = now;
    }

    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, dur: Duration) {
        self.sleeps.lock().unwrap().push(dur);
        *self.now.lock().unwrap() += dur;
    }
}

/// Frozen clock whose `sleep` blocks until released.
struct GatedClock {
    now: Mutex<SystemTime>,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Clock for GatedClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, dur: Duration) {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        *self.now.lock().unwrap() += dur;
    }
}

fn epoch() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(EPOCH_SECS)
}

fn mock_generator(machine_id: u32, elapsed: Duration) -> (Generator<MockClock>, MockClock) {
    let config = Config::builder()
        .epoch(epoch())
        .time_unit(Duration::from_millis(1))
        .machine_id(machine_id)
        .build()
        .unwrap();
    let clock = MockClock::at(epoch() + elapsed);
    (Generator::with_clock(config, clock.clone()), clock)
}

fn recent_config(machine_id: u32) -> Config {
    Config::builder()
        .epoch(SystemTime::now() - Duration::from_secs(3600))
        .machine_id(machine_id)
        .build()
        .unwrap()
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.time_unit(), Duration::from_millis(1));
    assert_eq!(config.machine_id(), None);
    assert!(config.epoch() < SystemTime::now());
}

#[test]
fn test_invalid_machine_id() {
    let config = Config::builder().machine_id(1 << 24).build();
    assert!(matches!(config.err(), Some(FlakeError::ArgumentError(..))));
}

#[test]
fn test_zero_machine_id_is_unset() {
    let config = Config::builder().machine_id(0).build().unwrap();
    assert_eq!(config.machine_id(), None);
}

#[test]
fn test_invalid_time_unit() {
    let config = Config::builder().time_unit(Duration::ZERO).build();
    assert!(matches!(config.err(), Some(FlakeError::ArgumentError(..))));

    let config = Config::builder().time_unit(Duration::MAX).build();
    assert!(matches!(config.err(), Some(FlakeError::ArgumentError(..))));
}

#[test]
fn test_invalid_epoch() {
    let config = Config::builder()
        .epoch(SystemTime::now() + Duration::from_secs(3600))
        .build();
    assert!(matches!(config.err(), Some(FlakeError::InvalidEpoch)));
}

#[test]
fn test_first_ids_in_bucket() {
    let (generator, _) = mock_generator(1, Duration::from_millis(5));
    assert_eq!(generator.allocate(), (1 << 40) | (5 << 8));
    assert_eq!(generator.allocate(), (1 << 40) | (5 << 8) | 1);
}

#[test]
fn test_field_extraction() {
    let (generator, clock) = mock_generator(0xAB_CDEF, Duration::from_millis(5));
    generator.allocate();
    let id = generator.allocate();

    let parts = FlakeId::from_u64(id);
    assert_eq!(parts, FlakeId::new(0xAB_CDEF, 5, 1));
    assert_eq!(id >> 40, 0xAB_CDEF);
    assert_eq!((id >> 8) & 0xFFFF_FFFF, 5);
    assert_eq!(id & 0xFF, 1);
    assert_eq!(parts.to_u64(), id);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_sequence_wraparound() {
    let (generator, clock) = mock_generator(1, Duration::from_millis(5));

    let ids: Vec<u64> = (0 .. 256).map(|_| generator.allocate()).collect();
    for (sequence, id) in ids.iter().enumerate() {
        assert_eq!(FlakeId::from_u64(*id), FlakeId::new(1, 5, sequence as u8));
    }
    assert!(clock.sleeps().is_empty());

    let wrapped = FlakeId::from_u64(generator.allocate());
    assert_eq!(wrapped.time_bucket, 6);
    assert_eq!(wrapped.sequence, 0);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(1)]);

    let next = FlakeId::from_u64(generator.allocate());
    assert_eq!(next, FlakeId::new(1, 6, 1));
    assert!(wrapped.to_u64() > ids[255] && next.to_u64() > wrapped.to_u64());
}

#[test]
fn test_exhaustion_stall_blocks_other_callers() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let clock = GatedClock {
        now: Mutex::new(epoch() + Duration::from_millis(5)),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let config = Config::builder().epoch(epoch()).machine_id(1).build().unwrap();
    let generator = Generator::with_clock(config, clock);
    let generator = &generator;

    thread::scope(|s| {
        let first = s.spawn(move || {
            for _ in 0 .. 256 {
                generator.allocate();
            }
            generator.allocate()
        });
        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let second = s.spawn(move || done_tx.send(generator.allocate()).unwrap());
        assert_eq!(
            done_rx.recv_timeout(Duration::from_millis(200)),
            Err(RecvTimeoutError::Timeout)
        );

        release_tx.send(()).unwrap();
        let id_first = first.join().unwrap();
        let id_second = done_rx.recv().unwrap();
        second.join().unwrap();

        assert_eq!(FlakeId::from_u64(id_first), FlakeId::new(1, 6, 0));
        assert_eq!(FlakeId::from_u64(id_second), FlakeId::new(1, 6, 1));
        assert!(id_second > id_first);
    });
}

#[test]
fn test_bucket_advances_after_gap() {
    let (generator, clock) = mock_generator(1, Duration::from_millis(5));
    generator.allocate();
    generator.allocate();

    clock.set(epoch() + Duration::from_millis(8));
    assert_eq!(FlakeId::from_u64(generator.allocate()), FlakeId::new(1, 8, 0));
}

#[test]
fn test_bucket_kept_within_one_time_unit() {
    let (generator, clock) = mock_generator(1, Duration::from_millis(5));
    generator.allocate();

    clock.set(epoch() + Duration::from_millis(6));
    assert_eq!(FlakeId::from_u64(generator.allocate()), FlakeId::new(1, 5, 1));
}

#[test]
fn test_clock_moves_backwards() {
    let (generator, clock) = mock_generator(1, Duration::from_millis(50));
    let id1 = generator.allocate();

    clock.set(epoch() + Duration::from_millis(10));
    let id2 = generator.allocate();
    assert!(id1 < id2);
    assert_eq!(FlakeId::from_u64(id2), FlakeId::new(1, 50, 1));

    clock.set(epoch() - Duration::from_secs(1));
    let id3 = generator.allocate();
    assert!(id2 < id3);
}

#[test]
fn test_set_machine_id() {
    let (generator, _) = mock_generator(1, Duration::from_millis(5));
    assert_eq!(generator.machine_id(), 1);
    generator.allocate();

    generator.set_machine_id(2);
    let id = generator.allocate();
    assert_eq!(generator.machine_id(), 2);
    assert_eq!(FlakeId::from_u64(id), FlakeId::new(2, 5, 1));

    generator.set_machine_id(0x1FF_FFFF);
    assert_eq!(generator.machine_id(), 0xFF_FFFF);
}

#[test]
fn test_missing_generator_yields_zero() {
    let missing: Option<Generator<MockClock>> = None;
    assert_eq!(missing.allocate(), 0);

    let (generator, _) = mock_generator(1, Duration::from_millis(5));
    assert_eq!(Some(generator).allocate(), (1 << 40) | (5 << 8));
}

#[test]
fn test_zero_fallback() {
    let config = Config::builder().epoch(epoch()).build().unwrap();
    let resolver = Resolver::with(Vec::<IpAddr>::new(), FirstMatch);
    let clock = MockClock::at(epoch() + Duration::from_millis(5));
    let generator = Generator::with_resolver(config.clone(), clock.clone(), &resolver);

    assert_eq!(generator.machine_id(), 0);
    let ids: Vec<u64> = (0 .. 300).map(|_| generator.allocate()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(ids.iter().all(|id| id >> 40 == 0));

    let generator = Generator::with_resolver(config, clock, &resolver.pid_fallback(true));
    assert_eq!(generator.machine_id(), std::process::id() & 0xFF);
}

#[test]
fn test_id_unique() {
    let generator = Generator::new(recent_config(1));
    let ids: HashSet<u64> = (0 .. 10_000).map(|_| generator.allocate()).collect();
    assert_eq!(ids.len(), 10_000);
}

#[test]
fn test_id_order() {
    let generator = Generator::new(recent_config(1));
    let mut last = generator.allocate();
    for _ in 0 .. 10_000 {
        let id = generator.allocate();
        assert!(last < id);
        last = id;
    }
}

#[test]
fn test_concurrent_allocation() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 2_000;

    let generator = Arc::new(Generator::new(recent_config(3)));
    let per_thread: Vec<Vec<u64>> = thread::scope(|s| {
        let handles: Vec<_> = (0 .. THREADS)
            .map(|_| {
                let generator = Arc::clone(&generator);
                s.spawn(move || (0 .. IDS_PER_THREAD).map(|_| generator.allocate()).collect::<Vec<_>>())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for ids in &per_thread {
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
    let unique: HashSet<u64> = per_thread.into_iter().flatten().collect();
    assert_eq!(unique.len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn test_default_generator() {
    let generator = hostflake::default_generator();
    assert!(std::ptr::eq(generator, hostflake::default_generator()));
    assert_eq!(generator.time_unit(), Duration::from_millis(1));

    let id1 = hostflake::generate();
    let id2 = hostflake::generate();
    assert_ne!(id1, id2);
}
