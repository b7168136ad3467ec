use {
    hostflake::{Config, FlakeId, Generator},
    std::{
        error::Error,
        time::{Duration, SystemTime},
    },
};

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::builder()
        .epoch(SystemTime::now() - Duration::from_secs(60))
        .time_unit(Duration::from_millis(10))
        .machine_id(0x00_2A_01)
        .build()?;
    let generator = Generator::new(config);

    let id = generator.allocate();
    let parts = FlakeId::from_u64(id);
    println!("id: {}", id);
    println!(
        "machine id: {:#08x}, time bucket: {}, sequence: {}",
        parts.machine_id, parts.time_bucket, parts.sequence
    );
    Ok(())
}
