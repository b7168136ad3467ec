use {
    hostflake::{Config, Generator},
    std::{
        error::Error,
        sync::{mpsc, Arc},
        thread,
    },
};

fn main() -> Result<(), Box<dyn Error>> {
    let generator = Arc::new(Generator::new(Config::default()));
    let (tx, rx) = mpsc::channel();

    for _ in 0 .. 10 {
        let generator = Arc::clone(&generator);
        let tx = tx.clone();

        thread::spawn(move || {
            let _ = tx.send(generator.allocate());
        });
    }
    drop(tx);

    for id in rx {
        println!("id: {}", id);
    }

    Ok(())
}
