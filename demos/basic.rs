fn main() {
    let id1 = hostflake::generate();
    let id2 = hostflake::generate();
    let id3 = hostflake::generate();

    println!("machine id: {:#08x}", hostflake::default_generator().machine_id());
    println!("id1: {}", id1);
    println!("id2: {}", id2);
    println!("id3: {}", id3);

    assert_ne!(id1, id2);
    assert_ne!(id1, id3);
    assert_ne!(id2, id3);
}
