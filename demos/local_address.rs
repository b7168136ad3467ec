fn main() {
    match hostflake::find_local_address(&[192, 168]) {
        Some(addr) => println!("local address: {}", addr),
        None => println!("no 192.168.x.x address on this host"),
    }
    println!("private addresses: {:?}", hostflake::private_ipv4s(&hostflake::SystemAddresses));
}
