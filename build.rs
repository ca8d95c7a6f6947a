use std::io::ErrorKind;
use std::path::Path;
use std::{fs, io};

const PROTO_DIR: &str = "./protos/";
const GENERATED_DIR: &str = "./generated/";

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed={}cluster.proto", PROTO_DIR);
    build_peer_service()
}

// Both halves are generated: every node serves the peer service and calls it on the other hosts.
fn build_peer_service() -> io::Result<()> {
    create_dir_if_missing(GENERATED_DIR)?;
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .out_dir(GENERATED_DIR)
        .compile(&[format!("{}cluster.proto", PROTO_DIR)], &[PROTO_DIR.to_string()])
}

fn create_dir_if_missing<P: AsRef<Path>>(path: P) -> io::Result<()> {
    match fs::create_dir(path) {
        Err(e) if e.kind() != ErrorKind::AlreadyExists => Err(e),
        _ => Ok(()),
    }
}
