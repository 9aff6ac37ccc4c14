// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Two-process rendezvous demo.
//
// Usage:
//   demo_rendezvous host [size]
//   demo_rendezvous peer [size]
//
// The host creates an event and a shared region, fills the region with
// 0xAB, and signals. The peer waits for the signal, opens and maps the
// region, verifies the pattern, and signals back. Start the host first,
// then the peer, in separate terminals.

use named_sync::{NamedEvent, OpenMode, SharedRegion};

const SHM_NAME: &str = "rendezvous_shm";
const DATA_EVT: &str = "rendezvous_data";
const ACK_EVT: &str = "rendezvous_ack";
const DEFAULT_SIZE: usize = 4096;
const PATTERN: u8 = 0xAB;
const TIMEOUT_MS: u64 = 30_000;

fn do_host(size: usize) {
    // Clear leftovers from a previous run so we create fresh objects.
    SharedRegion::unlink_by_name(SHM_NAME);
    NamedEvent::unlink_by_name(DATA_EVT);
    NamedEvent::unlink_by_name(ACK_EVT);

    let region = SharedRegion::create_or_open(SHM_NAME, size).expect("create region");
    let data_evt = NamedEvent::create_or_open(DATA_EVT, false).expect("create data event");
    let ack_evt = NamedEvent::create_or_open(ACK_EVT, false).expect("create ack event");

    let mapping = region.map().expect("map region");
    unsafe { std::ptr::write_bytes(mapping.as_mut_ptr(), PATTERN, size) };
    println!("host: wrote {size} bytes of {PATTERN:#04x}, signaling");

    data_evt.signal().expect("signal");

    println!("host: waiting for peer acknowledgement...");
    match ack_evt.wait(Some(TIMEOUT_MS)) {
        Ok(true) => println!("host: peer verified the payload"),
        Ok(false) => eprintln!("host: no peer within {TIMEOUT_MS}ms"),
        Err(e) => eprintln!("host: wait failed: {e}"),
    }

    drop(mapping);
    region.unlink();
    data_evt.unlink();
    ack_evt.unlink();
}

fn do_peer(size: usize) {
    let data_evt = NamedEvent::create_or_open(DATA_EVT, false).expect("open data event");
    let ack_evt = NamedEvent::create_or_open(ACK_EVT, false).expect("open ack event");

    println!("peer: waiting for host signal...");
    match data_evt.wait(Some(TIMEOUT_MS)) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("peer: no host signal within {TIMEOUT_MS}ms");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("peer: wait failed: {e}");
            std::process::exit(1);
        }
    }

    let region = SharedRegion::acquire(SHM_NAME, size, OpenMode::Open).expect("open region");
    let mapping = region.map().expect("map region");

    let bytes = unsafe { std::slice::from_raw_parts(mapping.as_ptr(), size) };
    let ok = bytes.iter().all(|&b| b == PATTERN);
    println!(
        "peer: read {size} bytes, pattern {}",
        if ok { "verified" } else { "MISMATCH" }
    );

    ack_evt.signal().expect("signal ack");

    if !ok {
        std::process::exit(1);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: demo_rendezvous host [size]");
        eprintln!("       demo_rendezvous peer [size]");
        std::process::exit(1);
    }

    let size: usize = args
        .get(2)
        .map(|s| s.parse().expect("size"))
        .unwrap_or(DEFAULT_SIZE);

    match args[1].as_str() {
        "host" => do_host(size),
        "peer" => do_peer(size),
        other => {
            eprintln!("unknown mode: {other}");
            std::process::exit(1);
        }
    }
}
