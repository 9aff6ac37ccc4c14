// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Unit tests for named event functionality.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use named_sync::NamedEvent;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_evt_{n}")
}

#[test]
fn create_unsignaled() {
    let name = unique_name("create");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, false).expect("create");
    assert!(!evt.wait(Some(50)).expect("wait"), "fresh event must be unsignaled");
    evt.unlink();
}

#[test]
fn create_initially_signaled() {
    let name = unique_name("initial");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, true).expect("create");
    assert!(evt.wait(Some(100)).expect("wait"), "event created signaled");
    evt.unlink();
}

#[test]
fn round_trip_timeout_then_signal() {
    let name = unique_name("round_trip");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, false).expect("create");

    assert!(!evt.wait(Some(100)).expect("wait 1"));

    evt.signal().expect("signal");
    assert!(evt.wait(Some(100)).expect("wait 2"));

    evt.unlink();
}

#[test]
fn wait_consumes_signal() {
    let name = unique_name("consume");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, false).expect("create");
    evt.signal().expect("signal");

    assert!(evt.wait(Some(100)).expect("wait 1"));
    // Auto-reset: the signal is gone after a successful wait.
    assert!(!evt.wait(Some(50)).expect("wait 2"));

    evt.unlink();
}

#[test]
fn signal_does_not_accumulate() {
    let name = unique_name("binary");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, false).expect("create");
    evt.signal().expect("signal 1");
    evt.signal().expect("signal 2");
    evt.signal().expect("signal 3");

    assert!(evt.wait(Some(100)).expect("wait 1"));
    assert!(!evt.wait(Some(50)).expect("wait 2"), "state is binary, not a count");

    evt.unlink();
}

#[test]
fn wait_timeout_elapses() {
    let name = unique_name("timeout");
    NamedEvent::unlink_by_name(&name);

    let evt = NamedEvent::create_or_open(&name, false).expect("create");

    let start = Instant::now();
    let signaled = evt.wait(Some(50)).expect("wait");
    let elapsed = start.elapsed();

    assert!(!signaled, "should timeout");
    assert!(
        elapsed.as_millis() >= 40,
        "should have waited ~50ms, got {}ms",
        elapsed.as_millis()
    );

    evt.unlink();
}

#[test]
fn infinite_wait_wakes_on_signal() {
    let name = unique_name("infinite");
    NamedEvent::unlink_by_name(&name);

    let evt = Arc::new(NamedEvent::create_or_open(&name, false).expect("create"));
    let wait_started = Arc::new(AtomicBool::new(false));
    let wait_succeeded = Arc::new(AtomicBool::new(false));

    let evt2 = Arc::clone(&evt);
    let ws = Arc::clone(&wait_started);
    let wsucc = Arc::clone(&wait_succeeded);
    let waiter = thread::spawn(move || {
        ws.store(true, Ordering::SeqCst);
        let result = evt2.wait(None).expect("wait");
        wsucc.store(result, Ordering::SeqCst);
    });

    while !wait_started.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));

    evt.signal().expect("signal");

    waiter.join().unwrap();
    assert!(wait_succeeded.load(Ordering::SeqCst));

    evt.unlink();
}

#[test]
fn one_signal_wakes_one_waiter() {
    let name = unique_name("one_of_n");
    NamedEvent::unlink_by_name(&name);

    let evt = Arc::new(NamedEvent::create_or_open(&name, false).expect("create"));
    let signaled = Arc::new(AtomicI32::new(0));
    let timed_out = Arc::new(AtomicI32::new(0));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let e = Arc::clone(&evt);
        let s = Arc::clone(&signaled);
        let t = Arc::clone(&timed_out);
        handles.push(thread::spawn(move || {
            if e.wait(Some(500)).expect("wait") {
                s.fetch_add(1, Ordering::SeqCst);
            } else {
                t.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    // Let all waiters block, then release exactly one.
    thread::sleep(Duration::from_millis(50));
    evt.signal().expect("signal");

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(signaled.load(Ordering::SeqCst), 1);
    assert_eq!(timed_out.load(Ordering::SeqCst), 2);

    evt.unlink();
}

#[test]
fn attach_to_existing() {
    let name = unique_name("attach");
    NamedEvent::unlink_by_name(&name);

    let creator = NamedEvent::create_or_open(&name, false).expect("create");
    let attached = NamedEvent::create_or_open(&name, false).expect("attach");

    creator.signal().expect("signal");
    assert!(
        attached.wait(Some(100)).expect("wait"),
        "signal through one handle must wake a wait through the other"
    );

    creator.unlink();
}

#[test]
fn empty_name_fails() {
    let result = NamedEvent::create_or_open("", false);
    assert!(result.is_err());
    assert_eq!(
        result.err().map(|e| e.kind()),
        Some(std::io::ErrorKind::InvalidInput)
    );
}

// POSIX-only: unlink removes the name, so the next create gets a fresh
// object instead of attaching to the old signaled one. On Windows the
// name dies with the last handle instead.
#[cfg(unix)]
#[test]
fn unlink_detaches_name() {
    let name = unique_name("unlink");
    NamedEvent::unlink_by_name(&name);

    let old = NamedEvent::create_or_open(&name, false).expect("create");
    old.signal().expect("signal");
    old.unlink();

    let fresh = NamedEvent::create_or_open(&name, false).expect("recreate");
    assert!(
        !fresh.wait(Some(50)).expect("wait"),
        "recreated event must not inherit the unlinked object's state"
    );

    // The old handle stays usable after unlink.
    assert!(old.wait(Some(100)).expect("old wait"));

    fresh.unlink();
}

#[test]
fn unlink_by_name_missing_is_noop() {
    // Must not panic or error when the name was never created.
    NamedEvent::unlink_by_name("never_created_event_name");
}
