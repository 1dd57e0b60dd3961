use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use textscope_sync::{LockError, SharedExclusiveLock};

#[test]
fn active_writer_reenters_read_and_write_without_blocking() {
    let lock = Arc::new(SharedExclusiveLock::new());
    let (tx, rx) = mpsc::channel();

    let worker = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            lock.acquire_write();
            lock.acquire_read();
            lock.acquire_write();
            lock.release_write().unwrap();
            lock.release_read().unwrap();
            lock.release_write().unwrap();
            tx.send(()).unwrap();
        })
    };

    rx.recv_timeout(Duration::from_secs(5))
        .expect("writer deadlocked on its own lock");
    worker.join().unwrap();
    assert_eq!(lock.readers(), 0);
    assert_eq!(lock.writers(), 0);
}

#[test]
fn release_read_with_no_readers_is_state_error() {
    let lock = SharedExclusiveLock::new();
    assert_eq!(lock.release_read(), Err(LockError::State("readers")));

    lock.acquire_read();
    assert!(lock.release_read().is_ok());
    assert!(matches!(lock.release_read(), Err(LockError::State(_))));
}

#[test]
fn release_write_from_other_thread_is_ownership_error() {
    let lock = Arc::new(SharedExclusiveLock::new());
    lock.acquire_write();

    let other = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || lock.release_write())
    };
    assert_eq!(other.join().unwrap(), Err(LockError::Ownership));

    assert_eq!(lock.writers(), 1);
    lock.release_write().unwrap();
    assert_eq!(lock.release_write(), Err(LockError::State("writers")));
}

#[test]
fn readers_share_the_lock() {
    let lock = Arc::new(SharedExclusiveLock::new());
    let barrier = Arc::new(Barrier::new(3));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _guard = lock.read();
                // All three readers must be inside at once to pass the barrier.
                barrier.wait();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(lock.readers(), 0);
}

#[test]
fn writer_waits_for_readers_to_leave() {
    let lock = Arc::new(SharedExclusiveLock::new());
    let wrote = Arc::new(AtomicBool::new(false));

    lock.acquire_read();
    let writer = {
        let lock = Arc::clone(&lock);
        let wrote = Arc::clone(&wrote);
        thread::spawn(move || {
            let _guard = lock.write();
            wrote.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!wrote.load(Ordering::SeqCst));

    lock.release_read().unwrap();
    writer.join().unwrap();
    assert!(wrote.load(Ordering::SeqCst));
}

#[test]
fn reader_waits_for_foreign_writer() {
    let lock = Arc::new(SharedExclusiveLock::new());
    let read = Arc::new(AtomicBool::new(false));

    lock.acquire_write();
    let reader = {
        let lock = Arc::clone(&lock);
        let read = Arc::clone(&read);
        thread::spawn(move || {
            let _guard = lock.read();
            read.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!read.load(Ordering::SeqCst));

    lock.release_write().unwrap();
    reader.join().unwrap();
    assert!(read.load(Ordering::SeqCst));
}

#[test]
fn writers_are_mutually_exclusive() {
    let lock = Arc::new(SharedExclusiveLock::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                for _ in 0..50 {
                    let _guard = lock.write();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}
