//! Performance benchmarks for the hot paths of the host loop

use server::presence::PresenceTracker;
use server::store::SqliteStore;
use server::users::UserList;
use shared::{FrameBuffer, Message, Stroke};
use std::time::Instant;

/// Benchmarks frame reassembly over a fragmented stream
#[test]
fn benchmark_frame_scanning() {
    let frame = Message::Draw(Stroke {
        prev_x: 120,
        prev_y: 340,
        x: 125,
        y: 338,
        color: 16711680,
        width: 4,
    })
    .to_frame();
    let stream: Vec<u8> = frame.as_bytes().repeat(10_000);

    let start = Instant::now();
    let mut frames = FrameBuffer::new();
    let mut count = 0;
    for chunk in stream.chunks(7) {
        frames.push(chunk);
        count += frames.frames().count();
    }
    let duration = start.elapsed();

    println!(
        "Frame scanning: {} frames in {:?} ({:.2} μs/frame)",
        count,
        duration,
        duration.as_micros() as f64 / count as f64
    );

    assert_eq!(count, 10_000);
    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding of the per-tick broadcast messages
#[test]
fn benchmark_message_decoding() {
    let roster = Message::ConnectedUsers((0..20).map(|i| format!("player{}", i)).collect());
    let scores = Message::Topscores(vec![
        ("alice".to_string(), 1200),
        ("bob".to_string(), 800),
        ("carol".to_string(), 600),
    ]);
    let payloads = [roster.encode(), scores.encode()];

    let iterations = 50_000;
    let start = Instant::now();
    for i in 0..iterations {
        let _ = Message::decode(&payloads[i % 2]).unwrap();
    }
    let duration = start.elapsed();

    println!(
        "Message decoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks leaderboard computation with a realistic user count
#[test]
fn benchmark_leaderboard() {
    let mut users = UserList::new(Box::new(SqliteStore::open_memory().unwrap()));
    for i in 0..500 {
        let name = format!("user{}", i);
        let _ = users.register(&name, "pw", i).unwrap();
        let _ = users.award_points(&name, (i as u32 * 37) % 1000);
    }

    let iterations = 1_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let top = users.top(3);
        assert_eq!(top.len(), 3);
        let _ = users.rank("user250");
    }
    let duration = start.elapsed();

    println!(
        "Leaderboard: {} iterations over {} users in {:?}",
        iterations,
        users.len(),
        duration
    );

    // Runs every tick at 60Hz, so must stay well under a frame
    assert!(duration.as_millis() / iterations < 16);
}

/// Benchmarks presence aging with many tracked users
#[test]
fn benchmark_presence_tick() {
    let mut presence = PresenceTracker::default();
    for i in 0..200 {
        presence.heartbeat(&format!("user{}", i));
    }

    let iterations = 99;
    let start = Instant::now();
    for _ in 0..iterations {
        assert_eq!(presence.tick().len(), 200);
    }
    let duration = start.elapsed();

    println!(
        "Presence tick: {} ticks over 200 users in {:?}",
        iterations, duration
    );

    assert!(duration.as_millis() < 500);
    assert!(presence.tick().is_empty());
}
