//! Performance benchmarks for critical session systems

use server::arena::Arena;
use server::chat::plan_send;
use server::roster::Roster;
use shared::{Packet, ParticipantRecord, PlayerColor, Vec3};
use std::time::Instant;

/// Benchmarks roster churn (join and leave cycles with color recycling)
#[test]
fn benchmark_roster_churn() {
    let iterations = 10_000;
    let start = Instant::now();

    let mut roster = Roster::new();
    roster.join(0);
    for i in 1..=iterations {
        roster.join(i);
        roster.leave(i);
    }

    let duration = start.elapsed();
    println!(
        "Roster churn: {} join/leave cycles in {:?} ({:.2} μs/cycle)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks chat delivery planning against a populated roster
#[test]
fn benchmark_chat_planning() {
    let mut roster = Roster::new();
    for id in 1..=16 {
        roster.join(id);
    }

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let text = if i % 4 == 0 { "@2 psst" } else { "hello" };
        let _ = plan_send(1, text, &roster);
    }

    let duration = start.elapsed();
    println!(
        "Chat planning: {} sends in {:?} ({:.2} μs/send)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks movement application across a full arena
#[test]
fn benchmark_movement_application() {
    let mut arena = Arena::new(1);
    for id in 1..=16u64 {
        arena.spawn_player(id, PlayerColor::Blue);
    }

    let frames = 10_000;
    let start = Instant::now();

    for frame in 0..frames {
        let step = if frame % 2 == 0 { 0.1 } else { -0.1 };
        for id in 1..=16u64 {
            let _ = arena.apply_move(id, Vec3::new(step, 0.0, 0.0));
            let _ = arena.apply_rotate(id, Vec3::new(0.0, 1.0, 0.0));
        }
    }

    let duration = start.elapsed();
    println!(
        "Movement: 16 players × {} frames in {:?} ({:.2} μs/frame)",
        frames,
        duration,
        duration.as_micros() as f64 / frames as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks network packet serialization performance
#[test]
fn benchmark_packet_serialization() {
    use bincode::{deserialize, serialize};

    let records: Vec<ParticipantRecord> = (1..=16u64)
        .map(|id| ParticipantRecord {
            id,
            name: format!("Player {}", id),
            ready: id % 2 == 0,
            color: PlayerColor::Blue,
        })
        .collect();
    let packet = Packet::Roster { records };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let serialized = serialize(&packet).unwrap();
        let _: Packet = deserialize(&serialized).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Roster serialization: {} round-trips in {:?} ({:.2} μs/round-trip)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
