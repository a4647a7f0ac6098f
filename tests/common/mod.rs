use std::sync::mpsc;
use std::time::Duration;

use hashkit::{Config, Engine, RehashCallback};

/// How long a test waits for a background upgrade before giving up.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Cheap work factors so tests stay fast.
pub fn config(memory_cost: u32, workers: usize) -> Config {
    Config {
        memory_cost,
        time_cost: 1,
        parallelism: 1,
        key_length: 32,
        salt_length: 16,
        workers,
    }
}

pub fn engine(memory_cost: u32, workers: usize) -> Engine {
    Engine::new(Some(config(memory_cost, workers))).expect("engine should start")
}

/// A callback that forwards the upgraded hash into a channel.
pub fn forwarding_callback() -> (RehashCallback, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel::<String>();
    let callback: RehashCallback = Box::new(move |upgraded: String| {
        let _ = tx.send(upgraded);
    });
    (callback, rx)
}
