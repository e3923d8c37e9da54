//! Tick scheduler
//!
//! A background worker sleeps at the heartbeat rate and publishes a
//! [`GameEvent::Tick`] whenever the accumulated sleep reaches the gravity
//! delay for the configured difficulty and speed level. Subscribers (the
//! simulation driver, a latency probe) hang off the shared [`EventBus`].
//!
//! Lifecycle transitions publish exactly once per actual change; calling
//! `start` on a running loop, or `pause` on a paused one, is a silent no-op.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::bail;
use log::{debug, info};

use crate::events::{EventBus, GameEvent, LoopTransition};
use crate::types::{Difficulty, DEFAULT_TICK_RATE, GRAVITY_DELAY_TABLE, SPEED_LEVELS};

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct LocalGameLoop {
    bus: Arc<EventBus>,
    /// Difficulty table row, stored as its index so it can be swapped live
    difficulty: AtomicU32,
    /// Heartbeat frequency in Hz; the worker wakes this often
    tick_rate: AtomicU32,
    speed_level: AtomicU32,
    /// Shared with the worker so speed changes apply without a restart
    gravity_delay_ms: Arc<AtomicU32>,
    ticks: Arc<AtomicU64>,
    running: AtomicBool,
    paused: AtomicBool,
    worker: Mutex<Option<Worker>>,
}

impl LocalGameLoop {
    pub fn new(bus: Arc<EventBus>, difficulty: Difficulty) -> Self {
        let delay = GRAVITY_DELAY_TABLE[difficulty.index()][0];
        Self {
            bus,
            difficulty: AtomicU32::new(difficulty.index() as u32),
            tick_rate: AtomicU32::new(DEFAULT_TICK_RATE),
            speed_level: AtomicU32::new(0),
            gravity_delay_ms: Arc::new(AtomicU32::new(delay)),
            ticks: Arc::new(AtomicU64::new(0)),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn gravity_delay_ms(&self) -> u32 {
        self.gravity_delay_ms.load(Ordering::SeqCst)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate.load(Ordering::SeqCst)
    }

    pub fn speed_level(&self) -> usize {
        self.speed_level.load(Ordering::SeqCst) as usize
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_index(self.difficulty.load(Ordering::SeqCst) as i32)
    }

    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.paused.store(false, Ordering::SeqCst);
        info!(
            "game loop starting ({:?}, {} ms gravity)",
            self.difficulty(),
            self.gravity_delay_ms()
        );
        self.spawn_worker();
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::Started,
        });
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.paused.store(false, Ordering::SeqCst);
        self.halt_worker();
        info!("game loop stopped after {} ticks", self.tick_count());
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::Stopped,
        });
    }

    pub fn pause(&self) {
        if !self.is_running() || self.paused.swap(true, Ordering::SeqCst) {
            return;
        }
        self.halt_worker();
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::Paused,
        });
    }

    pub fn resume(&self) {
        if !self.is_running() || !self.paused.swap(false, Ordering::SeqCst) {
            return;
        }
        self.spawn_worker();
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::Resumed,
        });
    }

    /// Change the heartbeat frequency. Zero is rejected up front rather than
    /// dividing through to an infinite sleep.
    pub fn set_tick_rate(&self, rate: u32) -> anyhow::Result<()> {
        if rate == 0 {
            bail!("tick rate must be positive");
        }
        if self.tick_rate.swap(rate, Ordering::SeqCst) == rate {
            return Ok(());
        }
        // the heartbeat is baked into the worker's sleep, so restart it
        if self.is_running() && !self.is_paused() {
            self.halt_worker();
            self.spawn_worker();
        }
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::RateChanged,
        });
        Ok(())
    }

    /// Select a gravity speed level. Out-of-range levels are ignored, and
    /// re-selecting the current level publishes nothing.
    pub fn set_speed_level(&self, level: usize) {
        if level >= SPEED_LEVELS {
            debug!("ignoring out-of-range speed level {}", level);
            return;
        }
        if self.speed_level.swap(level as u32, Ordering::SeqCst) == level as u32 {
            return;
        }
        let delay = GRAVITY_DELAY_TABLE[self.difficulty().index()][level];
        self.gravity_delay_ms.store(delay, Ordering::SeqCst);
        debug!("speed level {} -> {} ms gravity", level, delay);
        if self.is_running() && !self.is_paused() {
            self.halt_worker();
            self.spawn_worker();
        }
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::SpeedChanged {
                delay_ms: delay,
                level: level as u32,
            },
        });
    }

    /// Switch the gravity table row. The current speed level carries over;
    /// re-selecting the current difficulty publishes nothing.
    pub fn set_difficulty(&self, difficulty: Difficulty) {
        let index = difficulty.index() as u32;
        if self.difficulty.swap(index, Ordering::SeqCst) == index {
            return;
        }
        let level = self.speed_level();
        let delay = GRAVITY_DELAY_TABLE[difficulty.index()][level];
        self.gravity_delay_ms.store(delay, Ordering::SeqCst);
        debug!("difficulty {:?} -> {} ms gravity", difficulty, delay);
        if self.is_running() && !self.is_paused() {
            self.halt_worker();
            self.spawn_worker();
        }
        self.bus.publish(&GameEvent::TimerLifecycle {
            transition: LoopTransition::SpeedChanged {
                delay_ms: delay,
                level: level as u32,
            },
        });
    }

    fn spawn_worker(&self) {
        let stop = Arc::new(AtomicBool::new(false));
        let bus = Arc::clone(&self.bus);
        let gravity = Arc::clone(&self.gravity_delay_ms);
        let ticks = Arc::clone(&self.ticks);
        let heartbeat = Duration::from_millis(u64::from(
            1000 / self.tick_rate.load(Ordering::SeqCst).max(1),
        ));

        let worker_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut accumulated = Duration::ZERO;
            while !worker_stop.load(Ordering::SeqCst) {
                thread::sleep(heartbeat);
                accumulated += heartbeat;
                let delay = Duration::from_millis(u64::from(gravity.load(Ordering::SeqCst)));
                if accumulated >= delay {
                    accumulated = Duration::ZERO;
                    let tick = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                    bus.publish(&GameEvent::Tick { tick });
                }
            }
        });

        // a worker may already occupy the slot when two reconfigurations
        // race; halt it instead of leaking its thread
        let displaced = {
            let mut slot = self.worker.lock().unwrap_or_else(|e| e.into_inner());
            slot.replace(Worker { stop, handle })
        };
        if let Some(old) = displaced {
            old.stop.store(true, Ordering::SeqCst);
            let _ = old.handle.join();
        }
    }

    fn halt_worker(&self) {
        let worker = {
            let mut slot = self.worker.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(worker) = worker {
            worker.stop.store(true, Ordering::SeqCst);
            let _ = worker.handle.join();
        }
    }
}

impl Drop for LocalGameLoop {
    fn drop(&mut self) {
        self.halt_worker();
    }
}
