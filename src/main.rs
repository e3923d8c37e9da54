//! Headless versus demo
//!
//! Runs two engines from the same seed, drives them off one tick scheduler,
//! and relays attacks and heartbeats through emulated links. Link profile
//! and seed come from the command line:
//!
//! ```text
//! duotris [perfect|good|normal|poor|terrible] [seed]
//! ```

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::info;

use duotris::core::SimpleRng;
use duotris::net::{
    ControlDirective, EmulatedLink, LatencyMonitor, NetConfig, NetMessage, NetworkEmulator, Payload,
};
use duotris::types::{epoch_ms, Command, Difficulty, GameConfig};
use duotris::{CommandQueue, EventBus, EventKind, GamePhase, LocalGameLoop, PlayerEngine};

const MAX_GRAVITY_STEPS: u32 = 150;
const HEARTBEAT_EVERY: u32 = 5;

fn parse_profile(name: &str) -> Option<NetConfig> {
    match name {
        "perfect" => Some(NetConfig::perfect()),
        "good" => Some(NetConfig::good()),
        "normal" => Some(NetConfig::normal()),
        "poor" => Some(NetConfig::poor()),
        "terrible" => Some(NetConfig::terrible()),
        _ => None,
    }
}

fn random_command(rng: &mut SimpleRng) -> Command {
    match rng.next_range(6) {
        0 => Command::Left,
        1 => Command::Right,
        2 | 3 => Command::Rotate,
        4 => Command::SoftDrop,
        _ => Command::HardDrop,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let profile_name = args.next().unwrap_or_else(|| "good".to_string());
    let profile = parse_profile(&profile_name)
        .ok_or_else(|| anyhow::anyhow!("unknown link profile '{}'", profile_name))?;
    let seed: u32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    info!("versus demo: profile {}, seed {}", profile_name, seed);

    let config = GameConfig {
        seed,
        difficulty: Difficulty::Hard,
        colorblind: false,
        start_level: 6,
    };

    let bus = Arc::new(EventBus::new());
    let mut players = [
        PlayerEngine::new(0, config, Arc::clone(&bus)),
        PlayerEngine::new(1, config, Arc::clone(&bus)),
    ];
    let queues = [CommandQueue::new(), CommandQueue::new()];

    // one emulated link per direction, both with the chosen profile
    let emu_ab = Arc::new(NetworkEmulator::new(profile, seed.wrapping_add(17)));
    let emu_ba = Arc::new(NetworkEmulator::new(profile, seed.wrapping_add(29)));
    let (link_ab, inbox_b) = EmulatedLink::new(Arc::clone(&emu_ab));
    let (link_ba, inbox_a) = EmulatedLink::new(Arc::clone(&emu_ba));
    let links = [link_ab, link_ba];
    let inboxes = [inbox_a, inbox_b];
    let mut monitors = [LatencyMonitor::new(), LatencyMonitor::new()];

    // forward scheduler ticks into the main loop
    let (tick_tx, tick_rx) = mpsc::channel();
    bus.subscribe(EventKind::Tick, move |_| {
        let _ = tick_tx.send(());
    });

    let game_loop = LocalGameLoop::new(Arc::clone(&bus), Difficulty::Hard);
    game_loop.set_speed_level(players[0].speed_level());
    game_loop.start();

    for (i, link) in links.iter().enumerate() {
        link.send(NetMessage::control_with(
            ControlDirective::ModeSelect,
            Some("VERSUS".to_string()),
            Some(i as u8),
            None,
        ));
        link.send(NetMessage::control(ControlDirective::Start));
    }
    players[0].start();
    players[1].start();

    let mut rng = SimpleRng::new(seed.wrapping_add(99));
    let mut steps = 0u32;
    while steps < MAX_GRAVITY_STEPS {
        if tick_rx.recv_timeout(Duration::from_secs(5)).is_err() {
            break;
        }
        steps += 1;

        for (i, engine) in players.iter_mut().enumerate() {
            queues[i].push_now(random_command(&mut rng));
            for cmd in queues[i].drain_for_tick() {
                engine.command(cmd.command);
            }
            // the scheduler ticks once per gravity interval, so each tick
            // carries a full interval of elapsed time
            engine.step(game_loop.gravity_delay_ms());
            if let Some(attack) = engine.take_outgoing_attack() {
                info!("player {} sends {} attack lines", i, attack.lines);
                links[i].send(NetMessage::attack(attack));
            }
        }

        if steps % HEARTBEAT_EVERY == 0 {
            links[0].send(NetMessage::heartbeat());
            links[1].send(NetMessage::heartbeat());
        }

        for (i, inbox) in inboxes.iter().enumerate() {
            while let Ok(msg) = inbox.try_recv() {
                match msg.payload {
                    Payload::Attack { attack } => players[i].receive_attack(&attack),
                    Payload::Heartbeat => {
                        monitors[i].record((epoch_ms() - msg.timestamp) as f64);
                    }
                    Payload::Control { directive, .. } => {
                        info!("player {} got control {:?}", i, directive);
                    }
                    Payload::Event { .. } => {}
                }
            }
        }

        if players.iter().any(|p| p.phase() == GamePhase::GameOver) {
            break;
        }
    }
    links[0].send(NetMessage::control(ControlDirective::End));
    links[1].send(NetMessage::control(ControlDirective::End));
    game_loop.stop();

    for (i, engine) in players.iter().enumerate() {
        let snap = engine.snapshot();
        info!(
            "player {}: {:?}, {} points, {} lines",
            i, snap.phase, snap.score, snap.lines
        );
    }
    for (i, monitor) in monitors.iter().enumerate() {
        let stats = links[i].stats();
        info!(
            "link {}: {}/{} delivered, avg heartbeat delay {:.0} ms{}",
            i,
            stats.sent - stats.lost,
            stats.sent,
            monitor.average_ms(),
            if monitor.is_degraded() { " (degraded)" } else { "" }
        );
    }
    Ok(())
}
