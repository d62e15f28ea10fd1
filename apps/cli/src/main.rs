#![deny(warnings)]

//! Headless CLI: loads a save, reconciles offline time, then simulates a
//! stretch of play against the built-in catalog and saves the result.

use anyhow::Result;
use egg_core::{validate_catalog, Catalog, Clock, GameEvent, GameState, SystemClock};
use egg_econ::{
    click, purchase, recalculate, reconcile_offline, tick, upgrade_price, PurchaseKind,
};
use persistence::{load_state, save_state, FileStore, SaveStore};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Autosave cadence in simulated seconds.
const AUTOSAVE_EVERY_SECONDS: u64 = 5;

struct Args {
    save_path: String,
    seconds: u64,
    clicks_per_sec: u32,
    buy: bool,
    reset: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        save_path: "saves/egg-clicker.json".to_string(),
        seconds: 30,
        clicks_per_sec: 2,
        buy: true,
        reset: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save" => {
                if let Some(v) = it.next() {
                    args.save_path = v;
                }
            }
            "--seconds" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.seconds = v;
                }
            }
            "--clicks-per-sec" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.clicks_per_sec = v;
                }
            }
            "--no-buy" => args.buy = false,
            "--reset" => args.reset = true,
            _ => {}
        }
    }
    args
}

/// The notification sink: render engine events as log lines.
fn report(event: &GameEvent) {
    match event {
        GameEvent::OfflineEarnings {
            elapsed_seconds,
            amount,
        } => info!(elapsed_seconds, amount, "welcome back"),
        GameEvent::AchievementUnlocked { id, name } => {
            info!(id = %id.0, name = %name, "achievement")
        }
        GameEvent::PurchaseRejected { reason } => info!(reason = %reason, "purchase rejected"),
        GameEvent::PurchaseCompleted { item_id } => info!(item_id = %item_id, "purchased"),
    }
}

/// Demo shopper: buy the cheapest upgrade currently affordable.
fn buy_step(state: &mut GameState, catalog: &Catalog) -> Vec<GameEvent> {
    let cheapest = catalog
        .upgrades
        .iter()
        .map(|def| {
            let owned = state.upgrades.get(&def.id).copied().unwrap_or(0);
            (upgrade_price(def, owned), def.id.0.clone())
        })
        .min_by_key(|(price, _)| *price);
    let Some((price, id)) = cheapest else {
        return Vec::new();
    };
    if (price as f64) > state.balance {
        return Vec::new();
    }
    match purchase(state, catalog, PurchaseKind::Upgrade, &id) {
        Ok(events) => events,
        Err(e) => vec![GameEvent::PurchaseRejected {
            reason: e.to_string(),
        }],
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(git_sha = env!("GIT_SHA"), "starting egg-clicker CLI");

    let catalog = Catalog::builtin();
    validate_catalog(&catalog)?;

    let store = FileStore::new(&args.save_path);
    if args.reset {
        store.clear()?;
        info!("save cleared; starting fresh");
    }

    let clock = SystemClock;
    let mut state = match load_state(&store)? {
        Some(mut loaded) => {
            loaded.sanitize(&catalog);
            loaded
        }
        None => GameState::new(&catalog, clock.now_ms()),
    };
    // Rates are derived; never trust the stored copies.
    recalculate(&mut state, &catalog);

    for event in reconcile_offline(&mut state, &catalog, clock.now_ms()) {
        report(&event);
    }

    // Fixed-step virtual clock: one tick per simulated second.
    let mut now_ms = state.last_tick_ms;
    for second in 0..args.seconds {
        now_ms += 1_000;
        for _ in 0..args.clicks_per_sec {
            for event in click(&mut state, &catalog) {
                report(&event);
            }
        }
        for event in tick(&mut state, &catalog, now_ms) {
            report(&event);
        }
        if args.buy {
            for event in buy_step(&mut state, &catalog) {
                report(&event);
            }
        }
        if (second + 1) % AUTOSAVE_EVERY_SECONDS == 0 {
            if let Err(e) = save_state(&store, &state) {
                warn!(error = %e, "autosave failed; will retry");
            }
        }
    }

    if let Err(e) = save_state(&store, &state) {
        warn!(error = %e, "final save failed; progress kept in memory only");
    }

    let unlocked = state.achievements.values().filter(|&&u| u).count();
    println!(
        "Egg farm | balance: {:.1} | per action: {:.2} | per second: {:.2}",
        state.balance, state.per_action_rate, state.per_second_rate
    );
    println!(
        "Owned | upgrades: {} | companions: {} | themes: {} | achievements: {}/{}",
        state.total_upgrade_units(),
        state.total_companions(),
        state.themes.len(),
        unlocked,
        catalog.achievements.len()
    );

    Ok(())
}
