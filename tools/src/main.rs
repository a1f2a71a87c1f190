//! sim-runner: headless runner for the wardsim physiology engine.
//!
//! Usage:
//!   sim-runner --seed 42 --ticks 240 --scale 60
//!   sim-runner --scenario hf.json --order furosemide:40:30 --ticks 360
//!   sim-runner --realtime --ticks 120

use anyhow::Result;
use std::env;
use std::fs;
use std::thread;
use std::time::Duration;
use wardsim_core::{
    engine::SimEngine,
    event::{EventKind, SimEvent},
    intervention::{InterventionOrder, Route},
    scenario::Scenario,
    state::edema_description,
};

/// A scheduled order from the command line: name:dose:at_minutes.
struct ScheduledOrder {
    name: String,
    dose: f64,
    at_minutes: f64,
    submitted: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 240u64);
    let scale = parse_arg(&args, "--scale", 60.0f64);
    let realtime = args.iter().any(|a| a == "--realtime");
    let scenario_path = args
        .windows(2)
        .find(|w| w[0] == "--scenario")
        .map(|w| w[1].clone());
    let mut orders = parse_orders(&args);

    let scenario = match &scenario_path {
        Some(path) => Scenario::from_json(&fs::read_to_string(path)?)?,
        None => Scenario::demo_heart_failure(),
    };

    println!("wardsim — sim-runner");
    println!("  scenario: {}", scenario.label);
    println!("  seed:     {seed}");
    println!("  ticks:    {ticks}");
    println!("  scale:    {scale}x");
    println!();

    let mut engine = SimEngine::new(scenario, seed);
    engine.set_time_scale(scale);

    engine.on(EventKind::NurseAlert, |event| {
        if let SimEvent::NurseAlert { message, priority } = event {
            println!("  [ALERT {}] {message}", priority.as_str());
        }
    });
    engine.on(EventKind::LabResult, |event| {
        if let SimEvent::LabResult { values } = event {
            for lab in values {
                println!("  [LAB] {}: {} {}", lab.label, lab.value, lab.unit);
            }
        }
    });
    engine.on(EventKind::TriggerActivated, |event| {
        if let SimEvent::TriggerActivated { trigger_id, elapsed_minutes } = event {
            println!("  [TRIGGER] '{trigger_id}' at {elapsed_minutes:.0} sim-min");
        }
    });

    engine.start();
    let period = Duration::from_millis(engine.clock().tick_period_ms);
    for _ in 0..ticks {
        submit_due_orders(&mut engine, &mut orders);
        engine.tick();
        if realtime {
            thread::sleep(period);
        }
    }

    print_summary(&engine);
    Ok(())
}

fn submit_due_orders(engine: &mut SimEngine, orders: &mut [ScheduledOrder]) {
    let now = engine.elapsed_minutes();
    for order in orders.iter_mut() {
        if !order.submitted && now >= order.at_minutes {
            engine.apply_intervention(InterventionOrder {
                name: order.name.clone(),
                dose: Some(order.dose),
                route: Route::Iv,
            });
            order.submitted = true;
        }
    }
}

fn print_summary(engine: &SimEngine) {
    let vitals = engine.current_vitals();
    let state = engine.state();

    println!();
    println!("── end of run ({:.0} sim-min) ─────────────────", engine.elapsed_minutes());
    println!("  time:        {}", vitals.sim_time);
    println!("  HR:          {} bpm", vitals.heart_rate);
    println!("  BP:          {} mmHg", vitals.blood_pressure);
    println!("  RR:          {} /min", vitals.respiratory_rate);
    println!("  SpO2:        {}%", vitals.oxygen_saturation);
    println!("  temp:        {} C", vitals.temperature);
    println!("  weight:      {} kg", vitals.weight);
    println!("  overload:    {:.2}", state.physiology.fluid_overload);
    println!("  urine:       {:.0} mL/hr", state.physiology.urine_output);
    println!("  creatinine:  {:.2} mg/dL", state.labs.creatinine);
    println!("  potassium:   {:.2} mmol/L", state.labs.potassium);
    println!("  BNP:         {:.0} pg/mL", state.labs.bnp);
    println!("  edema:       {}", edema_description(state.symptoms.edema_grade));
    println!("  trajectory:  {:?}", state.trajectory);
    println!("  history:     {} snapshots", engine.state_history().len());
    println!("  orders:      {}", engine.active_interventions().len());
    println!();
    println!("{}", engine.symptoms_description());
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn parse_orders(args: &[String]) -> Vec<ScheduledOrder> {
    args.windows(2)
        .filter(|w| w[0] == "--order")
        .filter_map(|w| {
            let parsed = parse_order(&w[1]);
            if parsed.is_none() {
                log::warn!("ignoring malformed --order '{}' (want name:dose:at_minutes)", w[1]);
            }
            parsed
        })
        .collect()
}

fn parse_order(raw: &str) -> Option<ScheduledOrder> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next()?.to_string();
    let dose = parts.next()?.parse().ok()?;
    let at_minutes = parts.next()?.parse().ok()?;
    Some(ScheduledOrder { name, dose, at_minutes, submitted: false })
}
