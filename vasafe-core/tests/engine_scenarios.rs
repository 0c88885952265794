//! End-to-end scenarios for the telemetry engine
//!
//! Each test boots an engine against the in-memory transport and scripted
//! sensors, then drives it with a manual clock:
//! - Offline accumulation past capacity
//! - Maintenance mode lifecycle
//! - Forced sync with ordered drain, including a session drop mid-drain
//! - Emergency debounce under a tight polling loop
//! - Scheduled sync and idle power-down, also after a long session

mod common;

use common::{
    default_engine, engine_with, run_until, temperature_of, tick, MockTransport, ScriptedSensors,
    COMMAND_TOPIC,
};
use vasafe_core::engine::PollReport;
use vasafe_core::publisher::Delivery;
use vasafe_core::{ConnectivityState, ManualClock, TelemetryEngine, TimeSource};

fn recorded_temperature(base: f32, index: usize) -> f32 {
    base + 0.01 * index as f32
}

/// Tick until `count` samples were recorded, stepping temperature per sample
fn record_samples(
    engine: &mut TelemetryEngine,
    transport: &mut MockTransport,
    sensors: &mut ScriptedSensors,
    clock: &ManualClock,
    base: f32,
    count: usize,
) -> Vec<PollReport> {
    let mut reports = Vec::new();
    let mut recorded = 0;
    while recorded < count {
        sensors.temperature = Some(recorded_temperature(base, recorded));
        let report = tick(engine, transport, sensors, clock);
        if report.recorded.is_some() {
            recorded += 1;
            reports.push(report);
        }
    }
    reports
}

#[test]
fn offline_accumulation_keeps_the_most_recent_samples() {
    // One hour over 400 slots hits the 10 s floor
    let mut engine = engine_with("1", "5");
    let mut transport = MockTransport::unreachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    let reports = record_samples(&mut engine, &mut transport, &mut sensors, &clock, 10.0, 450);

    let evictions = reports
        .iter()
        .filter(|r| r.recorded == Some(Delivery::Buffered { evicted: true }))
        .count();
    assert!(reports.iter().all(|r| matches!(r.recorded, Some(Delivery::Buffered { .. }))));
    assert_eq!(evictions, 50);
    assert_eq!(engine.buffer().len(), 400);
    assert!(transport.published.is_empty());

    for (i, payload) in engine.buffer().iter().enumerate() {
        let json: serde_json::Value = serde_json::from_str(payload).unwrap();
        let expected = recorded_temperature(10.0, 50 + i);
        assert!(
            (temperature_of(&json) - expected).abs() < 1e-3,
            "slot {} holds {} instead of {}",
            i,
            temperature_of(&json),
            expected
        );
    }
}

#[test]
fn maintenance_keeps_the_radio_on_until_released() {
    let mut engine = default_engine();
    let mut transport = MockTransport::reachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    engine.submit_command(br#"{"comando":"MANUTENCAO_ON"}"#);
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::Connecting);
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::MaintenanceOnline);
    assert_eq!(transport.subscriptions, [COMMAND_TOPIC]);

    // Well past the idle grace period
    for _ in 0..60 {
        tick(&mut engine, &mut transport, &mut sensors, &clock);
        assert_eq!(engine.state(), ConnectivityState::MaintenanceOnline);
    }
    assert!(transport.powered);
    assert_eq!(engine.snapshot().headline(), "MANUTENCAO");
    let last = transport.telemetry().pop().unwrap();
    assert_eq!(last["modo"], "MANUTENCAO");

    transport.deliver_command("please go MAINTENANCE_OFF");
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
    assert!(!transport.powered);
    assert!(!engine.flags().shutdown_requested);

    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
}

#[test]
fn forced_sync_drains_in_capture_order() {
    let mut engine = engine_with("1", "60");
    let mut transport = MockTransport::unreachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    record_samples(&mut engine, &mut transport, &mut sensors, &clock, 5.0, 5);
    assert_eq!(engine.buffer().len(), 5);

    transport.link_available = true;
    engine.submit_command(br#"{"comando":"SYNC"}"#);
    let mut reports = Vec::new();
    for _ in 0..4 {
        reports.push(tick(&mut engine, &mut transport, &mut sensors, &clock));
    }

    assert!(reports.iter().any(|r| r.drain.is_some_and(|d| d.completed())));
    assert!(!engine.flags().forced_sync_requested);
    assert!(engine.buffer().is_empty());

    let telemetry = transport.telemetry();
    let temperatures: Vec<f32> = telemetry.iter().map(temperature_of).collect();
    for (i, t) in temperatures.iter().take(5).enumerate() {
        assert!((t - recorded_temperature(5.0, i)).abs() < 1e-3);
    }
    // Samples captured during the sync carry the manual-sync tag
    assert!(telemetry.iter().skip(5).all(|p| p["tipo"] == "SYNC_MANUAL"));
    assert!(telemetry.iter().take(5).all(|p| p.get("tipo").is_none()));
}

#[test]
fn drain_resumes_after_a_dropped_session() {
    let mut engine = engine_with("1", "60");
    let mut transport = MockTransport::unreachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    record_samples(&mut engine, &mut transport, &mut sensors, &clock, 5.0, 10);
    transport.link_available = true;
    transport.drop_after = Some(4);
    engine.submit_command(br#"{"comando":"SYNC"}"#);

    let mut interrupted = false;
    for _ in 0..4 {
        sensors.temperature = Some(6.0);
        let report = tick(&mut engine, &mut transport, &mut sensors, &clock);
        if let Some(drain) = report.drain {
            assert_eq!(drain.sent, 4);
            assert!(drain.interrupted.is_some());
            interrupted = true;
            break;
        }
    }
    assert!(interrupted);
    assert!(engine.flags().forced_sync_requested);
    assert!(!engine.buffer().is_empty());

    transport.drop_after = None;
    for _ in 0..6 {
        tick(&mut engine, &mut transport, &mut sensors, &clock);
    }
    assert!(engine.buffer().is_empty());
    assert!(!engine.flags().forced_sync_requested);
    assert_eq!(transport.handshakes, 2);

    // Nothing re-sent, nothing skipped
    let temperatures: Vec<f32> = transport.telemetry().iter().map(temperature_of).collect();
    for (i, t) in temperatures.iter().take(10).enumerate() {
        assert!((t - recorded_temperature(5.0, i)).abs() < 1e-3, "position {}", i);
    }
    assert!(temperatures.iter().skip(10).all(|t| (t - 6.0).abs() < 1e-3));
}

#[test]
fn emergency_debounce_holds_under_tight_polling() {
    let mut engine = default_engine();
    let mut transport = MockTransport::unreachable();
    let mut sensors = ScriptedSensors { light: 100, ..ScriptedSensors::default() };
    let clock = ManualClock::new(0);

    let mut alerts = Vec::new();
    while clock.now() < 30_000 {
        clock.advance(10);
        let report = engine.poll(&mut transport, &mut sensors, &clock);
        if report.emergency.actionable {
            alerts.push(clock.now());
        }
        if report.sensor_tick {
            assert!(report.emergency.active);
        }
    }

    assert_eq!(alerts.len(), 5);
    assert!(alerts.windows(2).all(|w| w[1] - w[0] > 5000));
    assert_eq!(engine.last_emergency_alert(), alerts.last().copied());

    let alerts_buffered = engine.buffer().iter().filter(|p| p.contains("EVENTO_CRITICO")).count();
    assert!(alerts_buffered >= alerts.len());
}

#[test]
fn faulted_sensor_does_not_block_network_activity() {
    let mut engine = default_engine();
    let mut transport = MockTransport::reachable();
    let mut sensors = ScriptedSensors { temperature: None, ..ScriptedSensors::default() };
    let clock = ManualClock::new(0);

    engine.submit_command(br#"{"comando":"SYNC"}"#);
    run_until(&mut engine, &mut transport, &mut sensors, &clock, 5_000);

    let telemetry = transport.telemetry();
    assert!(!telemetry.is_empty());
    assert!(telemetry.iter().all(|p| temperature_of(p) == 0.0));
    assert_eq!(engine.snapshot().headline(), "ERRO SENSOR");
}

#[test]
fn scheduled_sync_then_idle_power_down() {
    let mut engine = default_engine();
    let mut transport = MockTransport::reachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    // Just short of the five minute sync period, 27 s per sample
    run_until(&mut engine, &mut transport, &mut sensors, &clock, 299_000);
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
    let buffered = engine.buffer().len();
    assert!(buffered >= 10);

    let reports = run_until(&mut engine, &mut transport, &mut sensors, &clock, 320_000);
    assert!(reports.iter().any(|r| r.drain.is_some_and(|d| d.sent == buffered)));
    assert!(engine.buffer().is_empty());
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
    assert!(!transport.powered);
    assert_eq!(transport.telemetry().len(), buffered);
}

#[test]
fn long_lid_open_session_still_powers_down() {
    // One minute sync period, lid held open for a minute and a half
    let mut engine = engine_with("3", "1");
    let mut transport = MockTransport::reachable();
    let mut sensors = ScriptedSensors { light: 100, ..ScriptedSensors::default() };
    let clock = ManualClock::new(0);

    let reports = run_until(&mut engine, &mut transport, &mut sensors, &clock, 90_000);
    assert!(reports.iter().filter(|r| r.emergency.actionable).count() >= 10);

    sensors.light = 900;
    let mut first_rest = None;
    let mut powered_ticks = 0;
    let mut ticks = 0;
    while clock.now() < 400_000 {
        tick(&mut engine, &mut transport, &mut sensors, &clock);
        ticks += 1;
        if transport.powered {
            powered_ticks += 1;
        } else if first_rest.is_none() {
            first_rest = Some(clock.now());
        }
    }

    let first_rest = first_rest.expect("radio never powered down after the lid closed");
    assert!(first_rest < 120_000, "first rest at {} ms", first_rest);
    // Later wake-ups are brief scheduled syncs
    assert!(powered_ticks * 4 < ticks, "{} of {} ticks powered", powered_ticks, ticks);
}

#[test]
fn exhausted_connect_reverts_to_radio_off() {
    let mut engine = default_engine();
    let mut transport = MockTransport::unreachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    engine.submit_command(br#"{"comando":"SYNC"}"#);
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::Connecting);

    for _ in 0..14 {
        tick(&mut engine, &mut transport, &mut sensors, &clock);
        assert_eq!(engine.state(), ConnectivityState::Connecting);
    }
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
    assert_eq!(transport.radio_off_count, 1);
    // The forced sync survives and re-triggers on the next tick
    assert!(engine.flags().forced_sync_requested);
    tick(&mut engine, &mut transport, &mut sensors, &clock);
    assert_eq!(engine.state(), ConnectivityState::Connecting);
}

#[test]
fn malformed_commands_change_nothing() {
    let mut engine = default_engine();
    let mut transport = MockTransport::reachable();
    let mut sensors = ScriptedSensors::default();
    let clock = ManualClock::new(0);

    for payload in ["", "{", r#"{"comando":"REBOOT"}"#, "\u{0}\u{1}", "just chatting"] {
        transport.deliver_command(payload);
    }
    tick(&mut engine, &mut transport, &mut sensors, &clock);

    let flags = engine.flags();
    assert!(!flags.forced_sync_requested);
    assert!(!flags.maintenance_mode);
    assert_eq!(flags.remote_status_text.as_str(), "AGUARDANDO");
    assert_eq!(engine.state(), ConnectivityState::RadioOff);
}
