//! Simulated sensor suite for running the engine on a host

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vasafe_core::SensorSuite;

/// Cold-chain box with a slowly draining battery
///
/// Temperature wanders around a setpoint, the lid is opened now and then
/// for a few reads, and the temperature probe occasionally drops a reading.
pub struct SimulatedSensors {
    rng: StdRng,
    temperature: f32,
    setpoint: f32,
    battery_voltage: f32,
    open_reads_left: u32,
    open_chance: f64,
    fault_chance: f64,
}

impl SimulatedSensors {
    /// Sensors seeded from the OS
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic sensors
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            temperature: 4.0,
            setpoint: 4.0,
            battery_voltage: 4.15,
            open_reads_left: 0,
            open_chance: 0.002,
            fault_chance: 0.001,
        }
    }

    /// Probability per read that the lid opens
    pub fn with_open_chance(mut self, chance: f64) -> Self {
        self.open_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Probability per read that the probe drops a reading
    pub fn with_fault_chance(mut self, chance: f64) -> Self {
        self.fault_chance = chance.clamp(0.0, 1.0);
        self
    }
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSuite for SimulatedSensors {
    fn read_temperature(&mut self) -> Option<f32> {
        if self.rng.gen_bool(self.fault_chance) {
            return None;
        }
        // Mean-reverting walk around the setpoint
        let pull = (self.setpoint - self.temperature) * 0.05;
        self.temperature += pull + self.rng.gen_range(-0.1..0.1);
        Some(self.temperature)
    }

    fn read_light(&mut self) -> u16 {
        if self.open_reads_left == 0 && self.rng.gen_bool(self.open_chance) {
            self.open_reads_left = self.rng.gen_range(3..10);
        }
        if self.open_reads_left > 0 {
            self.open_reads_left -= 1;
            self.rng.gen_range(50..400)
        } else {
            self.rng.gen_range(800..1000)
        }
    }

    fn read_battery_voltage(&mut self) -> Option<f32> {
        self.battery_voltage = (self.battery_voltage - 0.0001).max(3.0);
        Some(self.battery_voltage)
    }
}
