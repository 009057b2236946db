use std::{fmt::Debug, fs, path::Path};

use crate::{poll::State, prelude::*};

impl State {
    #[instrument(name = "Reading the cache…")]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            toml::from_slice(&fs::read(path)?)
                .with_context(|| format!("failed to parse `{}`", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    #[instrument(skip(self), name = "Writing the cache…")]
    pub fn write_to<P: AsRef<Path> + Debug>(&self, path: P) -> Result {
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        core::{consumption::Consumption, interval::Interval, usage::calculate_gas_consumption},
        poll::{MeterState, Usage},
    };

    #[test]
    fn test_missing_cache_is_empty() -> Result {
        let state = State::read_from(env::temp_dir().join("octopus-meter-missing.toml"))?;
        assert!(state.meters.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_and_read() -> Result {
        let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
        let consumption = vec![Consumption::new(Interval::half_hour_from(start), 1.5)];
        let usage = calculate_gas_consumption(&consumption, None).ready().unwrap();
        let mut state = State::default();
        state.meters.insert(
            "gas-1234567890-E6S1".to_string(),
            MeterState {
                period: Some(Interval::new(start, start + chrono::TimeDelta::days(1))),
                consumption: Some(consumption),
                usage: Some(Usage::Gas(usage)),
                cost: None,
            },
        );

        let path = env::temp_dir().join(format!("octopus-meter-{}.toml", std::process::id()));
        state.write_to(&path)?;
        let restored = State::read_from(&path)?;
        fs::remove_file(&path)?;

        let meter_state = &restored.meters["gas-1234567890-E6S1"];
        assert_eq!(meter_state.period, state.meters["gas-1234567890-E6S1"].period);
        assert_eq!(meter_state.consumption.as_ref().map(Vec::len), Some(1));
        let Some(Usage::Gas(usage)) = &meter_state.usage else {
            panic!("expected gas usage");
        };
        assert_eq!(usage.total_kwh.0, 17.044);
        assert!(meter_state.cost.is_none());
        Ok(())
    }
}
