use std::fmt;

/// One reading of the inverter status page.
///
/// Power is in watts, both energy counters in watt-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub current_power: i64,
    pub today_energy: i64,
    pub total_energy: i64,
}

impl Sample {
    /// A device that is still booting reports zero lifetime yield.
    pub fn is_plausible(&self) -> bool {
        self.total_energy > 0
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "current_power={} W, today_energy={} Wh, total_energy={} Wh",
            self.current_power, self.today_energy, self.total_energy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_not_plausible() {
        let sample = Sample {
            current_power: 0,
            today_energy: 0,
            total_energy: 0,
        };

        assert!(!sample.is_plausible());
    }

    #[test]
    fn test_negative_total_is_not_plausible() {
        let sample = Sample {
            current_power: 10,
            today_energy: 10,
            total_energy: -1,
        };

        assert!(!sample.is_plausible());
    }

    #[test]
    fn test_positive_total_is_plausible() {
        let sample = Sample {
            current_power: 0,
            today_energy: 0,
            total_energy: 1,
        };

        assert!(sample.is_plausible());
    }
}
