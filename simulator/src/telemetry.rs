use rand::Rng;

/// Values as the inverter firmware prints them: watts as an integer,
/// energies in kWh.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub now_power: u32,
    pub today_kwh: f64,
    pub total_kwh: f64,
}

/// A fake inverter whose yield counters only ever grow.
#[derive(Debug)]
pub struct Inverter {
    today_kwh: f64,
    total_kwh: f64,
    boot_requests: u64,
    requests: u64,
}

impl Inverter {
    pub fn new(total_kwh: f64, boot_requests: u64) -> Self {
        Self {
            today_kwh: 0.0,
            total_kwh,
            boot_requests,
            requests: 0,
        }
    }

    /// Advances the simulation by one request. While booting every value
    /// reads zero.
    pub fn next_reading(&mut self, rng: &mut impl Rng) -> Reading {
        self.requests += 1;
        if self.requests <= self.boot_requests {
            return Reading {
                now_power: 0,
                today_kwh: 0.0,
                total_kwh: 0.0,
            };
        }

        let now_power = rng.gen_range(0..=600);
        let produced = rng.gen_range(0.0..0.1);
        self.today_kwh += produced;
        self.total_kwh += produced;

        Reading {
            now_power,
            today_kwh: self.today_kwh,
            total_kwh: self.total_kwh,
        }
    }
}

pub fn render_status_page(reading: &Reading) -> String {
    format!(
        r#"<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8">
<script type="text/javascript" src="js/lang.js"></script>
<script type="text/javascript">
var webdata_sn = "SIM0000000001";
var webdata_msvn = "V1.00";
var webdata_pv_type = "";
var webdata_rate_p = "";
var webdata_now_p = "{now}";
var webdata_today_e = "{today:.2}";
var webdata_total_e = "{total:.1}";
var webdata_alarm = "";
var webdata_utime = "0";
</script>
</head>
<body><div id="status">Inverter status</div></body>
</html>
"#,
        now = reading.now_power,
        today = reading.today_kwh,
        total = reading.total_kwh,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_requests_read_zero() {
        let mut rng = rand::thread_rng();
        let mut inverter = Inverter::new(1000.0, 2);

        assert_eq!(inverter.next_reading(&mut rng).total_kwh, 0.0);
        assert_eq!(inverter.next_reading(&mut rng).total_kwh, 0.0);
        assert!(inverter.next_reading(&mut rng).total_kwh >= 1000.0);
    }

    #[test]
    fn test_totals_never_decrease() {
        let mut rng = rand::thread_rng();
        let mut inverter = Inverter::new(42.0, 0);
        let mut last = 0.0;

        for _ in 0..100 {
            let reading = inverter.next_reading(&mut rng);
            assert!(reading.total_kwh >= last);
            assert!(reading.today_kwh <= reading.total_kwh);
            last = reading.total_kwh;
        }
    }

    #[test]
    fn test_page_contains_variables() {
        let page = render_status_page(&Reading {
            now_power: 1500,
            today_kwh: 4.56,
            total_kwh: 123.45,
        });

        assert!(page.contains(r#"var webdata_now_p = "1500";"#));
        assert!(page.contains(r#"var webdata_today_e = "4.56";"#));
        assert!(page.contains(r#"var webdata_total_e = "123.5";"#));
    }
}
