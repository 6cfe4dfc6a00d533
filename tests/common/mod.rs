use skymap::SkyCoord;
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(clippy::unwrap_used)]
pub fn deg(lon: f64, lat: f64) -> SkyCoord {
    SkyCoord::from_degrees(lon, lat).unwrap()
}

/// Points on a latitude/longitude grid, poles included once each.
pub fn sky_grid(step_deg: u32) -> Vec<SkyCoord> {
    let mut out = vec![deg(0.0, -90.0), deg(0.0, 90.0)];
    let step = i32::try_from(step_deg).unwrap_or(10);
    let mut lat = -90 + step;
    while lat < 90 {
        let mut lon = 0;
        while lon < 360 {
            out.push(deg(f64::from(lon), f64::from(lat)));
            lon += step;
        }
        lat += step;
    }
    out
}
