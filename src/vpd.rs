//! Vapor pressure deficit helpers (Tetens equation, kPa)

/// Saturation vapor pressure at `temperature` °C
pub fn saturation_vapor_pressure(temperature: f64) -> f64 {
    0.6108 * ((17.27 * temperature) / (temperature + 237.3)).exp()
}

/// VPD for `temperature` °C and relative `humidity` %
pub fn vapor_pressure_deficit(temperature: f64, humidity: f64) -> f64 {
    let svp = saturation_vapor_pressure(temperature);
    let avp = (humidity / 100.0) * svp;
    svp - avp
}

/// Two decimals, as shown on the dashboard
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
