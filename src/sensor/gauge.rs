//! Text diagnostics for the sensor pipelines. Presentation only.

use super::{LookReading, SteeringReading};

/// Default number of steps in a bar; the bar is one character longer.
pub const GAUGE_SIZE: usize = 15;
/// Rotation rate (deg/s) shown at either end of the look bars
pub const LOOK_GAUGE_RANGE: f64 = 10.0;

const MARKER: char = '●';
const FILL: char = '—';
const SEPARATOR: &str = "\n——————\n";

/// `size + 1` fill characters with a marker at `position`.
pub fn bar_gauge(position: usize, size: usize) -> String {
    (0..=size)
        .map(|i| if i == position { MARKER } else { FILL })
        .collect()
}

/// Marker position of `value` on a bar spanning `[-max, max]`.
pub fn centered_position(value: f64, max: f64, size: usize) -> usize {
    (((value / max) + 1.0) * 0.5 * size as f64)
        .clamp(0.0, size as f64)
        .floor() as usize
}

/// Marker position of an axis value on a bar spanning `[0, 255]`.
pub fn axis_position(value: u8, size: usize) -> usize {
    ((value as f64 / 255.0) * size as f64).floor() as usize
}

fn degrees_or_zero(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => format!("{:.1}", v),
        _ => "0".to_string(),
    }
}

pub fn look_text(reading: &LookReading, sensitivity: u8, invert_x: bool, invert_y: bool) -> String {
    let bar_x = bar_gauge(
        centered_position(reading.rate_alpha, LOOK_GAUGE_RANGE, GAUGE_SIZE),
        GAUGE_SIZE,
    );
    let bar_y = bar_gauge(
        centered_position(reading.rate_beta, LOOK_GAUGE_RANGE, GAUGE_SIZE),
        GAUGE_SIZE,
    );
    format!(
        "GYRO (Mouse Look)\nX: [{}] ({:.1})\nY: [{}] ({:.1})\nSens: {} | Inv: {}{}",
        bar_x,
        reading.dx,
        bar_y,
        reading.dy,
        sensitivity,
        if invert_x { "X" } else { "" },
        if invert_y { "Y" } else { "" },
    )
}

pub fn steering_text(reading: &SteeringReading) -> String {
    match reading {
        SteeringReading::NoData => "STEER: No Orientation Data".to_string(),
        SteeringReading::Sample {
            landscape,
            beta,
            gamma,
            relative,
            max_tilt,
            output,
        } => format!(
            "WHEEL ({})\nRaw-B: {}° (Steer)\nRaw-G: {}° (Pitch)\nRel Steer: {:.1}° (Max: ±{:.1}°)\nOUT: [{}] ({})",
            if *landscape { "Landscape" } else { "Portrait" },
            degrees_or_zero(*beta),
            degrees_or_zero(*gamma),
            relative,
            max_tilt,
            bar_gauge(axis_position(*output, GAUGE_SIZE), GAUGE_SIZE),
            output,
        ),
    }
}

/// Joins the non-empty sections with a separator line.
pub fn compose(sections: &[Option<String>]) -> Option<String> {
    let parts: Vec<&str> = sections
        .iter()
        .flatten()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(SEPARATOR))
    }
}
