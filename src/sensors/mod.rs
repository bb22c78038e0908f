//! Environmental measurements and their attribute encoding.
//!
//! Readings arrive in physical units and are reported as fixed-point
//! attribute values:
//!
//! | Kind        | Unit | Scale | Valid raw range     | Invalid |
//! |-------------|------|-------|---------------------|---------|
//! | Temperature | °C   | ×100  | -27315 ..= 32767    | 0x8000  |
//! | Humidity    | %RH  | ×100  | 0 ..= 10000         | 0xFFFF  |
//! | Pressure    | kPa  | ×10   | -32767 ..= 32767    | 0x8000  |
//!
//! A failed read or a value outside the valid range is reported as the
//! invalid sentinel; it never stops the dispatch loop.

use log::warn;

use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    Temperature,
    Humidity,
    Pressure,
}

impl MeasurementKind {
    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Pressure];

    const fn scale(self) -> f32 {
        match self {
            Self::Temperature | Self::Humidity => 100.0,
            Self::Pressure => 10.0,
        }
    }

    /// Inclusive raw range accepted for this kind.
    const fn raw_range(self) -> (i32, i32) {
        match self {
            Self::Temperature => (-27315, i16::MAX as i32),
            Self::Humidity => (0, 10_000),
            Self::Pressure => (i16::MIN as i32 + 1, i16::MAX as i32),
        }
    }

    /// The "invalid" attribute value.
    pub const fn invalid(self) -> MeasuredValue {
        match self {
            Self::Temperature => MeasuredValue::Temperature(i16::MIN),
            Self::Humidity => MeasuredValue::Humidity(u16::MAX),
            Self::Pressure => MeasuredValue::Pressure(i16::MIN),
        }
    }

    /// Encode a reading, truncating towards zero like the fixed-point
    /// attribute definition.
    pub fn encode(self, value: f32) -> Result<MeasuredValue, SensorError> {
        let scaled = (value * self.scale()).trunc();
        if !scaled.is_finite() {
            return Err(SensorError::OutOfRange);
        }
        let (min, max) = self.raw_range();
        if scaled < min as f32 || scaled > max as f32 {
            return Err(SensorError::OutOfRange);
        }
        let raw = scaled as i32;
        Ok(match self {
            Self::Temperature => MeasuredValue::Temperature(raw as i16),
            Self::Humidity => MeasuredValue::Humidity(raw as u16),
            Self::Pressure => MeasuredValue::Pressure(raw as i16),
        })
    }
}

/// Attribute-encoded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasuredValue {
    Temperature(i16),
    Humidity(u16),
    Pressure(i16),
}

impl MeasuredValue {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Self::Temperature(_) => MeasurementKind::Temperature,
            Self::Humidity(_) => MeasurementKind::Humidity,
            Self::Pressure(_) => MeasurementKind::Pressure,
        }
    }

    pub fn is_invalid(&self) -> bool {
        *self == self.kind().invalid()
    }
}

/// Turn a driver result into the value to report.
pub fn measured_value(kind: MeasurementKind, reading: Result<f32, SensorError>) -> MeasuredValue {
    match reading.and_then(|v| kind.encode(v)) {
        Ok(v) => v,
        Err(e) => {
            warn!("{:?} measurement invalid: {}", kind, e);
            kind.invalid()
        }
    }
}
