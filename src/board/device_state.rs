//! Connectivity state and its status indication.

use crate::config::DeviceConfig;
use crate::drivers::led_patterns::Pattern;
use crate::events::ConnectivityEvent;

/// Coarse connectivity state, driven only by stack reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Disconnected,
    AdvertisingBle,
    ConnectedBle,
    Provisioned,
}

impl DeviceState {
    /// Status-indicator pattern for this state.
    pub fn status_pattern(self, config: &DeviceConfig) -> Pattern {
        match self {
            Self::Disconnected => config.disconnected_blink.into(),
            Self::ConnectedBle => config.ble_connected_blink.into(),
            Self::Provisioned => Pattern::On,
            Self::AdvertisingBle => Pattern::Off,
        }
    }

    /// State a connectivity report leads to, if any.
    ///
    /// BLE reports never pull a provisioned device back; only a network
    /// report can.
    pub fn next(self, event: ConnectivityEvent) -> Option<Self> {
        match event {
            ConnectivityEvent::BleAdvertisingChange { advertising, connections } => {
                if self == Self::Provisioned {
                    None
                } else if connections > 0 {
                    Some(Self::ConnectedBle)
                } else if advertising {
                    Some(Self::AdvertisingBle)
                } else {
                    None
                }
            }
            ConnectivityEvent::NetworkChange { provisioned, enabled } => {
                if provisioned && enabled {
                    Some(Self::Provisioned)
                } else {
                    Some(Self::Disconnected)
                }
            }
        }
    }
}
