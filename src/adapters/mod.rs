//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                   |
//! |------------|--------------------|-------------------------------|
//! | `log_sink` | EventSink          | Serial log output             |
//! | `nvs`      | ConfigPort         | In-memory key-value store     |
//! |            | StoragePort        |                               |
//! | `sim`      | every driven port  | Host timers, logging LEDs,    |
//! |            |                    | simulated stack and sensors   |

pub mod log_sink;
pub mod nvs;
pub mod sim;
