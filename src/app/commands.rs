//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (remote
//! controller, companion app, data-model commands) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! They travel through the task queue like every other event.

use heapless::Vec;

use crate::config::MAX_CREDENTIAL_LEN;
use crate::lock::bolt::OperationSource;
use crate::lock::credentials::FabricIndex;

/// PIN supplied with a remote request.
pub type PinCode = Vec<u8, MAX_CREDENTIAL_LEN>;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Move the bolt to the locked position.  A supplied PIN must match an
    /// occupied PIN credential.
    Lock {
        pin: Option<PinCode>,
        source: OperationSource,
    },

    /// Move the bolt to the unlocked position.
    Unlock {
        pin: Option<PinCode>,
        source: OperationSource,
    },

    /// Start blinking the application indicator so the device can be found.
    IdentifyStart,

    /// Stop identify and restore the lock indication.
    IdentifyStop,

    /// Store a PIN in slot `index`, or free the slot when `pin` is `None`.
    SetPinCredential {
        index: u16,
        fabric: FabricIndex,
        pin: Option<PinCode>,
    },
}
