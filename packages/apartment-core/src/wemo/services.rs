//! WeMo UPnP service actions.
//!
//! Single source of truth for the `basicevent` action names and the
//! SOAPACTION header values they are sent with.

use crate::protocol_constants::BASIC_EVENT_URN;

/// Actions of the `basicevent` service used for on/off control.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum BasicEventAction {
    /// Reads the relay state.
    GetBinaryState,
    /// Switches the relay on or off.
    SetBinaryState,
}

impl BasicEventAction {
    /// Returns the SOAP action name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetBinaryState => "GetBinaryState",
            Self::SetBinaryState => "SetBinaryState",
        }
    }

    /// Returns the quoted SOAPACTION header value, e.g.
    /// `"urn:Belkin:service:basicevent:1#GetBinaryState"`.
    #[must_use]
    pub fn soap_action(&self) -> String {
        format!("\"{}#{}\"", BASIC_EVENT_URN, self.name())
    }
}
