//! Host-facing framed request/response protocol.
//!
//! A request is four bytes on the wire: opcode, two parameters, and the fixed
//! terminator. Framing is position-based rather than length-prefixed: the
//! decoder tracks a position local to each delivery event, and a frame only
//! completes when the terminator arrives at local index 0 — i.e. the
//! canonical transaction is a `[opcode, p0, p1]` write followed by a `[10]`
//! write. Every response is exactly four bytes:
//! `[error, echoed opcode, payload hi, payload lo]`.

/// Terminator byte closing every command frame. Opcodes must never equal it.
pub const FRAME_TERMINATOR: u8 = 10;

/// Number of parameter bytes in a command frame.
pub const PARAM_COUNT: usize = 2;

/// Length of every response frame.
pub const RESPONSE_LEN: usize = 4;

/// Wire opcodes. Numbering starts past the terminator byte and is fixed.
pub mod opcode {
    pub const GET_IGNITION_STATE: u8 = 11;
    pub const GET_IGNITION_CHANGE_SECONDS: u8 = 12;
    pub const GET_IGNITION_CHANGE_MINUTES: u8 = 13;
    pub const ECHO: u8 = 14;
    pub const PAT_WATCHDOG: u8 = 15;

    pub const DEBUG_SET_DEBOUNCE_ENABLED: u8 = 100;
    pub const DEBUG_FORCE_IGNITION_STATE: u8 = 101;
    pub const DEBUG_GET_DEBOUNCE_ENABLED: u8 = 102;
    pub const DEBUG_GET_TEST_COUNTER: u8 = 103;
    pub const DEBUG_GET_WATCHDOG_PHASE: u8 = 104;
}

/// Commands a host can issue over the bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HostCommand {
    /// Read the latched ignition state as 0/1.
    GetIgnitionState,
    /// Read seconds since the ignition latch last changed.
    GetIgnitionChangeSeconds,
    /// Read minutes since the ignition latch last changed.
    GetIgnitionChangeMinutes,
    /// Return the two parameter bytes verbatim.
    Echo,
    /// Keep-alive: record a watchdog pat.
    PatWatchdog,
    /// Diagnostic command group, honored only in debug mode.
    Debug(DebugCommand),
}

/// Diagnostic commands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DebugCommand {
    /// Enable or disable the debounce filter from parameter 0.
    SetDebounceEnabled,
    /// Latch the ignition state directly from parameter 0.
    ForceIgnitionState,
    /// Read the debounce-enable flag.
    GetDebounceEnabled,
    /// Read the diagnostic test counter.
    GetTestCounter,
    /// Read the watchdog phase code.
    GetWatchdogPhase,
}

impl HostCommand {
    /// Decodes a wire opcode.
    #[must_use]
    pub const fn from_opcode(raw: u8) -> Option<Self> {
        match raw {
            opcode::GET_IGNITION_STATE => Some(HostCommand::GetIgnitionState),
            opcode::GET_IGNITION_CHANGE_SECONDS => Some(HostCommand::GetIgnitionChangeSeconds),
            opcode::GET_IGNITION_CHANGE_MINUTES => Some(HostCommand::GetIgnitionChangeMinutes),
            opcode::ECHO => Some(HostCommand::Echo),
            opcode::PAT_WATCHDOG => Some(HostCommand::PatWatchdog),
            opcode::DEBUG_SET_DEBOUNCE_ENABLED => {
                Some(HostCommand::Debug(DebugCommand::SetDebounceEnabled))
            }
            opcode::DEBUG_FORCE_IGNITION_STATE => {
                Some(HostCommand::Debug(DebugCommand::ForceIgnitionState))
            }
            opcode::DEBUG_GET_DEBOUNCE_ENABLED => {
                Some(HostCommand::Debug(DebugCommand::GetDebounceEnabled))
            }
            opcode::DEBUG_GET_TEST_COUNTER => Some(HostCommand::Debug(DebugCommand::GetTestCounter)),
            opcode::DEBUG_GET_WATCHDOG_PHASE => {
                Some(HostCommand::Debug(DebugCommand::GetWatchdogPhase))
            }
            _ => None,
        }
    }

    /// Encodes the command back into its wire opcode.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            HostCommand::GetIgnitionState => opcode::GET_IGNITION_STATE,
            HostCommand::GetIgnitionChangeSeconds => opcode::GET_IGNITION_CHANGE_SECONDS,
            HostCommand::GetIgnitionChangeMinutes => opcode::GET_IGNITION_CHANGE_MINUTES,
            HostCommand::Echo => opcode::ECHO,
            HostCommand::PatWatchdog => opcode::PAT_WATCHDOG,
            HostCommand::Debug(DebugCommand::SetDebounceEnabled) => {
                opcode::DEBUG_SET_DEBOUNCE_ENABLED
            }
            HostCommand::Debug(DebugCommand::ForceIgnitionState) => {
                opcode::DEBUG_FORCE_IGNITION_STATE
            }
            HostCommand::Debug(DebugCommand::GetDebounceEnabled) => {
                opcode::DEBUG_GET_DEBOUNCE_ENABLED
            }
            HostCommand::Debug(DebugCommand::GetTestCounter) => opcode::DEBUG_GET_TEST_COUNTER,
            HostCommand::Debug(DebugCommand::GetWatchdogPhase) => opcode::DEBUG_GET_WATCHDOG_PHASE,
        }
    }

    /// Whether this is a diagnostic command.
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, HostCommand::Debug(_))
    }
}

/// Protocol-level errors, visible to the host for exactly one response.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// More bytes arrived before the terminator than the frame can hold.
    BufferOverflow,
    /// The opcode did not decode to a command.
    UnknownCommand,
    /// A response was requested before a frame completed.
    CommandIncomplete,
}

impl ProtocolError {
    /// Encodes the error into its wire code.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            ProtocolError::BufferOverflow => 1,
            ProtocolError::UnknownCommand => 2,
            ProtocolError::CommandIncomplete => 3,
        }
    }
}

/// Incremental decoder for inbound command frames.
///
/// One decoder instance lives for the process lifetime; delivery events reset
/// only the local position, never the captured opcode or parameters.
#[derive(Clone, Debug)]
pub struct FrameDecoder {
    opcode: u8,
    params: [u8; PARAM_COUNT],
    complete: bool,
    pending_error: Option<ProtocolError>,
}

impl FrameDecoder {
    /// Creates an empty decoder with no completed frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            opcode: 0,
            params: [0; PARAM_COUNT],
            complete: false,
            pending_error: None,
        }
    }

    /// Consumes one delivery event of 0..N bytes.
    ///
    /// Position is local to the event. Index 0 carries the opcode, or the
    /// terminator to complete the frame; indices 1 and 2 carry parameters.
    /// Anything later overflows: the error is latched and the remaining bytes
    /// are consumed and discarded.
    pub fn receive(&mut self, bytes: &[u8]) {
        for (index, &byte) in bytes.iter().enumerate() {
            // Completion only survives when the terminator is the event's
            // final byte.
            self.complete = false;
            match index {
                0 if byte == FRAME_TERMINATOR => self.complete = true,
                0 => self.opcode = byte,
                1..=PARAM_COUNT => self.params[index - 1] = byte,
                _ => self.pending_error = Some(ProtocolError::BufferOverflow),
            }
        }
    }

    /// Whether the current frame has been terminated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Opcode of the current (possibly incomplete) frame.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Parameter bytes of the current frame.
    #[must_use]
    pub const fn params(&self) -> [u8; PARAM_COUNT] {
        self.params
    }

    /// Takes the latched receive error, clearing it.
    pub fn take_error(&mut self) -> Option<ProtocolError> {
        self.pending_error.take()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response frame as sent on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResponseFrame {
    error: u8,
    echoed_opcode: u8,
    payload: [u8; PARAM_COUNT],
}

impl ResponseFrame {
    /// Successful response carrying raw payload bytes.
    #[must_use]
    pub const fn ok(echoed_opcode: u8, payload: [u8; PARAM_COUNT]) -> Self {
        Self {
            error: 0,
            echoed_opcode,
            payload,
        }
    }

    /// Successful response carrying a big-endian 16-bit value.
    #[must_use]
    pub const fn with_value(echoed_opcode: u8, value: u16) -> Self {
        Self::ok(echoed_opcode, value.to_be_bytes())
    }

    /// Error response with a zeroed payload.
    #[must_use]
    pub const fn failed(error: ProtocolError, echoed_opcode: u8) -> Self {
        Self {
            error: error.to_raw(),
            echoed_opcode,
            payload: [0; PARAM_COUNT],
        }
    }

    /// Wire error code (0 means none).
    #[must_use]
    pub const fn error_code(&self) -> u8 {
        self.error
    }

    /// Encodes the response for transmission.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; RESPONSE_LEN] {
        [
            self.error,
            self.echoed_opcode,
            self.payload[0],
            self.payload[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_two_write_transaction_completes() {
        let mut decoder = FrameDecoder::new();
        decoder.receive(&[opcode::ECHO, 0x41, 0x42]);
        assert!(!decoder.is_complete());

        decoder.receive(&[FRAME_TERMINATOR]);
        assert!(decoder.is_complete());
        assert_eq!(decoder.opcode(), opcode::ECHO);
        assert_eq!(decoder.params(), [0x41, 0x42]);
        assert_eq!(decoder.take_error(), None);
    }

    #[test]
    fn bytes_past_the_parameter_slots_overflow_without_corruption() {
        let mut decoder = FrameDecoder::new();
        decoder.receive(&[opcode::ECHO, 1, 2, 3, 4]);

        assert_eq!(decoder.take_error(), Some(ProtocolError::BufferOverflow));
        // The two parameter slots keep the bytes that fit.
        assert_eq!(decoder.params(), [1, 2]);
        assert!(!decoder.is_complete());
        // The error reads out once, then clears.
        assert_eq!(decoder.take_error(), None);
    }

    #[test]
    fn terminator_mid_event_does_not_complete() {
        let mut decoder = FrameDecoder::new();
        // Terminator at a parameter position is data, not framing.
        decoder.receive(&[opcode::ECHO, FRAME_TERMINATOR]);
        assert!(!decoder.is_complete());
        assert_eq!(decoder.params()[0], FRAME_TERMINATOR);

        // A trailing byte after a lone terminator also voids completion.
        decoder.receive(&[FRAME_TERMINATOR, 7]);
        assert!(!decoder.is_complete());
    }

    #[test]
    fn next_event_restarts_the_local_position() {
        let mut decoder = FrameDecoder::new();
        decoder.receive(&[opcode::GET_IGNITION_STATE, 0, 0, 9]);
        assert_eq!(decoder.take_error(), Some(ProtocolError::BufferOverflow));

        // A fresh event decodes normally; the overflow left no residue.
        decoder.receive(&[opcode::ECHO, 5, 6]);
        decoder.receive(&[FRAME_TERMINATOR]);
        assert!(decoder.is_complete());
        assert_eq!(decoder.opcode(), opcode::ECHO);
        assert_eq!(decoder.params(), [5, 6]);
    }

    #[test]
    fn empty_event_preserves_state() {
        let mut decoder = FrameDecoder::new();
        decoder.receive(&[opcode::ECHO, 1, 2]);
        decoder.receive(&[FRAME_TERMINATOR]);
        decoder.receive(&[]);
        assert!(decoder.is_complete());
    }

    #[test]
    fn opcode_decoding_covers_the_debug_group() {
        assert_eq!(
            HostCommand::from_opcode(11),
            Some(HostCommand::GetIgnitionState)
        );
        assert_eq!(
            HostCommand::from_opcode(104),
            Some(HostCommand::Debug(DebugCommand::GetWatchdogPhase))
        );
        assert_eq!(HostCommand::from_opcode(99), None);
        assert_eq!(HostCommand::from_opcode(FRAME_TERMINATOR), None);

        for raw in [11, 12, 13, 14, 15, 100, 101, 102, 103, 104] {
            let command = HostCommand::from_opcode(raw).unwrap();
            assert_eq!(command.opcode(), raw);
            assert_eq!(command.is_debug(), raw >= 100);
        }
    }

    #[test]
    fn response_encoding_is_wire_exact() {
        let echo = ResponseFrame::ok(opcode::ECHO, [0x41, 0x42]);
        assert_eq!(echo.to_bytes(), [0, opcode::ECHO, 0x41, 0x42]);

        let value = ResponseFrame::with_value(opcode::GET_IGNITION_CHANGE_SECONDS, 0x1234);
        assert_eq!(
            value.to_bytes(),
            [0, opcode::GET_IGNITION_CHANGE_SECONDS, 0x12, 0x34]
        );

        let failed = ResponseFrame::failed(ProtocolError::UnknownCommand, 99);
        assert_eq!(failed.to_bytes(), [2, 99, 0, 0]);
    }

    #[test]
    fn error_codes_match_the_wire() {
        assert_eq!(ProtocolError::BufferOverflow.to_raw(), 1);
        assert_eq!(ProtocolError::UnknownCommand.to_raw(), 2);
        assert_eq!(ProtocolError::CommandIncomplete.to_raw(), 3);
    }
}
