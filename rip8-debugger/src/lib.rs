mod breakpoints;
mod console;
mod control;
mod logging;
mod memory_view;
mod poller;
mod session;
mod snapshot;
mod sprite_view;
mod state;
#[cfg(test)]
mod testing;
mod transport;
mod view;

pub use debug_abi::{
    CHANNEL_COUNT, CHANNELS, CONTROL_COMMANDS, Channel, ChannelKind, ControlCommand,
    DEFAULT_HOST, DEFAULT_PEEK_WINDOW_SIZE, DEFAULT_POLL_INTERVAL_MS, add_breakpoint_path,
    channel_by_path, delete_breakpoint_path,
};

pub use breakpoints::{
    Address, BreakpointAction, BreakpointRequest, BreakpointSet, parse_address,
};
pub use console::{HELP_TEXT, OperatorCommand, ParseError, parse_command, spawn_console};
pub use control::{dispatch, spawn_dispatch};
pub use logging::init as init_logging;
pub use memory_view::{
    MemoryRow, MemoryWindow, ViewConfig, extract_window, format_window, row_count,
    window_bounds,
};
pub use poller::{ChannelUpdate, PollError, PollErrorKind, PollResult, Poller, fetch_channel};
pub use session::{ClientEvent, DebugSession, SessionConfig, SessionFlow};
pub use snapshot::{
    ChannelValue, DecodeError, InstructionRecord, MemorySnapshot, RegisterSnapshot, Sprite,
    decode, display_hex, display_registers, hexify,
};
pub use sprite_view::{format_sprite, format_sprite_rows};
pub use state::ClientState;
pub use transport::{HttpTransport, Transport, TransportError, normalize_base_url};
pub use view::{PANELS, Panel, TerminalView, ViewBoard, ViewSink};
