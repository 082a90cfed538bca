//! Endpoint table of the rip8 debug server.
//!
//! Every path the debugger client talks to is declared here so the client and
//! any test double agree on one table.

pub const DEFAULT_HOST: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_PEEK_WINDOW_SIZE: usize = 64;
pub const MEMORY_ROW_WIDTH: usize = 8;
pub const SPRITE_ROW_BITS: usize = 8;

pub const PATH_REGISTERS: &str = "/registers";
pub const PATH_MEMORY: &str = "/memory";
pub const PATH_LAST_INSTRUCTION: &str = "/last-instruction";
pub const PATH_NEXT_INSTRUCTION: &str = "/next-instruction";
pub const PATH_LAST_DRAWN_SPRITE: &str = "/last-drawn-sprite";
pub const PATH_LAST_DRAW_AREA: &str = "/last-draw-area";
pub const PATH_LAST_DRAW_RESULT: &str = "/last-draw-result";

pub const PATH_PAUSE: &str = "/pause";
pub const PATH_RESUME: &str = "/resume";
pub const PATH_STEP_NEXT: &str = "/step-next";
pub const PATH_STEP_NEXT_DRAW: &str = "/step-next-draw";

pub const PATH_ADD_PC_BREAKPOINT: &str = "/add-pc-breakpoint";
pub const PATH_DELETE_PC_BREAKPOINT: &str = "/delete-pc-breakpoint";

/// What a channel's body decodes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Registers,
    Memory,
    Instruction,
    Sprite,
}

/// One independently polled piece of target state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Registers,
    Memory,
    LastInstruction,
    NextInstruction,
    LastDrawnSprite,
    LastDrawArea,
    LastDrawResult,
}

pub const CHANNEL_COUNT: usize = 7;

pub const CHANNELS: [Channel; CHANNEL_COUNT] = [
    Channel::Registers,
    Channel::Memory,
    Channel::LastInstruction,
    Channel::NextInstruction,
    Channel::LastDrawnSprite,
    Channel::LastDrawArea,
    Channel::LastDrawResult,
];

impl Channel {
    pub const fn index(self) -> usize {
        match self {
            Channel::Registers => 0,
            Channel::Memory => 1,
            Channel::LastInstruction => 2,
            Channel::NextInstruction => 3,
            Channel::LastDrawnSprite => 4,
            Channel::LastDrawArea => 5,
            Channel::LastDrawResult => 6,
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Channel::Registers => PATH_REGISTERS,
            Channel::Memory => PATH_MEMORY,
            Channel::LastInstruction => PATH_LAST_INSTRUCTION,
            Channel::NextInstruction => PATH_NEXT_INSTRUCTION,
            Channel::LastDrawnSprite => PATH_LAST_DRAWN_SPRITE,
            Channel::LastDrawArea => PATH_LAST_DRAW_AREA,
            Channel::LastDrawResult => PATH_LAST_DRAW_RESULT,
        }
    }

    pub const fn kind(self) -> ChannelKind {
        match self {
            Channel::Registers => ChannelKind::Registers,
            Channel::Memory => ChannelKind::Memory,
            Channel::LastInstruction | Channel::NextInstruction => ChannelKind::Instruction,
            Channel::LastDrawnSprite | Channel::LastDrawArea | Channel::LastDrawResult => {
                ChannelKind::Sprite
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Registers => "registers",
            Channel::Memory => "memory",
            Channel::LastInstruction => "last-instruction",
            Channel::NextInstruction => "next-instruction",
            Channel::LastDrawnSprite => "last-drawn-sprite",
            Channel::LastDrawArea => "last-draw-area",
            Channel::LastDrawResult => "last-draw-result",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn channel_by_path(path: &str) -> Option<Channel> {
    CHANNELS.iter().copied().find(|channel| channel.path() == path)
}

/// One-shot execution control understood by the debug server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Pause,
    Resume,
    Step,
    StepDraw,
}

pub const CONTROL_COMMANDS: [ControlCommand; 4] = [
    ControlCommand::Pause,
    ControlCommand::Resume,
    ControlCommand::Step,
    ControlCommand::StepDraw,
];

impl ControlCommand {
    pub const fn path(self) -> &'static str {
        match self {
            ControlCommand::Pause => PATH_PAUSE,
            ControlCommand::Resume => PATH_RESUME,
            ControlCommand::Step => PATH_STEP_NEXT,
            ControlCommand::StepDraw => PATH_STEP_NEXT_DRAW,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Step => "step",
            ControlCommand::StepDraw => "step-draw",
        }
    }
}

impl std::fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The address segment is the decimal value of the address.
pub fn add_breakpoint_path(address: u16) -> String {
    format!("{PATH_ADD_PC_BREAKPOINT}/{address}")
}

pub fn delete_breakpoint_path(address: u16) -> String {
    format!("{PATH_DELETE_PC_BREAKPOINT}/{address}")
}
