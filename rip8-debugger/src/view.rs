use std::{
    collections::{BTreeMap, BTreeSet},
    io::{self, Write},
};

use debug_abi::Channel;

use crate::logging::panel_title;

/// Named output targets the client writes formatted text into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Panel {
    Registers,
    Memory,
    MemoryRange,
    LastInstruction,
    NextInstruction,
    Breakpoints,
    LastDrawnSprite,
    LastDrawArea,
    LastDrawResult,
}

pub const PANELS: [Panel; 9] = [
    Panel::Registers,
    Panel::MemoryRange,
    Panel::Memory,
    Panel::LastInstruction,
    Panel::NextInstruction,
    Panel::Breakpoints,
    Panel::LastDrawnSprite,
    Panel::LastDrawArea,
    Panel::LastDrawResult,
];

impl Panel {
    pub const fn name(self) -> &'static str {
        match self {
            Panel::Registers => "registers",
            Panel::Memory => "memory",
            Panel::MemoryRange => "memory-range",
            Panel::LastInstruction => "last-instruction",
            Panel::NextInstruction => "next-instruction",
            Panel::Breakpoints => "breakpoints",
            Panel::LastDrawnSprite => "last-drawn-sprite",
            Panel::LastDrawArea => "last-draw-area",
            Panel::LastDrawResult => "last-draw-result",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Panel::Registers => "Registers",
            Panel::Memory => "Memory",
            Panel::MemoryRange => "Memory range",
            Panel::LastInstruction => "Last instruction",
            Panel::NextInstruction => "Next instruction",
            Panel::Breakpoints => "PC breakpoints",
            Panel::LastDrawnSprite => "Last drawn sprite",
            Panel::LastDrawArea => "Last draw area",
            Panel::LastDrawResult => "Last draw result",
        }
    }

    /// Panel a channel renders into. Memory renders through the peek window.
    pub const fn for_channel(channel: Channel) -> Panel {
        match channel {
            Channel::Registers => Panel::Registers,
            Channel::Memory => Panel::Memory,
            Channel::LastInstruction => Panel::LastInstruction,
            Channel::NextInstruction => Panel::NextInstruction,
            Channel::LastDrawnSprite => Panel::LastDrawnSprite,
            Channel::LastDrawArea => Panel::LastDrawArea,
            Channel::LastDrawResult => Panel::LastDrawResult,
        }
    }

    pub fn from_name(name: &str) -> Option<Panel> {
        match name {
            "regs" | "registers" => Some(Panel::Registers),
            "mem" | "memory" => Some(Panel::Memory),
            "range" | "memory-range" => Some(Panel::MemoryRange),
            "last" | "last-instruction" => Some(Panel::LastInstruction),
            "next" | "next-instruction" => Some(Panel::NextInstruction),
            "breaks" | "breakpoints" => Some(Panel::Breakpoints),
            "sprite" | "last-drawn-sprite" => Some(Panel::LastDrawnSprite),
            "area" | "last-draw-area" => Some(Panel::LastDrawArea),
            "result" | "last-draw-result" => Some(Panel::LastDrawResult),
            _ => None,
        }
    }
}

pub trait ViewSink {
    /// Replaces the text of `panel`.
    fn write(&mut self, panel: Panel, text: &str);

    /// Presents panels on demand. Sinks without a presentation surface ignore
    /// it.
    fn show(&mut self, _panels: &[Panel]) {}
}

/// Latest text per panel, plus the panels written since the last
/// [`ViewBoard::take_dirty`].
#[derive(Clone, Debug, Default)]
pub struct ViewBoard {
    panels: BTreeMap<Panel, String>,
    dirty: BTreeSet<Panel>,
}

impl ViewBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, panel: Panel) -> Option<&str> {
        self.panels.get(&panel).map(String::as_str)
    }

    pub fn take_dirty(&mut self) -> Vec<Panel> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    pub fn render(&self, panels: &[Panel]) -> String {
        let mut out = String::new();
        for panel in panels {
            out.push_str(&panel_title(panel.title()));
            out.push('\n');
            match self.get(*panel) {
                Some(text) if !text.is_empty() => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => out.push_str("(empty)\n"),
            }
        }
        out
    }
}

impl ViewSink for ViewBoard {
    fn write(&mut self, panel: Panel, text: &str) {
        self.panels.insert(panel, text.to_string());
        self.dirty.insert(panel);
    }
}

/// Board-backed sink that prints to a terminal. In follow mode every write is
/// printed as it lands.
pub struct TerminalView<W: Write = io::Stdout> {
    board: ViewBoard,
    follow: bool,
    out: W,
}

impl TerminalView {
    pub fn stdout(follow: bool) -> Self {
        Self::new(io::stdout(), follow)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, follow: bool) -> Self {
        Self {
            board: ViewBoard::new(),
            follow,
            out,
        }
    }

    pub fn board(&self) -> &ViewBoard {
        &self.board
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn present(&mut self, panels: &[Panel]) {
        let text = self.board.render(panels);
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write> ViewSink for TerminalView<W> {
    fn write(&mut self, panel: Panel, text: &str) {
        let changed = self.board.get(panel) != Some(text);
        self.board.write(panel, text);
        if self.follow && changed {
            self.present(&[panel]);
        }
    }

    fn show(&mut self, panels: &[Panel]) {
        self.present(panels);
    }
}
