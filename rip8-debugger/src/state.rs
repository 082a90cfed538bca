use debug_abi::{CHANNEL_COUNT, Channel};
use tracing::debug;

use crate::{
    breakpoints::{BreakpointRequest, BreakpointSet, hex_digits, parse_address},
    memory_view::{ViewConfig, extract_window},
    poller::ChannelUpdate,
    snapshot::{
        ChannelValue, InstructionRecord, MemorySnapshot, RegisterSnapshot, Sprite, display_hex,
        display_registers,
    },
    sprite_view::format_sprite,
    view::{Panel, ViewSink},
};

/// Everything the client knows about the target, owned by one task.
///
/// Every snapshot slot is replaced whole; nothing here is mutated field by
/// field.
#[derive(Debug, Default)]
pub struct ClientState {
    registers: Option<RegisterSnapshot>,
    memory: Option<MemorySnapshot>,
    last_instruction: Option<InstructionRecord>,
    next_instruction: Option<InstructionRecord>,
    last_drawn_sprite: Option<Sprite>,
    last_draw_area: Option<Sprite>,
    last_draw_result: Option<Sprite>,
    applied_sequence: [u64; CHANNEL_COUNT],
    breakpoints: BreakpointSet,
    view_config: ViewConfig,
    peek_address: Option<usize>,
}

impl ClientState {
    pub fn new(view_config: ViewConfig) -> Self {
        Self {
            view_config,
            ..Self::default()
        }
    }

    pub fn registers(&self) -> Option<&RegisterSnapshot> {
        self.registers.as_ref()
    }

    pub fn memory(&self) -> Option<&MemorySnapshot> {
        self.memory.as_ref()
    }

    pub fn last_instruction(&self) -> Option<&InstructionRecord> {
        self.last_instruction.as_ref()
    }

    pub fn next_instruction(&self) -> Option<&InstructionRecord> {
        self.next_instruction.as_ref()
    }

    pub fn sprite(&self, channel: Channel) -> Option<&Sprite> {
        match channel {
            Channel::LastDrawnSprite => self.last_drawn_sprite.as_ref(),
            Channel::LastDrawArea => self.last_draw_area.as_ref(),
            Channel::LastDrawResult => self.last_draw_result.as_ref(),
            _ => None,
        }
    }

    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    pub fn view_config(&self) -> ViewConfig {
        self.view_config
    }

    pub fn peek_address(&self) -> Option<usize> {
        self.peek_address
    }

    pub fn applied_sequence(&self, channel: Channel) -> u64 {
        self.applied_sequence[channel.index()]
    }

    /// Replaces the channel's snapshot and renders it. Updates older than the
    /// last applied one for the same channel are dropped; returns whether the
    /// update was applied.
    pub fn apply_update(&mut self, update: ChannelUpdate, sink: &mut impl ViewSink) -> bool {
        let slot = update.channel.index();
        if update.sequence <= self.applied_sequence[slot] {
            debug!(
                "dropping stale {} update seq={} applied={}",
                update.channel, update.sequence, self.applied_sequence[slot]
            );
            return false;
        }
        self.applied_sequence[slot] = update.sequence;

        let panel = Panel::for_channel(update.channel);
        match (update.channel, update.value) {
            (_, ChannelValue::Registers(registers)) => {
                sink.write(panel, &display_registers(&registers));
                self.registers = Some(registers);
            }
            (_, ChannelValue::Memory(memory)) => {
                self.memory = Some(memory);
                self.render_memory(sink);
            }
            (channel, ChannelValue::Instruction(record)) => {
                sink.write(panel, &display_hex(record.value()));
                if channel == Channel::LastInstruction {
                    self.last_instruction = Some(record);
                } else {
                    self.next_instruction = Some(record);
                }
            }
            (channel, ChannelValue::Sprite(sprite)) => {
                sink.write(panel, &format_sprite(sprite.rows()));
                match channel {
                    Channel::LastDrawnSprite => self.last_drawn_sprite = Some(sprite),
                    Channel::LastDrawArea => self.last_draw_area = Some(sprite),
                    _ => self.last_draw_result = Some(sprite),
                }
            }
        }
        true
    }

    /// Invalid input leaves the current peek address in place.
    pub fn set_peek_address(&mut self, input: &str, sink: &mut impl ViewSink) -> bool {
        let Some(address) = parse_peek_address(input) else {
            debug!("ignoring invalid peek address {input:?}");
            return false;
        };
        self.peek_address = Some(address);
        self.render_memory(sink);
        true
    }

    /// Zero or unparsable sizes leave the current size in place.
    pub fn set_window_size(&mut self, input: &str, sink: &mut impl ViewSink) -> bool {
        let accepted = input
            .trim()
            .parse::<usize>()
            .is_ok_and(|size| self.view_config.set_window_size(size));
        if !accepted {
            debug!("ignoring invalid window size {input:?}");
            return false;
        }
        self.render_memory(sink);
        true
    }

    pub fn render_memory(&self, sink: &mut impl ViewSink) {
        let (Some(memory), Some(center)) = (self.memory.as_ref(), self.peek_address) else {
            return;
        };
        let window = extract_window(memory.bytes(), center, self.view_config.window_size());
        sink.write(Panel::MemoryRange, &window.caption());
        sink.write(Panel::Memory, &window.lines().concat());
    }

    pub fn request_breakpoint_add(&mut self, input: &str) -> Option<BreakpointRequest> {
        let Some(address) = parse_address(input) else {
            debug!("ignoring invalid breakpoint address {input:?}");
            return None;
        };
        self.breakpoints.request_add(address)
    }

    pub fn request_breakpoint_remove(&mut self, input: &str) -> Option<BreakpointRequest> {
        let Some(address) = parse_address(input) else {
            debug!("ignoring invalid breakpoint address {input:?}");
            return None;
        };
        self.breakpoints.request_remove(address)
    }

    pub fn complete_breakpoint(
        &mut self,
        request: BreakpointRequest,
        succeeded: bool,
        sink: &mut impl ViewSink,
    ) {
        if self.breakpoints.complete(request, succeeded) {
            sink.write(Panel::Breakpoints, &self.breakpoints.render());
        }
    }
}

fn parse_peek_address(input: &str) -> Option<usize> {
    usize::from_str_radix(hex_digits(input)?, 16).ok()
}
