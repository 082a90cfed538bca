use debug_abi::{add_breakpoint_path, delete_breakpoint_path};
use tracing::{debug, info, warn};

use crate::logging::category_breakpoint;

pub type Address = u16;

/// Parses operator input as hex, with or without a `0x` prefix.
pub fn parse_address(input: &str) -> Option<Address> {
    Address::from_str_radix(hex_digits(input)?, 16).ok()
}

pub(crate) fn hex_digits(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    (!digits.is_empty()).then_some(digits)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakpointAction {
    Add,
    Remove,
}

/// A request the manager wants sent; its outcome must be fed back through
/// [`BreakpointSet::complete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakpointRequest {
    pub action: BreakpointAction,
    pub address: Address,
}

impl BreakpointRequest {
    pub fn path(&self) -> String {
        match self.action {
            BreakpointAction::Add => add_breakpoint_path(self.address),
            BreakpointAction::Remove => delete_breakpoint_path(self.address),
        }
    }
}

/// Client mirror of the target's PC breakpoints.
///
/// `mirror` is updated optimistically when an add is requested. `listed` only
/// holds addresses the target has acknowledged, in acknowledgement order; each
/// listed entry is what carries a removal control.
#[derive(Clone, Debug, Default)]
pub struct BreakpointSet {
    mirror: Vec<Address>,
    listed: Vec<Address>,
}

impl BreakpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: Address) -> bool {
        self.mirror.contains(&address)
    }

    pub fn addresses(&self) -> &[Address] {
        &self.mirror
    }

    pub fn listed(&self) -> &[Address] {
        &self.listed
    }

    pub fn request_add(&mut self, address: Address) -> Option<BreakpointRequest> {
        if self.contains(address) {
            debug!(
                "{} ignoring duplicate breakpoint {address:#x}",
                category_breakpoint()
            );
            return None;
        }
        self.mirror.push(address);
        Some(BreakpointRequest {
            action: BreakpointAction::Add,
            address,
        })
    }

    pub fn request_remove(&mut self, address: Address) -> Option<BreakpointRequest> {
        if !self.listed.contains(&address) {
            debug!(
                "{} ignoring removal of unlisted breakpoint {address:#x}",
                category_breakpoint()
            );
            return None;
        }
        Some(BreakpointRequest {
            action: BreakpointAction::Remove,
            address,
        })
    }

    /// Applies the target's answer. Returns true when the listed entries
    /// changed.
    pub fn complete(&mut self, request: BreakpointRequest, succeeded: bool) -> bool {
        let address = request.address;
        match (request.action, succeeded) {
            (BreakpointAction::Add, true) => {
                if !self.contains(address) || self.listed.contains(&address) {
                    return false;
                }
                self.listed.push(address);
                info!("{} breakpoint set at {address:#x}", category_breakpoint());
                true
            }
            (BreakpointAction::Add, false) => {
                self.mirror.retain(|existing| *existing != address);
                warn!(
                    "{} target rejected breakpoint {address:#x}, rolled back",
                    category_breakpoint()
                );
                false
            }
            (BreakpointAction::Remove, true) => {
                self.mirror.retain(|existing| *existing != address);
                let before = self.listed.len();
                self.listed.retain(|existing| *existing != address);
                info!(
                    "{} breakpoint cleared at {address:#x}",
                    category_breakpoint()
                );
                before != self.listed.len()
            }
            (BreakpointAction::Remove, false) => {
                warn!(
                    "{} target failed to clear breakpoint {address:#x}",
                    category_breakpoint()
                );
                false
            }
        }
    }

    pub fn render(&self) -> String {
        self.listed
            .iter()
            .map(|address| format!("{address:#x}\n"))
            .collect()
    }
}
