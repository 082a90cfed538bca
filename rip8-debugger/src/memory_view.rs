use debug_abi::{DEFAULT_PEEK_WINDOW_SIZE, MEMORY_ROW_WIDTH};
use serde_json::Value;

use crate::snapshot::hexify;

/// Operator-controlled view parameters. Never sent to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    window_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_PEEK_WINDOW_SIZE,
        }
    }
}

impl ViewConfig {
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns false and keeps the previous size when `size` is zero.
    pub fn set_window_size(&mut self, size: usize) -> bool {
        if size == 0 {
            return false;
        }
        self.window_size = size;
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryRow {
    pub address: usize,
    pub bytes: Vec<u8>,
}

impl MemoryRow {
    pub fn render(&self) -> String {
        let literal = Value::Array(self.bytes.iter().map(|byte| Value::from(*byte)).collect());
        format!("{:#x}: {}\n", self.address, hexify(&literal))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryWindow {
    pub start: usize,
    pub end: usize,
    pub entries: Vec<u8>,
    pub rows: Vec<MemoryRow>,
}

impl MemoryWindow {
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(MemoryRow::render).collect()
    }

    pub fn caption(&self) -> String {
        format!("{:#x} - {:#x}", self.start, self.end)
    }
}

/// `end` is inclusive and clamped to the memory length, not the last index.
pub fn window_bounds(memory_len: usize, center: usize, window_size: usize) -> (usize, usize) {
    let half = window_size / 2;
    let start = center.saturating_sub(half);
    let end = memory_len.min(center.saturating_add(half));
    (start, end)
}

/// Rounds half up, so a trailing partial row of fewer than four entries is
/// not shown.
pub fn row_count(entries: usize) -> usize {
    (entries + MEMORY_ROW_WIDTH / 2) / MEMORY_ROW_WIDTH
}

pub fn extract_window(memory: &[u8], center: usize, window_size: usize) -> MemoryWindow {
    let (start, end) = window_bounds(memory.len(), center, window_size);
    if start >= memory.len() {
        return MemoryWindow {
            start,
            end,
            ..MemoryWindow::default()
        };
    }

    let last = end.min(memory.len() - 1);
    let entries = memory[start..=last].to_vec();
    let rows = (0..row_count(entries.len()))
        .map(|row| {
            let offset = row * MEMORY_ROW_WIDTH;
            let upper = (offset + MEMORY_ROW_WIDTH).min(entries.len());
            MemoryRow {
                address: start + offset,
                bytes: entries[offset..upper].to_vec(),
            }
        })
        .collect();

    MemoryWindow {
        start,
        end,
        entries,
        rows,
    }
}

pub fn format_window(memory: &[u8], center: usize, window_size: usize) -> Vec<String> {
    extract_window(memory, center, window_size).lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|address| address as u8).collect()
    }

    #[test]
    fn centered_window_has_two_labelled_rows() {
        let memory = ramp(256);
        let window = extract_window(&memory, 0x80, 16);
        assert_eq!(window.start, 0x78);
        assert_eq!(window.end, 0x88);
        assert_eq!(window.rows.len(), 2);
        assert!(window.rows.iter().all(|row| row.bytes.len() == 8));

        let lines = format_window(&memory, 0x80, 16);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x78: "));
        assert!(lines[1].starts_with("0x80: "));
        assert_eq!(
            lines[0],
            "0x78: [\"0x78\",\"0x79\",\"0x7a\",\"0x7b\",\"0x7c\",\"0x7d\",\"0x7e\",\"0x7f\"]\n"
        );
        assert_eq!(window.caption(), "0x78 - 0x88");
    }

    #[test]
    fn entries_include_the_end_address() {
        let memory = ramp(4096);
        for window_size in [1usize, 2, 7, 16, 33, 64, 100] {
            for center in [0usize, 3, 40, 0x200, 2000, 4000] {
                let window = extract_window(&memory, center, window_size);
                if window.end < memory.len() {
                    assert_eq!(
                        window.entries.len(),
                        window.end - window.start + 1,
                        "center={center} size={window_size}"
                    );
                }
                assert!(window.rows.iter().all(|row| row.bytes.len() <= 8));
            }
        }
    }

    #[test]
    fn window_clamps_at_memory_edges() {
        let memory = ramp(256);
        let low = extract_window(&memory, 2, 16);
        assert_eq!(low.start, 0);
        assert_eq!(low.end, 10);
        assert_eq!(low.entries.len(), 11);

        let high = extract_window(&memory, 250, 16);
        assert_eq!(high.start, 242);
        assert_eq!(high.end, 256);
        assert_eq!(high.entries.len(), 14);
        assert_eq!(high.entries.last(), Some(&255));
    }

    #[test]
    fn row_count_rounds_half_up() {
        assert_eq!(row_count(0), 0);
        assert_eq!(row_count(3), 0);
        assert_eq!(row_count(4), 1);
        assert_eq!(row_count(8), 1);
        assert_eq!(row_count(12), 2);
        assert_eq!(row_count(17), 2);
        assert_eq!(row_count(65), 8);
    }

    #[test]
    fn short_trailing_row_is_kept_when_half_full() {
        let memory = ramp(64);
        let window = extract_window(&memory, 6, 12);
        assert_eq!((window.start, window.end), (0, 12));
        assert_eq!(window.rows.len(), 2);
        assert_eq!(window.rows[1].address, 8);
        assert_eq!(window.rows[1].bytes, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn formatting_is_idempotent() {
        let memory = ramp(512);
        assert_eq!(
            format_window(&memory, 0x123, 40),
            format_window(&memory, 0x123, 40)
        );
    }

    #[test]
    fn out_of_range_center_yields_empty_window() {
        let memory = ramp(16);
        let window = extract_window(&memory, 100, 8);
        assert!(window.entries.is_empty());
        assert!(window.rows.is_empty());
        assert!(format_window(&[], 0, 64).is_empty());
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let mut config = ViewConfig::default();
        assert_eq!(config.window_size(), 64);
        assert!(!config.set_window_size(0));
        assert_eq!(config.window_size(), 64);
        assert!(config.set_window_size(16));
        assert_eq!(config.window_size(), 16);
    }
}
