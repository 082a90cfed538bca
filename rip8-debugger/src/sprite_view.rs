use debug_abi::SPRITE_ROW_BITS;

pub fn format_sprite(rows: &[u32]) -> String {
    format_sprite_rows(rows, SPRITE_ROW_BITS)
}

/// One line per row: set bits as `*`, clear bits as `.`. Rows wider than
/// `width` are drawn in full.
pub fn format_sprite_rows(rows: &[u32], width: usize) -> String {
    let mut out = String::with_capacity(rows.len() * (width + 1));
    for row in rows {
        let bits = format!("{row:0width$b}");
        out.extend(bits.chars().map(|bit| if bit == '1' { '*' } else { '.' }));
        out.push('\n');
    }
    out
}
