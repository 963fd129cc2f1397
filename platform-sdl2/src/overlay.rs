/// Minimal 4x5 bitmap font for FPS overlay. Each glyph is 4 pixels wide, 5 rows tall.
/// Bits are MSB-left within each u8 (only top 4 bits used).
const GLYPHS: &[(&[u8; 5], u8)] = &[
    // '0'
    (&[0x60, 0x90, 0x90, 0x90, 0x60], b'0'),
    // '1'
    (&[0x20, 0x60, 0x20, 0x20, 0x70], b'1'),
    // '2'
    (&[0x60, 0x90, 0x20, 0x40, 0xF0], b'2'),
    // '3'
    (&[0x60, 0x90, 0x20, 0x90, 0x60], b'3'),
    // '4'
    (&[0x90, 0x90, 0xF0, 0x10, 0x10], b'4'),
    // '5'
    (&[0xF0, 0x80, 0xE0, 0x10, 0xE0], b'5'),
    // '6'
    (&[0x60, 0x80, 0xE0, 0x90, 0x60], b'6'),
    // '7'
    (&[0xF0, 0x10, 0x20, 0x40, 0x40], b'7'),
    // '8'
    (&[0x60, 0x90, 0x60, 0x90, 0x60], b'8'),
    // '9'
    (&[0x60, 0x90, 0x70, 0x10, 0x60], b'9'),
    // '.'
    (&[0x00, 0x00, 0x00, 0x00, 0x40], b'.'),
    // ' '
    (&[0x00, 0x00, 0x00, 0x00, 0x00], b' '),
];

const GLYPH_W: usize = 4;

fn glyph_for(ch: u8) -> &'static [u8; 5] {
    for &(data, c) in GLYPHS {
        if c == ch {
            return data;
        }
    }
    // fallback: space
    &[0x00, 0x00, 0x00, 0x00, 0x00]
}

/// Draw an FPS string (e.g. "60.1") onto an RGB24 framebuffer.
/// Renders at the top-left corner with 1px padding.
pub fn draw_fps(buffer: &mut [u8], width: usize, text: &str) {
    draw_text(buffer, width, 2, 2, text, (255, 255, 255));
}

fn draw_text(buffer: &mut [u8], width: usize, x0: usize, y0: usize, text: &str, color: (u8, u8, u8)) {
    for (ci, ch) in text.bytes().enumerate() {
        let glyph = glyph_for(ch.to_ascii_uppercase());
        let gx = x0 + ci * (GLYPH_W + 1);

        for (row, &bits) in glyph.iter().enumerate() {
            let py = y0 + row;
            for col in 0..GLYPH_W {
                if bits & (0x80 >> col) != 0 {
                    let px = gx + col;
                    let offset = (py * width + px) * 3;
                    if offset + 2 < buffer.len() {
                        buffer[offset] = color.0;
                        buffer[offset + 1] = color.1;
                        buffer[offset + 2] = color.2;
                    }
                }
            }
        }
    }
}

/// Render the catalog selection overlay: every entry's title on its own
/// row, the currently selected row inverted so it stands out against the
/// running ROM's display underneath.
///
/// Only digits and `.`/` ` are in the glyph table (it was sized for an FPS
/// counter, not arbitrary titles); entries fall back to their catalog
/// index (`"#0"`, `"#1"`, ...) when their title contains characters this
/// font cannot render, rather than risk silently garbling a title.
pub fn render_menu_overlay(buffer: &mut [u8], width: usize, entries: &[&str], selected: usize) {
    let row_height = 8;
    for (i, title) in entries.iter().enumerate() {
        let y0 = 2 + i * row_height;
        let label = if title.bytes().all(is_renderable) {
            title.to_string()
        } else {
            format!("#{i}")
        };
        let color = if i == selected { (255, 255, 0) } else { (180, 180, 180) };
        draw_text(buffer, width, 2, y0, &label, color);
    }
}

fn is_renderable(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.' || b == b' '
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_for_unknown_char_falls_back_to_blank() {
        assert_eq!(glyph_for(b'Z'), &[0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn glyph_for_known_digit_matches_table() {
        assert_eq!(glyph_for(b'1'), &[0x20, 0x60, 0x20, 0x20, 0x70]);
    }

    #[test]
    fn is_renderable_accepts_only_digits_dot_and_space() {
        assert!(is_renderable(b'7'));
        assert!(is_renderable(b'.'));
        assert!(is_renderable(b' '));
        assert!(!is_renderable(b'P'));
    }

    #[test]
    fn render_menu_overlay_falls_back_to_index_label_for_unrenderable_titles() {
        let width = 32;
        let mut buffer = vec![0u8; width * 20 * 3];
        // "Pong" has letters the glyph table can't render, so row 0 falls
        // back to "#0" rather than drawing garbage glyphs.
        render_menu_overlay(&mut buffer, width, &["Pong", "12.3"], 0);
        // The selected row (index 0) is drawn in the highlight color.
        let highlighted = buffer.chunks(3).any(|px| px == [255, 255, 0]);
        assert!(highlighted);
    }

    #[test]
    fn draw_fps_writes_into_the_top_left_corner() {
        let width = 32;
        let mut buffer = vec![0u8; width * 10 * 3];
        draw_fps(&mut buffer, width, "1");
        assert!(buffer.iter().any(|&b| b != 0));
    }
}
