use std::collections::HashMap;

use sdl2::keyboard::Scancode;

/// Maps SDL scancodes to CHIP-8 hex keypad digits (`0x0`-`0xF`).
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Bind a scancode to a keypad digit.
    pub fn bind(&mut self, scancode: Scancode, digit: u8) {
        self.map.insert(scancode, digit);
    }

    /// Look up the keypad digit bound to a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard CHIP-8 keypad-to-QWERTY layout:
///
/// ```text
/// 1 2 3 C        1 2 3 4
/// 4 5 6 D   ->   Q W E R
/// 7 8 9 E        A S D F
/// A 0 B F        Z X C V
/// ```
pub fn default_key_map() -> KeyMap {
    let mut km = KeyMap::new();
    let bindings = [
        (Scancode::Num1, 0x1), (Scancode::Num2, 0x2), (Scancode::Num3, 0x3), (Scancode::Num4, 0xC),
        (Scancode::Q, 0x4), (Scancode::W, 0x5), (Scancode::E, 0x6), (Scancode::R, 0xD),
        (Scancode::A, 0x7), (Scancode::S, 0x8), (Scancode::D, 0x9), (Scancode::F, 0xE),
        (Scancode::Z, 0xA), (Scancode::X, 0x0), (Scancode::C, 0xB), (Scancode::V, 0xF),
    ];
    for (scancode, digit) in bindings {
        km.bind(scancode, digit);
    }
    km
}

/// Fill `keys` from the currently pressed scancodes in `pressed`.
pub fn update_keys(key_map: &KeyMap, pressed: &std::collections::HashSet<Scancode>, keys: &mut [bool; 16]) {
    for key in keys.iter_mut() {
        *key = false;
    }
    for &scancode in pressed {
        if let Some(digit) = key_map.get(scancode) {
            keys[digit as usize] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_maps_every_hex_digit() {
        let km = default_key_map();
        let mut seen = [false; 16];
        for scancode in [
            Scancode::Num1, Scancode::Num2, Scancode::Num3, Scancode::Num4,
            Scancode::Q, Scancode::W, Scancode::E, Scancode::R,
            Scancode::A, Scancode::S, Scancode::D, Scancode::F,
            Scancode::Z, Scancode::X, Scancode::C, Scancode::V,
        ] {
            let digit = km.get(scancode).expect("every bound scancode should resolve");
            seen[digit as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn unbound_scancode_resolves_to_none() {
        let km = default_key_map();
        assert_eq!(km.get(Scancode::Escape), None);
    }
}
