//! SDL2-backed `Platform` implementation: a streaming-texture video
//! surface, a ring-buffer/fade-ramp beeper, a scancode-to-hex-keypad map,
//! and a tiny bitmap-font overlay repurposed as the batch catalog's
//! selection menu.

pub mod audio;
pub mod input;
pub mod overlay;
pub mod video;

use std::collections::HashSet;

use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::{Keycode, Scancode};

use chip8rec_runtime::{DISPLAY_HEIGHT, DISPLAY_WIDTH, MenuCommand, Platform};

use audio::Beeper;
use input::KeyMap;
use video::Video;

/// One CHIP-8 "set" pixel in the native on/off display.
const PIXEL_ON: (u8, u8, u8) = (235, 235, 235);
const PIXEL_OFF: (u8, u8, u8) = (10, 10, 10);

pub struct Sdl2Platform {
    _sdl: sdl2::Sdl,
    event_pump: EventPump,
    video: Video,
    beeper: Beeper,
    key_map: KeyMap,
    pressed: HashSet<Scancode>,
    quit: bool,
    pending_menu: MenuCommand,
    framebuffer: Vec<u8>,
}

impl Sdl2Platform {
    /// Build and fully initialize the SDL2 backend: window sized to the
    /// CHIP-8 64x32 display scaled by `scale`, an audio device paused until
    /// the first beep, and the default keypad layout. `Platform::init` is
    /// a no-op afterward since construction already did the SDL setup the
    /// trait's `init` would otherwise perform.
    pub fn new(title: &str, scale: u32) -> Self {
        let sdl = sdl2::init().expect("Failed to initialize SDL2");
        let sdl_video = sdl.video().expect("Failed to init SDL video");
        let sdl_audio = sdl.audio().expect("Failed to init SDL audio");
        let event_pump = sdl.event_pump().expect("Failed to get event pump");

        let video = Video::new(&sdl_video, title, DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32, scale);
        let beeper = audio::init(&sdl_audio);

        Sdl2Platform {
            _sdl: sdl,
            event_pump,
            video,
            beeper,
            key_map: input::default_key_map(),
            pressed: HashSet::new(),
            quit: false,
            pending_menu: MenuCommand::None,
            framebuffer: vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT * 3],
        }
    }

    /// Drain pending SDL events once per tick: update the pressed-scancode
    /// set, latch a quit request, and latch the most recent menu navigation
    /// key (consumed by the next `poll_menu` call).
    fn pump_events(&mut self) {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.quit = true,
                Event::KeyDown { keycode: Some(Keycode::Escape), .. } => {
                    self.pending_menu = MenuCommand::Back;
                }
                Event::KeyDown { keycode: Some(Keycode::Up), repeat: false, .. } => {
                    self.pending_menu = MenuCommand::Up;
                }
                Event::KeyDown { keycode: Some(Keycode::Down), repeat: false, .. } => {
                    self.pending_menu = MenuCommand::Down;
                }
                Event::KeyDown { keycode: Some(Keycode::Return), repeat: false, .. } => {
                    self.pending_menu = MenuCommand::Select;
                }
                Event::KeyDown { scancode: Some(sc), repeat: false, .. } => {
                    self.pressed.insert(sc);
                }
                Event::KeyUp { scancode: Some(sc), .. } => {
                    self.pressed.remove(&sc);
                }
                _ => {}
            }
        }
    }

    fn write_pixel(&mut self, index: usize, on: bool) {
        let (r, g, b) = if on { PIXEL_ON } else { PIXEL_OFF };
        let offset = index * 3;
        self.framebuffer[offset] = r;
        self.framebuffer[offset + 1] = g;
        self.framebuffer[offset + 2] = b;
    }
}

impl Platform for Sdl2Platform {
    fn init(&mut self, _title: &str, _scale: u32) {}

    fn shutdown(&mut self) {
        self.beeper.stop();
    }

    fn render(&mut self, display: &[u8], display_width: usize, display_height: usize) {
        for (i, &pixel) in display.iter().enumerate() {
            self.write_pixel(i, pixel != 0);
        }
        let framebuffer = std::mem::take(&mut self.framebuffer);
        self.video.present(&framebuffer);
        self.framebuffer = framebuffer;
        let _ = (display_width, display_height);
    }

    fn beep_start(&mut self) {
        self.beeper.start();
    }

    fn beep_stop(&mut self) {
        self.beeper.stop();
    }

    fn poll_input(&mut self, keys: &mut [bool; 16]) -> bool {
        self.pump_events();
        input::update_keys(&self.key_map, &self.pressed, keys);
        self.quit
    }

    fn poll_menu(&mut self) -> MenuCommand {
        std::mem::replace(&mut self.pending_menu, MenuCommand::None)
    }

    fn should_quit(&self) -> bool {
        self.quit
    }

    fn render_menu_overlay(&mut self, entries: &[&str], selected: usize) {
        self.framebuffer.fill(0);
        overlay::render_menu_overlay(&mut self.framebuffer, DISPLAY_WIDTH, entries, selected);
        let framebuffer = std::mem::take(&mut self.framebuffer);
        self.video.present(&framebuffer);
        self.framebuffer = framebuffer;
    }

    fn apply_settings(&mut self, _cpu_hz: u32, _volume: f32) {}

    fn now_micros(&self) -> u64 {
        // SDL has no monotonic-clock query; `std::time::Instant` is the
        // idiomatic stand-in and is itself monotonic, matching the
        // contract `Platform::now_micros` needs.
        use std::sync::OnceLock;
        use std::time::Instant;
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_micros() as u64
    }

    fn sleep(&mut self, micros: u64) {
        std::thread::sleep(std::time::Duration::from_micros(micros));
    }
}
