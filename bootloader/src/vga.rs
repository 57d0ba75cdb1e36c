//! VGA text output.
//!
//! Direct character/attribute writes into the 80x25 text buffer at
//! 0xB8000. This is the post-transition output path; before protected
//! mode the diagnostics module prints through the firmware teletype
//! service instead.

/// VGA text buffer base address.
pub const VGA_BUFFER: *mut u16 = 0xB8000 as *mut u16;

pub const VGA_WIDTH: usize = 80;
pub const VGA_HEIGHT: usize = 25;

/// VGA color palette (16 colors).
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    LightMagenta = 13,
    Yellow = 14,
    White = 15,
}

/// Cursor-tracking writer over the text buffer.
pub struct VgaWriter {
    col: usize,
    row: usize,
    fg_color: Color,
    bg_color: Color,
}

impl VgaWriter {
    pub const fn new() -> Self {
        Self {
            col: 0,
            row: 0,
            fg_color: Color::White,
            bg_color: Color::Black,
        }
    }

    /// Clear the screen and home the cursor.
    pub fn clear(&mut self) {
        let attribute = self.color_byte();
        unsafe {
            for i in 0..VGA_WIDTH * VGA_HEIGHT {
                VGA_BUFFER
                    .add(i)
                    .write_volatile((b' ' as u16) | ((attribute as u16) << 8));
            }
        }
        self.col = 0;
        self.row = 0;
    }

    pub fn write_byte(&mut self, ch: u8) {
        match ch {
            b'\n' => {
                self.row += 1;
                self.col = 0;
            }
            b'\r' => {
                self.col = 0;
            }
            _ => {
                if self.row >= VGA_HEIGHT {
                    self.scroll_up();
                    self.row = VGA_HEIGHT - 1;
                }

                let index = self.row * VGA_WIDTH + self.col;
                let attribute = self.color_byte();
                unsafe {
                    VGA_BUFFER
                        .add(index)
                        .write_volatile((ch as u16) | ((attribute as u16) << 8));
                }

                self.col += 1;
                if self.col >= VGA_WIDTH {
                    self.col = 0;
                    self.row += 1;
                }
            }
        }
    }

    pub fn write_text(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            self.write_byte(byte);
        }
    }

    pub fn set_fg_color(&mut self, color: Color) {
        self.fg_color = color;
    }

    pub fn set_bg_color(&mut self, color: Color) {
        self.bg_color = color;
    }

    fn scroll_up(&self) {
        let attribute = self.color_byte();
        unsafe {
            core::ptr::copy(
                VGA_BUFFER.add(VGA_WIDTH),
                VGA_BUFFER,
                VGA_WIDTH * (VGA_HEIGHT - 1),
            );
            for i in 0..VGA_WIDTH {
                VGA_BUFFER
                    .add((VGA_HEIGHT - 1) * VGA_WIDTH + i)
                    .write_volatile((b' ' as u16) | ((attribute as u16) << 8));
            }
        }
    }

    fn color_byte(&self) -> u8 {
        ((self.bg_color as u8) << 4) | (self.fg_color as u8)
    }
}

impl core::fmt::Write for VgaWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for ch in s.bytes() {
            self.write_byte(if ch.is_ascii() { ch } else { b'?' });
        }
        Ok(())
    }
}

/// Global writer for the post-transition output path.
pub static VGA: spin::Mutex<VgaWriter> = spin::Mutex::new(VgaWriter::new());

/// Print to the VGA text buffer.
#[macro_export]
macro_rules! vga_print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($crate::vga::VGA.lock(), $($arg)*);
    }};
}

/// Print a line to the VGA text buffer.
#[macro_export]
macro_rules! vga_println {
    () => {
        $crate::vga_print!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::vga_print!($($arg)*);
        $crate::vga_print!("\n");
    }};
}
