/// Serial port driver (COM1, 0x3F8), output only.
///
/// The boot log goes here via serial_println! before any other console
/// exists.
use core::fmt;
use spin::Mutex;

const COM1: u16 = 0x3F8;

// Register offsets from the base port.
const DATA: u16 = 0;
const INT_ENABLE: u16 = 1;
const FIFO_CTRL: u16 = 2;
const LINE_CTRL: u16 = 3;
const MODEM_CTRL: u16 = 4;
const LINE_STATUS: u16 = 5;

/// LSR bit 5: transmit holding register empty.
const LSR_THR_EMPTY: u8 = 0x20;

pub static SERIAL: Mutex<Serial> = Mutex::new(Serial::new(COM1));

pub struct Serial {
    port: u16,
}

impl Serial {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }

    /// Initialize the serial port (8N1, 115200 baud).
    pub fn init(&self) {
        super::outb(self.port + INT_ENABLE, 0x00); // Disable interrupts
        super::outb(self.port + LINE_CTRL, 0x80);  // Enable DLAB (set baud rate divisor)
        super::outb(self.port + DATA, 0x01);       // 115200 baud (divisor 1, low byte)
        super::outb(self.port + INT_ENABLE, 0x00); // (divisor 1, high byte)
        super::outb(self.port + LINE_CTRL, 0x03);  // 8 bits, no parity, one stop bit
        super::outb(self.port + FIFO_CTRL, 0xC7);  // Enable FIFO, clear, 14-byte threshold
        super::outb(self.port + MODEM_CTRL, 0x03); // DTR + RTS, no IRQ
    }

    fn is_transmit_empty(&self) -> bool {
        super::inb(self.port + LINE_STATUS) & LSR_THR_EMPTY != 0
    }

    /// Write a single byte, waiting for the transmit buffer.
    pub fn write_byte(&self, byte: u8) {
        while !self.is_transmit_empty() {
            core::hint::spin_loop();
        }
        super::outb(self.port + DATA, byte);
    }

    /// Write a string, translating `\n` to `\r\n`.
    pub fn write_str_raw(&self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}

impl fmt::Write for Serial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_str_raw(s);
        Ok(())
    }
}

/// Print to serial console.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        {
            use core::fmt::Write;
            let mut serial = $crate::arch::x86_64::serial::SERIAL.lock();
            let _ = write!(serial, $($arg)*);
        }
    };
}

/// Print to serial console with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => {
        $crate::serial_print!("{}\n", format_args!($($arg)*))
    };
}
