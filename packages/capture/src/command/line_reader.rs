pub enum LineReadEvent<'a> {
    None,
    Complete(&'a [u8]),
    Overflow,
}

/// Assembles `\r`/`\n` terminated lines from single bytes. An overlong line
/// is reported once and dropped up to its terminator.
pub struct ConsoleLineReader<const N: usize> {
    line_buf: [u8; N],
    line_len: usize,
    overflowed: bool,
}

impl<const N: usize> Default for ConsoleLineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ConsoleLineReader<N> {
    pub const fn new() -> Self {
        Self {
            line_buf: [0; N],
            line_len: 0,
            overflowed: false,
        }
    }

    pub fn push_byte(&mut self, byte: u8) -> LineReadEvent<'_> {
        if byte == b'\r' || byte == b'\n' {
            if self.overflowed {
                self.overflowed = false;
                return LineReadEvent::None;
            }
            if self.line_len == 0 {
                return LineReadEvent::None;
            }
            let complete_len = self.line_len;
            self.line_len = 0;
            return LineReadEvent::Complete(&self.line_buf[..complete_len]);
        }

        if self.overflowed {
            return LineReadEvent::None;
        }

        if self.line_len < N {
            self.line_buf[self.line_len] = byte;
            self.line_len += 1;
            return LineReadEvent::None;
        }

        self.line_len = 0;
        self.overflowed = true;
        LineReadEvent::Overflow
    }
}
