//! Input and output ports used by the interpreter for `,` `s` `.` and `p`.
//!
//! The interpreter never touches the process console directly; it talks to an
//! [`InputPort`] and an [`OutputPort`]. The defaults wrap stdin and stdout, tests
//! and embedders hand in in-memory ports instead.

use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::sync::{Arc, Mutex};

/// Source of bytes and integers for the input opcodes.
pub trait InputPort: Send {
    /// Next raw byte, or `None` at end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Next whitespace-delimited decimal integer, or `None` when the input is
    /// exhausted or the next token is not a number.
    fn read_int(&mut self) -> io::Result<Option<i32>>;
}

/// Sink for the output opcodes.
pub trait OutputPort: Send {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Write `value` in decimal followed by a single space.
    fn write_int(&mut self, value: i32) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// [`InputPort`] over any buffered reader.
pub struct ReaderInput<R> {
    reader: R,
}

impl ReaderInput<BufReader<io::Stdin>> {
    /// Input port reading the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl ReaderInput<Cursor<Vec<u8>>> {
    /// Input port serving a fixed byte string.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }
}

impl<R: BufRead> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Look at the next byte without consuming it.
    fn peek(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: BufRead + Send> InputPort for ReaderInput<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }

    fn read_int(&mut self) -> io::Result<Option<i32>> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.reader.consume(1);
        }

        let negative = match self.peek()? {
            Some(sign @ (b'-' | b'+')) => {
                self.reader.consume(1);
                sign == b'-'
            }
            _ => false,
        };

        let mut value: i32 = 0;
        let mut digits = 0usize;
        while let Some(b) = self.peek()? {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.wrapping_mul(10).wrapping_add(i32::from(b - b'0'));
            digits += 1;
            self.reader.consume(1);
        }

        if digits == 0 {
            return Ok(None);
        }
        Ok(Some(if negative { value.wrapping_neg() } else { value }))
    }
}

/// [`OutputPort`] over any writer.
pub struct WriterOutput<W> {
    writer: W,
}

impl WriterOutput<io::Stdout> {
    /// Output port writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputPort for WriterOutput<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.writer.write_all(&[byte])
    }

    fn write_int(&mut self, value: i32) -> io::Result<()> {
        write!(self.writer, "{value} ")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Input that is always at end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputPort for NullInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }

    fn read_int(&mut self) -> io::Result<Option<i32>> {
        Ok(None)
    }
}

/// Output that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputPort for NullOutput {
    fn write_byte(&mut self, _byte: u8) -> io::Result<()> {
        Ok(())
    }

    fn write_int(&mut self, _value: i32) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Cloneable in-memory output. Every clone appends to the same buffer, so a
/// caller can keep one handle and give another to the interpreter.
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        match self.bytes.lock() {
            Ok(bytes) => bytes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    fn append(&self, data: &[u8]) {
        match self.bytes.lock() {
            Ok(mut bytes) => bytes.extend_from_slice(data),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(data),
        }
    }
}

impl OutputPort for SharedBuffer {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.append(&[byte]);
        Ok(())
    }

    fn write_int(&mut self, value: i32) -> io::Result<()> {
        self.append(format!("{value} ").as_bytes());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
