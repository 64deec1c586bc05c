//! The Lunatic Brain interpreter core.
//!
//! Lunatic Brain is Brainfuck plus a single auxiliary stack of integers and a
//! handful of extra opcodes:
//!
//! | Op | Effect |
//! |----|--------|
//! | `>` `<` | move the data pointer (never fails, may leave the tape) |
//! | `+` `-` | increment / decrement the current cell |
//! | `,` `.` | read a byte into / write the low 8 bits of the current cell |
//! | `[` `]` | naive first-match bracket scan (see below) |
//! | `#` `=` | shift the current cell left / right by one |
//! | `^` `v` | push the current cell / pop into the current cell |
//! | `$` `*` | push the data pointer / pop into the data pointer |
//! | `i` `!` | push the instruction pointer / pop into the instruction pointer |
//! | `p` `s` | print the current cell as a decimal / read a decimal into it |
//!
//! Everything else is a no-op, so comments and whitespace pass through.
//!
//! Brackets do not count nesting. `[` on a zero cell scans forward to the first
//! `]` (or the last instruction); `]` on a nonzero cell scans back to the first
//! `[` (or index 0). After every opcode, jumps included, the instruction pointer
//! advances by one.
//!
//! ```
//! use lunatic_brain::{Interpreter, Machine, SharedBuffer, Status};
//!
//! let out = SharedBuffer::new();
//! let mut vm = Interpreter::new_with_memory(16);
//! vm.set_output(out.clone());
//! vm.load(b"++++++++[>++++++++<-]>.");
//! vm.reset();
//! while vm.step().expect("program should not fault") == Status::Continue {}
//! assert_eq!(out.contents(), vec![64]);
//! ```

use crate::error::RuntimeError;
use crate::ports::{InputPort, NullInput, NullOutput, OutputPort, ReaderInput, WriterOutput};
use crate::tape::{ShiftDirection, Tape, DEFAULT_MEMORY_SIZE};

/// Value stored by `,` when the input is exhausted.
pub const EOF_CELL: i32 = -1;

/// Every byte the interpreter gives meaning to.
pub const OPCODES: &[u8] = b"><+-,.[]#=^v$*i!ps";

/// Outcome of a successful [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// One instruction ran; call `step` again.
    Continue,
    /// The instruction pointer is outside the program. Nothing ran.
    Halt,
}

/// Capabilities a driver needs from an interpreter.
pub trait Machine {
    /// Append program text. Successive calls concatenate.
    fn load(&mut self, text: &[u8]);

    /// The program loaded so far.
    fn source(&self) -> &[u8];

    /// Zero both pointers and the tape. The program and the stack survive.
    fn reset(&mut self);

    /// Execute exactly one instruction.
    fn step(&mut self) -> Result<Status, RuntimeError>;

    /// Cell value at `index`, 0 when `index` is off the tape.
    fn cell(&self, index: i32) -> i32;

    fn data_pointer(&self) -> i32;

    fn instruction_pointer(&self) -> i32;

    /// Auxiliary stack, bottom first.
    fn stack(&self) -> &[i32];

    /// Push buffered program output to its destination.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Direct fetch-execute interpreter with no preprocessing of the program.
pub struct Interpreter {
    code: Vec<u8>,
    code_ptr: i32,
    mem_ptr: i32,
    tape: Tape,
    stack: Vec<i32>,
    input: Box<dyn InputPort>,
    output: Box<dyn OutputPort>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with a [`DEFAULT_MEMORY_SIZE`] tape wired to
    /// stdin and stdout.
    pub fn new() -> Self {
        Self::new_with_memory(DEFAULT_MEMORY_SIZE)
    }

    /// Create an interpreter with a custom tape length.
    pub fn new_with_memory(memory_size: usize) -> Self {
        Self::with_tape(Tape::new(memory_size))
    }

    /// Create an interpreter around an existing tape, wired to stdin and stdout.
    pub fn with_tape(tape: Tape) -> Self {
        Self {
            code: Vec::new(),
            code_ptr: 0,
            mem_ptr: 0,
            tape,
            stack: Vec::new(),
            input: Box::new(ReaderInput::stdin()),
            output: Box::new(WriterOutput::stdout()),
        }
    }

    /// Create an interpreter whose I/O goes nowhere: input is always at EOF
    /// and output is discarded.
    pub fn detached(memory_size: usize) -> Self {
        Self::new_with_memory(memory_size).detach()
    }

    /// Disconnect the I/O ports: input is always at EOF and output is discarded.
    pub fn detach(mut self) -> Self {
        self.set_input(NullInput);
        self.set_output(NullOutput);
        self
    }

    /// Replace the port `,` and `s` read from.
    pub fn set_input<I>(&mut self, input: I)
    where
        I: InputPort + 'static,
    {
        self.input = Box::new(input);
    }

    /// Replace the port `.` and `p` write to.
    pub fn set_output<O>(&mut self, output: O)
    where
        O: OutputPort + 'static,
    {
        self.output = Box::new(output);
    }

    pub fn memory_size(&self) -> usize {
        self.tape.len()
    }

    /// Opcode under the instruction pointer, if any.
    pub fn current_op(&self) -> Option<u8> {
        if self.code_ptr < 0 {
            return None;
        }
        self.code.get(self.code_ptr as usize).copied()
    }

    /// Bounds-check the data pointer for a cell-touching opcode.
    #[inline]
    fn checked_cell(&self, op: u8) -> Result<i32, RuntimeError> {
        if self.tape.contains(self.mem_ptr) {
            Ok(self.mem_ptr)
        } else {
            Err(RuntimeError::PointerOutOfBounds {
                ip: self.code_ptr,
                ptr: self.mem_ptr,
                op: op as char,
            })
        }
    }

    #[inline]
    fn pop(&mut self, op: u8) -> Result<i32, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            ip: self.code_ptr,
            op: op as char,
        })
    }

    fn io_error(&self, op: u8, source: std::io::Error) -> RuntimeError {
        RuntimeError::Io {
            ip: self.code_ptr,
            op: op as char,
            source,
        }
    }

    /// Walk forward one byte at a time until a `]` or the last instruction.
    fn scan_forward(&mut self) {
        let last = self.code.len() as i32 - 1;
        while self.code_ptr < last {
            self.code_ptr += 1;
            if self.code[self.code_ptr as usize] == b']' {
                break;
            }
        }
    }

    /// Walk backward one byte at a time until a `[` or index 0.
    fn scan_backward(&mut self) {
        while self.code_ptr > 0 {
            self.code_ptr -= 1;
            if self.code[self.code_ptr as usize] == b'[' {
                break;
            }
        }
    }
}

impl Machine for Interpreter {
    fn load(&mut self, text: &[u8]) {
        self.code.extend_from_slice(text);
    }

    fn source(&self) -> &[u8] {
        &self.code
    }

    fn reset(&mut self) {
        self.mem_ptr = 0;
        self.code_ptr = 0;
        self.tape.reset();
    }

    fn step(&mut self) -> Result<Status, RuntimeError> {
        let Some(op) = self.current_op() else {
            return Ok(Status::Halt);
        };

        match op {
            b'>' => self.mem_ptr = self.mem_ptr.wrapping_add(1),
            b'<' => self.mem_ptr = self.mem_ptr.wrapping_sub(1),
            b'+' => {
                let idx = self.checked_cell(op)?;
                self.tape.increment(idx);
            }
            b'-' => {
                let idx = self.checked_cell(op)?;
                self.tape.decrement(idx);
            }
            b',' => {
                let idx = self.checked_cell(op)?;
                self.output.flush().map_err(|e| self.io_error(op, e))?;
                let byte = self.input.read_byte().map_err(|e| self.io_error(op, e))?;
                self.tape.write(idx, byte.map_or(EOF_CELL, i32::from));
            }
            b'.' => {
                let idx = self.checked_cell(op)?;
                let byte = (self.tape.read(idx) & 0xff) as u8;
                self.output.write_byte(byte).map_err(|e| self.io_error(op, e))?;
            }
            b'[' => {
                if self.tape.read(self.mem_ptr) == 0 {
                    self.scan_forward();
                }
            }
            b']' => {
                if self.tape.read(self.mem_ptr) != 0 {
                    self.scan_backward();
                }
            }
            b'#' => {
                let idx = self.checked_cell(op)?;
                self.tape.shift(idx, ShiftDirection::Left);
            }
            b'=' => {
                let idx = self.checked_cell(op)?;
                self.tape.shift(idx, ShiftDirection::Right);
            }
            b'^' => {
                let idx = self.checked_cell(op)?;
                self.stack.push(self.tape.read(idx));
            }
            b'v' => {
                let idx = self.checked_cell(op)?;
                let value = self.pop(op)?;
                self.tape.write(idx, value);
            }
            b'$' => self.stack.push(self.mem_ptr),
            b'*' => self.mem_ptr = self.pop(op)?,
            b'i' => self.stack.push(self.code_ptr),
            b'!' => self.code_ptr = self.pop(op)?,
            b'p' => {
                let idx = self.checked_cell(op)?;
                let value = self.tape.read(idx);
                self.output.write_int(value).map_err(|e| self.io_error(op, e))?;
            }
            b's' => {
                let idx = self.checked_cell(op)?;
                self.output.flush().map_err(|e| self.io_error(op, e))?;
                // Unparseable or missing input leaves the cell as it was.
                if let Some(value) = self.input.read_int().map_err(|e| self.io_error(op, e))? {
                    self.tape.write(idx, value);
                }
            }
            _ => {}
        }

        self.code_ptr = self.code_ptr.wrapping_add(1);
        Ok(Status::Continue)
    }

    fn cell(&self, index: i32) -> i32 {
        self.tape.read(index)
    }

    fn data_pointer(&self) -> i32 {
        self.mem_ptr
    }

    fn instruction_pointer(&self) -> i32 {
        self.code_ptr
    }

    fn stack(&self) -> &[i32] {
        &self.stack
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeErrorKind;
    use crate::ports::SharedBuffer;

    fn machine(code: &str, memory_size: usize) -> (Interpreter, SharedBuffer) {
        let out = SharedBuffer::new();
        let mut vm = Interpreter::new_with_memory(memory_size);
        vm.set_input(NullInput);
        vm.set_output(out.clone());
        vm.load(code.as_bytes());
        vm.reset();
        (vm, out)
    }

    fn run(vm: &mut Interpreter) -> Result<(), RuntimeError> {
        while vm.step()? == Status::Continue {}
        Ok(())
    }

    #[test]
    fn empty_program_halts_immediately() {
        let (mut vm, _) = machine("", 4);
        assert_eq!(vm.step().unwrap(), Status::Halt);
        assert_eq!(vm.instruction_pointer(), 0);
    }

    #[test]
    fn halt_has_no_side_effects() {
        let (mut vm, _) = machine("+", 4);
        assert_eq!(vm.step().unwrap(), Status::Continue);
        assert_eq!(vm.step().unwrap(), Status::Halt);
        assert_eq!(vm.step().unwrap(), Status::Halt);
        assert_eq!(vm.instruction_pointer(), 1);
        assert_eq!(vm.cell(0), 1);
    }

    #[test]
    fn unrecognized_byte_is_a_noop() {
        let (mut vm, out) = machine("z", 4);
        assert_eq!(vm.step().unwrap(), Status::Continue);
        assert_eq!(vm.instruction_pointer(), 1);
        assert_eq!(vm.data_pointer(), 0);
        assert_eq!(vm.cell(0), 0);
        assert!(vm.stack().is_empty());
        assert!(out.contents().is_empty());
    }

    #[test]
    fn multiplication_loop_prints_64() {
        let (mut vm, out) = machine("++++++++[>++++++++<-]>.", 2);
        run(&mut vm).unwrap();
        assert_eq!(out.contents(), vec![64]);
        assert_eq!(vm.cell(0), 0);
    }

    #[test]
    fn load_concatenates_chunks() {
        let (mut vm, out) = machine("+++", 2);
        vm.load(b"+.");
        run(&mut vm).unwrap();
        assert_eq!(vm.source(), b"++++.");
        assert_eq!(out.contents(), vec![4]);
    }

    #[test]
    fn moving_off_the_tape_is_not_an_error() {
        let (mut vm, _) = machine("<<>>>>>>", 2);
        run(&mut vm).unwrap();
        assert_eq!(vm.data_pointer(), 4);
    }

    #[test]
    fn touching_a_cell_off_the_tape_errors_without_advancing() {
        let (mut vm, _) = machine(">>+", 2);
        vm.step().unwrap();
        vm.step().unwrap();
        let err = vm.step().unwrap_err();
        assert!(matches!(err, RuntimeError::PointerOutOfBounds { ip: 2, ptr: 2, op: '+' }));
        assert_eq!(vm.instruction_pointer(), 2);
        assert_eq!(vm.data_pointer(), 2);
    }

    #[test]
    fn every_cell_opcode_is_bounds_checked() {
        for op in ["+", "-", ",", ".", "#", "=", "^", "v", "p", "s"] {
            let (mut vm, _) = machine(&format!("<{op}"), 4);
            vm.step().unwrap();
            let err = vm.step().unwrap_err();
            assert_eq!(err.kind(), RuntimeErrorKind::PointerOutOfBounds, "op {op}");
            assert_eq!(err.op().to_string(), op);
        }
    }

    #[test]
    fn zero_length_tape_faults_on_first_cell_access() {
        let (mut vm, _) = machine("+", 0);
        assert!(vm.step().is_err());
    }

    #[test]
    fn brackets_use_safe_read_off_the_tape() {
        // Off-tape reads as 0, so '[' scans forward instead of faulting.
        let (mut vm, _) = machine("<[+]", 4);
        run(&mut vm).unwrap();
        assert_eq!(vm.instruction_pointer(), 4);
        // ']' off-tape also reads 0 and falls through.
        let (mut vm, _) = machine("<]", 4);
        run(&mut vm).unwrap();
    }

    #[test]
    fn pops_on_empty_stack_error_without_mutation() {
        for op in ["v", "*", "!"] {
            let (mut vm, _) = machine(&format!(">{op}"), 4);
            vm.step().unwrap();
            let err = vm.step().unwrap_err();
            assert_eq!(err.kind(), RuntimeErrorKind::StackUnderflow, "op {op}");
            assert_eq!(err.ip(), 1);
            assert_eq!(vm.instruction_pointer(), 1);
            assert_eq!(vm.data_pointer(), 1);
        }
    }

    #[test]
    fn cell_stack_round_trip() {
        let (mut vm, _) = machine("+++^[-]v", 2);
        run(&mut vm).unwrap();
        assert_eq!(vm.cell(0), 3);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn data_pointer_save_and_restore() {
        let (mut vm, _) = machine(">>$>>>*+", 8);
        run(&mut vm).unwrap();
        assert_eq!(vm.data_pointer(), 2);
        assert_eq!(vm.cell(2), 1);
    }

    #[test]
    fn pop_into_data_pointer_uses_cell_value() {
        // Push 3 onto the stack, pop it as the data pointer.
        let (mut vm, _) = machine("+++^*+", 8);
        run(&mut vm).unwrap();
        assert_eq!(vm.data_pointer(), 3);
        assert_eq!(vm.cell(3), 1);
    }

    #[test]
    fn instruction_pointer_jump_resumes_after_saved_position() {
        let (mut vm, _) = machine("i+>!", 4);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        // '!' restored 0, the advance moved past the 'i'.
        assert_eq!(vm.instruction_pointer(), 1);
        assert!(vm.stack().is_empty());
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.cell(0), 1);
        assert_eq!(vm.cell(1), 1);
        // The saved pointer was consumed, so the second '!' underflows.
        let err = vm.step().unwrap_err();
        assert!(matches!(err, RuntimeError::StackUnderflow { ip: 3, op: '!' }));
        assert_eq!(vm.instruction_pointer(), 3);
    }

    #[test]
    fn negative_instruction_pointer_halts() {
        // Cell holds -3; '^' pushes it, '!' pops it, advance leaves -2.
        let (mut vm, _) = machine("---^!", 2);
        run(&mut vm).unwrap();
        assert_eq!(vm.instruction_pointer(), -2);
        assert_eq!(vm.step().unwrap(), Status::Halt);
    }

    #[test]
    fn forward_scan_stops_at_first_close_bracket() {
        // Nesting is not counted: the first ']' ends the skip.
        let (mut vm, _) = machine("[[]+]+", 2);
        vm.step().unwrap();
        assert_eq!(vm.instruction_pointer(), 3);
    }

    #[test]
    fn forward_scan_without_close_bracket_runs_to_end() {
        let (mut vm, _) = machine("[++", 2);
        assert_eq!(vm.step().unwrap(), Status::Continue);
        assert_eq!(vm.instruction_pointer(), 3);
        assert_eq!(vm.step().unwrap(), Status::Halt);
        assert_eq!(vm.cell(0), 0);
    }

    #[test]
    fn nonzero_open_bracket_without_close_falls_through() {
        let (mut vm, _) = machine("+[", 2);
        assert_eq!(vm.step().unwrap(), Status::Continue);
        assert_eq!(vm.step().unwrap(), Status::Continue);
        assert_eq!(vm.instruction_pointer(), 2);
        assert_eq!(vm.step().unwrap(), Status::Halt);
    }

    #[test]
    fn backward_scan_without_open_bracket_resumes_at_one() {
        let (mut vm, _) = machine("+>+<]", 2);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        vm.step().unwrap();
        assert_eq!(vm.instruction_pointer(), 1);
    }

    #[test]
    fn backward_scan_lands_inside_loop_body() {
        let (mut vm, _) = machine("++[-]", 2);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        // ']' with cell 1 jumps to '[' at 2, advance to 3.
        vm.step().unwrap();
        assert_eq!(vm.instruction_pointer(), 3);
    }

    #[test]
    fn shifts_on_current_cell() {
        let (mut vm, _) = machine("+++#", 2);
        run(&mut vm).unwrap();
        assert_eq!(vm.cell(0), 6);
        let (mut vm, _) = machine("-----=", 2);
        run(&mut vm).unwrap();
        assert_eq!(vm.cell(0), -3);
    }

    #[test]
    fn output_masks_to_low_byte() {
        let (mut vm, out) = machine("-.", 2);
        run(&mut vm).unwrap();
        assert_eq!(out.contents(), vec![0xff]);
    }

    #[test]
    fn print_writes_decimal_and_space() {
        let (mut vm, out) = machine("---p>++p", 2);
        run(&mut vm).unwrap();
        assert_eq!(out.to_string_lossy(), "-3 2 ");
    }

    #[test]
    fn byte_input_and_eof() {
        let (mut vm, out) = machine(",.,.,", 2);
        vm.set_input(ReaderInput::from_bytes("AB"));
        run(&mut vm).unwrap();
        assert_eq!(out.contents(), b"AB");
        assert_eq!(vm.cell(0), EOF_CELL);
    }

    #[test]
    fn integer_input_and_unparseable_input() {
        let (mut vm, _) = machine("s>s>+++s", 4);
        vm.set_input(ReaderInput::from_bytes(" 1234\n-5 oops"));
        run(&mut vm).unwrap();
        assert_eq!(vm.cell(0), 1234);
        assert_eq!(vm.cell(1), -5);
        assert_eq!(vm.cell(2), 3);
    }

    #[test]
    fn reset_keeps_program_and_stack() {
        let (mut vm, _) = machine(">+^", 4);
        run(&mut vm).unwrap();
        assert_eq!(vm.stack(), &[1]);
        vm.reset();
        assert_eq!(vm.data_pointer(), 0);
        assert_eq!(vm.instruction_pointer(), 0);
        assert_eq!(vm.cell(1), 0);
        assert_eq!(vm.stack(), &[1]);
        assert_eq!(vm.source(), b">+^");
    }

    #[test]
    fn detached_interpreter_ignores_io() {
        let mut vm = Interpreter::detached(2);
        vm.load(b",.p");
        vm.reset();
        run(&mut vm).unwrap();
        assert_eq!(vm.cell(0), EOF_CELL);
    }

    #[test]
    fn bytes_outside_the_opcode_set_only_advance() {
        for byte in (0u8..=255).filter(|b| !OPCODES.contains(b)) {
            let (mut vm, out) = machine("", 4);
            vm.load(&[byte]);
            assert_eq!(vm.step().unwrap(), Status::Continue);
            assert_eq!(vm.instruction_pointer(), 1);
            assert_eq!(vm.data_pointer(), 0);
            assert_eq!(vm.cell(0), 0);
            assert!(vm.stack().is_empty());
            assert!(out.contents().is_empty());
        }
    }
}
