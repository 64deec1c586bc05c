// Behavioural properties of the interpreter core, exercised through the public API.
use lunatic_brain::{Interpreter, Machine, ReaderInput, RuntimeError, RuntimeErrorKind, SharedBuffer, Status};

fn machine(code: &str, memory_size: usize) -> (Interpreter, SharedBuffer) {
    let out = SharedBuffer::new();
    let mut vm = Interpreter::detached(memory_size);
    vm.set_output(out.clone());
    vm.load(code.as_bytes());
    vm.reset();
    (vm, out)
}

fn run_to_halt(vm: &mut Interpreter) -> Result<u64, RuntimeError> {
    let mut steps = 0;
    while vm.step()? == Status::Continue {
        steps += 1;
    }
    Ok(steps)
}

#[test]
fn reset_leaves_zeroed_state_for_any_program_and_size() {
    for (code, size) in [("", 0), ("+>+>+", 3), ("^v$*i!", 1), ("[]", 202_000)] {
        let (mut vm, _) = machine(code, size);
        // Dirty the machine, then reset again.
        let _ = run_to_halt(&mut vm);
        vm.reset();
        assert_eq!(vm.data_pointer(), 0);
        assert_eq!(vm.instruction_pointer(), 0);
        for i in -2..(size.min(16) as i32 + 2) {
            assert_eq!(vm.cell(i), 0, "cell {i} of {code:?}");
        }
    }
}

#[test]
fn increment_then_decrement_is_identity() {
    let (mut vm, _) = machine(">>+++-+-", 4);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(vm.cell(2), 3);

    let (mut vm, _) = machine("+-", 1);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(vm.cell(0), 0);
}

#[test]
fn push_then_pop_restores_cell() {
    let (mut vm, _) = machine("-----^v", 1);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(vm.cell(0), -5);
    assert!(vm.stack().is_empty());
}

#[test]
fn save_then_restore_data_pointer_is_noop() {
    let (mut vm, _) = machine(">>>$*", 8);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(vm.data_pointer(), 3);
}

#[test]
fn moving_never_errors_but_touching_out_of_bounds_does() {
    let (mut vm, _) = machine(&">".repeat(10), 2);
    assert_eq!(run_to_halt(&mut vm).unwrap(), 10);
    assert_eq!(vm.data_pointer(), 10);

    let (mut vm, _) = machine(">>+", 2);
    let err = run_to_halt(&mut vm).unwrap_err();
    assert_eq!(err.kind(), RuntimeErrorKind::PointerOutOfBounds);
}

#[test]
fn empty_stack_pops_error_without_moving_pointers() {
    for op in ['v', '*', '!'] {
        let (mut vm, _) = machine(&format!(">>{op}"), 4);
        vm.step().unwrap();
        vm.step().unwrap();
        let err = vm.step().unwrap_err();
        assert_eq!(err.kind(), RuntimeErrorKind::StackUnderflow);
        assert_eq!(vm.instruction_pointer(), 2);
        assert_eq!(vm.data_pointer(), 2);
    }
}

#[test]
fn eight_times_eight_prints_64() {
    let (mut vm, out) = machine("++++++++[>++++++++<-]>.", 2);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(out.contents(), vec![64]);
    assert_eq!(vm.step().unwrap(), Status::Halt);
}

#[test]
fn unmatched_open_bracket_on_nonzero_cell_runs_off_the_end() {
    let (mut vm, _) = machine("+[", 4);
    assert_eq!(vm.step().unwrap(), Status::Continue);
    assert_eq!(vm.step().unwrap(), Status::Continue);
    assert_eq!(vm.instruction_pointer(), 2);
    assert_eq!(vm.step().unwrap(), Status::Halt);
}

#[test]
fn single_unknown_character_only_advances() {
    let (mut vm, out) = machine("z", 4);
    assert_eq!(vm.step().unwrap(), Status::Continue);
    assert_eq!(vm.instruction_pointer(), 1);
    assert_eq!(vm.data_pointer(), 0);
    assert_eq!(vm.cell(0), 0);
    assert!(out.contents().is_empty());
    assert_eq!(vm.step().unwrap(), Status::Halt);
}

#[test]
fn empty_program_halts_first() {
    let (mut vm, _) = machine("", 4);
    assert_eq!(vm.step().unwrap(), Status::Halt);
}

#[test]
fn program_streamed_in_chunks_matches_whole_program() {
    let whole = "++++++++[>++++++++<-]>+.";
    let out = SharedBuffer::new();
    let mut vm = Interpreter::detached(4);
    vm.set_output(out.clone());
    for chunk in whole.as_bytes().chunks(5) {
        vm.load(chunk);
    }
    vm.reset();
    run_to_halt(&mut vm).unwrap();
    assert_eq!(out.to_string_lossy(), "A");
}

#[test]
fn bracket_loop_counts_down() {
    let (mut vm, out) = machine("+++p-[p-]", 1);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(out.to_string_lossy(), "3 2 1 ");
}

#[test]
fn saved_instruction_pointer_drives_a_loop() {
    // Cell 1 counts down from 3; cell 0 is scratch. 'i' saves its own index,
    // the body duplicates it through the scratch cell ('v^^') and '!' jumps
    // back to just after the 'i'. On zero, '[' skips to the final ']'.
    let (mut vm, out) = machine(">+++<i>p-[<v^^!]", 2);
    run_to_halt(&mut vm).unwrap();
    assert_eq!(out.to_string_lossy(), "3 2 1 ");
    assert_eq!(vm.stack(), &[5]);
    assert_eq!(vm.cell(0), 5);
    assert_eq!(vm.cell(1), 0);
}

#[test]
fn integer_io_round_trip_through_ports() {
    let out = SharedBuffer::new();
    let mut vm = Interpreter::detached(4);
    vm.set_input(ReaderInput::from_bytes("17 -4"));
    vm.set_output(out.clone());
    vm.load(b"s>s^<v p");
    vm.reset();
    run_to_halt(&mut vm).unwrap();
    assert_eq!(out.to_string_lossy(), "-4 ");
}
