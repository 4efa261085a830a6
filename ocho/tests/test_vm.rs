//! End-to-end runs through the public API only.
use ocho::prelude::*;

#[test]
fn test_draw_glyph_end_to_end() {
    let mut vm = OchoVm::new();
    // LD V0, 0; LD F, V0; DRW V0, V0, 5
    vm.load_program(&[0x60, 0x00, 0xF0, 0x29, 0xD0, 0x05]).unwrap();

    for _ in 0..3 {
        vm.step().unwrap();
    }

    assert!(vm.redraw());
    let display = vm.dump_display().unwrap();
    let top_row = display.lines().next().unwrap();
    assert!(top_row.starts_with("####...."), "expected the glyph for 0");

    vm.clear_redraw();
    assert!(!vm.redraw());
}

#[test]
fn test_counting_loop() {
    // Counts V0 up to ten, then draws a marker sprite at (10, 10).
    //
    // 0x200 LD V0, 0
    // 0x202 ADD V0, 1
    // 0x204 SE V0, 0x0A
    // 0x206 JP 0x202
    // 0x208 DRW V0, V0, 1
    let mut vm = OchoVm::new();
    vm.load_program(&[0x60, 0x00, 0x70, 0x01, 0x30, 0x0A, 0x12, 0x02, 0xD0, 0x01])
        .unwrap();

    // the load, nine untaken rounds of three cycles, a taken round of
    // two, then the draw
    let mut flow = Flow::Continue;
    for _ in 0..31 {
        flow = vm.step().unwrap().flow;
    }

    assert_eq!(flow, Flow::Draw);
    // index is zero, so the sprite row is the first font byte 0xF0
    let fb = vm.framebuffer();
    assert!(fb[10 * 64 + 10] && fb[10 * 64 + 13]);
    assert!(!fb[10 * 64 + 14]);
}

#[test]
fn test_tone_reaches_the_host() {
    // LD V0, 1; LD ST, V0; LD V1, 0
    let mut vm = OchoVm::new();
    vm.load_program(&[0x60, 0x01, 0xF0, 0x18, 0x61, 0x00]).unwrap();

    assert!(!vm.step().unwrap().tone);
    // the write puts 1 in the sound timer and the same cycle exhausts it
    assert!(vm.step().unwrap().tone);
    assert!(!vm.step().unwrap().tone);
}

#[test]
fn test_key_wait_resumes_on_press() {
    // LD V0, K; DRW V0, V0, 1
    let mut vm = OchoVm::new();
    vm.load_program(&[0xF0, 0x0A, 0xD0, 0x01]).unwrap();

    for _ in 0..5 {
        assert_eq!(vm.step().unwrap().flow, Flow::KeyWait);
    }

    vm.set_key(0x4, true);
    assert_eq!(vm.step().unwrap().flow, Flow::Continue);

    // the draw lands at (4, 4), proving V0 took the key number
    assert_eq!(vm.step().unwrap().flow, Flow::Draw);
    let fb = vm.framebuffer();
    assert!(fb[4 * 64 + 4], "sprite must be drawn at the key coordinate");
}

#[test]
fn test_program_too_large_is_reported() {
    let mut vm = OchoVm::new();
    let image = vec![0_u8; 4096];

    assert_eq!(
        vm.load_program(&image),
        Err(OchoError::ProgramTooLarge { size: 4096 })
    );
}

#[test]
fn test_address_fault_is_reported() {
    // LD I, 0xFFF; LD [I], V5
    let mut vm = OchoVm::new();
    vm.load_program(&[0xAF, 0xFF, 0xF5, 0x55]).unwrap();

    vm.step().unwrap();
    assert_eq!(vm.step(), Err(OchoError::AddressFault { addr: 0xFFF }));
}

#[test]
fn test_unknown_word_is_surfaced() {
    let mut vm = OchoVm::new();
    vm.load_program(&[0x00, 0x05]).unwrap();

    let cycle = vm.step().unwrap();

    assert_eq!(cycle.flow, Flow::Unknown(Opcode::from(0x0005)));
}

#[test]
fn test_reset_between_programs() {
    let mut vm = OchoVm::new();
    vm.load_program(&[0x60, 0x0A, 0xF0, 0x29, 0xD0, 0x05]).unwrap();
    for _ in 0..3 {
        vm.step().unwrap();
    }
    assert!(vm.redraw());

    vm.reset();

    assert!(!vm.redraw());
    assert!(vm.framebuffer().iter().all(|&px| !px));
}
