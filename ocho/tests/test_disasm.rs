use ocho::prelude::*;

#[test]
fn test_disassemble_program() {
    let program = [
        0x00, 0xE0, // CLS
        0xA2, 0x0A, // LD I, 0x20A
        0x61, 0x05, // LD V1, 5
        0xD0, 0x15, // DRW V0, V1, 5
        0x12, 0x08, // JP 0x208
        0xF0, 0x90, // sprite data
    ];

    let mut buf = String::new();
    Disassembler::new(&program).disassemble(&mut buf).unwrap();
    let lines: Vec<&str> = buf.lines().collect();

    assert_eq!(lines[0], "0200: CLS");
    assert_eq!(lines[1], "0202: LD I, 0x20A");
    assert_eq!(lines[2], "0204: LD V1, 0x05");
    assert_eq!(lines[3], "0206: DRW V0, V1, 5");
    assert_eq!(lines[4], "0208: JP 0x208");
    assert_eq!(lines[5], "020A: .word 0xF090");
}

#[test]
fn test_every_family_has_a_mnemonic() {
    // one word from each routing family
    let program = [
        0x00, 0xEE, 0x12, 0x00, 0x22, 0x00, 0x30, 0x01, 0x40, 0x01, 0x50, 0x10, 0x60, 0x01,
        0x70, 0x01, 0x80, 0x14, 0x90, 0x10, 0xA2, 0x00, 0xB2, 0x00, 0xC0, 0xFF, 0xD0, 0x11,
        0xE0, 0x9E, 0xF0, 0x65,
    ];

    let mut buf = String::new();
    Disassembler::new(&program).disassemble(&mut buf).unwrap();

    for mnemonic in [
        "RET", "JP", "CALL", "SE", "SNE", "LD", "ADD", "RND", "DRW", "SKP", "LD V0, [I]",
    ] {
        assert!(buf.contains(mnemonic), "missing {mnemonic} in:\n{buf}");
    }
    assert!(!buf.contains(".word"), "all words decode:\n{buf}");
}

#[test]
fn test_trailing_odd_byte_is_ignored() {
    let program = [0x00, 0xE0, 0xF0];

    let mut buf = String::new();
    Disassembler::new(&program).disassemble(&mut buf).unwrap();

    assert_eq!(buf.lines().count(), 1);
}
