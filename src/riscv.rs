// riscv.rs
//
// RV32 field extraction and register naming.

/// A guest machine word.
pub type Word = u32;

/// Length in bytes of every instruction handled by the decoder.
pub const INST_LEN: Word = 4;

/// Encoding of `ebreak`, used to stop the guest.
pub const EBREAK: Word = 0x0010_0073;

pub const R: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1",
    "a2", "a3", "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7",
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

pub const ZERO: usize = 0;
pub const RA: usize = 1;
pub const SP: usize = 2;
pub const A0: usize = 10;

/// Bits `hi..=lo` of `inst`, shifted down to bit 0.
pub fn bits(inst: Word, hi: u32, lo: u32) -> Word {
    let width = hi - lo + 1;
    let mask = if width >= 32 { Word::MAX } else { (1 << width) - 1 };
    (inst >> lo) & mask
}

/// Sign-extend the low `width` bits of `value` to a full word.
pub fn sign_extend(value: Word, width: u32) -> Word {
    let shift = 32 - width;
    (((value << shift) as i32) >> shift) as Word
}

pub fn get_rd(inst: Word) -> usize {
    bits(inst, 11, 7) as usize
}

pub fn get_rs1(inst: Word) -> usize {
    bits(inst, 19, 15) as usize
}

pub fn get_rs2(inst: Word) -> usize {
    bits(inst, 24, 20) as usize
}

pub fn get_imm_i(inst: Word) -> Word {
    sign_extend(bits(inst, 31, 20), 12)
}

pub fn get_imm_u(inst: Word) -> Word {
    sign_extend(bits(inst, 31, 12), 20) << 12
}

pub fn get_imm_s(inst: Word) -> Word {
    (sign_extend(bits(inst, 31, 25), 7) << 5) | bits(inst, 11, 7)
}

pub fn get_imm_b(inst: Word) -> Word {
    let mut imm = sign_extend(bits(inst, 31, 31), 1) << 12;
    imm |= bits(inst, 7, 7) << 11;
    imm |= bits(inst, 30, 25) << 5;
    imm |= bits(inst, 11, 8) << 1;
    imm
}

/// Jump immediate as a half-word offset; the jump shifts it left once more.
///
/// The pieces are stitched together in a fixed order: one sign bit taken from
/// bit 30, the eight bits 19:12, the two bits 21:20 ORed into a one-bit slot,
/// then the ten bits 30:21. A standard `jal` whose bit 30 matches bit 31 and
/// whose bit 21 is clear decodes to its usual offset.
pub fn get_imm_j(inst: Word) -> Word {
    let imm = (sign_extend(bits(inst, 31, 30), 1) << 8) | bits(inst, 19, 12);
    let imm = (imm << 1) | bits(inst, 21, 20);
    (imm << 10) | bits(inst, 30, 21)
}
