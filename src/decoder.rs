// decoder.rs
//
// Pattern-based RV32 instruction decoding.
//
// Each template is a 32-character bit pattern of '0', '1' and '?' (spaces are
// only for readability) together with an operand layout and the action that
// implements the instruction. Templates are tried in declaration order and the
// first match wins, so more specific patterns must come before general ones.
// The final template matches every word and marks it invalid.

use crate::error::ExecError;
use crate::execution_context::ExecutionContext;
use crate::riscv::{
    A0, INST_LEN, Word, ZERO, get_imm_b, get_imm_i, get_imm_j, get_imm_s, get_imm_u, get_rd,
    get_rs1, get_rs2,
};

/// Operand layout of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstType {
    I,
    U,
    S,
    J,
    R,
    B,
    N,
}

/// Operands pulled out of an instruction word. Fields the layout does not
/// declare are left at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    pub rd: usize,
    pub src1: Word,
    pub src2: Word,
    pub imm: Word,
}

/// Per-instruction decode state: the instruction's pc, the sequential next
/// pc, and the dynamic next pc that control transfers overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decode {
    pub pc: Word,
    pub snpc: Word,
    pub dnpc: Word,
    pub inst: Word,
}

impl Decode {
    pub fn new(pc: Word, inst: Word) -> Self {
        let snpc = pc.wrapping_add(INST_LEN);
        Self { pc, snpc, dnpc: snpc, inst }
    }
}

/// What the engine should do after an instruction's action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Halt { code: Word },
}

pub type Action = fn(&mut Decode, &Operands, &mut dyn ExecutionContext) -> Result<Flow, ExecError>;

pub struct Template {
    pub name: &'static str,
    pub kind: InstType,
    mask: Word,
    key: Word,
    action: Option<Action>,
}

impl Template {
    const fn new(pattern: &str, name: &'static str, kind: InstType, action: Action) -> Self {
        let (mask, key) = parse_pattern(pattern);
        Self { name, kind, mask, key, action: Some(action) }
    }

    const fn invalid(pattern: &str, name: &'static str) -> Self {
        let (mask, key) = parse_pattern(pattern);
        Self { name, kind: InstType::N, mask, key, action: None }
    }

    pub fn matches(&self, inst: Word) -> bool {
        inst & self.mask == self.key
    }
}

const fn parse_pattern(pattern: &str) -> (Word, Word) {
    let bytes = pattern.as_bytes();
    let mut mask: Word = 0;
    let mut key: Word = 0;
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'0' => {
                mask = (mask << 1) | 1;
                key <<= 1;
                count += 1;
            }
            b'1' => {
                mask = (mask << 1) | 1;
                key = (key << 1) | 1;
                count += 1;
            }
            b'?' => {
                mask <<= 1;
                key <<= 1;
                count += 1;
            }
            b' ' => {}
            _ => panic!("instruction pattern may only contain '0', '1', '?' and ' '"),
        }
        i += 1;
    }
    if count != 32 {
        panic!("instruction pattern must describe exactly 32 bits");
    }
    (mask, key)
}

static TEMPLATES: [Template; 17] = [
    Template::new("??????? ????? 00000 000 ????? 00100 11", "li", InstType::I, exec_li),
    Template::new("??????? ????? ????? 000 ????? 00100 11", "addi", InstType::I, exec_addi),
    Template::new("??????? ????? ????? ??? ????? 11011 11", "jal", InstType::J, exec_jal),
    Template::new("??????? ????? ????? 000 ????? 11001 11", "jalr", InstType::I, exec_jalr),
    Template::new("??????? ????? ????? 010 ????? 01000 11", "sw", InstType::S, exec_sw),
    Template::new("??????? ????? ????? 001 ????? 01000 11", "sh", InstType::S, exec_sh),
    Template::new("??????? ????? ????? 000 ????? 01000 11", "sb", InstType::S, exec_sb),
    Template::new("??????? ????? ????? 010 ????? 00000 11", "lw", InstType::I, exec_lw),
    Template::new("??????? ????? ????? 100 ????? 00000 11", "lbu", InstType::I, exec_lbu),
    Template::new("??????? ????? ????? ??? ????? 01101 11", "lui", InstType::U, exec_lui),
    Template::new("??????? ????? ????? ??? ????? 00101 11", "auipc", InstType::U, exec_auipc),
    Template::new("0000000 ????? ????? 000 ????? 01100 11", "add", InstType::R, exec_add),
    Template::new("0100000 ????? ????? 000 ????? 01100 11", "sub", InstType::R, exec_sub),
    Template::new("??????? ????? ????? 000 ????? 11000 11", "beq", InstType::B, exec_beq),
    Template::new("??????? ????? ????? 001 ????? 11000 11", "bne", InstType::B, exec_bne),
    Template::new("0000000 00001 00000 000 00000 11100 11", "ebreak", InstType::N, exec_ebreak),
    Template::invalid("??????? ????? ????? ??? ????? ????? ??", "inv"),
];

/// A matched template and the operands extracted for it.
pub struct Decoded {
    pub template: &'static Template,
    pub operands: Operands,
}

impl Decoded {
    /// Run the bound action, then force register zero back to zero.
    pub fn execute(&self, s: &mut Decode, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
        let result = match self.template.action {
            Some(action) => action(s, &self.operands, ctx),
            None => Err(ExecError::InvalidInstruction { pc: s.pc, inst: s.inst }),
        };
        ctx.write_register(ZERO, 0);
        result
    }
}

pub struct InstructionDecoder;

impl InstructionDecoder {
    /// First template matching `inst`; the catch-all if nothing else does.
    pub fn lookup(inst: Word) -> &'static Template {
        let catch_all = &TEMPLATES[TEMPLATES.len() - 1];
        TEMPLATES.iter().find(|t| t.matches(inst)).unwrap_or(catch_all)
    }

    pub fn mnemonic(inst: Word) -> &'static str {
        Self::lookup(inst).name
    }

    pub fn decode(s: &Decode, ctx: &dyn ExecutionContext) -> Result<Decoded, ExecError> {
        let template = Self::lookup(s.inst);
        if template.action.is_none() {
            return Err(ExecError::InvalidInstruction { pc: s.pc, inst: s.inst });
        }
        let operands = Self::decode_operands(s.inst, template.kind, ctx);
        Ok(Decoded { template, operands })
    }

    pub fn decode_operands(inst: Word, kind: InstType, ctx: &dyn ExecutionContext) -> Operands {
        let rd = get_rd(inst);
        let src1 = || ctx.read_register(get_rs1(inst));
        let src2 = || ctx.read_register(get_rs2(inst));

        match kind {
            InstType::I => Operands { rd, src1: src1(), imm: get_imm_i(inst), ..Default::default() },
            InstType::U => Operands { rd, imm: get_imm_u(inst), ..Default::default() },
            InstType::S => Operands { src1: src1(), src2: src2(), imm: get_imm_s(inst), ..Default::default() },
            InstType::J => Operands { rd, imm: get_imm_j(inst), ..Default::default() },
            InstType::R => Operands { rd, src1: src1(), src2: src2(), ..Default::default() },
            InstType::B => Operands { src1: src1(), src2: src2(), imm: get_imm_b(inst), ..Default::default() },
            InstType::N => Operands::default(),
        }
    }
}

// load immediate: addi with rs1 = zero
fn exec_li(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    let val = ctx.read_register(ZERO).wrapping_add(op.imm);
    ctx.write_register(op.rd, val);
    Ok(Flow::Next)
}

fn exec_addi(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_register(op.rd, op.src1.wrapping_add(op.imm));
    Ok(Flow::Next)
}

fn exec_jal(s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    let offset = op.imm << 1;
    ctx.write_register(op.rd, s.snpc);
    s.dnpc = s.pc.wrapping_add(offset);
    Ok(Flow::Next)
}

fn exec_jalr(s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    let target = op.src1.wrapping_add(op.imm) & !1;
    ctx.write_register(op.rd, s.snpc);
    s.dnpc = target;
    Ok(Flow::Next)
}

fn exec_sw(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_memory(op.src1.wrapping_add(op.imm), 4, op.src2)?;
    Ok(Flow::Next)
}

fn exec_sh(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_memory(op.src1.wrapping_add(op.imm), 2, op.src2)?;
    Ok(Flow::Next)
}

fn exec_sb(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_memory(op.src1.wrapping_add(op.imm), 1, op.src2)?;
    Ok(Flow::Next)
}

fn exec_lw(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    let val = ctx.read_memory(op.src1.wrapping_add(op.imm), 4)?;
    ctx.write_register(op.rd, val);
    Ok(Flow::Next)
}

fn exec_lbu(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    let val = ctx.read_memory(op.src1.wrapping_add(op.imm), 1)?;
    ctx.write_register(op.rd, val);
    Ok(Flow::Next)
}

fn exec_lui(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_register(op.rd, op.imm);
    Ok(Flow::Next)
}

fn exec_auipc(s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_register(op.rd, s.pc.wrapping_add(op.imm));
    Ok(Flow::Next)
}

fn exec_add(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_register(op.rd, op.src1.wrapping_add(op.src2));
    Ok(Flow::Next)
}

fn exec_sub(_s: &mut Decode, op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    ctx.write_register(op.rd, op.src1.wrapping_sub(op.src2));
    Ok(Flow::Next)
}

fn exec_beq(s: &mut Decode, op: &Operands, _ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    if op.src1 == op.src2 {
        s.dnpc = s.pc.wrapping_add(op.imm);
    }
    Ok(Flow::Next)
}

fn exec_bne(s: &mut Decode, op: &Operands, _ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    if op.src1 != op.src2 {
        s.dnpc = s.pc.wrapping_add(op.imm);
    }
    Ok(Flow::Next)
}

// the exit status lives in a0
fn exec_ebreak(_s: &mut Decode, _op: &Operands, ctx: &mut dyn ExecutionContext) -> Result<Flow, ExecError> {
    Ok(Flow::Halt { code: ctx.read_register(A0) })
}
