//! Error taxonomy for the parser, disassembler and interpreter.
use thiserror::Error;

/// Errors surfaced while decoding a class file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("bad magic number (expected 0xCAFEBABE)")]
    BadMagic,
    #[error("unexpected end of input at byte offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("unknown constant pool tag {0} at index {1}")]
    UnknownConstantTag(u8, u16),
    #[error("constant pool index {0} out of range")]
    IndexOutOfRange(u16),
    #[error("constant pool entry at index {index} expected tag {expected}")]
    InvalidConstantRef { index: u16, expected: &'static str },
    #[error("unsupported major version {0}")]
    UnsupportedVersion(u16),
    #[error("invalid Code attribute: {0}")]
    InvalidCodeAttribute(&'static str),
}

/// Errors surfaced while interpreting bytecode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("operand stack overflow")]
    StackOverflow,
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("null pointer dereference at pc {pc}")]
    NullPointer { pc: u32 },
    #[error("division by zero at pc {pc}")]
    DivisionByZero { pc: u32 },
    #[error("negative array size {0}")]
    NegativeArraySize(i32),
    #[error("unsupported opcode 0x{opcode:02X} at pc {pc}")]
    UnsupportedOpcode { opcode: u8, pc: u32 },
    #[error("local variable index {0} out of range")]
    LocalIndexOutOfRange(u16),
    #[error("method '{0}' with descriptor '{1}' not found")]
    MethodNotFound(String, String),
    #[error("method has no Code attribute")]
    MissingCodeAttribute,
    #[error("instruction budget of {0} exceeded, aborting run")]
    InstructionBudgetExceeded(u64),
}

/// Top-level error returned from the CLI entry points.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("class file error: {0}")]
    ClassFile(#[from] ClassFileError),
    #[error("execution error: {0}")]
    Vm(#[from] VmError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
