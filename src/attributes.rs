//! Lifts the raw `Code` attribute (and its nested `LineNumberTable`/
//! `LocalVariableTable`) into structured form.
use crate::classfile::{ClassFile, ConstantPool, MethodInfo, RawAttribute};
use crate::error::ClassFileError;
use crate::io::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumberTableEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableTableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

/// Decoded `Code` attribute: bytecode plus its exception table and the
/// line/local-variable debug tables, when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub line_number_table: Vec<LineNumberTableEntry>,
    pub local_variable_table: Vec<LocalVariableTableEntry>,
}

pub struct AttributeParser;

impl AttributeParser {
    /// Finds and decodes `method`'s `Code` attribute.
    pub fn find_code(
        cp: &ConstantPool,
        method: &MethodInfo,
    ) -> Result<CodeAttribute, ClassFileError> {
        let raw = method
            .find_attribute(cp, "Code")
            .ok_or(ClassFileError::InvalidCodeAttribute("method has no Code attribute"))?;
        Self::parse_code(cp, raw)
    }

    fn parse_code(cp: &ConstantPool, raw: &RawAttribute) -> Result<CodeAttribute, ClassFileError> {
        let mut r = ByteReader::new(&raw.info);

        let max_stack = r.read_u2()?;
        let max_locals = r.read_u2()?;
        let code_length = r.read_u4()?;
        if code_length == 0 || code_length > 65535 {
            return Err(ClassFileError::InvalidCodeAttribute("code_length out of range"));
        }
        let code = r.read_bytes(code_length as usize)?;

        let exception_table_length = r.read_u2()?;
        let mut exception_table = Vec::with_capacity(exception_table_length as usize);
        for _ in 0..exception_table_length {
            let start_pc = r.read_u2()?;
            let end_pc = r.read_u2()?;
            let handler_pc = r.read_u2()?;
            let catch_type = r.read_u2()?;
            if start_pc as u32 >= end_pc as u32
                || end_pc as u32 > code_length
                || handler_pc as u32 >= code_length
            {
                return Err(ClassFileError::InvalidCodeAttribute(
                    "exception table entry out of bounds",
                ));
            }
            exception_table.push(ExceptionTableEntry { start_pc, end_pc, handler_pc, catch_type });
        }

        let nested_count = r.read_u2()?;
        let mut line_number_table = Vec::new();
        let mut local_variable_table = Vec::new();
        for _ in 0..nested_count {
            let name_index = r.read_u2()?;
            let length = r.read_u4()?;
            let info = r.read_bytes(length as usize)?;
            let name = cp.utf8(name_index).unwrap_or("");
            match name {
                "LineNumberTable" => {
                    line_number_table = Self::parse_line_number_table(&info)?;
                }
                "LocalVariableTable" => {
                    local_variable_table = Self::parse_local_variable_table(&info)?;
                }
                _ => {}
            }
        }

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            line_number_table,
            local_variable_table,
        })
    }

    fn parse_line_number_table(
        info: &[u8],
    ) -> Result<Vec<LineNumberTableEntry>, ClassFileError> {
        let mut r = ByteReader::new(info);
        let count = r.read_u2()?;
        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start_pc = r.read_u2()?;
            let line_number = r.read_u2()?;
            table.push(LineNumberTableEntry { start_pc, line_number });
        }
        Ok(table)
    }

    fn parse_local_variable_table(
        info: &[u8],
    ) -> Result<Vec<LocalVariableTableEntry>, ClassFileError> {
        let mut r = ByteReader::new(info);
        let count = r.read_u2()?;
        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start_pc = r.read_u2()?;
            let length = r.read_u2()?;
            let name_index = r.read_u2()?;
            let descriptor_index = r.read_u2()?;
            let index = r.read_u2()?;
            table.push(LocalVariableTableEntry {
                start_pc,
                length,
                name_index,
                descriptor_index,
                index,
            });
        }
        Ok(table)
    }
}

/// Locates a method's `Code` attribute directly from a `ClassFile` by name
/// and descriptor, for the interpreter's entry-point lookup.
pub fn find_method_code(
    class_file: &ClassFile,
    name: &str,
    descriptor: &str,
) -> Result<CodeAttribute, ClassFileError> {
    let method = class_file
        .find_method(name, descriptor)
        .ok_or(ClassFileError::InvalidCodeAttribute("method not found"))?;
    AttributeParser::find_code(&class_file.constant_pool, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp_with_code_name() -> ConstantPool {
        ConstantPool::default()
    }

    fn raw_code_attribute(max_stack: u16, max_locals: u16, code: &[u8]) -> RawAttribute {
        let mut info = Vec::new();
        info.extend_from_slice(&max_stack.to_be_bytes());
        info.extend_from_slice(&max_locals.to_be_bytes());
        info.extend_from_slice(&(code.len() as u32).to_be_bytes());
        info.extend_from_slice(code);
        info.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
        info.extend_from_slice(&0u16.to_be_bytes()); // nested attribute count
        RawAttribute { name_index: 1, info }
    }

    #[test]
    fn decodes_minimal_code_attribute() {
        let cp = cp_with_code_name();
        let raw = raw_code_attribute(2, 1, &[0x03, 0xAC]); // iconst_0, ireturn-ish bytes
        let decoded = AttributeParser::parse_code(&cp, &raw).unwrap();
        assert_eq!(decoded.max_stack, 2);
        assert_eq!(decoded.max_locals, 1);
        assert_eq!(decoded.code, vec![0x03, 0xAC]);
        assert!(decoded.exception_table.is_empty());
    }

    #[test]
    fn rejects_zero_length_code() {
        let cp = cp_with_code_name();
        let raw = raw_code_attribute(1, 1, &[]);
        assert!(AttributeParser::parse_code(&cp, &raw).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_exception_entry() {
        let cp = cp_with_code_name();
        let mut raw = raw_code_attribute(1, 1, &[0x00]);
        // overwrite exception_table_length=0 with 1, and append a bad entry
        let patch_offset = 2 + 2 + 4 + 1;
        raw.info[patch_offset..patch_offset + 2].copy_from_slice(&1u16.to_be_bytes());
        let mut with_entry = raw.info[..patch_offset + 2].to_vec();
        with_entry.extend_from_slice(&0u16.to_be_bytes()); // start_pc
        with_entry.extend_from_slice(&0u16.to_be_bytes()); // end_pc == start_pc: invalid
        with_entry.extend_from_slice(&0u16.to_be_bytes()); // handler_pc
        with_entry.extend_from_slice(&0u16.to_be_bytes()); // catch_type
        with_entry.extend_from_slice(&0u16.to_be_bytes()); // nested attr count
        raw.info = with_entry;
        assert!(AttributeParser::parse_code(&cp, &raw).is_err());
    }
}
