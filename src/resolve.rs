//! Turns constant pool indices into human-readable strings for the
//! disassembler and pretty-printer. Deliberately permissive: a malformed or
//! out-of-range reference yields a placeholder string rather than an error,
//! since resolution only feeds display output.
use crate::classfile::{ConstantPool, ConstantPoolEntry};

/// Resolves constant pool entries to display strings. Holds no state beyond
/// a borrow of the pool it resolves against.
pub struct Resolver<'a> {
    cp: &'a ConstantPool,
}

impl<'a> Resolver<'a> {
    pub fn new(cp: &'a ConstantPool) -> Self {
        Self { cp }
    }

    /// Resolves a literal-bearing entry (used by `ldc`/`ldc_w`/`ldc2_w`) to
    /// its display form: quoted string, decimal integer, `f`-suffixed float,
    /// `L`-suffixed long/double, or a `Utf8` entry passed through as-is.
    pub fn literal(&self, index: u16) -> String {
        match self.cp.get(index) {
            Some(ConstantPoolEntry::String { string_index }) => match self.cp.get(*string_index) {
                Some(ConstantPoolEntry::Utf8 { bytes }) => format!("\"{bytes}\""),
                _ => "<?>".to_string(),
            },
            Some(ConstantPoolEntry::Integer { raw }) => format!("{}", *raw as i32),
            Some(ConstantPoolEntry::Float { raw }) => format!("{}f", f32::from_bits(*raw)),
            Some(ConstantPoolEntry::Long { hi, lo }) => {
                let v = ((*hi as u64) << 32) | (*lo as u64);
                format!("{}L", v as i64)
            }
            Some(ConstantPoolEntry::Double { hi, lo }) => {
                let bits = ((*hi as u64) << 32) | (*lo as u64);
                format!("{}", f64::from_bits(bits))
            }
            Some(ConstantPoolEntry::Class { .. }) => self.class_name(index),
            Some(ConstantPoolEntry::Utf8 { bytes }) => bytes.clone(),
            _ => "<?>".to_string(),
        }
    }

    /// Resolves a `Class` entry to its internal name (`java/lang/Object`).
    pub fn class_name(&self, index: u16) -> String {
        match self.cp.get(index) {
            Some(ConstantPoolEntry::Class { name_index }) => match self.cp.get(*name_index) {
                Some(ConstantPoolEntry::Utf8 { bytes }) => bytes.clone(),
                _ => "<?>".to_string(),
            },
            _ => format!("ERRO_REF #{index}"),
        }
    }

    /// Resolves a field/method/interface-method ref to `Class.name:descriptor`.
    pub fn ref_(&self, index: u16) -> String {
        let (class_index, nat_index) = match self.cp.get(index) {
            Some(ConstantPoolEntry::FieldRef { class_index, name_and_type_index })
            | Some(ConstantPoolEntry::MethodRef { class_index, name_and_type_index })
            | Some(ConstantPoolEntry::InterfaceMethodRef { class_index, name_and_type_index }) => {
                (*class_index, *name_and_type_index)
            }
            _ => return format!("ERRO_REF #{index}"),
        };

        let class = self.class_name(class_index);
        let (name, descriptor) = match self.cp.get(nat_index) {
            Some(ConstantPoolEntry::NameAndType { name_index, descriptor_index }) => {
                let name = match self.cp.get(*name_index) {
                    Some(ConstantPoolEntry::Utf8 { bytes }) => bytes.clone(),
                    _ => "<?>".to_string(),
                };
                let descriptor = match self.cp.get(*descriptor_index) {
                    Some(ConstantPoolEntry::Utf8 { bytes }) => bytes.clone(),
                    _ => "<?>".to_string(),
                };
                (name, descriptor)
            }
            _ => return format!("ERRO_REF #{index}"),
        };

        format!("{class}.{name}:{descriptor}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::ClassFileParser;

    fn class_with_string_and_method_ref() -> crate::classfile::ClassFile {
        let mut b = Vec::new();
        b.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&52u16.to_be_bytes());

        // cp: 1=Utf8 "hi", 2=String->1, 3=Utf8 "Foo", 4=Class->3,
        // 5=Utf8 "bar", 6=Utf8 "()V", 7=NameAndType(5,6), 8=MethodRef(4,7)
        b.extend_from_slice(&9u16.to_be_bytes());
        b.push(1);
        b.extend_from_slice(&2u16.to_be_bytes());
        b.extend_from_slice(b"hi");
        b.push(8);
        b.extend_from_slice(&1u16.to_be_bytes());
        b.push(1);
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(b"Foo");
        b.push(7);
        b.extend_from_slice(&3u16.to_be_bytes());
        b.push(1);
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(b"bar");
        b.push(1);
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(b"()V");
        b.push(12);
        b.extend_from_slice(&5u16.to_be_bytes());
        b.extend_from_slice(&6u16.to_be_bytes());
        b.push(10);
        b.extend_from_slice(&4u16.to_be_bytes());
        b.extend_from_slice(&7u16.to_be_bytes());

        b.extend_from_slice(&0u16.to_be_bytes()); // access_flags
        b.extend_from_slice(&4u16.to_be_bytes()); // this_class
        b.extend_from_slice(&0u16.to_be_bytes()); // super_class
        b.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        b.extend_from_slice(&0u16.to_be_bytes()); // fields
        b.extend_from_slice(&0u16.to_be_bytes()); // methods
        b.extend_from_slice(&0u16.to_be_bytes()); // attributes

        ClassFileParser::parse(&b).unwrap()
    }

    #[test]
    fn resolves_string_literal_quoted() {
        let cf = class_with_string_and_method_ref();
        let r = Resolver::new(&cf.constant_pool);
        assert_eq!(r.literal(2), "\"hi\"");
    }

    #[test]
    fn resolves_method_ref_to_class_name_descriptor() {
        let cf = class_with_string_and_method_ref();
        let r = Resolver::new(&cf.constant_pool);
        assert_eq!(r.ref_(8), "Foo.bar:()V");
    }

    #[test]
    fn broken_ref_yields_placeholder() {
        let cf = class_with_string_and_method_ref();
        let r = Resolver::new(&cf.constant_pool);
        assert_eq!(r.ref_(1), "ERRO_REF #1");
        assert_eq!(r.class_name(1), "ERRO_REF #1");
    }
}
