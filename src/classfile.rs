//! Binary class-file decoder: header, constant pool, fields, methods and
//! class-level attributes.
use log::{debug, trace};

use crate::error::ClassFileError;
use crate::io::ByteReader;

/// Magic number every class file must start with.
pub const JVM_CLASS_FILE_MAGIC: u32 = 0xCAFE_BABE;

/// A raw, uninterpreted attribute blob. `AttributeParser` lifts the `Code`
/// attribute of these into a [`crate::attributes::CodeAttribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

/// Tagged constant pool entry. Index 0 is never valid; after a `Long`/
/// `Double` entry the following slot is `None` and skipped by iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantPoolEntry {
    None,
    Utf8 { bytes: String },
    Integer { raw: u32 },
    Float { raw: u32 },
    Long { hi: u32, lo: u32 },
    Double { hi: u32, lo: u32 },
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, ref_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_attr_index: u16, name_and_type_index: u16 },
}

#[repr(u8)]
enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    InvokeDynamic = 18,
}

impl TryFrom<u8> for ConstantTag {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, ()> {
        Ok(match v {
            1 => Self::Utf8,
            3 => Self::Integer,
            4 => Self::Float,
            5 => Self::Long,
            6 => Self::Double,
            7 => Self::Class,
            8 => Self::String,
            9 => Self::FieldRef,
            10 => Self::MethodRef,
            11 => Self::InterfaceMethodRef,
            12 => Self::NameAndType,
            15 => Self::MethodHandle,
            16 => Self::MethodType,
            18 => Self::InvokeDynamic,
            _ => return Err(()),
        })
    }
}

/// Table of constant pool entries indexed `1..cp_count-1`. Index 0 and any
/// gap slot after a `Long`/`Double` hold `ConstantPoolEntry::None`.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<ConstantPoolEntry>,
}

impl ConstantPool {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, or `None` if out of range.
    pub fn get(&self, index: u16) -> Option<&ConstantPoolEntry> {
        self.entries.get(index as usize)
    }

    /// Dereferences a `Utf8` entry to its string contents.
    pub fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(ConstantPoolEntry::Utf8 { bytes }) => Ok(bytes.as_str()),
            Some(_) => Err(ClassFileError::InvalidConstantRef { index, expected: "Utf8" }),
            None => Err(ClassFileError::IndexOutOfRange(index)),
        }
    }

    /// Dereferences a `Class` entry to its internal (slash-separated) name.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(ConstantPoolEntry::Class { name_index }) => self.utf8(*name_index),
            Some(_) => Err(ClassFileError::InvalidConstantRef { index, expected: "Class" }),
            None => Err(ClassFileError::IndexOutOfRange(index)),
        }
    }
}

/// Member (field or method) descriptor shared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<RawAttribute>,
}

pub type FieldInfo = MemberInfo;
pub type MethodInfo = MemberInfo;

impl MemberInfo {
    /// Finds a raw attribute by its (resolved) name.
    pub fn find_attribute<'a>(&'a self, cp: &ConstantPool, name: &str) -> Option<&'a RawAttribute> {
        self.attributes
            .iter()
            .find(|attr| cp.utf8(attr.name_index).map(|n| n == name).unwrap_or(false))
    }
}

/// Fully decoded class file. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<RawAttribute>,
}

impl ClassFile {
    /// Looks up a method by exact name and descriptor (used to locate the
    /// entry point).
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            self.constant_pool.utf8(m.name_index).map(|n| n == name).unwrap_or(false)
                && self
                    .constant_pool
                    .utf8(m.descriptor_index)
                    .map(|d| d == descriptor)
                    .unwrap_or(false)
        })
    }
}

/// Maps a class file major version to its JDK release name, for the
/// pretty-printer.
pub fn major_version_name(major: u16) -> &'static str {
    match major {
        45 => "JDK 1.1",
        46 => "JDK 1.2",
        47 => "JDK 1.3",
        48 => "JDK 1.4",
        49 => "Java 5",
        50 => "Java 6",
        51 => "Java 7",
        52 => "Java 8",
        53 => "Java 9",
        54 => "Java 10",
        55 => "Java 11",
        56 => "Java 12",
        57 => "Java 13",
        58 => "Java 14",
        59 => "Java 15",
        60 => "Java 16",
        61 => "Java 17",
        62 => "Java 18",
        63 => "Java 19",
        64 => "Java 20",
        65 => "Java 21",
        66 => "Java 22",
        67 => "Java 23",
        68 => "Java 24",
        _ => "unknown",
    }
}

/// Namespaces the class-file parsing operation.
pub struct ClassFileParser;

impl ClassFileParser {
    /// Parses a byte buffer into a [`ClassFile`].
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, ClassFileError> {
        let mut r = ByteReader::new(bytes);

        let magic = r.read_u4()?;
        if magic != JVM_CLASS_FILE_MAGIC {
            return Err(ClassFileError::BadMagic);
        }
        let minor_version = r.read_u2()?;
        let major_version = r.read_u2()?;
        debug!("class file version {major_version}.{minor_version}");

        let constant_pool = Self::parse_constant_pool(&mut r)?;

        let access_flags = r.read_u2()?;
        let this_class = r.read_u2()?;
        let super_class = r.read_u2()?;

        let interfaces_count = r.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(r.read_u2()?);
        }

        let fields = Self::parse_members(&mut r)?;
        let methods = Self::parse_members(&mut r)?;
        let attributes = Self::parse_raw_attributes(&mut r)?;

        Ok(ClassFile {
            magic,
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_constant_pool(r: &mut ByteReader) -> Result<ConstantPool, ClassFileError> {
        let cp_count = r.read_u2()?;
        let mut entries = vec![ConstantPoolEntry::None; cp_count as usize];

        let mut i: usize = 1;
        while i < cp_count as usize {
            let index = i;
            let tag_byte = r.read_u1()?;
            let tag = ConstantTag::try_from(tag_byte)
                .map_err(|_| ClassFileError::UnknownConstantTag(tag_byte, index as u16))?;

            let entry = match tag {
                ConstantTag::Class => ConstantPoolEntry::Class { name_index: r.read_u2()? },
                ConstantTag::FieldRef => ConstantPoolEntry::FieldRef {
                    class_index: r.read_u2()?,
                    name_and_type_index: r.read_u2()?,
                },
                ConstantTag::MethodRef => ConstantPoolEntry::MethodRef {
                    class_index: r.read_u2()?,
                    name_and_type_index: r.read_u2()?,
                },
                ConstantTag::InterfaceMethodRef => ConstantPoolEntry::InterfaceMethodRef {
                    class_index: r.read_u2()?,
                    name_and_type_index: r.read_u2()?,
                },
                ConstantTag::String => ConstantPoolEntry::String { string_index: r.read_u2()? },
                ConstantTag::Integer => ConstantPoolEntry::Integer { raw: r.read_u4()? },
                ConstantTag::Float => ConstantPoolEntry::Float { raw: r.read_u4()? },
                ConstantTag::Long => {
                    let hi = r.read_u4()?;
                    let lo = r.read_u4()?;
                    if index + 1 >= cp_count as usize {
                        return Err(ClassFileError::InvalidCodeAttribute(
                            "Long constant leaves no room for its gap slot",
                        ));
                    }
                    entries[index + 1] = ConstantPoolEntry::None;
                    ConstantPoolEntry::Long { hi, lo }
                }
                ConstantTag::Double => {
                    let hi = r.read_u4()?;
                    let lo = r.read_u4()?;
                    if index + 1 >= cp_count as usize {
                        return Err(ClassFileError::InvalidCodeAttribute(
                            "Double constant leaves no room for its gap slot",
                        ));
                    }
                    entries[index + 1] = ConstantPoolEntry::None;
                    ConstantPoolEntry::Double { hi, lo }
                }
                ConstantTag::NameAndType => ConstantPoolEntry::NameAndType {
                    name_index: r.read_u2()?,
                    descriptor_index: r.read_u2()?,
                },
                ConstantTag::Utf8 => {
                    let length = r.read_u2()?;
                    let raw = r.read_bytes(length as usize)?;
                    let bytes = String::from_utf8_lossy(&raw).into_owned();
                    ConstantPoolEntry::Utf8 { bytes }
                }
                ConstantTag::MethodHandle => ConstantPoolEntry::MethodHandle {
                    kind: r.read_u1()?,
                    ref_index: r.read_u2()?,
                },
                ConstantTag::MethodType => {
                    ConstantPoolEntry::MethodType { descriptor_index: r.read_u2()? }
                }
                ConstantTag::InvokeDynamic => ConstantPoolEntry::InvokeDynamic {
                    bootstrap_attr_index: r.read_u2()?,
                    name_and_type_index: r.read_u2()?,
                },
            };
            let width = match entry {
                ConstantPoolEntry::Long { .. } | ConstantPoolEntry::Double { .. } => 2,
                _ => 1,
            };
            entries[index] = entry;
            i += width;
        }

        Ok(ConstantPool { entries })
    }

    fn parse_members(r: &mut ByteReader) -> Result<Vec<MemberInfo>, ClassFileError> {
        let count = r.read_u2()?;
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let access_flags = r.read_u2()?;
            let name_index = r.read_u2()?;
            let descriptor_index = r.read_u2()?;
            let attributes = Self::parse_raw_attributes(r)?;
            members.push(MemberInfo { access_flags, name_index, descriptor_index, attributes });
        }
        Ok(members)
    }

    fn parse_raw_attributes(r: &mut ByteReader) -> Result<Vec<RawAttribute>, ClassFileError> {
        let count = r.read_u2()?;
        let mut attrs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = r.read_u2()?;
            let length = r.read_u4()?;
            let info = r.read_bytes(length as usize)?;
            trace!("raw attribute name_index={name_index} length={length}");
            attrs.push(RawAttribute { name_index, info });
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal valid class file: `class SingleFuncCall extends Object { void
    // <init>() { super(); } }`-shaped header + one method with an empty Code
    // attribute, hand-assembled so the test does not depend on an external
    // `.class` fixture.
    fn minimal_class_bytes() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes()); // magic
        b.extend_from_slice(&0u16.to_be_bytes()); // minor
        b.extend_from_slice(&52u16.to_be_bytes()); // major (Java 8)

        // constant pool: 1=Utf8 "Foo", 2=Class ->1
        b.extend_from_slice(&3u16.to_be_bytes()); // cp_count
        b.push(1); // Utf8 tag
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(b"Foo");
        b.push(7); // Class tag
        b.extend_from_slice(&1u16.to_be_bytes());

        b.extend_from_slice(&0x0021u16.to_be_bytes()); // access_flags
        b.extend_from_slice(&2u16.to_be_bytes()); // this_class
        b.extend_from_slice(&0u16.to_be_bytes()); // super_class

        b.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count
        b.extend_from_slice(&0u16.to_be_bytes()); // fields_count
        b.extend_from_slice(&0u16.to_be_bytes()); // methods_count
        b.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        b
    }

    #[test]
    fn parses_header_and_constant_pool() {
        let bytes = minimal_class_bytes();
        let cf = ClassFileParser::parse(&bytes).unwrap();
        assert_eq!(cf.magic, JVM_CLASS_FILE_MAGIC);
        assert_eq!(cf.major_version, 52);
        assert_eq!(cf.constant_pool.class_name(2).unwrap(), "Foo");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = minimal_class_bytes();
        bytes[0] = 0x00;
        assert_eq!(ClassFileParser::parse(&bytes).unwrap_err(), ClassFileError::BadMagic);
    }

    #[test]
    fn long_entry_leaves_a_none_gap_slot() {
        let mut b = Vec::new();
        b.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&52u16.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes()); // cp_count: slots 1,2 used by the Long
        b.push(5); // Long tag
        b.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        b.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        b.extend_from_slice(&0x0021u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());

        let cf = ClassFileParser::parse(&b).unwrap();
        assert_eq!(cf.constant_pool.get(1), Some(&ConstantPoolEntry::Long { hi: 0xDEAD_BEEF, lo: 0xCAFE_BABE }));
        assert_eq!(cf.constant_pool.get(2), Some(&ConstantPoolEntry::None));
    }

    #[test]
    fn truncated_input_is_end_of_input() {
        let bytes = &minimal_class_bytes()[..6];
        assert!(matches!(
            ClassFileParser::parse(bytes).unwrap_err(),
            ClassFileError::UnexpectedEof { .. }
        ));
    }
}
