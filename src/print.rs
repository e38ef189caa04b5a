//! Human-readable and JSON renderings of a parsed class file.
use serde::Serialize;

use crate::attributes::AttributeParser;
use crate::classfile::{major_version_name, ClassFile, ConstantPoolEntry, MemberInfo};
use crate::disasm::Disassembler;
use crate::error::AppError;

/// Writes the pretty, human-oriented dump of `class_file` to stdout:
/// header, constant pool table, access flags, interfaces, fields, methods
/// (with disassembly unless `no_code`), and class attributes.
pub fn print_classfile(class_file: &ClassFile, no_code: bool) {
    println!(
        "major/minor: {}.{} ({})",
        class_file.major_version,
        class_file.minor_version,
        major_version_name(class_file.major_version)
    );
    println!("access_flags: 0x{:04X}", class_file.access_flags);
    println!(
        "this_class: {}",
        class_file.constant_pool.class_name(class_file.this_class).unwrap_or("<?>")
    );
    if class_file.super_class != 0 {
        println!(
            "super_class: {}",
            class_file.constant_pool.class_name(class_file.super_class).unwrap_or("<?>")
        );
    }

    println!("constant_pool: {} entries", class_file.constant_pool.len().saturating_sub(1));
    for i in 1..class_file.constant_pool.len() as u16 {
        if let Some(entry) = class_file.constant_pool.get(i) {
            if matches!(entry, ConstantPoolEntry::None) {
                continue;
            }
            println!("  #{i} = {}", describe_constant(entry));
        }
    }

    println!("interfaces: {}", class_file.interfaces.len());
    for idx in &class_file.interfaces {
        println!("  {}", class_file.constant_pool.class_name(*idx).unwrap_or("<?>"));
    }

    println!("fields: {}", class_file.fields.len());
    for f in &class_file.fields {
        print_member(class_file, f);
    }

    println!("methods: {}", class_file.methods.len());
    for m in &class_file.methods {
        print_member(class_file, m);
        if !no_code {
            if let Ok(code_attr) = AttributeParser::find_code(&class_file.constant_pool, m) {
                if let Ok(instrs) = Disassembler::disassemble(&code_attr.code, &class_file.constant_pool) {
                    for instr in instrs {
                        match &instr.resolved_text {
                            Some(resolved) => println!(
                                "      {:>4}: {} {}  // {}",
                                instr.pc, instr.mnemonic, instr.args_text, resolved
                            ),
                            None => println!(
                                "      {:>4}: {} {}",
                                instr.pc, instr.mnemonic, instr.args_text
                            ),
                        }
                    }
                }
            }
        }
    }

    println!("attributes: {}", class_file.attributes.len());
}

fn print_member(class_file: &ClassFile, member: &MemberInfo) {
    let name = class_file.constant_pool.utf8(member.name_index).unwrap_or("<?>");
    let descriptor = class_file.constant_pool.utf8(member.descriptor_index).unwrap_or("<?>");
    println!("  {name}:{descriptor} (access_flags=0x{:04X})", member.access_flags);
}

fn describe_constant(entry: &ConstantPoolEntry) -> String {
    match entry {
        ConstantPoolEntry::Utf8 { bytes } => format!("Utf8 \"{bytes}\""),
        ConstantPoolEntry::Integer { raw } => format!("Integer {}", *raw as i32),
        ConstantPoolEntry::Float { raw } => format!("Float {}", f32::from_bits(*raw)),
        ConstantPoolEntry::Long { hi, lo } => {
            let v = ((*hi as u64) << 32) | (*lo as u64);
            format!("Long {}", v as i64)
        }
        ConstantPoolEntry::Double { hi, lo } => {
            let bits = ((*hi as u64) << 32) | (*lo as u64);
            format!("Double {}", f64::from_bits(bits))
        }
        ConstantPoolEntry::Class { name_index } => format!("Class #{name_index}"),
        ConstantPoolEntry::String { string_index } => format!("String #{string_index}"),
        ConstantPoolEntry::FieldRef { class_index, name_and_type_index } => {
            format!("Fieldref #{class_index}.#{name_and_type_index}")
        }
        ConstantPoolEntry::MethodRef { class_index, name_and_type_index } => {
            format!("Methodref #{class_index}.#{name_and_type_index}")
        }
        ConstantPoolEntry::InterfaceMethodRef { class_index, name_and_type_index } => {
            format!("InterfaceMethodref #{class_index}.#{name_and_type_index}")
        }
        ConstantPoolEntry::NameAndType { name_index, descriptor_index } => {
            format!("NameAndType #{name_index}:#{descriptor_index}")
        }
        ConstantPoolEntry::MethodHandle { kind, ref_index } => {
            format!("MethodHandle kind={kind} #{ref_index}")
        }
        ConstantPoolEntry::MethodType { descriptor_index } => {
            format!("MethodType #{descriptor_index}")
        }
        ConstantPoolEntry::InvokeDynamic { bootstrap_attr_index, name_and_type_index } => {
            format!("InvokeDynamic #{bootstrap_attr_index}:#{name_and_type_index}")
        }
        ConstantPoolEntry::None => "<empty>".to_string(),
    }
}

#[derive(Serialize)]
struct JsonClassFile {
    major_version: u16,
    minor_version: u16,
    access_flags: u16,
    this_class: String,
    super_class: Option<String>,
    constant_pool_count: usize,
    interfaces: Vec<String>,
    fields: Vec<JsonMember>,
    methods: Vec<JsonMember>,
    attribute_count: usize,
}

#[derive(Serialize)]
struct JsonMember {
    name: String,
    descriptor: String,
    access_flags: u16,
    code: Option<Vec<JsonInstruction>>,
}

#[derive(Serialize)]
struct JsonInstruction {
    pc: u32,
    mnemonic: &'static str,
    args: String,
    resolved: Option<String>,
}

/// Serializes `class_file` to a JSON string, matching the field naming used
/// by the pretty-printer.
pub fn classfile_to_json(class_file: &ClassFile, no_code: bool) -> Result<String, AppError> {
    let cp = &class_file.constant_pool;
    let to_member = |m: &MemberInfo| -> JsonMember {
        let name = cp.utf8(m.name_index).unwrap_or("<?>").to_string();
        let descriptor = cp.utf8(m.descriptor_index).unwrap_or("<?>").to_string();
        let code = if no_code {
            None
        } else {
            AttributeParser::find_code(cp, m).ok().and_then(|code_attr| {
                Disassembler::disassemble(&code_attr.code, cp).ok().map(|instrs| {
                    instrs
                        .into_iter()
                        .map(|i| JsonInstruction {
                            pc: i.pc,
                            mnemonic: i.mnemonic,
                            args: i.args_text,
                            resolved: i.resolved_text,
                        })
                        .collect()
                })
            })
        };
        JsonMember { name, descriptor, access_flags: m.access_flags, code }
    };

    let doc = JsonClassFile {
        major_version: class_file.major_version,
        minor_version: class_file.minor_version,
        access_flags: class_file.access_flags,
        this_class: cp.class_name(class_file.this_class).unwrap_or("<?>").to_string(),
        super_class: if class_file.super_class == 0 {
            None
        } else {
            Some(cp.class_name(class_file.super_class).unwrap_or("<?>").to_string())
        },
        constant_pool_count: cp.len(),
        interfaces: class_file
            .interfaces
            .iter()
            .map(|idx| cp.class_name(*idx).unwrap_or("<?>").to_string())
            .collect(),
        fields: class_file.fields.iter().map(to_member).collect(),
        methods: class_file.methods.iter().map(to_member).collect(),
        attribute_count: class_file.attributes.len(),
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}
