//! From-scratch parser for the JVM class-file binary format.
//!
//! Parses the sequential layout (magic, versions, constant pool, members,
//! attributes) into an owned [`ClassFile`]. Only the `Code` attribute is
//! decoded structurally; every other attribute is retained as raw bytes, which
//! is all the statistics pipeline needs.

use std::fmt;

/// Structural violation of the class-file layout.
#[derive(Debug)]
pub(crate) enum ClassFileError {
    UnexpectedEof,
    BadMagic(u32),
    UnknownConstantTag { tag: u8, index: u16 },
    BadConstantIndex(u16),
    AttributeOverrun(String),
    ModifiedUtf8(String),
}

impl fmt::Display for ClassFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFileError::UnexpectedEof => write!(f, "unexpected end of class file"),
            ClassFileError::BadMagic(magic) => write!(f, "bad magic 0x{magic:08x}"),
            ClassFileError::UnknownConstantTag { tag, index } => {
                write!(f, "unknown constant pool tag {tag} at index {index}")
            }
            ClassFileError::BadConstantIndex(index) => {
                write!(f, "invalid constant pool index {index}")
            }
            ClassFileError::AttributeOverrun(name) => {
                write!(f, "attribute {name} does not fill its declared length")
            }
            ClassFileError::ModifiedUtf8(message) => {
                write!(f, "invalid modified UTF-8: {message}")
            }
        }
    }
}

impl std::error::Error for ClassFileError {}

/// One constant pool entry, tagged by kind.
///
/// `Unusable` fills index 0 and the trailing slot of each Long/Double entry;
/// dereferencing one is a [`ClassFileError::BadConstantIndex`].
#[derive(Debug, Clone)]
pub(crate) enum ConstantEntry {
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

/// Index-addressable constant pool with the class file's 1-based index space.
#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<ConstantEntry>,
}

impl ConstantPool {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(ConstantEntry::Unusable);

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    ConstantEntry::Utf8(decode_modified_utf8(bytes)?)
                }
                3 => ConstantEntry::Integer(reader.read_u4()? as i32),
                4 => ConstantEntry::Float(f32::from_bits(reader.read_u4()?)),
                5 => ConstantEntry::Long(reader.read_u8()? as i64),
                6 => ConstantEntry::Double(f64::from_bits(reader.read_u8()?)),
                7 => ConstantEntry::Class {
                    name_index: reader.read_u2()?,
                },
                8 => ConstantEntry::String {
                    string_index: reader.read_u2()?,
                },
                9 => ConstantEntry::FieldRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => ConstantEntry::MethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => ConstantEntry::InterfaceMethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => ConstantEntry::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => ConstantEntry::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => ConstantEntry::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 => ConstantEntry::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                18 => ConstantEntry::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => ConstantEntry::Module {
                    name_index: reader.read_u2()?,
                },
                20 => ConstantEntry::Package {
                    name_index: reader.read_u2()?,
                },
                _ => {
                    return Err(ClassFileError::UnknownConstantTag {
                        tag,
                        index: index as u16,
                    });
                }
            };

            entries.push(entry);

            // Long and Double occupy two pool slots; the second is never
            // addressable.
            if tag == 5 || tag == 6 {
                entries.push(ConstantEntry::Unusable);
                index += 2;
            } else {
                index += 1;
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn entry(&self, index: u16) -> Result<&ConstantEntry, ClassFileError> {
        match self.entries.get(index as usize) {
            None | Some(ConstantEntry::Unusable) => Err(ClassFileError::BadConstantIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.entry(index)? {
            ConstantEntry::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassFileError::BadConstantIndex(index)),
        }
    }

    /// Resolves a Class entry to its fully qualified internal name.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.entry(index)? {
            ConstantEntry::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::BadConstantIndex(index)),
        }
    }

    /// Number of occupied slots, including the unaddressable fillers.
    pub(crate) fn slot_count(&self) -> usize {
        self.entries.len()
    }
}

/// Attribute kept as raw bytes; only `Code` gets structural parsing.
#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub(crate) name: String,
    pub(crate) info: Vec<u8>,
}

/// Exception table row of a Code attribute.
#[derive(Debug, Clone)]
pub(crate) struct ExceptionHandler {
    pub(crate) start_pc: u16,
    pub(crate) end_pc: u16,
    pub(crate) handler_pc: u16,
    pub(crate) catch_type: u16,
}

/// Parsed body of a method's `Code` attribute.
#[derive(Debug, Clone)]
pub(crate) struct CodeAttribute {
    pub(crate) max_stack: u16,
    pub(crate) max_locals: u16,
    pub(crate) code: Vec<u8>,
    pub(crate) exception_table: Vec<ExceptionHandler>,
    pub(crate) attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldInfo {
    pub(crate) access_flags: u16,
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    pub(crate) attributes: Vec<Attribute>,
}

/// Method declaration; `code` is absent for abstract and native methods.
#[derive(Debug, Clone)]
pub(crate) struct MethodInfo {
    pub(crate) access_flags: u16,
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    pub(crate) code: Option<CodeAttribute>,
    pub(crate) attributes: Vec<Attribute>,
}

/// Fully parsed class file. All cross-references are pool indices resolved on
/// demand through [`ClassFile::constant_pool`].
#[derive(Debug, Clone)]
pub(crate) struct ClassFile {
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) access_flags: u16,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) attributes: Vec<Attribute>,
}

impl ClassFile {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != 0xCAFEBABE {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let constant_pool = ConstantPool::read(&mut reader)?;
        let access_flags = reader.read_u2()?;
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;
        let interfaces = read_u2_table(&mut reader)?;
        let fields = read_fields(&mut reader, &constant_pool)?;
        let methods = read_methods(&mut reader, &constant_pool)?;
        let attributes = read_attributes(&mut reader, &constant_pool)?;

        Ok(Self {
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

    /// Internal name of this class, resolved through the constant pool.
    pub(crate) fn name(&self) -> Result<&str, ClassFileError> {
        self.constant_pool.class_name(self.this_class)
    }

    pub(crate) fn method_name(&self, method: &MethodInfo) -> Result<&str, ClassFileError> {
        self.constant_pool.utf8(method.name_index)
    }

    pub(crate) fn method_descriptor(&self, method: &MethodInfo) -> Result<&str, ClassFileError> {
        self.constant_pool.utf8(method.descriptor_index)
    }
}

fn read_u2_table(reader: &mut ByteReader<'_>) -> Result<Vec<u16>, ClassFileError> {
    let count = reader.read_u2()? as usize;
    let mut values = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        values.push(reader.read_u2()?);
    }
    Ok(values)
}

fn read_fields(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<FieldInfo>, ClassFileError> {
    let count = reader.read_u2()? as usize;
    let mut fields = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes = read_attributes(reader, pool)?;
        fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(fields)
}

fn read_methods(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<MethodInfo>, ClassFileError> {
    let count = reader.read_u2()? as usize;
    let mut methods = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let raw_attributes = read_attributes(reader, pool)?;

        let mut code = None;
        let mut attributes = Vec::new();
        for attribute in raw_attributes {
            if attribute.name == "Code" && code.is_none() {
                code = Some(parse_code_attribute(&attribute.info, pool)?);
            } else {
                attributes.push(attribute);
            }
        }

        methods.push(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            code,
            attributes,
        });
    }
    Ok(methods)
}

fn read_attributes(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Attribute>, ClassFileError> {
    let count = reader.read_u2()? as usize;
    let mut attributes = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let name = pool.utf8(name_index)?.to_string();
        let info = reader.read_bytes(length)?.to_vec();
        attributes.push(Attribute { name, info });
    }
    Ok(attributes)
}

fn parse_code_attribute(info: &[u8], pool: &ConstantPool) -> Result<CodeAttribute, ClassFileError> {
    let mut reader = ByteReader::new(info);
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_bytes(code_length)?.to_vec();
    let exception_table_length = reader.read_u2()? as usize;
    let mut exception_table = Vec::with_capacity(exception_table_length.min(64));
    for _ in 0..exception_table_length {
        exception_table.push(ExceptionHandler {
            start_pc: reader.read_u2()?,
            end_pc: reader.read_u2()?,
            handler_pc: reader.read_u2()?,
            catch_type: reader.read_u2()?,
        });
    }
    let attributes = read_attributes(&mut reader, pool)?;
    if reader.remaining() != 0 {
        return Err(ClassFileError::AttributeOverrun("Code".to_string()));
    }

    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

/// Decodes the JVM's modified UTF-8 into a Rust string.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassFileError> {
    let mut code_units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte & 0x80 == 0 {
            code_units.push(byte as u16);
            i += 1;
        } else if byte & 0xE0 == 0xC0 {
            if i + 1 >= bytes.len() {
                return Err(ClassFileError::ModifiedUtf8("truncated 2-byte".to_string()));
            }
            let byte2 = bytes[i + 1];
            if byte2 & 0xC0 != 0x80 {
                return Err(ClassFileError::ModifiedUtf8("invalid 2-byte".to_string()));
            }
            code_units.push((((byte & 0x1F) as u16) << 6) | ((byte2 & 0x3F) as u16));
            i += 2;
        } else if byte & 0xF0 == 0xE0 {
            if i + 2 >= bytes.len() {
                return Err(ClassFileError::ModifiedUtf8("truncated 3-byte".to_string()));
            }
            let byte2 = bytes[i + 1];
            let byte3 = bytes[i + 2];
            if byte2 & 0xC0 != 0x80 || byte3 & 0xC0 != 0x80 {
                return Err(ClassFileError::ModifiedUtf8("invalid 3-byte".to_string()));
            }
            code_units.push(
                (((byte & 0x0F) as u16) << 12)
                    | (((byte2 & 0x3F) as u16) << 6)
                    | ((byte3 & 0x3F) as u16),
            );
            i += 3;
        } else {
            return Err(ClassFileError::ModifiedUtf8(
                "invalid leading byte".to_string(),
            ));
        }
    }

    String::from_utf16(&code_units)
        .map_err(|_| ClassFileError::ModifiedUtf8("unpaired surrogate".to_string()))
}

/// Big-endian cursor over the class file bytes.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u1(&mut self) -> Result<u8, ClassFileError> {
        if self.pos >= self.data.len() {
            return Err(ClassFileError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_u2(&mut self) -> Result<u16, ClassFileError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassFileError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u8(&mut self) -> Result<u64, ClassFileError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        if len > self.remaining() {
            return Err(ClassFileError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}
