//! Minimal class-file writer used by tests to generate byte-exact fixtures.

/// Builds a small but well-formed class file in memory.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    next_index: u16,
    this_class: u16,
    super_class: u16,
    code_name_index: u16,
    methods: Vec<MethodSpec>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: &str) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            next_index: 1,
            this_class: 0,
            super_class: 0,
            code_name_index: 0,
            methods: Vec::new(),
        };
        builder.code_name_index = builder.add_utf8("Code");
        builder.this_class = builder.add_class(class_name);
        builder.super_class = builder.add_class(super_name);
        builder
    }

    fn push(&mut self, entry: CpEntry) -> u16 {
        let index = self.next_index;
        // Long constants take two pool slots.
        self.next_index += match entry {
            CpEntry::Long(_) => 2,
            _ => 1,
        };
        self.cp.push(entry);
        index
    }

    pub(crate) fn add_utf8(&mut self, value: &str) -> u16 {
        self.push(CpEntry::Utf8(value.to_string()))
    }

    pub(crate) fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(CpEntry::Class(name_index))
    }

    pub(crate) fn add_long(&mut self, value: i64) -> u16 {
        self.push(CpEntry::Long(value))
    }

    pub(crate) fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(CpEntry::NameAndType(name_index, descriptor_index))
    }

    pub(crate) fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::MethodRef(class_index, name_and_type))
    }

    pub(crate) fn add_method(
        &mut self,
        name: &str,
        descriptor: &str,
        code: Vec<u8>,
        max_stack: u16,
        max_locals: u16,
    ) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.methods.push(MethodSpec {
            access_flags: 0x0001,
            name_index,
            descriptor_index,
            code: Some(CodeSpec {
                code,
                max_stack,
                max_locals,
            }),
        });
    }

    pub(crate) fn add_abstract_method(&mut self, name: &str, descriptor: &str) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.methods.push(MethodSpec {
            access_flags: 0x0401,
            name_index,
            descriptor_index,
            code: None,
        });
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFEBABE);
        write_u16(&mut bytes, 0); // minor
        write_u16(&mut bytes, 52); // major: Java 8
        write_u16(&mut bytes, self.next_index); // pool count
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, 0x0021); // ACC_PUBLIC | ACC_SUPER
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, 0); // interfaces
        write_u16(&mut bytes, 0); // fields
        write_u16(&mut bytes, self.methods.len() as u16);
        for method in &self.methods {
            write_u16(&mut bytes, method.access_flags);
            write_u16(&mut bytes, method.name_index);
            write_u16(&mut bytes, method.descriptor_index);
            match &method.code {
                Some(code) => {
                    write_u16(&mut bytes, 1);
                    write_u16(&mut bytes, self.code_name_index);
                    write_u32(&mut bytes, 12 + code.code.len() as u32);
                    write_u16(&mut bytes, code.max_stack);
                    write_u16(&mut bytes, code.max_locals);
                    write_u32(&mut bytes, code.code.len() as u32);
                    bytes.extend_from_slice(&code.code);
                    write_u16(&mut bytes, 0); // exception table
                    write_u16(&mut bytes, 0); // nested attributes
                }
                None => write_u16(&mut bytes, 0),
            }
        }
        write_u16(&mut bytes, 0); // class attributes
        bytes
    }
}

struct MethodSpec {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    code: Option<CodeSpec>,
}

struct CodeSpec {
    code: Vec<u8>,
    max_stack: u16,
    max_locals: u16,
}

enum CpEntry {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    MethodRef(u16, u16),
    Long(i64),
}

impl CpEntry {
    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
            CpEntry::NameAndType(name_index, descriptor_index) => {
                bytes.push(12);
                write_u16(bytes, *name_index);
                write_u16(bytes, *descriptor_index);
            }
            CpEntry::MethodRef(class_index, name_and_type) => {
                bytes.push(10);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::Long(value) => {
                bytes.push(5);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
        }
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}
