//! Opcode-level facts: mnemonic names and the statistic categories.
//!
//! All tables cover the full u8 opcode space so lookups never fail, even for
//! values a well-formed decoder can never produce.

pub(crate) const IFEQ: u8 = 153;
pub(crate) const IFLE: u8 = 158;
pub(crate) const IF_ICMPEQ: u8 = 159;
pub(crate) const IF_ICMPLE: u8 = 164;
pub(crate) const IF_ACMPEQ: u8 = 165;
pub(crate) const IF_ACMPNE: u8 = 166;
pub(crate) const TABLESWITCH: u8 = 170;
pub(crate) const LOOKUPSWITCH: u8 = 171;
pub(crate) const INVOKEVIRTUAL: u8 = 182;
pub(crate) const INVOKEDYNAMIC: u8 = 186;
pub(crate) const IFNULL: u8 = 198;
pub(crate) const IFNONNULL: u8 = 199;

/// Statistic category of a single opcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) enum Category {
    Invocation,
    ConditionalBranch,
    Other,
}

/// Maps an opcode to its statistic category.
///
/// Invocation covers the five invoke opcodes (182..=186). ConditionalBranch
/// covers exactly the five ranges below; unconditional transfers (`goto`,
/// `jsr`, `ret`, `goto_w`, `jsr_w`, `athrow`) stay in Other on purpose: the
/// branch statistic means conditional control transfer only.
pub(crate) fn classify(opcode: u8) -> Category {
    match opcode {
        INVOKEVIRTUAL..=INVOKEDYNAMIC => Category::Invocation,
        IFEQ..=IFLE
        | IF_ICMPEQ..=IF_ICMPLE
        | IF_ACMPEQ..=IF_ACMPNE
        | TABLESWITCH..=LOOKUPSWITCH
        | IFNULL..=IFNONNULL => Category::ConditionalBranch,
        _ => Category::Other,
    }
}

/// Returns the JVM mnemonic for an opcode, or `""` for undefined values.
pub(crate) fn mnemonic(opcode: u8) -> &'static str {
    MNEMONICS[opcode as usize]
}

/// Mnemonic per opcode value. Opcodes 203..=253 have no assigned instruction
/// and map to the empty string; the reserved opcodes keep their JVM names.
static MNEMONICS: [&str; 256] = [
    "nop",
    "aconst_null",
    "iconst_m1",
    "iconst_0",
    "iconst_1",
    "iconst_2",
    "iconst_3",
    "iconst_4",
    "iconst_5",
    "lconst_0",
    "lconst_1",
    "fconst_0",
    "fconst_1",
    "fconst_2",
    "dconst_0",
    "dconst_1",
    "bipush",
    "sipush",
    "ldc",
    "ldc_w",
    "ldc2_w",
    "iload",
    "lload",
    "fload",
    "dload",
    "aload",
    "iload_0",
    "iload_1",
    "iload_2",
    "iload_3",
    "lload_0",
    "lload_1",
    "lload_2",
    "lload_3",
    "fload_0",
    "fload_1",
    "fload_2",
    "fload_3",
    "dload_0",
    "dload_1",
    "dload_2",
    "dload_3",
    "aload_0",
    "aload_1",
    "aload_2",
    "aload_3",
    "iaload",
    "laload",
    "faload",
    "daload",
    "aaload",
    "baload",
    "caload",
    "saload",
    "istore",
    "lstore",
    "fstore",
    "dstore",
    "astore",
    "istore_0",
    "istore_1",
    "istore_2",
    "istore_3",
    "lstore_0",
    "lstore_1",
    "lstore_2",
    "lstore_3",
    "fstore_0",
    "fstore_1",
    "fstore_2",
    "fstore_3",
    "dstore_0",
    "dstore_1",
    "dstore_2",
    "dstore_3",
    "astore_0",
    "astore_1",
    "astore_2",
    "astore_3",
    "iastore",
    "lastore",
    "fastore",
    "dastore",
    "aastore",
    "bastore",
    "castore",
    "sastore",
    "pop",
    "pop2",
    "dup",
    "dup_x1",
    "dup_x2",
    "dup2",
    "dup2_x1",
    "dup2_x2",
    "swap",
    "iadd",
    "ladd",
    "fadd",
    "dadd",
    "isub",
    "lsub",
    "fsub",
    "dsub",
    "imul",
    "lmul",
    "fmul",
    "dmul",
    "idiv",
    "ldiv",
    "fdiv",
    "ddiv",
    "irem",
    "lrem",
    "frem",
    "drem",
    "ineg",
    "lneg",
    "fneg",
    "dneg",
    "ishl",
    "lshl",
    "ishr",
    "lshr",
    "iushr",
    "lushr",
    "iand",
    "land",
    "ior",
    "lor",
    "ixor",
    "lxor",
    "iinc",
    "i2l",
    "i2f",
    "i2d",
    "l2i",
    "l2f",
    "l2d",
    "f2i",
    "f2l",
    "f2d",
    "d2i",
    "d2l",
    "d2f",
    "i2b",
    "i2c",
    "i2s",
    "lcmp",
    "fcmpl",
    "fcmpg",
    "dcmpl",
    "dcmpg",
    "ifeq",
    "ifne",
    "iflt",
    "ifge",
    "ifgt",
    "ifle",
    "if_icmpeq",
    "if_icmpne",
    "if_icmplt",
    "if_icmpge",
    "if_icmpgt",
    "if_icmple",
    "if_acmpeq",
    "if_acmpne",
    "goto",
    "jsr",
    "ret",
    "tableswitch",
    "lookupswitch",
    "ireturn",
    "lreturn",
    "freturn",
    "dreturn",
    "areturn",
    "return",
    "getstatic",
    "putstatic",
    "getfield",
    "putfield",
    "invokevirtual",
    "invokespecial",
    "invokestatic",
    "invokeinterface",
    "invokedynamic",
    "new",
    "newarray",
    "anewarray",
    "arraylength",
    "athrow",
    "checkcast",
    "instanceof",
    "monitorenter",
    "monitorexit",
    "wide",
    "multianewarray",
    "ifnull",
    "ifnonnull",
    "goto_w",
    "jsr_w",
    "breakpoint",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "impdep1",
    "impdep2",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_partition_is_exhaustive() {
        let mut invocations = 0;
        let mut branches = 0;
        let mut others = 0;
        for opcode in 0..=255u8 {
            match classify(opcode) {
                Category::Invocation => invocations += 1,
                Category::ConditionalBranch => branches += 1,
                Category::Other => others += 1,
            }
        }
        assert_eq!(invocations, 5);
        assert_eq!(branches, 18);
        assert_eq!(others, 256 - 5 - 18);
    }

    #[test]
    fn invocation_range_boundaries() {
        assert_eq!(classify(181), Category::Other); // putfield
        assert_eq!(classify(182), Category::Invocation); // invokevirtual
        assert_eq!(classify(186), Category::Invocation); // invokedynamic
        assert_eq!(classify(187), Category::Other); // new
    }

    #[test]
    fn conditional_branch_range_boundaries() {
        assert_eq!(classify(152), Category::Other); // dcmpg
        assert_eq!(classify(153), Category::ConditionalBranch); // ifeq
        assert_eq!(classify(158), Category::ConditionalBranch); // ifle
        assert_eq!(classify(159), Category::ConditionalBranch); // if_icmpeq
        assert_eq!(classify(164), Category::ConditionalBranch); // if_icmple
        assert_eq!(classify(165), Category::ConditionalBranch); // if_acmpeq
        assert_eq!(classify(166), Category::ConditionalBranch); // if_acmpne
        assert_eq!(classify(170), Category::ConditionalBranch); // tableswitch
        assert_eq!(classify(171), Category::ConditionalBranch); // lookupswitch
        assert_eq!(classify(198), Category::ConditionalBranch); // ifnull
        assert_eq!(classify(199), Category::ConditionalBranch); // ifnonnull
        assert_eq!(classify(200), Category::Other); // goto_w
    }

    #[test]
    fn unconditional_transfers_are_not_branches() {
        for opcode in [167u8, 168, 169, 191, 200, 201] {
            assert_eq!(classify(opcode), Category::Other, "opcode {opcode}");
        }
    }

    #[test]
    fn mnemonics_cover_defined_opcodes() {
        assert_eq!(mnemonic(0), "nop");
        assert_eq!(mnemonic(18), "ldc");
        assert_eq!(mnemonic(170), "tableswitch");
        assert_eq!(mnemonic(182), "invokevirtual");
        assert_eq!(mnemonic(196), "wide");
        assert_eq!(mnemonic(201), "jsr_w");
        assert_eq!(mnemonic(202), "breakpoint");
        assert_eq!(mnemonic(254), "impdep1");
        assert_eq!(mnemonic(255), "impdep2");
        for opcode in 203..=253u8 {
            assert_eq!(mnemonic(opcode), "", "opcode {opcode}");
        }
    }
}
