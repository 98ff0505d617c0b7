//! Plain-text report writer.
//!
//! Emits the trace lines, the statistics block, and the 256-row opcode
//! histogram in a fixed, byte-stable shape so that repeated runs over the
//! same archive produce identical output.

use std::io::{self, Write};

use crate::opcodes::mnemonic;
use crate::stats::Statistics;

pub(crate) struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    pub(crate) fn archive_header(&mut self, base_name: &str) -> io::Result<()> {
        writeln!(self.out, "Analyzing {base_name}")
    }

    pub(crate) fn entry(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "\tFile {name}")
    }

    pub(crate) fn class(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "\t\tClass {name}")
    }

    pub(crate) fn method(&mut self, name: &str, descriptor: &str) -> io::Result<()> {
        writeln!(self.out, "\t\t\tMethod {name}{descriptor}")
    }

    /// Writes the statistics block followed by the full opcode histogram.
    pub(crate) fn summary(&mut self, stats: &Statistics) -> io::Result<()> {
        writeln!(self.out, "==== STATISTICS ====")?;
        writeln!(self.out, "classes:\t{}", stats.classes)?;
        writeln!(self.out, "methods:\t{}", stats.methods)?;
        writeln!(self.out, "instructions:\t{}", stats.instructions)?;
        writeln!(self.out, "invoke instructions:\t{}", stats.invocations)?;
        writeln!(self.out, "branch instructions:\t{}", stats.branches)?;

        writeln!(self.out, "OPCODE\tMNEMONIC\tCOUNT")?;
        for opcode in 0..=255u8 {
            writeln!(
                self.out,
                "{}\t{}\t{}",
                opcode,
                mnemonic(opcode),
                stats.histogram[opcode as usize]
            )?;
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
