//! Turns a merged record into the argument vector handed to the subject.

use crate::model::{CaseKey, MergedRecord, TestFamily};
use std::fmt::Write as _;
use std::path::Path;

/// One subject run: `-<flag> <value>` pairs followed by the family selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub family: TestFamily,
    pub key: CaseKey,
    pub args: Vec<String>,
}

impl Invocation {
    /// Every populated field becomes a flag; empty and null fields are left to
    /// the subject's defaults. Flags come out sorted by name.
    pub fn build(record: &MergedRecord) -> Self {
        let family = record.family();
        let fields = record.to_field_map();
        let mut args = Vec::with_capacity(fields.len() * 2 + 1);

        for (name, value) in &fields {
            if let Some(rendered) = value.as_flag_value() {
                args.push(format!("-{name}"));
                args.push(rendered);
            }
        }
        args.push(family.selector().to_string());

        Self {
            family,
            key: record.key(),
            args,
        }
    }

    /// Value given for `-<flag>`, if any
    pub fn flag(&self, name: &str) -> Option<&str> {
        let flag = format!("-{name}");
        let mut pairs = self.args[..self.args.len().saturating_sub(1)].chunks_exact(2);
        pairs
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// Shell-style rendering for logs, so a failing case can be replayed by hand.
    pub fn command_line(&self, program: &Path, leading_args: &[String]) -> String {
        let mut line = program.display().to_string();
        for arg in leading_args {
            let _ = write!(line, " {}", quote(arg));
        }
        for pair in self.args[..self.args.len().saturating_sub(1)].chunks_exact(2) {
            let _ = write!(line, " {} {}", pair[0], quote(&pair[1]));
        }
        if let Some(selector) = self.args.last() {
            let _ = write!(line, " {selector}");
        }
        line
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
