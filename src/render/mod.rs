//! Renderer module: trait-based C artifact generation.

pub mod class;
pub mod interface;
pub mod preamble;

use crate::model::{Document, ParamDecl};
use crate::parser::ResolvedClass;
use preamble::Preamble;
use std::path::{Path, PathBuf};

/// Where generated files go and how they are named.
#[derive(Debug, Clone)]
pub struct GenConfig {
    pub output_dir: PathBuf,
    /// Appended to every generated file stem, e.g. `_gen` for `button_gen.h`
    pub suffix: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            suffix: "_gen".to_string(),
        }
    }
}

impl GenConfig {
    /// `<stem><suffix>.<ext>`
    pub fn file_name(&self, stem: &str, ext: &str) -> String {
        format!("{}{}.{}", stem, self.suffix, ext)
    }

    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.output_dir.join(&artifact.file_name)
    }
}

/// One generated file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

/// Trait for anything that expands into a set of C files.
pub trait Generator {
    fn artifacts(&self, config: &GenConfig, preamble: &Preamble<'_>) -> Vec<Artifact>;
}

/// Render every interface, then every class, in declaration order.
pub fn generate(doc: &Document, classes: &[ResolvedClass<'_>], config: &GenConfig) -> Vec<Artifact> {
    let preamble = Preamble::new(doc.author.as_ref(), doc.license.as_ref());

    let mut artifacts = Vec::new();
    for intf in &doc.interfaces {
        artifacts.extend(interface::InterfaceGenerator::new(intf).artifacts(config, &preamble));
    }
    for class in classes {
        artifacts.extend(class::ClassGenerator::new(class).artifacts(config, &preamble));
    }
    artifacts
}

// -- Shared C formatting ------------------------------------------------------

/// `#ifndef` guard for a header: `button_gen.h` → `__BUTTON_GEN_H__`.
fn include_guard(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!("__{}_H__", stem.to_uppercase())
}

/// Trailing parameters after the handle, one per line, aligned by `indent`.
fn param_list<'a>(params: impl IntoIterator<Item = &'a ParamDecl>, indent: usize) -> String {
    let pad = " ".repeat(indent);
    params
        .into_iter()
        .map(|p| format!(",\n{}{}", pad, p.declaration()))
        .collect()
}
