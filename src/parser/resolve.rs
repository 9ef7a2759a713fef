//! Class → interface resolution.
//!
//! Runs once after parsing. Unlike the parser, which stops at the first bad
//! line, every undefined `IMPLEMENTS` target across the document is collected
//! before failing.

use crate::error::ResolveError;
use crate::model::*;

/// A class whose implemented interfaces point at their definitions.
#[derive(Debug)]
pub struct ResolvedClass<'a> {
    pub name: &'a str,
    /// Implemented interfaces in declaration order
    pub interfaces: Vec<&'a Interface>,
}

/// Resolve every class of `doc` against its interfaces.
pub fn resolve(doc: &Document) -> Result<Vec<ResolvedClass<'_>>, ResolveError> {
    let mut undefined: Vec<String> = Vec::new();
    let mut resolved = Vec::with_capacity(doc.classes.len());

    for class in &doc.classes {
        let mut interfaces = Vec::with_capacity(class.interfaces.len());
        for name in &class.interfaces {
            match doc.interface(name) {
                Some(intf) => interfaces.push(intf),
                None => {
                    log::debug!("class `{}` implements undefined `{}`", class.name, name);
                    if !undefined.contains(name) {
                        undefined.push(name.clone());
                    }
                }
            }
        }
        resolved.push(ResolvedClass {
            name: &class.name,
            interfaces,
        });
    }

    if !undefined.is_empty() {
        return Err(ResolveError { undefined });
    }

    Ok(resolved)
}
