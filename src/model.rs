//! Data model for a parsed interface description.

/// Name of the destructor every interface receives when its block closes.
pub const DELETE_FN: &str = "delete";

/// Complete parsed description from a single input file.
#[derive(Debug, Default)]
pub struct Document {
    /// Interfaces in declaration order
    pub interfaces: Vec<Interface>,
    /// Classes in declaration order
    pub classes: Vec<ClassObj>,
    pub author: Option<Author>,
    pub license: Option<License>,
}

impl Document {
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|intf| intf.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassObj> {
        self.classes.iter().find(|class| class.name == name)
    }
}

/// A single parameter of an interface function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// The `void` sentinel: the function takes no parameters.
    Void,
    Decl(ParamDecl),
}

/// A typed C parameter declaration, e.g. `const char *name` or `int v[4]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    /// Everything before the identifier, trimmed (`const char *`)
    pub type_fragment: String,
    pub identifier: String,
    /// Array dimensions following the identifier, if any (`[4]`)
    pub suffix: String,
}

impl ParamDecl {
    /// The declaration as it appears in a parameter list.
    pub fn declaration(&self) -> String {
        if self.type_fragment.ends_with('*') {
            format!("{}{}{}", self.type_fragment, self.identifier, self.suffix)
        } else {
            format!("{} {}{}", self.type_fragment, self.identifier, self.suffix)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub return_type: Option<String>,
    pub inputs: Vec<Param>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            inputs: Vec::new(),
        }
    }

    /// The destructor appended to every interface.
    pub fn destructor() -> Self {
        Self {
            name: DELETE_FN.to_string(),
            return_type: Some("void".to_string()),
            inputs: vec![Param::Void],
        }
    }

    pub fn is_void_input(&self) -> bool {
        self.inputs.contains(&Param::Void)
    }

    pub fn is_destructor(&self) -> bool {
        self.name == DELETE_FN
    }

    /// Real parameters, empty for the `void` sentinel.
    pub fn params(&self) -> impl Iterator<Item = &ParamDecl> {
        self.inputs.iter().filter_map(|p| match p {
            Param::Decl(decl) => Some(decl),
            Param::Void => None,
        })
    }

    pub fn return_type(&self) -> &str {
        self.return_type.as_deref().unwrap_or("void")
    }

    pub fn returns_void(&self) -> bool {
        self.return_type() == "void"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    /// Functions in declaration order; names are unique
    pub functions: Vec<Function>,
    /// Raw include tokens, emitted after `#include`
    pub includes: Vec<String>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            includes: Vec::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// A class before resolution: interfaces are referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassObj {
    pub name: String,
    /// Implemented interface names, duplicate-free, first declaration first
    pub interfaces: Vec<String>,
}

impl ClassObj {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }

    /// Record an implemented interface. Returns false if it was already present.
    pub fn add_interface(&mut self, name: &str) -> bool {
        if self.interfaces.iter().any(|i| i == name) {
            return false;
        }
        self.interfaces.push(name.to_string());
        true
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct License {
    pub lines: Vec<String>,
}
