//! Description parser: line-by-line block state machine.
//!
//! Each logical line is classified into a [`Statement`] and applied to the
//! single open block. Entities are registered in the [`Document`] only when
//! their block closes, so a rejected statement never leaves a half-built
//! interface or class behind.

use crate::error::{ParseError, ParseErrorKind};
use crate::model::*;
use crate::parser::join::{logical_lines, LogicalLine};
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INTERFACE\s+(\S+)$").unwrap());

static RE_END_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+INTERFACE$").unwrap());

static RE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INCLUDE\s+(\S+)$").unwrap());

static RE_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FUNCTION\s+(\S+)$").unwrap());

static RE_END_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+FUNCTION$").unwrap());

static RE_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RETURN\s+(\S+)$").unwrap());

static RE_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INPUT\s+(\S.*)$").unwrap());

static RE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CLASS\s+(\S+)$").unwrap());

static RE_END_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+CLASS$").unwrap());

static RE_IMPLEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^IMPLEMENTS\s+(\S+)$").unwrap());

static RE_END_IMPLEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+IMPLEMENTS$").unwrap());

static RE_AUTHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^AUTHOR$").unwrap());

static RE_END_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+AUTHOR$").unwrap());

static RE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^NAME\s+(\S.*)$").unwrap());

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^EMAIL\s+(\S.*)$").unwrap());

static RE_LICENSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^LICENSE$").unwrap());

static RE_END_LICENSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END\s+LICENSE$").unwrap());

// Trailing C identifier with optional array dimensions. Anything that ends in
// `)` (function pointers) or `...` does not match. One declaration per INPUT.
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*\W)([A-Za-z_]\w*)((?:\s*\[\w*\])*)$").unwrap()
});

// -- Statements ---------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement<'a> {
    Interface(&'a str),
    EndInterface,
    Include(&'a str),
    Function(&'a str),
    EndFunction,
    Return(&'a str),
    Input(&'a str),
    Class(&'a str),
    EndClass,
    Implements(&'a str),
    EndImplements,
    Author,
    EndAuthor,
    Name(&'a str),
    Email(&'a str),
    License,
    EndLicense,
}

impl Statement<'_> {
    /// Statement family used in "invalid ... statement" errors.
    fn family(&self) -> &'static str {
        match self {
            Statement::Interface(_) | Statement::EndInterface | Statement::Include(_) => {
                "interface"
            }
            Statement::Function(_)
            | Statement::EndFunction
            | Statement::Return(_)
            | Statement::Input(_) => "function",
            Statement::Class(_) | Statement::EndClass => "class",
            Statement::Implements(_) | Statement::EndImplements => "implements",
            Statement::Author | Statement::EndAuthor => "author",
            Statement::Name(_) => "name",
            Statement::Email(_) => "email",
            Statement::License | Statement::EndLicense => "license",
        }
    }
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Classify a trimmed, non-comment line.
fn classify(line: &str) -> Option<Statement<'_>> {
    if let Some(name) = capture(&RE_INTERFACE, line) {
        return Some(Statement::Interface(name));
    }
    if RE_END_INTERFACE.is_match(line) {
        return Some(Statement::EndInterface);
    }
    if let Some(token) = capture(&RE_INCLUDE, line) {
        return Some(Statement::Include(token));
    }
    if let Some(name) = capture(&RE_FUNCTION, line) {
        return Some(Statement::Function(name));
    }
    if RE_END_FUNCTION.is_match(line) {
        return Some(Statement::EndFunction);
    }
    if let Some(ty) = capture(&RE_RETURN, line) {
        return Some(Statement::Return(ty));
    }
    if let Some(decl) = capture(&RE_INPUT, line) {
        return Some(Statement::Input(decl));
    }
    if let Some(name) = capture(&RE_CLASS, line) {
        return Some(Statement::Class(name));
    }
    if RE_END_CLASS.is_match(line) {
        return Some(Statement::EndClass);
    }
    if let Some(name) = capture(&RE_IMPLEMENTS, line) {
        return Some(Statement::Implements(name));
    }
    if RE_END_IMPLEMENTS.is_match(line) {
        return Some(Statement::EndImplements);
    }
    if RE_AUTHOR.is_match(line) {
        return Some(Statement::Author);
    }
    if RE_END_AUTHOR.is_match(line) {
        return Some(Statement::EndAuthor);
    }
    if RE_LICENSE.is_match(line) {
        return Some(Statement::License);
    }
    if RE_END_LICENSE.is_match(line) {
        return Some(Statement::EndLicense);
    }
    if let Some(text) = capture(&RE_NAME, line) {
        return Some(Statement::Name(text));
    }
    if let Some(text) = capture(&RE_EMAIL, line) {
        return Some(Statement::Email(text));
    }
    None
}

// -- Parser state -------------------------------------------------------------

/// The one block currently open. The entity under construction lives in the
/// variant until its closing statement moves it into the document.
#[derive(Debug, Default)]
enum State {
    #[default]
    Top,
    Interface(Interface),
    Function(Interface, Function),
    Class(ClassObj),
    Implements(ClassObj, String),
    Author(Author),
    License(License),
}

impl State {
    /// Number of blocks open in this state.
    fn depth(&self) -> usize {
        match self {
            State::Top => 0,
            State::Function(..) | State::Implements(..) => 2,
            _ => 1,
        }
    }

    fn describe(&self) -> String {
        match self {
            State::Top => "document".to_string(),
            State::Interface(intf) => format!("interface `{}`", intf.name),
            State::Function(intf, f) => {
                format!("function `{}` of interface `{}`", f.name, intf.name)
            }
            State::Class(class) => format!("class `{}`", class.name),
            State::Implements(class, name) => {
                format!("implements `{}` of class `{}`", name, class.name)
            }
            State::Author(_) => "author block".to_string(),
            State::License(_) => "license block".to_string(),
        }
    }
}

#[derive(Default)]
struct BlockParser {
    doc: Document,
    state: State,
    /// Lines that opened the blocks still open, outermost first
    opened: Vec<LogicalLine>,
}

// -- Public API ---------------------------------------------------------------

/// Parse a description into an unresolved [`Document`].
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut parser = BlockParser::default();

    for line in logical_lines(input.lines()) {
        parser.process_line(&line)?;
    }

    parser.finish()
}

// -- Line processing ----------------------------------------------------------

impl BlockParser {
    fn process_line(&mut self, line: &LogicalLine) -> Result<(), ParseError> {
        let text = line.text.trim();

        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        let Some(stmt) = classify(text) else {
            if let State::License(license) = &mut self.state {
                license.lines.push(line.text.trim_end().to_string());
                return Ok(());
            }
            return Err(ParseError::new(line.line_no, text, ParseErrorKind::UnknownStatement));
        };

        let state = std::mem::take(&mut self.state);
        self.state = self
            .apply(state, stmt, line)
            .map_err(|kind| ParseError::new(line.line_no, text, kind))?;
        Ok(())
    }

    fn apply(
        &mut self,
        state: State,
        stmt: Statement<'_>,
        line: &LogicalLine,
    ) -> Result<State, ParseErrorKind> {
        let next = match (state, stmt) {
            // -- interfaces
            (State::Top, Statement::Interface(name)) => {
                if self.doc.interface(name).is_some() {
                    return Err(ParseErrorKind::DuplicateInterface {
                        name: name.to_string(),
                    });
                }
                if self.doc.class(name).is_some() {
                    return Err(ParseErrorKind::SharedName {
                        name: name.to_string(),
                    });
                }
                self.opened.push(line.clone());
                State::Interface(Interface::new(name))
            }
            (State::Interface(mut intf), Statement::EndInterface) => {
                intf.functions.push(Function::destructor());
                log::debug!(
                    "parsed interface `{}` ({} functions)",
                    intf.name,
                    intf.functions.len()
                );
                self.doc.interfaces.push(intf);
                State::Top
            }
            (State::Interface(mut intf), Statement::Include(token)) => {
                intf.includes.push(token.to_string());
                State::Interface(intf)
            }
            (State::Function(mut intf, func), Statement::Include(token)) => {
                intf.includes.push(token.to_string());
                State::Function(intf, func)
            }

            // -- functions
            (State::Interface(intf), Statement::Function(name)) => {
                if name == DELETE_FN {
                    return Err(ParseErrorKind::ReservedFunction);
                }
                if intf.function(name).is_some() {
                    return Err(ParseErrorKind::DuplicateFunction {
                        interface: intf.name,
                        function: name.to_string(),
                    });
                }
                self.opened.push(line.clone());
                State::Function(intf, Function::new(name))
            }
            (State::Function(mut intf, func), Statement::EndFunction) => {
                if func.return_type.is_none() {
                    return Err(ParseErrorKind::MissingReturn { function: func.name });
                }
                intf.functions.push(func);
                State::Interface(intf)
            }
            (State::Function(intf, mut func), Statement::Return(ty)) => {
                if func.return_type.is_some() {
                    return Err(ParseErrorKind::DuplicateReturn { function: func.name });
                }
                func.return_type = Some(ty.to_string());
                State::Function(intf, func)
            }
            (State::Function(intf, mut func), Statement::Input(decl)) => {
                add_input(&mut func, decl)?;
                State::Function(intf, func)
            }

            // -- classes
            (State::Top, Statement::Class(name)) => {
                if self.doc.class(name).is_some() {
                    return Err(ParseErrorKind::DuplicateClass {
                        name: name.to_string(),
                    });
                }
                if self.doc.interface(name).is_some() {
                    return Err(ParseErrorKind::SharedName {
                        name: name.to_string(),
                    });
                }
                self.opened.push(line.clone());
                State::Class(ClassObj::new(name))
            }
            (State::Class(class), Statement::EndClass) => {
                log::debug!(
                    "parsed class `{}` implementing [{}]",
                    class.name,
                    class.interfaces.join(", ")
                );
                self.doc.classes.push(class);
                State::Top
            }
            (State::Class(mut class), Statement::Implements(name)) => {
                if !class.add_interface(name) {
                    log::debug!("class `{}` repeats interface `{}`", class.name, name);
                }
                self.opened.push(line.clone());
                State::Implements(class, name.to_string())
            }
            (State::Implements(class, _), Statement::EndImplements) => State::Class(class),

            // -- author
            (State::Top, Statement::Author) => {
                if self.doc.author.is_some() {
                    return Err(ParseErrorKind::DuplicateAuthor);
                }
                self.opened.push(line.clone());
                State::Author(Author::default())
            }
            (State::Author(author), Statement::EndAuthor) => {
                self.doc.author = Some(author);
                State::Top
            }
            (State::Author(mut author), Statement::Name(text)) => {
                author.name = Some(text.to_string());
                State::Author(author)
            }
            (State::Author(mut author), Statement::Email(text)) => {
                author.email = Some(text.to_string());
                State::Author(author)
            }

            // -- license
            (State::Top, Statement::License) => {
                if self.doc.license.is_some() {
                    return Err(ParseErrorKind::DuplicateLicense);
                }
                self.opened.push(line.clone());
                State::License(License::default())
            }
            (State::License(license), Statement::EndLicense) => {
                self.doc.license = Some(license);
                State::Top
            }

            (_, stmt) => {
                return Err(ParseErrorKind::Misplaced {
                    statement: stmt.family(),
                })
            }
        };

        self.opened.truncate(next.depth());
        Ok(next)
    }

    fn finish(mut self) -> Result<Document, ParseError> {
        if let State::Top = self.state {
            return Ok(self.doc);
        }

        let kind = ParseErrorKind::UnterminatedBlock {
            block: self.state.describe(),
        };
        let (line_no, text) = self
            .opened
            .pop()
            .map(|l| (l.line_no, l.text))
            .unwrap_or_default();
        Err(ParseError::new(line_no, &text, kind))
    }
}

// -- Helper functions ---------------------------------------------------------

/// Append one `INPUT` to a function, keeping `void` exclusive.
fn add_input(func: &mut Function, decl: &str) -> Result<(), ParseErrorKind> {
    if func.is_void_input() {
        return Err(ParseErrorKind::InputAfterVoid {
            function: func.name.clone(),
        });
    }

    let decl = decl.trim();
    if decl == "void" {
        if !func.inputs.is_empty() {
            return Err(ParseErrorKind::VoidAfterInput {
                function: func.name.clone(),
            });
        }
        func.inputs.push(Param::Void);
        return Ok(());
    }

    func.inputs.push(Param::Decl(parse_param(decl)?));
    Ok(())
}

/// Split a C parameter declaration into type, identifier and array suffix.
///
/// Best effort: the identifier is the last word, optionally followed by
/// `[...]` dimensions.
pub fn parse_param(decl: &str) -> Result<ParamDecl, ParseErrorKind> {
    let caps = RE_PARAM
        .captures(decl.trim())
        .ok_or(ParseErrorKind::UnparsableParameter)?;

    let type_fragment = caps[1].trim_end().to_string();
    if type_fragment.is_empty() || type_fragment.ends_with(')') || type_fragment.contains(',') {
        return Err(ParseErrorKind::UnparsableParameter);
    }

    Ok(ParamDecl {
        type_fragment,
        identifier: caps[2].to_string(),
        suffix: caps[3].split_whitespace().collect(),
    })
}
