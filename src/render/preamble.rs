//! Banner comment at the top of every generated file.

use crate::model::{Author, License};

pub struct Preamble<'a> {
    author: Option<&'a Author>,
    license: Option<&'a License>,
}

impl<'a> Preamble<'a> {
    pub fn new(author: Option<&'a Author>, license: Option<&'a License>) -> Self {
        Self { author, license }
    }

    /// Render the banner with a per-file `@section DESCRIPTION`.
    pub fn render(&self, description: &str) -> String {
        let mut lines: Vec<String> = vec![
            "/* THIS IS A GENERATED FILE, DO NOT EDIT!!! */".to_string(),
            "/**".to_string(),
            " * @file".to_string(),
            " *".to_string(),
        ];

        if let Some(author) = self.author {
            let mut tag = String::from(" * @author");
            if let Some(ref name) = author.name {
                tag.push(' ');
                tag.push_str(name);
            }
            if let Some(ref email) = author.email {
                tag.push_str(&format!(" <{}>", email));
            }
            lines.push(tag);
            lines.push(" *".to_string());
        }

        if let Some(license) = self.license {
            lines.push(" * @section LICENSE".to_string());
            lines.extend(license.lines.iter().map(String::as_str).map(comment_line));
            lines.push(" *".to_string());
        }

        lines.push(" * @section DESCRIPTION".to_string());
        lines.push(" *".to_string());
        lines.extend(description.lines().map(comment_line));
        lines.push(" */".to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn comment_line(text: &str) -> String {
    if text.trim().is_empty() {
        " *".to_string()
    } else {
        format!(" * {}", text)
    }
}
