//! Whole-file management units.

use super::Unit;

/// A line appended to a [`FileUnit`], either newline-terminated or not.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    terminated: bool,
}

/// A unit specialised for managing the full content of one file.
///
/// Content accretes through ordered appends; the desired content is rebuilt
/// lazily when read, as the appended pieces joined with any trailing
/// newlines trimmed.  The generated test is "current file content equals
/// desired content", which makes applying the unit naturally idempotent:
/// re-running it when the content already matches performs no write.
#[derive(Debug, Clone)]
pub struct FileUnit {
    name: String,
    precondition: Option<String>,
    path: String,
    message: String,
    lines: Vec<Line>,
}

impl FileUnit {
    /// File unit with a default failure message.
    #[must_use]
    pub fn new(name: impl Into<String>, precondition: Option<&str>, path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("Couldn't write out {path}; its service may be misconfigured");
        Self::with_message(name, precondition, path, message)
    }

    /// File unit with a custom failure message.
    #[must_use]
    pub fn with_message(
        name: impl Into<String>,
        precondition: Option<&str>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            precondition: precondition.map(str::to_string),
            path: path.into(),
            message: message.into(),
            lines: Vec::new(),
        }
    }

    /// Name of the unit this file unit will compile into.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the managed file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append text without a trailing newline.
    pub fn append_text(&mut self, text: impl Into<String>) {
        self.lines.push(Line {
            text: text.into(),
            terminated: false,
        });
    }

    /// Append one newline-terminated line.
    pub fn append_line(&mut self, line: impl Into<String>) {
        self.lines.push(Line {
            text: line.into(),
            terminated: true,
        });
    }

    /// Append several newline-terminated lines in order.
    pub fn append_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.append_line(line);
        }
    }

    /// Append an empty line.
    pub fn append_blank(&mut self) {
        self.append_line("");
    }

    /// The desired file content: appended pieces joined in order, with any
    /// trailing newlines trimmed.
    #[must_use]
    pub fn desired_content(&self) -> String {
        let mut body = String::new();
        for line in &self.lines {
            body.push_str(&line.text);
            if line.terminated {
                body.push('\n');
            }
        }
        while body.ends_with('\n') {
            body.pop();
        }
        body
    }

    /// Compile into a plain [`Unit`].
    ///
    /// The test reads the file; the expected pass token is the desired
    /// content itself, so the unit passes exactly when the file already
    /// matches.
    #[must_use]
    pub fn into_unit(self) -> Unit {
        let body = self.desired_content();
        let test = format!("sudo cat {} 2>&1", self.path);
        let config = format!(
            "sudo [ -f {path} ] || sudo touch {path}; echo \"{body}\" | sudo tee {path} > /dev/null",
            path = self.path,
        );
        Unit::new(
            self.name,
            self.precondition.as_deref(),
            test,
            config,
            body,
            self.message,
        )
    }
}

impl From<FileUnit> for Unit {
    fn from(file: FileUnit) -> Self {
        file.into_unit()
    }
}
