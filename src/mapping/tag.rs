//! Field tag parsing: `name[,option[,option...]]`.

/// A parsed field tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// Storage name, `None` when the tag is absent or its name token is empty
    pub name: Option<String>,
    pub options: FieldOptions,
}

impl Tag {
    /// Parse tag text. The first comma-delimited token is the storage name,
    /// the rest are whitespace-trimmed options.
    pub fn parse(text: &str) -> Self {
        let mut tokens = text.split(',');
        let name = tokens.next().map(str::trim).unwrap_or_default();

        let ignored = name == "-";
        let options = tokens
            .map(str::trim)
            .filter(|opt| !opt.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            name: (!name.is_empty() && !ignored).then(|| name.to_string()),
            options: FieldOptions { ignored, options },
        }
    }

    /// Parse an optional tag; a missing tag behaves like an empty one.
    pub fn parse_opt(text: Option<&str>) -> Self {
        text.map(Self::parse).unwrap_or_default()
    }
}

/// Options attached to a field by its tag.
///
/// Unrecognized options are kept verbatim and can be queried with [`FieldOptions::contains`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    ignored: bool,
    options: Vec<String>,
}

impl FieldOptions {
    /// The field is excluded from mapping entirely.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// The field receives the generated key after an insert.
    pub fn is_auto_increment(&self) -> bool {
        self.contains("auto_increment") || self.contains("autoincrement")
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        !self.ignored && self.options.is_empty()
    }
}
