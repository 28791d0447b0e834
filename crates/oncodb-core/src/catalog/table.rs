//! Table definitions.

/// A read-only table and the fields that give its records meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name (unique within the catalog).
    pub name: String,
    /// Primary identity field; also the default ordering.
    pub identity_field: String,
    /// Human-facing display name, matched case-insensitively on lookup.
    pub name_field: String,
    /// Owning provider of each record.
    pub provider_field: String,
    /// Fields holding arrays of strings.
    pub array_fields: Vec<String>,
    /// Dataset file the table is loaded from.
    pub source_file: String,
}

impl TableDef {
    /// Create a table definition with `name` / `vendor` as the display and
    /// provider fields.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        let name = name.into();
        let source_file = format!("{name}.json");
        Self {
            name,
            identity_field: identity_field.into(),
            name_field: "name".to_string(),
            provider_field: "vendor".to_string(),
            array_fields: Vec::new(),
            source_file,
        }
    }

    /// Set the display-name field.
    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = field.into();
        self
    }

    /// Set the provider field.
    pub fn with_provider_field(mut self, field: impl Into<String>) -> Self {
        self.provider_field = field.into();
        self
    }

    /// Declare an array-of-strings field.
    pub fn with_array_field(mut self, field: impl Into<String>) -> Self {
        self.array_fields.push(field.into());
        self
    }

    /// Declare several array-of-strings fields.
    pub fn with_array_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Set the dataset file name.
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = file.into();
        self
    }

    /// Check whether a field holds an array of strings.
    pub fn is_array_field(&self, field: &str) -> bool {
        self.array_fields.iter().any(|f| f == field)
    }

    /// Fields every record must carry, without duplicates.
    pub fn required_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::with_capacity(3);
        for field in [&self.identity_field, &self.name_field, &self.provider_field] {
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }
        fields
    }
}
