use serde::{Deserialize, Serialize};

/// In-progress registration form.
///
/// Every field is optional: the form is autosaved long before it is
/// complete. A draft without an email cannot be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegistrationDraft {
    #[schema(example = "Ayu Lestari")]
    pub name: Option<String>,
    /// Contact number (WhatsApp).
    #[schema(example = "+6281234567890")]
    pub whatsapp: Option<String>,
    #[schema(example = "a@x.com")]
    pub email: Option<String>,
    #[schema(example = "Student")]
    pub role: Option<String>,
    /// Affiliation. Optional for the college-exempt role.
    #[schema(example = "Institut Teknologi Bandung")]
    pub college: Option<String>,
    /// Year of study.
    #[schema(example = "3")]
    pub year: Option<String>,
    /// Preferred competition category.
    #[schema(example = "Photography")]
    pub category: Option<String>,
    /// Prior-discount eligibility.
    #[serde(default)]
    pub discount_flag: bool,
}

/// A single field edit coming from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    Whatsapp(String),
    Email(String),
    Role(String),
    College(String),
    Year(String),
    Category(String),
    DiscountFlag(bool),
}

impl RegistrationDraft {
    /// Apply one edit in place. Clearing a text field stores `None`.
    pub fn apply(&mut self, edit: FieldEdit) {
        fn text(value: String) -> Option<String> {
            if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        }

        match edit {
            FieldEdit::Name(v) => self.name = text(v),
            FieldEdit::Whatsapp(v) => self.whatsapp = text(v),
            FieldEdit::Email(v) => self.email = text(v),
            FieldEdit::Role(v) => self.role = text(v),
            FieldEdit::College(v) => self.college = text(v),
            FieldEdit::Year(v) => self.year = text(v),
            FieldEdit::Category(v) => self.category = text(v),
            FieldEdit::DiscountFlag(v) => self.discount_flag = v,
        }
    }

    /// The lifecycle key: trimmed, lower-cased email, or `None` when absent.
    pub fn key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether this draft can be written to the lifecycle store yet.
    pub fn is_persistable(&self) -> bool {
        self.key().is_some()
    }

    /// Copy of the draft with every text field trimmed and blanks cleared.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            name: clean(&self.name),
            whatsapp: clean(&self.whatsapp),
            email: self.key(),
            role: clean(&self.role),
            college: clean(&self.college),
            year: clean(&self.year),
            category: clean(&self.category),
            discount_flag: self.discount_flag,
        }
    }
}
