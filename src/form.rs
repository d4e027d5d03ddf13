use anyhow::bail;

use crate::data::{Comment, CommentBuilder};

pub const AUTHOR_MIN_LEN: usize = 3;
pub const AUTHOR_MAX_LEN: usize = 25;
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;
pub const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Rating,
    Comment,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Author, Field::Rating, Field::Comment];

    pub fn name(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Rating => "rating",
            Self::Comment => "comment",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Author => "Author Name",
            Self::Rating => "Rating",
            Self::Comment => "Comment",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    Required,
    MinLength(usize),
    MaxLength(usize),
    OutOfRange { min: u8, max: u8 },
}

impl ValidationError {
    pub fn message(self, field: Field) -> String {
        let label = field.label();
        match self {
            Self::Required => format!("{label} is required."),
            Self::MinLength(n) => format!("{label} must be at least {n} characters long."),
            Self::MaxLength(n) => format!("{label} cannot be more than {n} characters long."),
            Self::OutOfRange { min, max } => format!("{label} must be between {min} and {max}."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Untouched,
    Touched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// failing rules in the order they are checked
    Invalid(Vec<ValidationError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub interaction: Interaction,
    pub validity: Validity,
}

impl FieldState {
    fn untouched(validity: Validity) -> Self {
        Self {
            interaction: Interaction::Untouched,
            validity,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// The message to display: first failing rule, and only once the visitor
    /// has edited the field.
    fn message(&self, field: Field) -> String {
        match (&self.interaction, &self.validity) {
            (Interaction::Touched, Validity::Invalid(errors)) => errors
                .first()
                .map(|e| e.message(field))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFormValue {
    pub author: String,
    pub rating: u8,
    pub comment: String,
}

impl Default for CommentFormValue {
    fn default() -> Self {
        Self {
            author: String::new(),
            rating: DEFAULT_RATING,
            comment: String::new(),
        }
    }
}

/// Field name to current message, empty when there is nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FormErrors {
    pub author: String,
    pub rating: String,
    pub comment: String,
}

impl FormErrors {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Author => &self.author,
            Field::Rating => &self.rating,
            Field::Comment => &self.comment,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Author => &mut self.author,
            Field::Rating => &mut self.rating,
            Field::Comment => &mut self.comment,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

fn validate_author(author: &str) -> Validity {
    let mut errors = Vec::new();
    let len = author.trim().chars().count();
    if len == 0 {
        errors.push(ValidationError::Required);
    } else if len < AUTHOR_MIN_LEN {
        errors.push(ValidationError::MinLength(AUTHOR_MIN_LEN));
    }
    if len > AUTHOR_MAX_LEN {
        errors.push(ValidationError::MaxLength(AUTHOR_MAX_LEN));
    }
    into_validity(errors)
}

fn validate_rating(rating: u8) -> Validity {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Validity::Valid
    } else {
        Validity::Invalid(vec![ValidationError::OutOfRange {
            min: RATING_MIN,
            max: RATING_MAX,
        }])
    }
}

fn validate_comment(comment: &str) -> Validity {
    if comment.trim().is_empty() {
        Validity::Invalid(vec![ValidationError::Required])
    } else {
        Validity::Valid
    }
}

fn into_validity(errors: Vec<ValidationError>) -> Validity {
    if errors.is_empty() {
        Validity::Valid
    } else {
        Validity::Invalid(errors)
    }
}

#[derive(Debug, Clone)]
pub struct CommentForm {
    value: CommentFormValue,
    states: [FieldState; 3],
    errors: FormErrors,
}

impl Default for CommentForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentForm {
    pub fn new() -> Self {
        let value = CommentFormValue::default();
        let states = [
            FieldState::untouched(validate_author(&value.author)),
            FieldState::untouched(validate_rating(value.rating)),
            FieldState::untouched(validate_comment(&value.comment)),
        ];
        let mut form = Self {
            value,
            states,
            errors: FormErrors::default(),
        };
        form.on_value_change();
        form
    }

    pub fn value(&self) -> &CommentFormValue {
        &self.value
    }

    pub fn state(&self, field: Field) -> &FieldState {
        &self.states[field.index()]
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.states.iter().all(FieldState::is_valid)
    }

    /// Whether any field has been edited since the last reset.
    pub fn is_dirty(&self) -> bool {
        self.states
            .iter()
            .any(|s| s.interaction == Interaction::Touched)
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.value.author = author.into();
        self.touch(Field::Author);
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.value.rating = rating;
        self.touch(Field::Rating);
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.value.comment = comment.into();
        self.touch(Field::Comment);
    }

    /// Mark every field as edited so all pending messages become visible.
    pub fn touch_all(&mut self) {
        for state in &mut self.states {
            state.interaction = Interaction::Touched;
        }
        self.on_value_change();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Turn the current values into a timestamped comment.
    pub fn to_comment(&self) -> anyhow::Result<Comment> {
        if !self.is_valid() {
            let reasons = Field::ALL
                .iter()
                .filter_map(|f| match &self.state(*f).validity {
                    Validity::Invalid(errors) => errors.first().map(|e| e.message(*f)),
                    Validity::Valid => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            bail!("comment form is invalid: {reasons}");
        }

        let comment = CommentBuilder::default()
            .author(self.value.author.trim())
            .rating(self.value.rating)
            .comment(self.value.comment.as_str())
            .build()?;
        Ok(comment)
    }

    fn touch(&mut self, field: Field) {
        self.states[field.index()].interaction = Interaction::Touched;
        self.on_value_change();
    }

    fn on_value_change(&mut self) {
        self.states[Field::Author.index()].validity = validate_author(&self.value.author);
        self.states[Field::Rating.index()].validity = validate_rating(self.value.rating);
        self.states[Field::Comment.index()].validity = validate_comment(&self.value.comment);

        for field in Field::ALL {
            let message = self.state(field).message(field);
            *self.errors.slot(field) = message;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pristine_form_shows_nothing() {
        let form = CommentForm::new();
        assert_eq!(form.value(), &CommentFormValue::default());
        assert_eq!(form.value().rating, 5);
        assert!(form.errors().is_empty());
        assert!(!form.is_dirty());
        // required fields are empty, so the form is not submittable yet
        assert!(!form.is_valid());
    }

    #[test]
    fn test_author_too_short() {
        let mut form = CommentForm::new();
        form.set_author("Al");
        assert_eq!(
            form.errors().author,
            "Author Name must be at least 3 characters long."
        );
        assert!(form.is_dirty());
    }

    #[test]
    fn test_author_bounds_accepted() {
        let mut form = CommentForm::new();
        for len in AUTHOR_MIN_LEN..=AUTHOR_MAX_LEN {
            form.set_author("a".repeat(len));
            assert!(form.state(Field::Author).is_valid(), "length {len}");
            assert_eq!(form.errors().author, "");
        }
    }

    #[test]
    fn test_author_too_long() {
        let mut form = CommentForm::new();
        form.set_author("a".repeat(AUTHOR_MAX_LEN + 1));
        assert_eq!(
            form.errors().author,
            "Author Name cannot be more than 25 characters long."
        );
    }

    #[test]
    fn test_author_counts_chars() {
        let mut form = CommentForm::new();
        form.set_author("李小龙");
        assert!(form.state(Field::Author).is_valid());
    }

    #[test]
    fn test_author_cleared_is_required() {
        let mut form = CommentForm::new();
        form.set_author("Avimitin");
        form.set_author("   ");
        assert_eq!(form.errors().author, "Author Name is required.");
    }

    #[test]
    fn test_comment_required() {
        let mut form = CommentForm::new();
        form.set_comment("");
        assert_eq!(form.errors().comment, "Comment is required.");

        form.set_comment("Lovely");
        assert_eq!(form.errors().comment, "");
        assert!(form.state(Field::Comment).is_valid());
    }

    #[test]
    fn test_untouched_field_hides_message() {
        let mut form = CommentForm::new();
        form.set_author("Avimitin");
        assert_eq!(form.errors().comment, "");
        assert!(matches!(
            form.state(Field::Comment).validity,
            Validity::Invalid(_)
        ));
        assert_eq!(form.state(Field::Comment).interaction, Interaction::Untouched);
    }

    #[test]
    fn test_rating_range() {
        let mut form = CommentForm::new();
        form.set_rating(0);
        assert_eq!(form.errors().rating, "Rating must be between 1 and 5.");
        form.set_rating(3);
        assert_eq!(form.errors().rating, "");
    }

    #[test]
    fn test_to_comment() {
        let mut form = CommentForm::new();
        assert!(form.to_comment().is_err());

        form.set_author(" Avimitin ");
        form.set_rating(4);
        form.set_comment("Very good chicken");
        let comment = form.to_comment().unwrap();
        assert_eq!(comment.author, "Avimitin");
        assert_eq!(comment.rating, 4);
        assert_eq!(comment.comment, "Very good chicken");
        assert!(chrono::DateTime::parse_from_rfc3339(&comment.date).is_ok());
    }

    #[test]
    fn test_reset() {
        let mut form = CommentForm::new();
        form.set_author("Al");
        form.set_rating(2);
        form.reset();
        assert_eq!(form.value(), &CommentFormValue::default());
        assert!(form.errors().is_empty());
        assert!(!form.is_dirty());
    }
}
