//! Student record form controller.
//!
//! # Responsibility
//! - Track field values as the input layer reports changes.
//! - Apply input-layer validation before any write is issued.
//! - Drive the `Editing -> Submitting -> Editing` cycle around one insert.
//!
//! # Invariants
//! - Invalid input never reaches the collection.
//! - Success resets every field; failure keeps them for retry.
//! - `password` is held in form state only and never leaves this module.
//! - No local record is appended; new rows arrive through the live list.

use crate::model::student::{ClassRoom, Gender, NewStudentDocument, StudentId};
use crate::store::{RemoteCollection, StoreResult};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Notice shown after a successful insert.
pub const SAVE_SUCCESS_NOTICE: &str = "Student added successfully";
/// Notice shown after a failed insert.
pub const SAVE_FAILURE_NOTICE: &str = "Something went wrong while saving data";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid email regex")
});

pub type FormResult<T> = Result<T, FormError>;

/// Input names reported by the form's input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    FullName,
    Email,
    Password,
    Class,
    Gender,
    Subject,
    PhoneNumber,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::FullName,
        FormField::Email,
        FormField::Password,
        FormField::Class,
        FormField::Gender,
        FormField::Subject,
        FormField::PhoneNumber,
    ];

    /// Input name as used by the UI layer.
    pub fn name(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
            Self::Class => "class",
            Self::Gender => "gender",
            Self::Subject => "subject",
            Self::PhoneNumber => "phoneNumber",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Self::FullName | Self::Email | Self::Class | Self::Gender | Self::PhoneNumber
        )
    }
}

/// Form input errors. None of these reach the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownField(String),
    MissingField(FormField),
    InvalidEmail,
    UnknownClass(String),
    UnknownGender(String),
    /// A write is already in flight.
    Busy,
    /// `complete_submit` called without a matching `begin_submit`.
    NotSubmitting,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "unknown form field `{name}`"),
            Self::MissingField(field) => write!(f, "`{}` is required", field.name()),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::UnknownClass(value) => write!(f, "class `{value}` is not in the roster"),
            Self::UnknownGender(value) => {
                write!(f, "gender `{value}` is not one of male|female")
            }
            Self::Busy => write!(f, "a submission is already in progress"),
            Self::NotSubmitting => write!(f, "no submission is in progress"),
        }
    }
}

impl Error for FormError {}

/// Raw field values, exactly as typed or selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFormFields {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub class_name: String,
    pub gender: String,
    pub subject: String,
    pub phone_number: String,
}

impl StudentFormFields {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FullName => &self.full_name,
            FormField::Email => &self.email,
            FormField::Password => &self.password,
            FormField::Class => &self.class_name,
            FormField::Gender => &self.gender,
            FormField::Subject => &self.subject,
            FormField::PhoneNumber => &self.phone_number,
        }
    }

    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FullName => &mut self.full_name,
            FormField::Email => &mut self.email,
            FormField::Password => &mut self.password,
            FormField::Class => &mut self.class_name,
            FormField::Gender => &mut self.gender,
            FormField::Subject => &mut self.subject,
            FormField::PhoneNumber => &mut self.phone_number,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Submitting,
}

/// Result of one finished submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Insert accepted; the caller should close the form.
    Saved { id: StudentId },
    /// Insert failed; fields are intact and the form stays open.
    Failed { reason: String },
}

impl SubmitOutcome {
    pub fn should_close(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Alert text for the user.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Saved { .. } => SAVE_SUCCESS_NOTICE,
            Self::Failed { .. } => SAVE_FAILURE_NOTICE,
        }
    }
}

/// Controller behind the "Add Student" form.
#[derive(Debug, Clone)]
pub struct RecordFormController {
    fields: StudentFormFields,
    state: FormState,
    class_options: Vec<ClassRoom>,
}

impl RecordFormController {
    pub fn new(class_options: Vec<ClassRoom>) -> Self {
        Self {
            fields: StudentFormFields::default(),
            state: FormState::Editing,
            class_options,
        }
    }

    pub fn fields(&self) -> &StudentFormFields {
        &self.fields
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn class_options(&self) -> &[ClassRoom] {
        &self.class_options
    }

    pub fn gender_options(&self) -> [Gender; 2] {
        Gender::ALL
    }

    /// Records one input change.
    ///
    /// # Errors
    /// - Returns `Busy` while a submission is in flight.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> FormResult<()> {
        if self.state == FormState::Submitting {
            return Err(FormError::Busy);
        }
        *self.fields.slot(field) = value.into();
        Ok(())
    }

    /// Records one input change addressed by input name.
    pub fn set_field_by_name(&mut self, name: &str, value: impl Into<String>) -> FormResult<()> {
        let field =
            FormField::from_name(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        self.set_field(field, value)
    }

    /// Runs input-layer validation and builds the insert payload.
    pub fn validate(&self) -> FormResult<NewStudentDocument> {
        for field in FormField::ALL {
            if field.is_required() && self.fields.get(field).trim().is_empty() {
                return Err(FormError::MissingField(field));
            }
        }

        let email = self.fields.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(FormError::InvalidEmail);
        }

        let class_name = self.fields.class_name.as_str();
        if !self
            .class_options
            .iter()
            .any(|room| room.class_name == class_name)
        {
            return Err(FormError::UnknownClass(class_name.to_string()));
        }

        let gender = Gender::parse(&self.fields.gender)
            .ok_or_else(|| FormError::UnknownGender(self.fields.gender.clone()))?;

        Ok(NewStudentDocument {
            name: self.fields.full_name.clone(),
            email: email.to_string(),
            class_name: class_name.to_string(),
            gender,
            subject: self.fields.subject.clone(),
            contact: self.fields.phone_number.clone(),
        })
    }

    /// Validates and enters `Submitting`, returning the payload to insert.
    pub fn begin_submit(&mut self) -> FormResult<NewStudentDocument> {
        if self.state == FormState::Submitting {
            return Err(FormError::Busy);
        }
        let document = self.validate()?;
        self.state = FormState::Submitting;
        Ok(document)
    }

    /// Applies the insert result and returns to `Editing`.
    pub fn complete_submit(&mut self, result: StoreResult<StudentId>) -> FormResult<SubmitOutcome> {
        if self.state != FormState::Submitting {
            return Err(FormError::NotSubmitting);
        }
        self.state = FormState::Editing;

        match result {
            Ok(id) => {
                info!("event=student_submit module=form status=ok student_id={id}");
                self.fields = StudentFormFields::default();
                Ok(SubmitOutcome::Saved { id })
            }
            Err(err) => {
                error!("event=student_submit module=form status=error error={err}");
                Ok(SubmitOutcome::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Validates, issues exactly one insert, and applies its result.
    ///
    /// # Errors
    /// - Returns a `FormError` when input is invalid; nothing is written.
    pub fn submit<C: RemoteCollection + ?Sized>(
        &mut self,
        collection: &C,
    ) -> FormResult<SubmitOutcome> {
        let document = match self.begin_submit() {
            Ok(document) => document,
            Err(err) => {
                warn!("event=student_submit module=form status=rejected error={err}");
                return Err(err);
            }
        };
        let result = collection.insert(&document);
        self.complete_submit(result)
    }
}
