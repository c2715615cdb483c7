//! Client-side form validation.
//!
//! Validation is pure and synchronous: a [`FormSchema`] maps a field name, its value
//! and the sibling values to an error message, with `""` meaning valid. Nothing in
//! this module performs I/O except [`FormState::submit`], which only reaches the
//! network once the whole form validates.

use crate::client::QueryClient;
use crate::errors::SubmitError;
use crate::mutation::Mutation;
use crate::types::{FieldErrors, FormData};

pub mod forms;
pub mod rules;

pub use forms::{
    CategoryForm, ProductForm, RoleForm, ShippingAddressForm, ShippingCostForm,
    SupplierItemForm, UserForm,
};

/// Validation rules of one form
pub trait FormSchema {
    /// Payload built from a valid form
    type Input;

    /// Fields validated by [`validate_all_fields`], in display order
    fn fields(&self) -> &'static [&'static str];

    /// Fields that must be non-blank for the form to be valid
    fn required_fields(&self) -> &'static [&'static str];

    /// Error for `name = value` given the other values, or `""` when valid
    fn validate_field(&self, name: &str, value: &str, form: &FormData) -> String;

    /// Fields whose error depends on `name` and must be re-checked when it changes
    fn dependents(&self, _name: &str) -> &'static [&'static str] {
        &[]
    }

    /// Build the request payload from validated values
    fn to_input(&self, form: &FormData) -> Self::Input;
}

/// Value of `name` in `form`, blank when missing
pub fn field<'a>(form: &'a FormData, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or("")
}

/// Validate every field of the schema
pub fn validate_all_fields<S: FormSchema + ?Sized>(schema: &S, form: &FormData) -> FieldErrors {
    schema
        .fields()
        .iter()
        .map(|name| {
            let error = schema.validate_field(name, field(form, name), form);
            (name.to_string(), error)
        })
        .collect()
}

/// Every required field is non-blank and no recorded error is non-empty.
///
/// Only errors already in `errors` count: a required field that was filled but
/// never validated passes. [`FormState::submit`] closes that gap by validating the
/// whole form first.
pub fn is_form_valid<S: FormSchema + ?Sized>(
    schema: &S,
    form: &FormData,
    errors: &FieldErrors,
) -> bool {
    let required_filled = schema
        .required_fields()
        .iter()
        .all(|name| !field(form, name).trim().is_empty());
    required_filled && errors.values().all(String::is_empty)
}

/// Local state of one open form
#[derive(Debug, Clone, PartialEq)]
pub struct FormState<S> {
    schema: S,
    values: FormData,
    errors: FieldErrors,
    submitting: bool,
}

impl<S: FormSchema> FormState<S> {
    pub fn new(schema: S) -> Self {
        Self::with_values(schema, FormData::new())
    }

    /// Start from existing values (edit dialogs)
    pub fn with_values(schema: S, values: FormData) -> Self {
        Self {
            schema,
            values,
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn values(&self) -> &FormData {
        &self.values
    }

    pub fn value(&self, name: &str) -> &str {
        field(&self.values, name)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// The error shown under `name`, if any
    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors
            .get(name)
            .map(String::as_str)
            .filter(|error| !error.is_empty())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Update a value. Fields already showing a result are re-validated, along with
    /// the fields depending on this one.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
        if self.errors.contains_key(name) {
            self.validate(name);
        }
        for dependent in self.schema.dependents(name) {
            if self.errors.contains_key(*dependent) {
                self.validate(dependent);
            }
        }
    }

    /// The user left `name`: record its validation result
    pub fn blur(&mut self, name: &str) {
        self.validate(name);
    }

    fn validate(&mut self, name: &str) {
        let error = self
            .schema
            .validate_field(name, field(&self.values, name), &self.values);
        self.errors.insert(name.to_string(), error);
    }

    /// Validate every field, replacing recorded errors. Returns whether the form is valid.
    pub fn validate_all(&mut self) -> bool {
        self.errors = validate_all_fields(&self.schema, &self.values);
        self.is_valid()
    }

    /// [`is_form_valid`] over the current values and recorded errors
    pub fn is_valid(&self) -> bool {
        is_form_valid(&self.schema, &self.values, &self.errors)
    }

    /// Clear values and errors (dialog closed)
    pub fn reset(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.submitting = false;
    }

    /// Validate the whole form and, if valid, send `mutation` with the schema's input
    pub async fn submit<M>(
        &mut self,
        client: &QueryClient,
        mutation: &M,
    ) -> Result<M::Output, SubmitError>
    where
        M: Mutation<Arg = S::Input>,
    {
        self.submit_with(client, mutation, |input| input).await
    }

    /// Like [`submit`](Self::submit), wrapping the input first (e.g. into an
    /// [`Update`](crate::api::Update) carrying the edited id).
    ///
    /// An invalid form returns [`SubmitError::Invalid`] without any request.
    pub async fn submit_with<M, F>(
        &mut self,
        client: &QueryClient,
        mutation: &M,
        wrap: F,
    ) -> Result<M::Output, SubmitError>
    where
        M: Mutation,
        F: FnOnce(S::Input) -> M::Arg,
    {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }
        if !self.validate_all() {
            crate::debug_log!("🚫 [FORM] Submission blocked by validation");
            let errors = self
                .errors
                .iter()
                .filter(|(_, error)| !error.is_empty())
                .map(|(name, error)| (name.clone(), error.clone()))
                .collect();
            return Err(SubmitError::Invalid(errors));
        }

        let arg = wrap(self.schema.to_input(&self.values));
        let result = {
            let _submitting = SubmittingFlag::raise(&mut self.submitting);
            client.mutate(mutation, arg).await
        };
        Ok(result?)
    }
}

/// Holds `submitting` up until dropped, so an abandoned submission does not leave
/// the form locked
struct SubmittingFlag<'a>(&'a mut bool);

impl<'a> SubmittingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for SubmittingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn untouched_required_field_fails_validity() {
        let state = FormState::new(CategoryForm);
        assert!(!state.is_valid());
    }

    #[test]
    fn filled_but_unvalidated_field_passes_until_checked() {
        // `name` is filled with an invalid value but never blurred
        let mut state = FormState::with_values(CategoryForm, form(&[("name", "#")]));
        assert!(state.is_valid());
        assert!(!state.validate_all());
        assert_eq!(
            state.error("name"),
            Some("Category name must be between 2 and 50 characters")
        );
    }

    #[test]
    fn set_field_revalidates_shown_errors_and_dependents() {
        let mut state = FormState::new(ProductForm);
        state.set_field("price", "100");
        state.set_field("discount_price", "100");
        state.blur("discount_price");
        assert!(state.error("discount_price").is_some());

        state.set_field("price", "150");
        assert_eq!(state.error("discount_price"), None);
    }
}
