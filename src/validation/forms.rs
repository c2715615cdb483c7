//! Field rules of the back-office and checkout forms

use std::sync::LazyLock;

use regex::Regex;

use super::rules::{
    email, first_error, integer_between, length_between, matches, max_length,
    non_negative_amount, optional, parse_amount, phone, positive_amount, required, url,
};
use super::{FormSchema, field};
use crate::api::categories::CategoryInput;
use crate::api::products::ProductInput;
use crate::api::roles::RoleInput;
use crate::api::shipping::{ShippingAddressInput, ShippingCostInput};
use crate::api::supplier_items::SupplierItemInput;
use crate::api::users::UserInput;
use crate::types::FormData;

static CATEGORY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} &.\-]+$").expect("Invalid category name regex"));

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} .'\-]+$").expect("Invalid person name regex"));

static ROLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_ \-]+$").expect("Invalid role name regex"));

static SKU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]{3,32}$").expect("Invalid SKU regex"));

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 \-]{3,10}$").expect("Invalid postal code regex"));

fn text(form: &FormData, name: &str) -> String {
    field(form, name).trim().to_string()
}

fn optional_text(form: &FormData, name: &str) -> Option<String> {
    Some(text(form, name)).filter(|value| !value.is_empty())
}

fn amount(form: &FormData, name: &str) -> f64 {
    parse_amount(field(form, name)).unwrap_or_default()
}

fn lines(form: &FormData, name: &str) -> Vec<String> {
    field(form, name)
        .split([',', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Product create/edit dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductForm;

impl ProductForm {
    fn discount_price(value: &str, form: &FormData) -> String {
        if value.trim().is_empty() {
            return String::new();
        }
        let Some(discount) = parse_amount(value) else {
            return "Discount price must be a valid number".to_string();
        };
        if discount < 0.0 {
            return "Discount price cannot be negative".to_string();
        }
        match parse_amount(field(form, "price")) {
            Some(price) if discount >= price => {
                "Discount price must be less than the regular price".to_string()
            }
            _ => String::new(),
        }
    }
}

impl FormSchema for ProductForm {
    type Input = ProductInput;

    fn fields(&self) -> &'static [&'static str] {
        &[
            "name",
            "description",
            "price",
            "discount_price",
            "stock",
            "category_id",
            "sku",
            "image_url",
        ]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["name", "description", "price", "stock", "category_id"]
    }

    fn validate_field(&self, name: &str, value: &str, form: &FormData) -> String {
        match name {
            "name" => first_error([
                required(value, "Product name is required"),
                length_between(value, 3, 100, "Product name"),
            ]),
            "description" => first_error([
                required(value, "Description is required"),
                length_between(value, 10, 2000, "Description"),
            ]),
            "price" => first_error([
                required(value, "Price is required"),
                positive_amount(value, "Price"),
            ]),
            "discount_price" => Self::discount_price(value, form),
            "stock" => first_error([
                required(value, "Stock is required"),
                integer_between(value, 0, 1_000_000, "Stock"),
            ]),
            "category_id" => first_error([required(value, "Please select a category")]),
            "sku" => first_error([optional(value, |v| {
                matches(v, &SKU, "SKU must be 3-32 letters, digits, - or _")
            })]),
            "image_url" => first_error([optional(value, url)]),
            _ => String::new(),
        }
    }

    fn dependents(&self, name: &str) -> &'static [&'static str] {
        match name {
            "price" => &["discount_price"],
            _ => &[],
        }
    }

    fn to_input(&self, form: &FormData) -> ProductInput {
        ProductInput {
            name: text(form, "name"),
            description: text(form, "description"),
            price: amount(form, "price"),
            discount_price: parse_amount(field(form, "discount_price")),
            stock: field(form, "stock").trim().parse().unwrap_or_default(),
            category_id: text(form, "category_id"),
            images: optional_text(form, "image_url").into_iter().collect(),
            sku: optional_text(form, "sku"),
        }
    }
}

/// Category create/edit dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryForm;

impl FormSchema for CategoryForm {
    type Input = CategoryInput;

    fn fields(&self) -> &'static [&'static str] {
        &["name", "description", "image_url"]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn validate_field(&self, name: &str, value: &str, _form: &FormData) -> String {
        match name {
            "name" => first_error([
                required(value, "Category name is required"),
                length_between(value, 2, 50, "Category name"),
                matches(
                    value,
                    &CATEGORY_NAME,
                    "Category name can only contain letters, spaces, &, . and -",
                ),
            ]),
            "description" => first_error([max_length(value, 500, "Description")]),
            "image_url" => first_error([optional(value, url)]),
            _ => String::new(),
        }
    }

    fn to_input(&self, form: &FormData) -> CategoryInput {
        CategoryInput {
            name: text(form, "name"),
            description: text(form, "description"),
            parent_id: optional_text(form, "parent_id"),
            image_url: optional_text(form, "image_url"),
        }
    }
}

/// Checkout and account shipping address form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShippingAddressForm;

impl FormSchema for ShippingAddressForm {
    type Input = ShippingAddressInput;

    fn fields(&self) -> &'static [&'static str] {
        &[
            "full_name",
            "phone",
            "address_line1",
            "address_line2",
            "city",
            "state",
            "postal_code",
            "country",
        ]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[
            "full_name",
            "phone",
            "address_line1",
            "city",
            "postal_code",
            "country",
        ]
    }

    fn validate_field(&self, name: &str, value: &str, _form: &FormData) -> String {
        match name {
            "full_name" => first_error([
                required(value, "Full name is required"),
                length_between(value, 2, 100, "Full name"),
                matches(value, &PERSON_NAME, "Full name can only contain letters"),
            ]),
            "phone" => first_error([required(value, "Phone number is required"), phone(value)]),
            "address_line1" => first_error([
                required(value, "Address is required"),
                length_between(value, 5, 200, "Address"),
            ]),
            "address_line2" => first_error([max_length(value, 200, "Address line 2")]),
            "city" => first_error([
                required(value, "City is required"),
                length_between(value, 2, 100, "City"),
            ]),
            "state" => first_error([max_length(value, 100, "State")]),
            "postal_code" => first_error([
                required(value, "Postal code is required"),
                matches(value, &POSTAL_CODE, "Please enter a valid postal code"),
            ]),
            "country" => first_error([required(value, "Country is required")]),
            _ => String::new(),
        }
    }

    fn to_input(&self, form: &FormData) -> ShippingAddressInput {
        ShippingAddressInput {
            full_name: text(form, "full_name"),
            phone: text(form, "phone"),
            address_line1: text(form, "address_line1"),
            address_line2: optional_text(form, "address_line2"),
            city: text(form, "city"),
            state: optional_text(form, "state"),
            postal_code: text(form, "postal_code"),
            country: text(form, "country"),
            is_default: field(form, "is_default") == "true",
        }
    }
}

/// Back-office user form. A blank password keeps the current one on edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserForm;

impl UserForm {
    fn password(value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }
        if value.chars().count() < 8 {
            return "Password must be at least 8 characters".to_string();
        }
        let has_letter = value.chars().any(char::is_alphabetic);
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return "Password must contain letters and numbers".to_string();
        }
        String::new()
    }
}

impl FormSchema for UserForm {
    type Input = UserInput;

    fn fields(&self) -> &'static [&'static str] {
        &["name", "email", "phone", "password", "confirm_password", "role_id"]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["name", "email"]
    }

    fn validate_field(&self, name: &str, value: &str, form: &FormData) -> String {
        match name {
            "name" => first_error([
                required(value, "Name is required"),
                length_between(value, 2, 50, "Name"),
                matches(value, &PERSON_NAME, "Name can only contain letters"),
            ]),
            "email" => first_error([required(value, "Email is required"), email(value)]),
            "phone" => first_error([optional(value, phone)]),
            "password" => Self::password(value),
            "confirm_password" => {
                if value != field(form, "password") {
                    "Passwords do not match".to_string()
                } else {
                    String::new()
                }
            }
            _ => String::new(),
        }
    }

    fn dependents(&self, name: &str) -> &'static [&'static str] {
        match name {
            "password" => &["confirm_password"],
            _ => &[],
        }
    }

    fn to_input(&self, form: &FormData) -> UserInput {
        UserInput {
            name: text(form, "name"),
            email: text(form, "email"),
            phone: optional_text(form, "phone"),
            password: Some(field(form, "password").to_string()).filter(|p| !p.is_empty()),
            role_id: optional_text(form, "role_id"),
        }
    }
}

/// Role form; permissions are entered comma or line separated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleForm;

impl FormSchema for RoleForm {
    type Input = RoleInput;

    fn fields(&self) -> &'static [&'static str] {
        &["name", "description"]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn validate_field(&self, name: &str, value: &str, _form: &FormData) -> String {
        match name {
            "name" => first_error([
                required(value, "Role name is required"),
                length_between(value, 2, 50, "Role name"),
                matches(
                    value,
                    &ROLE_NAME,
                    "Role name can only contain letters, spaces, - and _",
                ),
            ]),
            "description" => first_error([max_length(value, 200, "Description")]),
            _ => String::new(),
        }
    }

    fn to_input(&self, form: &FormData) -> RoleInput {
        RoleInput {
            name: text(form, "name"),
            description: text(form, "description"),
            permissions: lines(form, "permissions"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplierItemForm;

impl FormSchema for SupplierItemForm {
    type Input = SupplierItemInput;

    fn fields(&self) -> &'static [&'static str] {
        &[
            "supplier_name",
            "item_name",
            "unit_cost",
            "quantity",
            "contact_email",
        ]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["supplier_name", "item_name", "unit_cost", "quantity"]
    }

    fn validate_field(&self, name: &str, value: &str, _form: &FormData) -> String {
        match name {
            "supplier_name" => first_error([
                required(value, "Supplier name is required"),
                length_between(value, 2, 100, "Supplier name"),
            ]),
            "item_name" => first_error([
                required(value, "Item name is required"),
                length_between(value, 2, 100, "Item name"),
            ]),
            "unit_cost" => first_error([
                required(value, "Unit cost is required"),
                positive_amount(value, "Unit cost"),
            ]),
            "quantity" => first_error([
                required(value, "Quantity is required"),
                integer_between(value, 0, 1_000_000, "Quantity"),
            ]),
            "contact_email" => first_error([optional(value, email)]),
            _ => String::new(),
        }
    }

    fn to_input(&self, form: &FormData) -> SupplierItemInput {
        SupplierItemInput {
            supplier_name: text(form, "supplier_name"),
            item_name: text(form, "item_name"),
            product_id: optional_text(form, "product_id"),
            unit_cost: amount(form, "unit_cost"),
            quantity: field(form, "quantity").trim().parse().unwrap_or_default(),
            contact_email: optional_text(form, "contact_email"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShippingCostForm;

impl FormSchema for ShippingCostForm {
    type Input = ShippingCostInput;

    fn fields(&self) -> &'static [&'static str] {
        &["region", "cost", "free_shipping_threshold", "estimated_days"]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["region", "cost"]
    }

    fn validate_field(&self, name: &str, value: &str, _form: &FormData) -> String {
        match name {
            "region" => first_error([
                required(value, "Region is required"),
                length_between(value, 2, 100, "Region"),
            ]),
            "cost" => first_error([
                required(value, "Shipping cost is required"),
                non_negative_amount(value, "Shipping cost"),
            ]),
            "free_shipping_threshold" => first_error([optional(value, |v| {
                positive_amount(v, "Free shipping threshold")
            })]),
            "estimated_days" => first_error([optional(value, |v| {
                integer_between(v, 1, 365, "Estimated days")
            })]),
            _ => String::new(),
        }
    }

    fn to_input(&self, form: &FormData) -> ShippingCostInput {
        ShippingCostInput {
            region: text(form, "region"),
            cost: amount(form, "cost"),
            free_shipping_threshold: parse_amount(field(form, "free_shipping_threshold")),
            estimated_days: field(form, "estimated_days").trim().parse().ok(),
        }
    }
}
