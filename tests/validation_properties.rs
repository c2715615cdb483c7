use proptest::prelude::*;
use storefront_provider::types::{FieldErrors, FormData};
use storefront_provider::validation::{
    CategoryForm, FormSchema, ProductForm, ShippingAddressForm, UserForm, is_form_valid,
};

fn money(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn product_form(price: &str, discount: &str) -> FormData {
    FormData::from([
        ("price".to_string(), price.to_string()),
        ("discount_price".to_string(), discount.to_string()),
    ])
}

#[test]
fn discount_must_be_strictly_below_price() {
    let schema = ProductForm;
    let check = |price: &str, discount: &str| {
        let form = product_form(price, discount);
        schema.validate_field("discount_price", discount, &form)
    };
    assert_eq!(
        check("100", "100"),
        "Discount price must be less than the regular price"
    );
    assert_eq!(check("100", "99.99"), "");
    assert_eq!(check("100", ""), "");
    assert_eq!(check("", ""), "");
    assert_eq!(check("5", "   "), "");
}

fn field_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-zA-Z &.\\-]{0,60}",
        "[0-9.\\-]{0,12}",
        "\\PC{0,40}",
    ]
}

proptest! {
    #[test]
    fn validation_is_deterministic(
        index in 0usize..8,
        value in field_value(),
        sibling in field_value(),
    ) {
        let schema = ProductForm;
        let name = schema.fields()[index];
        let form = FormData::from([("price".to_string(), sibling.clone())]);
        let first = schema.validate_field(name, &value, &form);
        let second = schema.validate_field(name, &value, &form);
        prop_assert_eq!(first, second);

        let users = UserForm;
        let form = FormData::from([("password".to_string(), sibling)]);
        prop_assert_eq!(
            users.validate_field("confirm_password", &value, &form),
            users.validate_field("confirm_password", &value, &form)
        );
    }

    #[test]
    fn category_name_errors_match_rules(
        value in prop_oneof![Just("  ".to_string()), "[a-zA-Z0-9 &.!_\\-]{0,60}"],
    ) {
        let error = CategoryForm.validate_field("name", &value, &FormData::new());
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        let allowed = trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '&' | '.' | '-'));

        if trimmed.is_empty() {
            prop_assert_eq!(error, "Category name is required");
        } else if !(2..=50).contains(&length) {
            prop_assert_eq!(error, "Category name must be between 2 and 50 characters");
        } else if !allowed {
            prop_assert_eq!(error, "Category name can only contain letters, spaces, &, . and -");
        } else {
            prop_assert_eq!(error, "");
        }
    }

    #[test]
    fn discount_rule_compares_against_price(price in 1u64..1_000_000, discount in 0u64..1_000_000) {
        let (price, discount) = (money(price), money(discount));
        let form = product_form(&price, &discount);
        let error = ProductForm.validate_field("discount_price", &discount, &form);
        let expected_invalid = discount.parse::<f64>().unwrap() >= price.parse::<f64>().unwrap();
        prop_assert_eq!(!error.is_empty(), expected_invalid);
    }

    #[test]
    fn form_validity_is_the_documented_conjunction(
        name in field_value(),
        errors in proptest::collection::btree_map("[a-z_]{1,12}", prop_oneof![Just(String::new()), "[a-z ]{1,20}"], 0..5),
    ) {
        let schema = CategoryForm;
        let form = FormData::from([("name".to_string(), name.clone())]);
        let errors: FieldErrors = errors;
        let expected = !name.trim().is_empty() && errors.values().all(|error| error.is_empty());
        prop_assert_eq!(is_form_valid(&schema, &form, &errors), expected);
    }

    #[test]
    fn address_validity_requires_every_required_field(blank in 0usize..6) {
        let schema = ShippingAddressForm;
        let mut form: FormData = schema
            .required_fields()
            .iter()
            .map(|name| (name.to_string(), "filled".to_string()))
            .collect();
        let required = schema.required_fields();
        if blank < required.len() {
            form.insert(required[blank].to_string(), "  ".to_string());
        }
        let valid = is_form_valid(&schema, &form, &FieldErrors::new());
        prop_assert_eq!(valid, blank >= required.len());
    }
}
