//! # Validation Module
//!
//! Turns a raw `POST /checkout` body into a [`CheckoutInput`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Shape (serde)                                                │
//! │  ├── Body must be a JSON object with the expected value types          │
//! │  └── Failure: VALIDATION_ERROR on "body" or the mistyped field's path  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Fields (THIS MODULE)                                         │
//! │  ├── Required fields, UUIDs, positive quantities, cart size            │
//! │  └── Every problem is collected, not just the first                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Id typing                                                    │
//! │  ├── non-UUID locationId / shopId → LOCATION_NOT_FOUND                 │
//! │  ├── "9999" → ServiceCharge, other ids must be UUIDs                   │
//! │  └── source → BottleSource (missing = CLOSED)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database                                                     │
//! │  └── CHECK / UNIQUE / FOREIGN KEY constraints                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O, so a rejected request never reaches the
//! database.
//!
//! ## Usage
//! ```rust
//! use garage_core::validation::parse_checkout_request;
//!
//! let body = br#"{
//!     "locationId": "6f1c1f4e-4f8a-4a57-9a43-1d7b1c3e5a01",
//!     "paymentMethod": "cash",
//!     "cashierId": "cashier-7",
//!     "cart": [{ "productId": "9999", "quantity": 1, "sellingPrice": 5 }]
//! }"#;
//!
//! let input = parse_checkout_request(body).unwrap();
//! assert_eq!(input.cart.len(), 1);
//! assert_eq!(input.shop_id, input.location_id);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{BottleSource, CartLine, CheckoutInput, LineItemKind, TradeInCondition, TradeInLine};
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_LINE_QUANTITY, SERVICE_CHARGE_PRODUCT_ID};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Wire Types
// =============================================================================

/// Body of `POST /checkout`.
///
/// Every field is optional at this level so that a missing value is reported
/// against its own name instead of failing the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub location_id: Option<String>,
    pub shop_id: Option<String>,
    pub payment_method: Option<String>,
    pub cashier_id: Option<String>,
    pub cart: Option<Vec<CartItemRequest>>,
    pub trade_ins: Option<Vec<TradeInRequest>>,
    pub car_plate_number: Option<String>,
    pub customer_id: Option<String>,
}

/// One cart line as sent by the till.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<f64>,
    pub selling_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One trade-in line as sent by the till.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TradeInRequest {
    pub product_id: Option<String>,
    pub quantity: Option<f64>,
    pub trade_in_value: Option<f64>,
    pub name: Option<String>,
    pub cost_price: Option<f64>,
    pub size: Option<String>,
    pub condition: Option<String>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Parses and validates a raw request body.
///
/// ## Errors
/// - [`CoreError::Validation`] for malformed JSON, wrongly typed values and
///   every field problem
/// - [`CoreError::LocationNotFound`] for a location or shop id that is not a
///   UUID
/// - [`CoreError::InvalidProductId`] for a product id that is not a UUID
/// - [`CoreError::InvalidSource`] for a bottle source other than CLOSED/OPEN
pub fn parse_checkout_request(body: &[u8]) -> CoreResult<CheckoutInput> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        CoreError::from(ValidationError::Malformed {
            field: "body".to_string(),
            reason: e.to_string(),
        })
    })?;

    let request = CheckoutRequest::deserialize(&value).map_err(|e| {
        let errors = shape_errors(&value);
        if errors.is_empty() {
            CoreError::from(ValidationError::Malformed {
                field: "body".to_string(),
                reason: e.to_string(),
            })
        } else {
            CoreError::Validation(errors)
        }
    })?;

    let raw_cart = value.get("cart").cloned().unwrap_or(Value::Null);
    validate_with_snapshot(request, raw_cart)
}

/// Validates an already deserialized request.
pub fn validate_checkout_request(request: CheckoutRequest) -> CoreResult<CheckoutInput> {
    let raw_cart = serde_json::to_value(&request.cart)
        .map_err(|e| CoreError::Internal(format!("cart snapshot failed: {e}")))?;
    validate_with_snapshot(request, raw_cart)
}

/// `raw_cart` is the cart exactly as received; it becomes `items_sold`.
fn validate_with_snapshot(request: CheckoutRequest, raw_cart: Value) -> CoreResult<CheckoutInput> {
    let mut errors = Vec::new();

    let location_raw = collect(&mut errors, require_text(request.location_id.as_deref(), "locationId"));
    let shop_raw = non_empty(request.shop_id.as_deref());
    let payment_method = collect(
        &mut errors,
        require_text(request.payment_method.as_deref(), "paymentMethod"),
    );
    let cashier_id = collect(&mut errors, require_text(request.cashier_id.as_deref(), "cashierId"));

    let cart_items = request.cart.unwrap_or_default();
    collect(&mut errors, validate_cart_size(cart_items.len(), "cart", true));

    let mut cart_fields = Vec::with_capacity(cart_items.len());
    for (i, item) in cart_items.iter().enumerate() {
        cart_fields.push(validate_cart_item(item, i, &mut errors));
    }

    let trade_in_items = request.trade_ins.unwrap_or_default();
    collect(&mut errors, validate_cart_size(trade_in_items.len(), "tradeIns", false));

    let mut trade_in_fields = Vec::with_capacity(trade_in_items.len());
    for (i, item) in trade_in_items.iter().enumerate() {
        trade_in_fields.push(validate_trade_in(item, i, &mut errors));
    }

    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    let (Some(location_raw), Some(payment_method), Some(cashier_id)) =
        (location_raw, payment_method, cashier_id)
    else {
        return Err(CoreError::Internal("validation passed with missing fields".into()));
    };

    let location_id = parse_location_id(&location_raw)?;
    let shop_id = match shop_raw {
        None => location_id,
        Some(raw) => parse_location_id(&raw)?,
    };

    // Line typing runs only once the shape is known to be sound.
    let mut cart = Vec::with_capacity(cart_items.len());
    for (item, fields) in cart_items.iter().zip(cart_fields) {
        let Some((quantity, selling_price)) = fields else {
            return Err(CoreError::Internal("validation passed with missing line fields".into()));
        };

        cart.push(CartLine {
            kind: parse_line_kind(item.product_id.as_deref().unwrap_or_default())?,
            quantity,
            selling_price,
            volume_description: non_empty(item.volume_description.as_deref()),
            source: parse_source(item.source.as_deref())?,
        });
    }

    let mut trade_ins = Vec::with_capacity(trade_in_items.len());
    for (item, fields) in trade_in_items.iter().zip(trade_in_fields) {
        let Some((quantity, trade_in_value, cost_price, condition)) = fields else {
            return Err(CoreError::Internal("validation passed with missing trade-in fields".into()));
        };
        let raw_id = item.product_id.as_deref().unwrap_or_default().trim();
        let product_id =
            Uuid::parse_str(raw_id).map_err(|_| CoreError::InvalidProductId(raw_id.to_string()))?;

        trade_ins.push(TradeInLine {
            product_id,
            quantity,
            trade_in_value,
            name: non_empty(item.name.as_deref()),
            cost_price,
            size: non_empty(item.size.as_deref()),
            condition,
        });
    }

    let items_sold = snapshot_cart(raw_cart, &cart);

    Ok(CheckoutInput {
        location_id,
        shop_id,
        payment_method,
        cashier_id,
        cart,
        trade_ins,
        car_plate_number: non_empty(request.car_plate_number.as_deref()),
        customer_id: non_empty(request.customer_id.as_deref()),
        items_sold,
    })
}

/// Location ids are stored as UUIDs; any other id names no location.
fn parse_location_id(raw: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CoreError::LocationNotFound(raw.to_string()))
}

/// The cart as the till sent it, with every line's resolved `source`.
fn snapshot_cart(raw_cart: Value, lines: &[CartLine]) -> Value {
    match raw_cart {
        Value::Array(mut items) => {
            for (item, line) in items.iter_mut().zip(lines) {
                if let Value::Object(fields) = item {
                    fields.insert("source".to_string(), Value::from(line.source.as_str()));
                }
            }
            Value::Array(items)
        }
        other => other,
    }
}

// =============================================================================
// Shape Errors
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Expected {
    Text,
    Number,
    List,
}

impl Expected {
    fn matches(self, value: &Value) -> bool {
        match self {
            _ if value.is_null() => true,
            Expected::Text => value.is_string(),
            Expected::Number => value.is_number(),
            Expected::List => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Expected::Text => "expected a string",
            Expected::Number => "expected a number",
            Expected::List => "expected an array",
        }
    }
}

const REQUEST_FIELDS: &[(&str, Expected)] = &[
    ("locationId", Expected::Text),
    ("shopId", Expected::Text),
    ("paymentMethod", Expected::Text),
    ("cashierId", Expected::Text),
    ("cart", Expected::List),
    ("tradeIns", Expected::List),
    ("carPlateNumber", Expected::Text),
    ("customerId", Expected::Text),
];

const CART_ITEM_FIELDS: &[(&str, Expected)] = &[
    ("productId", Expected::Text),
    ("quantity", Expected::Number),
    ("sellingPrice", Expected::Number),
    ("volumeDescription", Expected::Text),
    ("source", Expected::Text),
];

const TRADE_IN_FIELDS: &[(&str, Expected)] = &[
    ("productId", Expected::Text),
    ("quantity", Expected::Number),
    ("tradeInValue", Expected::Number),
    ("name", Expected::Text),
    ("costPrice", Expected::Number),
    ("size", Expected::Text),
    ("condition", Expected::Text),
];

/// Names every value whose JSON type does not match the wire types.
fn shape_errors(value: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_object(value, "body", None, REQUEST_FIELDS, &mut errors);

    for (list, fields) in [("cart", CART_ITEM_FIELDS), ("tradeIns", TRADE_IN_FIELDS)] {
        if let Some(Value::Array(items)) = value.get(list) {
            for (i, item) in items.iter().enumerate() {
                let path = format!("{list}[{i}]");
                check_object(item, &path, Some(&path), fields, &mut errors);
            }
        }
    }

    errors
}

fn check_object(
    value: &Value,
    name: &str,
    prefix: Option<&str>,
    fields: &[(&str, Expected)],
    errors: &mut Vec<ValidationError>,
) {
    let Some(object) = value.as_object() else {
        errors.push(ValidationError::InvalidFormat {
            field: name.to_string(),
            reason: "expected an object".to_string(),
        });
        return;
    };

    for (field, expected) in fields {
        match object.get(*field) {
            Some(v) if !expected.matches(v) => errors.push(ValidationError::InvalidFormat {
                field: match prefix {
                    Some(prefix) => format!("{prefix}.{field}"),
                    None => field.to_string(),
                },
                reason: expected.describe().to_string(),
            }),
            _ => {}
        }
    }
}

// =============================================================================
// Line Validators
// =============================================================================

fn validate_cart_item(
    item: &CartItemRequest,
    index: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<(Quantity, Money)> {
    let field = |name: &str| format!("cart[{index}].{name}");

    collect(errors, require_text(item.product_id.as_deref(), &field("productId")));
    let quantity = collect(errors, validate_quantity(item.quantity, &field("quantity")));
    let price = collect(errors, validate_amount(item.selling_price, &field("sellingPrice")));

    Some((quantity?, price?))
}

fn validate_trade_in(
    item: &TradeInRequest,
    index: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<(i64, Money, Option<Money>, Option<TradeInCondition>)> {
    let field = |name: &str| format!("tradeIns[{index}].{name}");

    collect(errors, require_text(item.product_id.as_deref(), &field("productId")));

    let quantity = collect(errors, validate_quantity(item.quantity, &field("quantity")))
        .and_then(|q| {
            let whole = q.whole_units();
            if whole.is_none() {
                errors.push(ValidationError::MustBeWhole {
                    field: field("quantity"),
                });
            }
            whole
        });

    let value = collect(errors, validate_amount(item.trade_in_value, &field("tradeInValue")));

    let cost_price = match item.cost_price {
        None => Some(None),
        Some(raw) => collect(errors, validate_amount(Some(raw), &field("costPrice"))).map(Some),
    };

    let condition = match non_empty(item.condition.as_deref()) {
        None => Some(None),
        Some(raw) => collect(errors, parse_condition(&raw, &field("condition"))).map(Some),
    };

    Some((quantity?, value?, cost_price?, condition?))
}

/// Classifies a cart line's product id.
///
/// ```rust
/// use garage_core::validation::parse_line_kind;
/// use garage_core::LineItemKind;
///
/// assert_eq!(parse_line_kind("9999").unwrap(), LineItemKind::ServiceCharge);
/// assert!(parse_line_kind("oil-5w30").is_err());
/// ```
pub fn parse_line_kind(raw: &str) -> CoreResult<LineItemKind> {
    let raw = raw.trim();
    if raw == SERVICE_CHARGE_PRODUCT_ID {
        return Ok(LineItemKind::ServiceCharge);
    }

    Uuid::parse_str(raw)
        .map(LineItemKind::InventoryProduct)
        .map_err(|_| CoreError::InvalidProductId(raw.to_string()))
}

/// Resolves the bottle source, defaulting to CLOSED when absent.
pub fn parse_source(raw: Option<&str>) -> CoreResult<BottleSource> {
    match raw.map(str::trim) {
        None | Some("") => Ok(BottleSource::Closed),
        Some(s) if s.eq_ignore_ascii_case("CLOSED") => Ok(BottleSource::Closed),
        Some(s) if s.eq_ignore_ascii_case("OPEN") => Ok(BottleSource::Open),
        Some(other) => Err(CoreError::InvalidSource(other.to_string())),
    }
}

fn parse_condition(raw: &str, field: &str) -> ValidationResult<TradeInCondition> {
    if raw.eq_ignore_ascii_case("scrap") {
        Ok(TradeInCondition::Scrap)
    } else if raw.eq_ignore_ascii_case("resalable") {
        Ok(TradeInCondition::Resalable)
    } else {
        Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be either 'Scrap' or 'Resalable'".to_string(),
        })
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required, non-blank string.
pub fn require_text(value: Option<&str>, field: &str) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

/// Validates a required, strictly positive quantity.
pub fn validate_quantity(value: Option<f64>, field: &str) -> ValidationResult<Quantity> {
    let raw = value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    let quantity = Quantity::from_decimal(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a finite number".to_string(),
    })?;

    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if quantity > Quantity::from_units(MAX_LINE_QUANTITY) {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_LINE_QUANTITY.to_string(),
        });
    }

    Ok(quantity)
}

/// Validates a required, non-negative amount of money.
pub fn validate_amount(value: Option<f64>, field: &str) -> ValidationResult<Money> {
    let raw = value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    let amount = Money::from_decimal(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a finite number".to_string(),
    })?;

    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if amount > Money::from_major(MAX_AMOUNT) {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_AMOUNT.to_string(),
        });
    }

    Ok(amount)
}

/// Validates the number of lines in the cart or trade-in list.
///
/// ## Rules
/// - Must not exceed [`MAX_CART_ITEMS`]
/// - Must not be empty when `required`
pub fn validate_cart_size(len: usize, field: &str, required: bool) -> ValidationResult<()> {
    if required && len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if len > MAX_CART_ITEMS {
        return Err(ValidationError::TooMany {
            field: field.to_string(),
            max: MAX_CART_ITEMS,
        });
    }

    Ok(())
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: ValidationResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const LOCATION: &str = "6f1c1f4e-4f8a-4a57-9a43-1d7b1c3e5a01";
    const PRODUCT: &str = "0b6d2f3a-2c1e-4d55-8f0a-5e9c7d1b2a44";

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "locationId": LOCATION,
            "paymentMethod": "cash",
            "cashierId": "cashier-1",
            "cart": [
                { "productId": PRODUCT, "quantity": 1, "sellingPrice": 10.5,
                  "volumeDescription": "4L" }
            ]
        })
    }

    #[test]
    fn test_valid_request() {
        let input = parse_checkout_request(&body(valid_body())).unwrap();

        assert_eq!(input.location_id.to_string(), LOCATION);
        assert_eq!(input.shop_id, input.location_id);
        assert_eq!(input.cart.len(), 1);
        assert_eq!(input.cart[0].selling_price.minor(), 10_500);
        assert_eq!(input.cart[0].quantity, Quantity::from_units(1));
        assert_eq!(input.cart[0].volume_description.as_deref(), Some("4L"));
        assert!(input.trade_ins.is_empty());
    }

    #[test]
    fn test_missing_source_defaults_to_closed_in_line_and_snapshot() {
        let input = parse_checkout_request(&body(valid_body())).unwrap();

        assert_eq!(input.cart[0].source, BottleSource::Closed);
        assert_eq!(input.items_sold[0]["source"], "CLOSED");
        assert_eq!(input.items_sold[0]["productId"], PRODUCT);
    }

    #[test]
    fn test_open_source() {
        let mut value = valid_body();
        value["cart"][0]["source"] = json!("OPEN");
        let input = parse_checkout_request(&body(value)).unwrap();
        assert_eq!(input.cart[0].source, BottleSource::Open);
    }

    #[test]
    fn test_unknown_source_is_business_logic_error() {
        let mut value = valid_body();
        value["cart"][0]["source"] = json!("HALF");
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert!(matches!(err, CoreError::InvalidSource(ref s) if s == "HALF"));
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);
    }

    #[test]
    fn test_non_uuid_product_id_is_rejected_with_the_id() {
        let mut value = valid_body();
        value["cart"][0]["productId"] = json!("not-a-uuid");
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert!(matches!(err, CoreError::InvalidProductId(ref id) if id == "not-a-uuid"));
        assert_eq!(err.error_type(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_service_charge_line() {
        let mut value = valid_body();
        value["cart"][0]["productId"] = json!("9999");
        let input = parse_checkout_request(&body(value)).unwrap();

        assert_eq!(input.cart[0].kind, LineItemKind::ServiceCharge);
        assert!(input.referenced_product_ids().is_empty());
    }

    #[test]
    fn test_collects_every_field_error() {
        let value = json!({
            "locationId": "branch-1",
            "cart": [{ "productId": PRODUCT, "quantity": 0, "sellingPrice": -1 }]
        });
        let err = parse_checkout_request(&body(value)).unwrap_err();
        let fields: Vec<&str> = err.validation_errors().iter().map(|e| e.field()).collect();

        assert_eq!(
            fields,
            vec![
                "paymentMethod",
                "cashierId",
                "cart[0].quantity",
                "cart[0].sellingPrice",
            ]
        );
    }

    #[test]
    fn test_missing_location_is_a_field_error() {
        let mut value = valid_body();
        value["locationId"] = json!("  ");
        let err = parse_checkout_request(&body(value)).unwrap_err();
        assert_eq!(err.validation_errors()[0].field(), "locationId");
    }

    #[test]
    fn test_non_uuid_location_is_not_found() {
        let mut value = valid_body();
        value["locationId"] = json!("branch-1");
        value["cart"][0]["productId"] = json!("not-a-uuid");
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert!(matches!(err, CoreError::LocationNotFound(ref id) if id == "branch-1"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.error_type(), "LOCATION_NOT_FOUND");
    }

    #[test]
    fn test_non_uuid_shop_is_not_found() {
        let mut value = valid_body();
        value["shopId"] = json!("shop-2");
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert!(matches!(err, CoreError::LocationNotFound(ref id) if id == "shop-2"));
    }

    #[test]
    fn test_wrong_value_types_are_reported_per_field() {
        let mut value = valid_body();
        value["cashierId"] = json!(7);
        value["cart"][0]["quantity"] = json!("2");
        value["tradeIns"] = json!([{ "productId": PRODUCT, "quantity": 1, "tradeInValue": [5] }]);
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert_eq!(
            err.validation_errors(),
            &[
                ValidationError::InvalidFormat {
                    field: "cashierId".to_string(),
                    reason: "expected a string".to_string(),
                },
                ValidationError::InvalidFormat {
                    field: "cart[0].quantity".to_string(),
                    reason: "expected a number".to_string(),
                },
                ValidationError::InvalidFormat {
                    field: "tradeIns[0].tradeInValue".to_string(),
                    reason: "expected a number".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_non_object_cart_line_is_reported_by_index() {
        let mut value = valid_body();
        value["cart"] = json!([value["cart"][0].clone(), "oil"]);
        let err = parse_checkout_request(&body(value)).unwrap_err();

        assert_eq!(err.validation_errors()[0].field(), "cart[1]");
    }

    #[test]
    fn test_snapshot_keeps_fields_the_till_sent() {
        let mut value = valid_body();
        value["cart"][0]["discountNote"] = json!("loyalty");
        value["cart"][0]["name"] = json!("Oil 5W-30");
        value["cart"][0]["source"] = json!("open");
        let input = parse_checkout_request(&body(value)).unwrap();

        assert_eq!(input.items_sold[0]["discountNote"], "loyalty");
        assert_eq!(input.items_sold[0]["name"], "Oil 5W-30");
        assert_eq!(input.items_sold[0]["volumeDescription"], "4L");
        assert_eq!(input.items_sold[0]["source"], "OPEN");
    }

    #[test]
    fn test_typed_request_snapshot_has_resolved_source() {
        let request = CheckoutRequest {
            location_id: Some(LOCATION.to_string()),
            payment_method: Some("cash".to_string()),
            cashier_id: Some("cashier-1".to_string()),
            cart: Some(vec![CartItemRequest {
                product_id: Some("9999".to_string()),
                quantity: Some(1.0),
                selling_price: Some(5.0),
                ..CartItemRequest::default()
            }]),
            ..CheckoutRequest::default()
        };
        let input = validate_checkout_request(request).unwrap();

        assert_eq!(input.items_sold[0]["productId"], "9999");
        assert_eq!(input.items_sold[0]["source"], "CLOSED");
    }

    #[test]
    fn test_quantity_and_amount_are_capped() {
        let mut value = valid_body();
        value["cart"][0]["quantity"] = json!(1e12);
        value["cart"][0]["sellingPrice"] = json!(9.0e15);
        let err = parse_checkout_request(&body(value)).unwrap_err();
        let fields: Vec<&str> = err.validation_errors().iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["cart[0].quantity", "cart[0].sellingPrice"]);
        assert!(err
            .validation_errors()
            .iter()
            .all(|e| matches!(e, ValidationError::TooLarge { .. })));

        assert!(validate_quantity(Some(MAX_LINE_QUANTITY as f64), "q").is_ok());
        assert!(validate_amount(Some(MAX_AMOUNT as f64), "a").is_ok());
        assert!(validate_amount(Some(MAX_AMOUNT as f64 + 0.001), "a").is_err());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let mut value = valid_body();
        value["cart"] = json!([]);
        let err = parse_checkout_request(&body(value)).unwrap_err();
        assert_eq!(err.validation_errors()[0].field(), "cart");
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_checkout_request(b"{not json").unwrap_err();
        assert_eq!(err.validation_errors()[0].field(), "body");

        let err = parse_checkout_request(&body(json!({ "cart": "everything" }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation_errors()[0].field(), "cart");

        let err = parse_checkout_request(b"[1, 2]").unwrap_err();
        assert_eq!(err.validation_errors()[0].field(), "body");
    }

    #[test]
    fn test_trade_in_quantity_must_be_whole() {
        let mut value = valid_body();
        value["tradeIns"] = json!([
            { "productId": PRODUCT, "quantity": 1.5, "tradeInValue": 2 }
        ]);
        let err = parse_checkout_request(&body(value)).unwrap_err();
        assert_eq!(
            err.validation_errors(),
            &[ValidationError::MustBeWhole {
                field: "tradeIns[0].quantity".to_string()
            }]
        );
    }

    #[test]
    fn test_trade_in_fields() {
        let mut value = valid_body();
        value["tradeIns"] = json!([{
            "productId": PRODUCT, "quantity": 1, "tradeInValue": 5,
            "name": "NS60 12V", "costPrice": 3.25, "size": "NS60", "condition": "resalable"
        }]);
        let input = parse_checkout_request(&body(value)).unwrap();
        let trade_in = &input.trade_ins[0];

        assert_eq!(trade_in.quantity, 1);
        assert_eq!(trade_in.trade_in_value.minor(), 5_000);
        assert_eq!(trade_in.cost_price, Some(Money::from_minor(3_250)));
        assert_eq!(trade_in.condition, Some(TradeInCondition::Resalable));
        assert_eq!(input.referenced_product_ids().len(), 1);
    }

    #[test]
    fn test_bad_trade_in_condition() {
        let mut value = valid_body();
        value["tradeIns"] = json!([
            { "productId": PRODUCT, "quantity": 1, "tradeInValue": 5, "condition": "Mint" }
        ]);
        let err = parse_checkout_request(&body(value)).unwrap_err();
        assert_eq!(err.validation_errors()[0].field(), "tradeIns[0].condition");
    }

    #[test]
    fn test_explicit_shop_and_optional_fields() {
        let mut value = valid_body();
        value["shopId"] = json!(PRODUCT);
        value["carPlateNumber"] = json!("  12345 AB ");
        value["customerId"] = json!("");
        let input = parse_checkout_request(&body(value)).unwrap();

        assert_eq!(input.shop_id.to_string(), PRODUCT);
        assert_ne!(input.shop_id, input.location_id);
        assert_eq!(input.car_plate_number.as_deref(), Some("12345 AB"));
        assert_eq!(input.customer_id, None);
    }

    #[test]
    fn test_cart_size_limit() {
        assert!(validate_cart_size(MAX_CART_ITEMS, "cart", true).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS + 1, "cart", true).is_err());
        assert!(validate_cart_size(0, "tradeIns", false).is_ok());
    }
}
