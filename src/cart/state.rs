//! Cart state machine.
//!
//! [`apply`] is the only way to move from one [`CartState`] to the next. The
//! totals are recomputed from the item list every time a state is built, so
//! they cannot drift from the items.

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkout::CheckoutItem;

/// One distinct product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique per insertion, not per product.
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub slug: String,
    pub quantity: u32,
}

/// Product fields supplied when adding to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub slug: String,
    /// Defaults to 1; anything below 1 is raised to 1.
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    LoadCart(Vec<CartItem>),
    AddItem(NewCartItem),
    RemoveItem { product_id: Uuid },
    UpdateQuantity { product_id: Uuid, quantity: i64 },
    ClearCart,
}

impl CartAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            CartAction::LoadCart(_) => ActionKind::LoadCart,
            CartAction::AddItem(_) => ActionKind::AddItem,
            CartAction::RemoveItem { .. } => ActionKind::RemoveItem,
            CartAction::UpdateQuantity { .. } => ActionKind::UpdateQuantity,
            CartAction::ClearCart => ActionKind::ClearCart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    LoadCart,
    AddItem,
    RemoveItem,
    UpdateQuantity,
    ClearCart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartState {
    items: Vec<CartItem>,
    total_items: u64,
    total_amount: BigDecimal,
}

impl Default for CartState {
    fn default() -> Self {
        Self::from_items(Vec::new())
    }
}

impl CartState {
    fn from_items(items: Vec<CartItem>) -> Self {
        let total_items = items.iter().map(|item| u64::from(item.quantity)).sum();
        let total_amount = items
            .iter()
            .map(|item| item.price.clone() * BigDecimal::from(item.quantity))
            .fold(BigDecimal::zero(), |acc, line| acc + line);
        Self {
            items,
            total_items,
            total_amount,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn total_amount(&self) -> &BigDecimal {
        &self.total_amount
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.find(product_id).is_some()
    }

    /// Quantity of `product_id` in the cart, 0 when absent.
    pub fn quantity_of(&self, product_id: Uuid) -> u32 {
        self.find(product_id).map_or(0, |item| item.quantity)
    }

    pub fn find(&self, product_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Lines in the shape the checkout endpoint expects.
    pub fn checkout_items(&self) -> Vec<CheckoutItem> {
        self.items.iter().map(CheckoutItem::from).collect()
    }
}

/// Pure transition function.
pub fn apply(state: &CartState, action: CartAction) -> CartState {
    match action {
        CartAction::LoadCart(items) => CartState::from_items(normalize(items)),

        CartAction::AddItem(new) => {
            if new.price < BigDecimal::zero() {
                return state.clone();
            }
            let quantity = clamp_quantity(new.quantity.unwrap_or(1).max(1));
            let mut items = state.items.clone();
            match items.iter_mut().find(|item| item.product_id == new.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                }
                None => items.push(CartItem {
                    id: Uuid::new_v4(),
                    product_id: new.product_id,
                    name: new.name,
                    price: new.price,
                    image_url: new.image_url,
                    slug: new.slug,
                    quantity,
                }),
            }
            CartState::from_items(items)
        }

        CartAction::RemoveItem { product_id } => remove(state, product_id),

        CartAction::UpdateQuantity {
            product_id,
            quantity,
        } => {
            if quantity <= 0 {
                return remove(state, product_id);
            }
            if !state.contains(product_id) {
                return state.clone();
            }
            let quantity = clamp_quantity(quantity);
            let items = state
                .items
                .iter()
                .cloned()
                .map(|mut item| {
                    if item.product_id == product_id {
                        item.quantity = quantity;
                    }
                    item
                })
                .collect();
            CartState::from_items(items)
        }

        CartAction::ClearCart => CartState::default(),
    }
}

fn remove(state: &CartState, product_id: Uuid) -> CartState {
    if !state.contains(product_id) {
        return state.clone();
    }
    let items = state
        .items
        .iter()
        .filter(|item| item.product_id != product_id)
        .cloned()
        .collect();
    CartState::from_items(items)
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity).unwrap_or(u32::MAX)
}

/// Drops lines that could never have been produced by a transition and folds
/// duplicate products into their first occurrence.
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut normalized: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 || item.price < BigDecimal::zero() {
            continue;
        }
        match normalized
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => normalized.push(item),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn product(product_id: Uuid, price: &str, quantity: Option<i64>) -> NewCartItem {
        NewCartItem {
            product_id,
            name: format!("Product {}", &product_id.simple().to_string()[..4]),
            price: dec(price),
            image_url: None,
            slug: "product".to_string(),
            quantity,
        }
    }

    fn add(state: &CartState, product_id: Uuid, price: &str, quantity: i64) -> CartState {
        apply(
            state,
            CartAction::AddItem(product(product_id, price, Some(quantity))),
        )
    }

    fn assert_totals_derived(state: &CartState) {
        let items: u64 = state.items().iter().map(|i| u64::from(i.quantity)).sum();
        let amount = state
            .items()
            .iter()
            .fold(BigDecimal::zero(), |acc, i| {
                acc + i.price.clone() * BigDecimal::from(i.quantity)
            });
        assert_eq!(state.total_items(), items);
        assert_eq!(state.total_amount(), &amount);
    }

    fn assert_unique(state: &CartState) {
        let ids: HashSet<Uuid> = state.items().iter().map(|i| i.product_id).collect();
        assert_eq!(ids.len(), state.items().len(), "duplicate product lines");
    }

    #[test]
    fn adding_to_existing_line_merges_quantities() {
        let a = Uuid::new_v4();
        let state = add(&CartState::default(), a, "10", 1);

        let state = add(&state, a, "10", 2);

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(a), 3);
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_amount(), &dec("30"));
    }

    #[test]
    fn repeated_adds_sum_to_one_line() {
        let a = Uuid::new_v4();
        let quantities = [1, 4, 2, 7];
        let state = quantities
            .iter()
            .fold(CartState::default(), |s, q| add(&s, a, "2.50", *q));

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(a), 14);
        assert_eq!(state.total_amount(), &dec("35.00"));
    }

    #[test]
    fn add_defaults_quantity_to_one_and_clamps_non_positive() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let state = apply(&CartState::default(), CartAction::AddItem(product(a, "1", None)));
        let state = add(&state, b, "1", 0);
        let state = add(&state, c, "1", -3);

        assert_eq!(state.quantity_of(a), 1);
        assert_eq!(state.quantity_of(b), 1);
        assert_eq!(state.quantity_of(c), 1);
    }

    #[test]
    fn new_lines_get_distinct_ids_and_keep_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let state = add(&add(&CartState::default(), a, "1", 1), b, "1", 1);

        assert_eq!(state.items()[0].product_id, a);
        assert_eq!(state.items()[1].product_id, b);
        assert_ne!(state.items()[0].id, state.items()[1].id);
    }

    #[test]
    fn negative_price_add_is_ignored() {
        let state = add(&CartState::default(), Uuid::new_v4(), "-1.00", 1);
        assert!(state.is_empty());
    }

    #[test]
    fn removing_absent_product_is_a_no_op() {
        let state = apply(
            &CartState::default(),
            CartAction::RemoveItem {
                product_id: Uuid::new_v4(),
            },
        );
        assert_eq!(state, CartState::default());
    }

    #[test]
    fn update_to_zero_or_negative_equals_remove() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let state = add(&add(&CartState::default(), a, "3", 2), b, "4", 1);

        let removed = apply(&state, CartAction::RemoveItem { product_id: a });
        for quantity in [0, -5] {
            let updated = apply(
                &state,
                CartAction::UpdateQuantity {
                    product_id: a,
                    quantity,
                },
            );
            assert_eq!(updated, removed);
        }
        assert!(!removed.contains(a));
        assert_eq!(removed.total_amount(), &dec("4"));
    }

    #[test]
    fn update_sets_quantity_instead_of_incrementing() {
        let a = Uuid::new_v4();
        let state = add(&CartState::default(), a, "1.25", 3);

        let state = apply(
            &state,
            CartAction::UpdateQuantity {
                product_id: a,
                quantity: 5,
            },
        );

        assert_eq!(state.quantity_of(a), 5);
        assert_eq!(state.total_amount(), &dec("6.25"));
    }

    #[test]
    fn update_of_absent_product_is_a_no_op() {
        let a = Uuid::new_v4();
        let state = add(&CartState::default(), a, "1", 1);

        let updated = apply(
            &state,
            CartAction::UpdateQuantity {
                product_id: Uuid::new_v4(),
                quantity: 9,
            },
        );
        assert_eq!(updated, state);
    }

    #[test]
    fn clear_is_idempotent() {
        let state = add(&CartState::default(), Uuid::new_v4(), "1", 1);

        let once = apply(&state, CartAction::ClearCart);
        let twice = apply(&once, CartAction::ClearCart);

        assert_eq!(once, CartState::default());
        assert_eq!(twice, once);
        assert_eq!(twice.total_amount(), &BigDecimal::zero());
    }

    #[test]
    fn load_replaces_items_and_normalizes() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let line = |product_id, quantity, price: &str| CartItem {
            id: Uuid::new_v4(),
            product_id,
            name: "x".to_string(),
            price: dec(price),
            image_url: None,
            slug: "x".to_string(),
            quantity,
        };
        let existing = add(&CartState::default(), Uuid::new_v4(), "1", 1);

        let state = apply(
            &existing,
            CartAction::LoadCart(vec![
                line(a, 2, "1.50"),
                line(b, 0, "9.99"),
                line(a, 1, "1.50"),
                line(c, 1, "-2"),
            ]),
        );

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.quantity_of(a), 3);
        assert_eq!(state.total_amount(), &dec("4.50"));
    }

    #[test]
    fn invariants_hold_across_a_mixed_action_sequence() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let prices = ["0.99", "12.00", "3.33", "7.5"];
        let mut state = CartState::default();

        for step in 0..60usize {
            let id = ids[step % ids.len()];
            let action = match step % 7 {
                0 | 3 => CartAction::AddItem(product(id, prices[step % 4], Some((step % 5) as i64))),
                1 => CartAction::UpdateQuantity {
                    product_id: id,
                    quantity: (step as i64 % 6) - 2,
                },
                2 => CartAction::AddItem(product(id, prices[step % 4], None)),
                4 => CartAction::RemoveItem { product_id: id },
                5 => CartAction::UpdateQuantity {
                    product_id: ids[(step + 1) % ids.len()],
                    quantity: 4,
                },
                _ if step % 20 == 6 => CartAction::ClearCart,
                _ => CartAction::AddItem(product(id, prices[step % 4], Some(2))),
            };
            state = apply(&state, action);

            assert_unique(&state);
            assert_totals_derived(&state);
            assert!(state.items().iter().all(|i| i.quantity > 0));
        }
    }

    #[test]
    fn checkout_items_carry_name_price_quantity_and_image() {
        let a = Uuid::new_v4();
        let mut new = product(a, "9.99", Some(2));
        new.image_url = Some("https://cdn.example.com/a.png".to_string());
        let state = apply(&CartState::default(), CartAction::AddItem(new.clone()));

        let items = state.checkout_items();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, new.name);
        assert_eq!(items[0].price, dec("9.99"));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }
}
