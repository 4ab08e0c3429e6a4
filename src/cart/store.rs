use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::state::{apply, ActionKind, CartAction, CartItem, CartState, NewCartItem};
use super::storage::{CartStorage, StorageError, CART_STORAGE_KEY};

/// Delivered to subscribers after every dispatched action.
#[derive(Debug)]
pub struct CartChange<'a> {
    pub kind: ActionKind,
    pub state: &'a CartState,
    /// Short message suitable for a toast, when the action warrants one.
    pub notice: Option<String>,
}

type Subscriber = Box<dyn FnMut(&CartChange<'_>) + Send>;

/// Owns the cart state and keeps its storage slot in sync with it.
pub struct CartStore {
    state: CartState,
    storage: Box<dyn CartStorage>,
    subscribers: Vec<Subscriber>,
}

impl CartStore {
    /// Hydrates from storage once. Missing or unreadable data yields an empty cart.
    pub fn open(storage: Box<dyn CartStorage>) -> Self {
        let mut store = Self {
            state: CartState::default(),
            storage,
            subscribers: Vec::new(),
        };
        let items = match store.load() {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Discarding stored cart: {e}");
                Vec::new()
            }
        };
        store.state = apply(&store.state, CartAction::LoadCart(items));
        store
    }

    fn load(&self) -> Result<Vec<CartItem>, StorageError> {
        match self.storage.read(CART_STORAGE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&CartChange<'_>) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn dispatch(&mut self, action: CartAction) -> &CartState {
        let kind = action.kind();
        let notice = self.notice_for(&action);
        let next = apply(&self.state, action);

        if next.items() != self.state.items() {
            if let Err(e) = self.persist(&next) {
                log::error!("Failed to persist cart: {e}");
            }
        }
        self.state = next;

        let change = CartChange {
            kind,
            state: &self.state,
            notice,
        };
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&change);
        }
        &self.state
    }

    fn persist(&self, state: &CartState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state.items())?;
        self.storage.write(CART_STORAGE_KEY, &json)
    }

    fn notice_for(&self, action: &CartAction) -> Option<String> {
        let removed = |product_id: Uuid| {
            self.state
                .find(product_id)
                .map(|item| format!("{} removed from cart", item.name))
        };
        match action {
            CartAction::AddItem(new) if new.price >= BigDecimal::zero() => {
                Some(format!("{} added to cart", new.name))
            }
            CartAction::RemoveItem { product_id } => removed(*product_id),
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            } if *quantity <= 0 => removed(*product_id),
            CartAction::ClearCart => Some("Cart cleared".to_string()),
            _ => None,
        }
    }

    pub fn add_item(&mut self, item: NewCartItem) -> &CartState {
        self.dispatch(CartAction::AddItem(item))
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> &CartState {
        self.dispatch(CartAction::RemoveItem { product_id })
    }

    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) -> &CartState {
        self.dispatch(CartAction::UpdateQuantity {
            product_id,
            quantity,
        })
    }

    pub fn clear(&mut self) -> &CartState {
        self.dispatch(CartAction::ClearCart)
    }
}
