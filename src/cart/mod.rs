//! Shopping cart: a pure state machine, a store that persists it, and the
//! client flow that turns it into a checkout session and then an order.

pub mod checkout;
pub mod state;
pub mod storage;
pub mod store;

pub use checkout::{
    begin_checkout, complete_checkout, CheckoutError, CheckoutItem, HttpStorefrontClient,
    StorefrontApi,
};
pub use state::{apply, ActionKind, CartAction, CartItem, CartState, NewCartItem};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError, CART_STORAGE_KEY};
pub use store::{CartChange, CartStore};
