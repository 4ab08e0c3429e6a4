use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{run_blocking, DbPool};
use crate::domain::errors::DomainError;
use crate::domain::order::{Insertion, NewOrder, OrderItemView, OrderView};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let order = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?;

            order.map(|row| load_order(conn, row)).transpose()
        })
        .await
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<OrderView>, DomainError> {
        let payment_id = payment_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let order = orders::table
                .filter(orders::stripe_payment_id.eq(&payment_id))
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?;

            order.map(|row| load_order(conn, row)).transpose()
        })
        .await
    }

    async fn insert(&self, order: NewOrder) -> Result<Insertion, DomainError> {
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                // 1. Claim the payment id. The unique constraint turns a
                //    concurrent duplicate into a no-op instead of a second order.
                let order_id = order.id;
                let inserted = diesel::insert_into(orders::table)
                    .values(&NewOrderRow {
                        id: order_id,
                        order_number: order.order_number.clone(),
                        status: order.status.as_str().to_string(),
                        total_amount: order.total_amount.clone(),
                        stripe_payment_id: order.stripe_payment_id.clone(),
                        customer_email: order.customer_email.clone(),
                        customer_name: order.customer_name.clone(),
                    })
                    .on_conflict(orders::stripe_payment_id)
                    .do_nothing()
                    .execute(conn)?;

                if inserted == 0 {
                    let existing = orders::table
                        .filter(orders::stripe_payment_id.eq(&order.stripe_payment_id))
                        .select(OrderRow::as_select())
                        .first(conn)?;
                    return Ok(Insertion::AlreadyExists(load_order(conn, existing)?));
                }

                // 2. Insert the purchased lines
                let new_items: Vec<NewOrderItemRow> = order
                    .items
                    .iter()
                    .zip(0..)
                    .map(|(item, position)| NewOrderItemRow {
                        id: Uuid::new_v4(),
                        order_id,
                        product_id: item.product_id,
                        position,
                        quantity: item.quantity,
                        price: item.price.clone(),
                    })
                    .collect();
                if !new_items.is_empty() {
                    diesel::insert_into(order_items::table)
                        .values(&new_items)
                        .execute(conn)?;
                }

                let created = orders::table
                    .find(order_id)
                    .select(OrderRow::as_select())
                    .first(conn)?;
                Ok(Insertion::Created(load_order(conn, created)?))
            })
        })
        .await
    }
}

fn load_order(conn: &mut PgConnection, order: OrderRow) -> Result<OrderView, DomainError> {
    let items = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq(order.id))
        .order(order_items::position.asc())
        .select((
            OrderItemRow::as_select(),
            products::name,
            products::download_url,
        ))
        .load::<(OrderItemRow, String, Option<String>)>(conn)?;

    Ok(OrderView {
        id: order.id,
        order_number: order.order_number,
        status: order.status.parse()?,
        total_amount: order.total_amount,
        stripe_payment_id: order.stripe_payment_id,
        customer_email: order.customer_email,
        customer_name: order.customer_name,
        created_at: order.created_at,
        items: items
            .into_iter()
            .map(|(item, product_name, download_url)| OrderItemView {
                id: item.id,
                product_id: item.product_id,
                product_name,
                download_url,
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::domain::order::{generate_order_number, Insertion, NewOrder, NewOrderItem, OrderStatus};
    use crate::domain::ports::{OrderRepository, ProductCatalog};
    use crate::domain::product::{NewProduct, Product, ProductStatus};
    use crate::infrastructure::product_repo::DieselProductCatalog;
    use crate::infrastructure::test_db::setup_db;
    use crate::schema::{order_items, orders};

    async fn seed_product(catalog: &DieselProductCatalog, name: &str) -> Product {
        catalog
            .create(NewProduct {
                name: name.to_string(),
                description: None,
                price: BigDecimal::from_str("19.99").expect("valid decimal"),
                image_url: None,
                download_url: Some(format!("https://cdn.example.com/{name}.zip")),
                category: None,
                status: ProductStatus::Published,
            })
            .await
            .expect("seed product")
    }

    fn make_order(payment_id: &str, product: &Product) -> NewOrder {
        let id = Uuid::new_v4();
        NewOrder {
            id,
            order_number: generate_order_number(Utc::now(), id),
            status: OrderStatus::Paid,
            total_amount: BigDecimal::from_str("39.98").expect("valid decimal"),
            stripe_payment_id: payment_id.to_string(),
            customer_email: "buyer@example.com".to_string(),
            customer_name: Some("Ada Buyer".to_string()),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 2,
                price: BigDecimal::from_str("19.99").expect("valid decimal"),
            }],
        }
    }

    #[tokio::test]
    async fn insert_and_find_by_payment_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselProductCatalog::new(pool.clone());
        let product = seed_product(&catalog, "Icon Pack").await;
        let repo = DieselOrderRepository::new(pool);

        let new_order = make_order("cs_test_1", &product);
        let assigned_id = new_order.id;
        let created = match repo
            .insert(new_order)
            .await
            .expect("insert failed")
        {
            Insertion::Created(order) => order,
            other => panic!("expected Created, got {other:?}"),
        };

        let found = repo
            .find_by_payment_id("cs_test_1")
            .await
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(created.id, assigned_id);
        assert_eq!(found.id, created.id);
        assert_eq!(found.status, OrderStatus::Paid);
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].product_name, "Icon Pack");
        assert_eq!(
            found.items[0].download_url.as_deref(),
            Some("https://cdn.example.com/Icon Pack.zip")
        );
        assert_eq!(found.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn duplicate_payment_id_returns_existing_order() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselProductCatalog::new(pool.clone());
        let product = seed_product(&catalog, "Fonts").await;
        let repo = DieselOrderRepository::new(pool.clone());

        let first = repo
            .insert(make_order("cs_test_dup", &product))
            .await
            .expect("first insert");
        let second = repo
            .insert(make_order("cs_test_dup", &product))
            .await
            .expect("second insert");

        let (Insertion::Created(a), Insertion::AlreadyExists(b)) = (first, second) else {
            panic!("expected Created then AlreadyExists");
        };
        assert_eq!(a.id, b.id);

        let mut conn = pool.get().expect("Failed to get connection");
        let orders: i64 = orders::table.count().get_result(&mut conn).expect("count");
        let items: i64 = order_items::table.count().get_result(&mut conn).expect("count");
        assert_eq!(orders, 1, "exactly one order per payment id");
        assert_eq!(items, 1, "duplicate insert must not add lines");
    }

    #[tokio::test]
    async fn concurrent_inserts_create_one_order() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselProductCatalog::new(pool.clone());
        let product = seed_product(&catalog, "Brushes").await;
        let repo = Arc::new(DieselOrderRepository::new(pool.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                let order = make_order("cs_test_race", &product);
                tokio::spawn(async move { repo.insert(order).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let insertion = handle.await.expect("join").expect("insert");
            ids.push(match insertion {
                Insertion::Created(o) | Insertion::AlreadyExists(o) => o.id,
            });
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let mut conn = pool.get().expect("Failed to get connection");
        let orders: i64 = orders::table.count().get_result(&mut conn).expect("count");
        assert_eq!(orders, 1);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo
            .find_by_id(Uuid::new_v4())
            .await
            .expect("find should not error");

        assert!(result.is_none());
    }
}
