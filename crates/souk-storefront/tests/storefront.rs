//! End-to-end tests for the storefront operation surface, over a real
//! (in-memory or temp-file) SQLite database.

use souk_core::{Principal, Product};
use souk_db::{Database, DbConfig, NewProduct};
use souk_storefront::{ErrorCode, Storefront};

async fn storefront() -> Storefront {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Storefront::new(db)
}

async fn seed_product(
    shop: &Storefront,
    owner_id: i64,
    name: &str,
    price: &str,
    stock: i64,
) -> Product {
    shop.db()
        .products()
        .insert(&NewProduct {
            owner_id,
            name: name.to_string(),
            price: price.parse().unwrap(),
            stock,
            is_active: true,
        })
        .await
        .unwrap()
}

const SELLER: i64 = 900;

#[tokio::test]
async fn full_purchase_flow() {
    let shop = storefront().await;
    let rug = seed_product(&shop, SELLER, "Berber Rug", "249.00", 4).await;
    let lamp = seed_product(&shop, SELLER, "Brass Lamp", "89.99", 12).await;

    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    let m = shop
        .cart_add(&session, &buyer, rug.id, Some(2))
        .await
        .unwrap();
    assert_eq!(m.quantity, Some(2));
    assert_eq!(m.line_total.unwrap().to_string(), "498.00");

    shop.cart_add(&session, &buyer, lamp.id, None).await.unwrap();
    let m = shop.cart_increment(&session, &buyer, lamp.id).await.unwrap();
    assert_eq!(m.quantity, Some(2));
    assert_eq!(m.cart_count, 4);

    let view = shop.cart_view(&session, &buyer).await.unwrap();
    assert_eq!(view.lines.len(), 2);
    assert!(!view.expired);
    assert!(view.dropped.is_empty());
    // 2 × 249.00 + 2 × 89.99
    assert_eq!(view.total.to_string(), "677.98");

    let receipt = shop.checkout_submit(&session, &buyer).await.unwrap();
    assert!(receipt.order.is_paid);
    assert_eq!(receipt.order.total_amount.to_string(), "677.98");
    assert_eq!(receipt.lines.len(), 2);

    // The committed checkout cleared the cart.
    let view = shop.cart_view(&session, &buyer).await.unwrap();
    assert!(view.lines.is_empty());
    assert_eq!(view.total_units, 0);

    // Stock moved exactly once per unit.
    assert_eq!(shop.db().checkout().stock_of(rug.id).await.unwrap(), 2);
    assert_eq!(shop.db().checkout().stock_of(lamp.id).await.unwrap(), 10);

    // The buyer (and staff) can read the order back; strangers cannot.
    let detail = shop.order_view(&buyer, receipt.order.id).await.unwrap();
    assert_eq!(detail.lines.len(), 2);
    shop.order_view(&Principal::staff(1), receipt.order.id)
        .await
        .unwrap();
    let err = shop
        .order_view(&Principal::customer(8), receipt.order.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let orders = shop.order_list(&buyer, 10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, receipt.order.id);
}

#[tokio::test]
async fn add_unknown_or_inactive_product_is_not_found() {
    let shop = storefront().await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    let err = shop
        .cart_add(&session, &buyer, 9999, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let hidden = seed_product(&shop, SELLER, "Hidden", "5.00", 5).await;
    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
        .bind(hidden.id)
        .execute(shop.db().pool())
        .await
        .unwrap();

    let err = shop
        .cart_add(&session, &buyer, hidden.id, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn sellers_cannot_buy_their_own_products() {
    let shop = storefront().await;
    let own = seed_product(&shop, 7, "My Own Rug", "99.00", 5).await;
    let seller = Principal::seller(7);
    let session = shop.sessions().create();

    let err = shop
        .cart_add(&session, &seller, own.id, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SelfPurchase);
}

#[tokio::test]
async fn update_clamps_to_stock_with_a_warning() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(2)).await.unwrap();

    let m = shop
        .cart_update(&session, &buyer, pot.id, 20)
        .await
        .unwrap();
    assert_eq!(m.quantity, Some(10));
    assert!(m.warning.as_deref().unwrap().contains("10"));

    let view = shop.cart_view(&session, &buyer).await.unwrap();
    assert_eq!(view.lines[0].quantity, 10);
}

#[tokio::test]
async fn update_to_zero_removes_without_catalog_lookup() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(2)).await.unwrap();

    let m = shop.cart_update(&session, &buyer, pot.id, 0).await.unwrap();
    assert!(m.removed);
    assert_eq!(m.cart_count, 0);

    // Idempotent: updating an absent line to ≤ 0 still succeeds.
    let m = shop.cart_update(&session, &buyer, pot.id, -3).await.unwrap();
    assert!(m.removed);
}

#[tokio::test]
async fn remove_distinguishes_absent_lines() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(1)).await.unwrap();

    let m = shop.cart_remove(&session, pot.id).await.unwrap();
    assert!(m.removed);

    let err = shop.cart_remove(&session, pot.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInCart);
}

#[tokio::test]
async fn decrement_to_zero_removes_the_line() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(1)).await.unwrap();

    let m = shop.cart_decrement(&session, pot.id).await.unwrap();
    assert!(m.removed);

    let err = shop.cart_decrement(&session, pot.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInCart);
}

#[tokio::test]
async fn empty_cart_checkout_creates_no_order() {
    let shop = storefront().await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    let err = shop.checkout_submit(&session, &buyer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyCart);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(shop.db().pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn fully_invalid_cart_checkout_creates_no_order() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(2)).await.unwrap();

    // The product vanishes from the catalog before submit; sanitation
    // drops the only line and checkout reports EmptyCart.
    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
        .bind(pot.id)
        .execute(shop.db().pool())
        .await
        .unwrap();

    let err = shop.checkout_submit(&session, &buyer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyCart);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(shop.db().pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn expired_cart_is_cleared_and_surfaced_once() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    // A cart aged well past the 24h TTL, via the wire format.
    let stale = format!(
        r#"{{"cart":{{"{}":2}},"cart_created_at":"2020-01-01T00:00:00Z"}}"#,
        pot.id
    );
    shop.sessions().import(&session, &stale).unwrap();

    let err = shop
        .cart_add(&session, &buyer, pot.id, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CartExpired);

    // Surfaced once: the cart is now fresh and empty, so the retry works.
    let m = shop
        .cart_add(&session, &buyer, pot.id, Some(1))
        .await
        .unwrap();
    assert_eq!(m.quantity, Some(1));
    assert_eq!(m.cart_count, 1);
}

#[tokio::test]
async fn expired_cart_blocks_checkout_once() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    let stale = format!(
        r#"{{"cart":{{"{}":2}},"cart_created_at":"2020-01-01T00:00:00Z"}}"#,
        pot.id
    );
    shop.sessions().import(&session, &stale).unwrap();

    let err = shop.checkout_submit(&session, &buyer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CartExpired);

    // The expired lines are gone, so the next submit sees an empty cart.
    let err = shop.checkout_submit(&session, &buyer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyCart);
}

#[tokio::test]
async fn view_reports_sanitation_as_one_aggregated_notice() {
    let shop = storefront().await;
    let kept = seed_product(&shop, SELLER, "Kept", "10.00", 10).await;
    let doomed = seed_product(&shop, SELLER, "Doomed", "10.00", 10).await;
    let shrunk = seed_product(&shop, SELLER, "Shrunk", "10.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, kept.id, Some(1)).await.unwrap();
    shop.cart_add(&session, &buyer, doomed.id, Some(2)).await.unwrap();
    shop.cart_add(&session, &buyer, shrunk.id, Some(5)).await.unwrap();

    // The catalog shifts under the cart.
    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
        .bind(doomed.id)
        .execute(shop.db().pool())
        .await
        .unwrap();
    sqlx::query("UPDATE products SET stock = 3 WHERE id = ?1")
        .bind(shrunk.id)
        .execute(shop.db().pool())
        .await
        .unwrap();

    let view = shop.cart_view(&session, &buyer).await.unwrap();
    assert_eq!(view.dropped, vec![doomed.id]);
    assert_eq!(view.clamped, vec![(shrunk.id, 3)]);
    assert_eq!(view.lines.len(), 2);
    assert_eq!(view.total.to_string(), "40.00");

    // Self-healing: a second view is already clean.
    let view = shop.cart_view(&session, &buyer).await.unwrap();
    assert!(view.dropped.is_empty());
    assert!(view.clamped.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submits_one_wins_loser_keeps_cart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("souk-storefront-test.db");
    let db = Database::new(DbConfig::new(&path).max_connections(4))
        .await
        .unwrap();
    let shop = Storefront::new(db);

    let rug = seed_product(&shop, SELLER, "Rug", "249.00", 5).await;

    let alice = Principal::customer(10);
    let bob = Principal::customer(11);
    let session_a = shop.sessions().create();
    let session_b = shop.sessions().create();

    shop.cart_add(&session_a, &alice, rug.id, Some(3)).await.unwrap();
    shop.cart_add(&session_b, &bob, rug.id, Some(3)).await.unwrap();

    let shop_a = shop.clone();
    let shop_b = shop.clone();
    let sa = session_a.clone();
    let sb = session_b.clone();

    let a = tokio::spawn(async move { shop_a.checkout_submit(&sa, &alice).await });
    let b = tokio::spawn(async move { shop_b.checkout_submit(&sb, &bob).await });

    let results = [a.await.unwrap(), b.await.unwrap()];

    // Interleaving decides the loser's fate: if both sanitized before
    // either committed, the loser aborts with InsufficientStock and keeps
    // its cart; if the loser sanitized after the winner's commit, its cart
    // was clamped to the remaining stock and it also commits. Both ways,
    // units sold never exceed the 5 in stock and stock never goes negative.
    assert!(results.iter().any(|r| r.is_ok()));

    let sold: i64 = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|receipt| receipt.lines[0].quantity)
        .sum();
    assert!(sold <= 5);

    let stock = shop.db().checkout().stock_of(rug.id).await.unwrap();
    assert_eq!(stock, 5 - sold);
    assert!(stock >= 0);

    if let Some(err) = results.iter().find_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::Aborted);

        // The aborted submit left its cart untouched for correction.
        let loser_session = if results[0].is_ok() { &session_b } else { &session_a };
        let qty = shop
            .sessions()
            .with_cart(loser_session, |c| c.quantity(rug.id));
        assert_eq!(qty, Some(3));
    }

    shop.db().close().await;
}

#[tokio::test]
async fn line_status_update_is_gated_and_validated() {
    let shop = storefront().await;
    let pot = seed_product(&shop, SELLER, "Tagine Pot", "64.00", 10).await;
    let buyer = Principal::customer(7);
    let session = shop.sessions().create();

    shop.cart_add(&session, &buyer, pot.id, Some(1)).await.unwrap();
    let receipt = shop.checkout_submit(&session, &buyer).await.unwrap();
    let line_id = receipt.lines[0].id;

    // The buyer is neither staff nor the owning seller.
    let err = shop
        .order_line_update_status(&buyer, line_id, "shipped")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);

    // Unknown status values are rejected before any lookup.
    let err = shop
        .order_line_update_status(&Principal::staff(1), line_id, "teleported")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStatus);

    // The owning seller may move the line through its lifecycle.
    let owner = Principal::seller(SELLER);
    let line = shop
        .order_line_update_status(&owner, line_id, "shipped")
        .await
        .unwrap();
    assert_eq!(line.status.as_str(), "shipped");

    // Staff may as well; quantity and price snapshot stay frozen.
    let line = shop
        .order_line_update_status(&Principal::staff(1), line_id, "delivered")
        .await
        .unwrap();
    assert_eq!(line.status.as_str(), "delivered");
    assert_eq!(line.quantity, 1);
    assert_eq!(line.price_at_purchase.to_string(), "64.00");

    // Absent lines are NotFound.
    let err = shop
        .order_line_update_status(&Principal::staff(1), 424242, "shipped")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}
