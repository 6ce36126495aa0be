mod support;

use chrono::{Duration, Utc};
use ofe_common::Money;
use order_flow_engine::{db_types::OrderStatusType, CreateOrderRequest, OrderDatabase, OrderFlowError, OrderQueryFilter};
use support::*;

#[tokio::test]
async fn creating_an_order_prices_the_cart_server_side() {
    let mut harness = new_harness().await;
    let (order, items) = harness.api.create_order(&customer(7), &burger_order(7)).await.unwrap();

    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.customer_id, 7);
    assert_eq!(order.restaurant_name, "Mama's Kitchen");
    // 2 x $15.99 + $5.99, computed from catalog prices, not the request
    assert_eq!(order.total_amount, Money::from_cents(3797));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].menu_item_name, "Burger");
    assert_eq!(items[0].unit_price, Money::from_cents(1599));
    assert_eq!(items[0].special_instructions.as_deref(), Some("No onion"));
    assert_eq!(items[1].menu_item_name, "Chips");
    // a fresh order carries the 45 minute estimate
    let eta = order.estimated_delivery_time.expect("new orders must carry an estimate");
    assert!(eta > Utc::now() + Duration::minutes(44) && eta < Utc::now() + Duration::minutes(46));

    let events = harness.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "ORDER_PLACED");
    assert_eq!(events[0].order_id, order.id);
    assert_eq!(events[0].total_amount, Money::from_cents(3797));
    assert_eq!(events[0].items.len(), 2);
}

#[tokio::test]
async fn invalid_carts_never_touch_the_store() {
    let mut harness = new_harness().await;
    let caller = customer(7);

    let mut empty = burger_order(7);
    empty.items.clear();
    assert!(matches!(harness.api.create_order(&caller, &empty).await, Err(OrderFlowError::InvalidItem(_))));

    let mut unknown_restaurant = burger_order(7);
    unknown_restaurant.restaurant_id = 404;
    assert!(matches!(
        harness.api.create_order(&caller, &unknown_restaurant).await,
        Err(OrderFlowError::NotFound(_))
    ));

    let mut foreign_item = burger_order(7);
    foreign_item.items[0].menu_item_id = SASHIMI;
    assert!(matches!(harness.api.create_order(&caller, &foreign_item).await, Err(OrderFlowError::InvalidItem(_))));

    let mut zero_quantity = burger_order(7);
    zero_quantity.items[0].quantity = 0;
    assert!(matches!(harness.api.create_order(&caller, &zero_quantity).await, Err(OrderFlowError::InvalidItem(_))));

    let orders = harness.api.orders_for_customer(&admin(), 7, None).await.unwrap();
    assert!(orders.is_empty(), "a rejected cart must not leave rows behind");
    assert!(harness.drain_events().is_empty(), "a rejected cart must not emit events");
}

#[tokio::test]
async fn orders_move_forward_through_the_lifecycle() {
    let mut harness = new_harness().await;
    let (order, _) = harness.api.create_order(&customer(7), &burger_order(7)).await.unwrap();
    let chef = owner(MAMAS_OWNER);

    let confirmed = harness.api.update_order_status(&chef, order.id, OrderStatusType::Confirmed).await.unwrap();
    // confirming does not touch the estimate
    assert_eq!(confirmed.estimated_delivery_time, order.estimated_delivery_time);

    let preparing = harness.api.update_order_status(&chef, order.id, OrderStatusType::Preparing).await.unwrap();
    let eta = preparing.estimated_delivery_time.unwrap();
    assert!(eta > Utc::now() + Duration::minutes(29) && eta < Utc::now() + Duration::minutes(31));

    let ready = harness.api.update_order_status(&chef, order.id, OrderStatusType::ReadyForPickup).await.unwrap();
    assert_eq!(ready.estimated_delivery_time, preparing.estimated_delivery_time);

    let delivered = harness.api.update_order_status(&chef, order.id, OrderStatusType::Delivered).await.unwrap();
    assert_eq!(delivered.status, OrderStatusType::Delivered);

    let events = harness.drain_events();
    assert_eq!(events.len(), 5, "exactly one event per committed write");
    assert_eq!(events[0].event_type, "ORDER_PLACED");
    assert!(events[1..].iter().all(|e| e.event_type == "ORDER_STATUS_UPDATED"));
    assert_eq!(events[4].status, OrderStatusType::Delivered);
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let mut harness = new_harness().await;
    let (order, _) = harness.api.create_order(&customer(7), &burger_order(7)).await.unwrap();
    harness.drain_events();

    // skipping ahead is not allowed
    let err = harness.api.update_order_status(&admin(), order.id, OrderStatusType::Delivered).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition {
        from: OrderStatusType::Pending,
        to: OrderStatusType::Delivered
    }));
    // and neither is moving backwards
    harness.api.update_order_status(&admin(), order.id, OrderStatusType::Confirmed).await.unwrap();
    let err = harness.api.update_order_status(&admin(), order.id, OrderStatusType::Pending).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { .. }));

    // a delivered order is terminal
    for status in [OrderStatusType::Preparing, OrderStatusType::OutForDelivery, OrderStatusType::Delivered] {
        harness.api.update_order_status(&admin(), order.id, status).await.unwrap();
    }
    let err = harness.api.update_order_status(&admin(), order.id, OrderStatusType::Cancelled).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition {
        from: OrderStatusType::Delivered,
        to: OrderStatusType::Cancelled
    }));

    let (stored, _) = harness.api.fetch_order(&admin(), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::Delivered);
}

#[tokio::test]
async fn racing_status_writes_leave_exactly_one_winner() {
    let mut harness = new_harness().await;
    let (order, _) = harness.api.create_order(&customer(7), &burger_order(7)).await.unwrap();
    harness.drain_events();

    // two writers both try PENDING -> CONFIRMED; the loser must re-read the fresh state and re-validate,
    // surfacing the now-illegal CONFIRMED -> CONFIRMED edge
    let admin_actor = admin();
    let owner_actor = owner(MAMAS_OWNER);
    let first = harness.api.update_order_status(&admin_actor, order.id, OrderStatusType::Confirmed);
    let second = harness.api.update_order_status(&owner_actor, order.id, OrderStatusType::Confirmed);
    let (first, second) = tokio::join!(first, second);

    assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1, "exactly one writer may win");
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser.unwrap_err(), OrderFlowError::InvalidTransition {
        from: OrderStatusType::Confirmed,
        to: OrderStatusType::Confirmed
    }));

    let (stored, _) = harness.api.fetch_order(&admin(), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::Confirmed);
    // only the winning write published
    let events = harness.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "ORDER_STATUS_UPDATED");
}

#[tokio::test]
async fn customers_can_cancel_early_orders_only() {
    let mut harness = new_harness().await;
    let caller = customer(7);
    let (order, _) = harness.api.create_order(&caller, &burger_order(7)).await.unwrap();
    harness.drain_events();

    let cancelled = harness.api.cancel_order(&caller, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
    let events = harness.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "ORDER_CANCELLED");
    // the cancellation event still carries the full item snapshot
    assert_eq!(events[0].items.len(), 2);

    // once the kitchen has started, it is too late
    let (order, _) = harness.api.create_order(&caller, &burger_order(7)).await.unwrap();
    harness.api.update_order_status(&admin(), order.id, OrderStatusType::Confirmed).await.unwrap();
    harness.api.update_order_status(&admin(), order.id, OrderStatusType::Preparing).await.unwrap();
    let err = harness.api.cancel_order(&caller, order.id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { from: OrderStatusType::Preparing, .. }));

    // cancelling twice fails the second time
    let (order, _) = harness.api.create_order(&caller, &burger_order(7)).await.unwrap();
    harness.api.cancel_order(&caller, order.id).await.unwrap();
    let err = harness.api.cancel_order(&caller, order.id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { from: OrderStatusType::Cancelled, .. }));
}

#[tokio::test]
async fn delivered_orders_can_be_rated_exactly_once() {
    let mut harness = new_harness().await;
    let caller = customer(7);
    let (order, _) = harness.api.create_order(&caller, &burger_order(7)).await.unwrap();

    // not yet delivered
    let err = harness.api.rate_order(&caller, order.id, 5, None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::RatingNotEligible(_)));

    harness.deliver(order.id).await;
    harness.drain_events();

    let rated = harness.api.rate_order(&caller, order.id, 4, Some("Great burger".to_string())).await.unwrap();
    assert_eq!(rated.rating, Some(4));
    assert_eq!(rated.review.as_deref(), Some("Great burger"));
    let events = harness.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "ORDER_RATED");

    // second rating is rejected and the first one stands
    let err = harness.api.rate_order(&caller, order.id, 1, None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::RatingNotEligible(_)));
    let (stored, _) = harness.api.fetch_order(&caller, order.id).await.unwrap();
    assert_eq!(stored.rating, Some(4));
    assert!(harness.drain_events().is_empty());
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected_before_any_read() {
    let harness = new_harness().await;
    let caller = customer(7);
    for rating in [0, 6, -1] {
        let err = harness.api.rate_order(&caller, 12345, rating, None).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::RatingNotEligible(_)), "rating {rating} must be rejected");
    }
}

#[tokio::test]
async fn fetching_a_missing_order_is_not_found() {
    let harness = new_harness().await;
    let err = harness.api.fetch_order(&admin(), 404).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::NotFound(_)));
}

#[tokio::test]
async fn order_level_special_instructions_are_stored() {
    let harness = new_harness().await;
    let req = CreateOrderRequest {
        special_instructions: Some("Ring the bell twice".to_string()),
        ..burger_order(7)
    };
    let (order, _) = harness.api.create_order(&customer(7), &req).await.unwrap();
    assert_eq!(order.special_instructions.as_deref(), Some("Ring the bell twice"));

    // and they survive a round trip through the store
    let found = harness.api.db().search_orders(OrderQueryFilter::customer(7)).await.unwrap();
    assert_eq!(found[0].special_instructions.as_deref(), Some("Ring the bell twice"));
}
