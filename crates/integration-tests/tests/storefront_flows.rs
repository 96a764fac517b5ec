//! Shopper journeys through the full runtime against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use capelli_core::{CartLine, Price, Quantity, UsState};
use capelli_integration_tests::{FakeBackend, address};
use capelli_storefront::api::ApiClient;
use capelli_storefront::app::App;
use capelli_storefront::config::{MutationPolicy, StorefrontSettings};
use capelli_storefront::navigation::Route;
use capelli_storefront::screens::{Action, Field, ScreenContext};
use capelli_storefront::session::{MemorySessionStore, SessionStore, SessionToken};

type TestApp = App<ApiClient, MemorySessionStore>;

async fn app_with(backend: &FakeBackend, session: MemorySessionStore, policy: MutationPolicy) -> TestApp {
    let settings = StorefrontSettings {
        mutation_policy: policy,
        ..StorefrontSettings::default()
    };
    let mut app = App::new(backend.client().unwrap(), session, ScreenContext::from(&settings));
    app.start().await;
    app.settle().await;
    app
}

async fn act(app: &mut TestApp, action: Action) {
    app.dispatch(action).await;
    app.settle().await;
}

async fn set(app: &mut TestApp, field: Field, value: &str) {
    act(app, Action::SetField(field, value.to_string())).await;
}

fn names(app: &TestApp) -> Vec<&'static str> {
    app.routes().map(Route::name).collect()
}

fn clipper_line(quantity: u32) -> CartLine {
    CartLine {
        title: "Wahl Magic Clip".to_string(),
        image: "https://img/clip.png".to_string(),
        price: Price::parse("124.99").unwrap(),
        quantity: Quantity::new(quantity).unwrap(),
    }
}

#[tokio::test]
async fn test_anonymous_add_logs_in_then_adds() {
    let backend = FakeBackend::start().await;
    backend.add_user("shopper@example.com", "shopper", "pw");
    let session = MemorySessionStore::new();
    let mut app = app_with(&backend, session.clone(), MutationPolicy::Optimistic).await;

    act(&mut app, Action::SelectCategory("Clippers".to_string())).await;
    assert!(app.view().unwrap().contains("Wahl Magic Clip"));
    assert!(!app.view().unwrap().contains("Andis"));

    act(&mut app, Action::OpenProduct("Wahl Magic Clip".to_string())).await;
    act(&mut app, Action::AddToCart).await;
    assert_eq!(app.route(), Some(&Route::Login));

    set(&mut app, Field::Username, "shopper").await;
    set(&mut app, Field::Password, "pw").await;
    act(&mut app, Action::Submit).await;
    // Category selection replaces the home screen.
    assert_eq!(names(&app), vec!["Search", "Product", "Account"]);
    assert!(session.load().await.unwrap().is_some());

    act(&mut app, Action::Back).await;
    set(&mut app, Field::Quantity, "2").await;
    act(&mut app, Action::AddToCart).await;
    assert!(app.view().unwrap().contains("View in Cart"));

    act(&mut app, Action::AddToCart).await;
    assert_eq!(app.route(), Some(&Route::Cart));
    let view = app.view().unwrap();
    assert!(view.contains("$124.99 x 2"));
    assert!(view.contains("$249.98"));
    assert_eq!(backend.user("shopper").unwrap().cart, vec![clipper_line(2)]);
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    let backend = FakeBackend::start().await;
    backend.add_user("shopper@example.com", "shopper", "pw");
    let session = MemorySessionStore::new();
    let mut app = app_with(&backend, session.clone(), MutationPolicy::Optimistic).await;

    act(&mut app, Action::Account).await;
    assert_eq!(app.route(), Some(&Route::Login));
    set(&mut app, Field::Username, "shopper").await;
    set(&mut app, Field::Password, "nope").await;
    act(&mut app, Action::Submit).await;

    assert_eq!(app.route(), Some(&Route::Login));
    assert!(app.view().unwrap().contains("User not found!"));
    assert!(session.is_empty().await);
}

#[tokio::test]
async fn test_signup_mismatch_sends_no_request() {
    let backend = FakeBackend::start().await;
    let mut app = app_with(&backend, MemorySessionStore::new(), MutationPolicy::Optimistic).await;

    act(&mut app, Action::Account).await;
    act(&mut app, Action::SignUp).await;
    assert_eq!(app.route(), Some(&Route::SignUp));

    set(&mut app, Field::Email, "new@example.com").await;
    set(&mut app, Field::ConfirmEmail, "new@example.org").await;
    set(&mut app, Field::Username, "newbie").await;
    set(&mut app, Field::Password, "pw").await;
    set(&mut app, Field::ConfirmPassword, "pw").await;
    act(&mut app, Action::Submit).await;
    assert_eq!(backend.count("signup"), 0);
    assert!(app.view().unwrap().contains("Emails do not match!"));

    set(&mut app, Field::ConfirmEmail, "new@example.com").await;
    act(&mut app, Action::Submit).await;
    assert_eq!(backend.count("signup"), 1);
    assert_eq!(app.route(), Some(&Route::Account));
    assert!(backend.user("newbie").is_some());
}

#[tokio::test]
async fn test_logout_clears_session_and_redirects() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("shopper@example.com", "shopper", "pw");
    let session = MemorySessionStore::with_token(&SessionToken::new(token));
    let mut app = app_with(&backend, session.clone(), MutationPolicy::Optimistic).await;

    act(&mut app, Action::Account).await;
    assert_eq!(app.route(), Some(&Route::Account));
    act(&mut app, Action::Logout).await;

    assert_eq!(app.route(), Some(&Route::Login));
    assert!(session.is_empty().await);
    assert_eq!(backend.count("logout"), 1);

    // The cart now asks the shopper to log in.
    act(&mut app, Action::Cart).await;
    assert!(app.view().unwrap().contains("No User Logged in!"));
}

async fn cart_with_failing_update(policy: MutationPolicy) -> (FakeBackend, TestApp) {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("shopper@example.com", "shopper", "pw");
    backend.with_state(|state| {
        if let Some(user) = state.users.first_mut() {
            user.cart.push(clipper_line(1));
        }
    });
    let session = MemorySessionStore::with_token(&SessionToken::new(token));
    let mut app = app_with(&backend, session, policy).await;
    act(&mut app, Action::Cart).await;
    assert!(app.view().unwrap().contains("$124.99 x 1"));

    backend.fail("updateCartQuantity");
    act(
        &mut app,
        Action::SetLineQuantity {
            title: "Wahl Magic Clip".to_string(),
            input: "3".to_string(),
        },
    )
    .await;
    (backend, app)
}

#[tokio::test]
async fn test_optimistic_update_keeps_local_change() {
    let (backend, app) = cart_with_failing_update(MutationPolicy::Optimistic).await;
    let view = app.view().unwrap();
    assert!(view.contains("$124.99 x 3"));
    assert!(view.contains("Could not update Wahl Magic Clip; your cart may be out of date."));
    assert_eq!(backend.user("shopper").unwrap().cart, vec![clipper_line(1)]);
}

#[tokio::test]
async fn test_rollback_update_restores_line() {
    let (_backend, app) = cart_with_failing_update(MutationPolicy::Rollback).await;
    let view = app.view().unwrap();
    assert!(view.contains("$124.99 x 1"));
    assert!(view.contains("Could not update Wahl Magic Clip; change undone."));
}

#[tokio::test]
async fn test_reply_after_leaving_screen_is_dropped() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("shopper@example.com", "shopper", "pw");
    let session = MemorySessionStore::with_token(&SessionToken::new(token));
    let mut app = app_with(&backend, session, MutationPolicy::Optimistic).await;

    app.dispatch(Action::Cart).await;
    assert_eq!(app.pending(), 1);
    app.dispatch(Action::Back).await;
    app.settle().await;

    assert_eq!(names(&app), vec!["Home"]);
    assert_eq!(backend.count("getCart"), 1);
    assert!(app.view().unwrap().contains("Wahl Magic Clip"));
}

#[tokio::test]
async fn test_address_list_refetches_after_delete() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("shopper@example.com", "shopper", "pw");
    backend.with_state(|state| {
        if let Some(user) = state.users.first_mut() {
            user.addresses = vec![
                address("1 First St", UsState::NY, "10001"),
                address("2 Second St", UsState::NY, "10002"),
            ];
        }
    });
    let session = MemorySessionStore::with_token(&SessionToken::new(token));
    let mut app = app_with(&backend, session, MutationPolicy::Optimistic).await;

    act(&mut app, Action::Account).await;
    act(&mut app, Action::EditAddresses).await;
    assert!(app.view().unwrap().contains("1: 2 Second St"));

    act(&mut app, Action::RemoveAddress(0)).await;
    let view = app.view().unwrap();
    assert!(view.contains("0: 2 Second St"));
    assert!(!view.contains("First St"));
    assert_eq!(backend.count("getAddresses"), 2);

    // Editing position 0 now targets the former second address.
    act(&mut app, Action::EditAddress(0)).await;
    set(&mut app, Field::Zip, "10099").await;
    act(&mut app, Action::Submit).await;
    assert_eq!(app.route(), Some(&Route::SelectAddress { checkout: false }));
    let stored = backend.user("shopper").unwrap().addresses;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].zip_code, "10099");
}

#[tokio::test]
async fn test_checkout_with_new_address() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("shopper@example.com", "shopper", "pw");
    backend.with_state(|state| {
        if let Some(user) = state.users.first_mut() {
            user.cart.push(clipper_line(1));
        }
    });
    let session = MemorySessionStore::with_token(&SessionToken::new(token));
    let mut app = app_with(&backend, session, MutationPolicy::Optimistic).await;

    act(&mut app, Action::Cart).await;
    act(&mut app, Action::Checkout).await;
    act(&mut app, Action::ChooseShipping).await;
    assert_eq!(app.route(), Some(&Route::AddAddress));

    set(&mut app, Field::Line1, "9 Ninth St").await;
    set(&mut app, Field::State, "tx").await;
    set(&mut app, Field::Zip, "75001").await;
    act(&mut app, Action::Submit).await;
    assert_eq!(app.route().map(Route::name), Some("Checkout"));
    assert!(app.view().unwrap().contains("9 Ninth St"));

    act(&mut app, Action::SubmitOrder).await;
    assert_eq!(names(&app), vec!["Home"]);
}
