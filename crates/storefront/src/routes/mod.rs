//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page (product listing)
//! GET  /health                  - Health check
//! GET  /contacts                - Contact form
//! POST /contacts                - Contact form submission
//!
//! # Products
//! GET  /products/{id}           - Product detail (counts the view)
//! GET  /products/new            - New product form
//! POST /products/new            - Create product (multipart)
//! GET  /products/{id}/edit      - Edit product form
//! POST /products/{id}/edit      - Update product (multipart)
//! POST /products/{id}/delete    - Delete product
//! POST /products/{id}/versions  - Record a product version
//!
//! # Blog
//! GET  /blog                    - Published articles
//! GET  /blog/{id}               - Article detail (counts the view)
//! GET  /blog/new                - New article form
//! POST /blog/new                - Create article (multipart)
//! GET  /blog/{id}/edit          - Edit article form
//! POST /blog/{id}/edit          - Update article (multipart)
//! POST /blog/{id}/delete        - Delete article
//!
//! # Users
//! GET  /users/register              - Registration page
//! POST /users/register              - Register action
//! GET  /users/email-confirm/{token} - Email confirmation link
//! GET  /users/reset-password        - Password reset page
//! POST /users/reset-password        - Password reset action
//! GET  /users/login                 - Login page
//! POST /users/login                 - Login action
//! POST /users/logout                - Logout action
//! GET  /users/profile               - Profile page (requires auth)
//! POST /users/profile               - Profile update (requires auth, multipart)
//! ```

pub mod account;
pub mod blog;
pub mod contact;
pub mod home;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/new", get(products::new_form).post(products::create))
        .route("/{id}", get(products::show))
        .route("/{id}/edit", get(products::edit_form).post(products::update))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/versions", post(products::add_version))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/new", get(blog::new_form).post(blog::create))
        .route("/{id}", get(blog::show))
        .route("/{id}/edit", get(blog::edit_form).post(blog::update))
        .route("/{id}/delete", post(blog::delete))
}

/// Create the user/account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(users::register_page).post(users::register))
        .route("/email-confirm/{token}", get(users::email_confirm))
        .route(
            "/reset-password",
            get(users::reset_password_page).post(users::reset_password),
        )
        .route("/login", get(users::login_page).post(users::login))
        .route("/logout", post(users::logout))
        .route(
            "/profile",
            get(account::profile_page).post(account::profile_update),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Contact form
        .route("/contacts", get(contact::page).post(contact::submit))
        // Product routes
        .nest("/products", product_routes())
        // Blog routes
        .nest("/blog", blog_routes())
        // User routes
        .nest("/users", user_routes())
}
