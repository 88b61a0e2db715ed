//! Payments — hosted payment provider adapter.
//!
//! DESIGN
//! ======
//! The `PaymentGateway` trait is the seam between checkout routes and the
//! provider. The concrete `StripeGateway` talks to the Stripe REST API over
//! reqwest; tests substitute a mock. The gateway is constructed once at
//! startup from environment configuration and carried in `AppState` — absent
//! credentials leave it `None` and checkout routes fail fast.

pub mod stripe;
pub mod types;

pub use stripe::StripeGateway;
pub use types::{CheckoutSession, PaymentError, PaymentGateway, PaymentIntent, SessionLineItem};
