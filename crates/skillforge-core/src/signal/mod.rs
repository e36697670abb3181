//! Signal propagation: fan a raised event out to every subscribed handler.

pub mod propagation;

pub use propagation::{
    HandlerFailure, HandlerOutcome, SignalPropagation, SignalSubscription, SubscriptionDirectory,
};
