//! Drives a network activity indicator from the requests flowing through an
//! HTTP pipeline.
//!
//! An [`Interceptor`] attached to a [`HookChain`] counts each request once,
//! from dispatch until it succeeds, fails or is cancelled. The count feeds an
//! [`ActivityCounter`], which shows the indicator as soon as a request starts
//! and hides it only after activity has stayed at zero for a short debounce.

pub mod config;
mod global;
pub mod interceptor;
pub mod logging;
pub mod pipeline;
pub mod service;

pub use netbusy_counter::{Active, ActivityCounter, Background, IndicatorOwner, DEFAULT_DEBOUNCE};

pub use self::global::{counter, subscribe};
pub use self::interceptor::{Interceptor, Outcome, Tracked, Tracking};
pub use self::pipeline::{Binding, HookChain, RequestHook, Terminal, Terminals};
pub use self::service::{Pipeline, PipelineLayer, TrackedBody};
