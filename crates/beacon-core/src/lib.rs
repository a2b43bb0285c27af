//! # Beacon Core
//!
//! The core engine of the Beacon bot backend.
//!
//! This crate provides the building blocks the framework layer assembles
//! into a per-invocation runtime:
//!
//! - **Resolution container**: service bindings, singleton caching, and
//!   statically-checked auto-wiring ([`Container`], [`Injectable`]).
//! - **Update envelope**: the union-shaped inbound record ([`Update`]) and
//!   its payload types.
//! - **Typed events**: the enumerated router-to-plugin wire contract
//!   ([`EventKind`], [`Event`]).
//! - **Boundary ports**: trait seams for the messaging platform and the
//!   persistence layer ([`MessagingApi`], [`Storage`]).
//!
//! Everything here is per-invocation state. A webhook call constructs a
//! fresh container and registry, routes exactly one update, and discards
//! the lot; no state survives between invocations.

pub mod container;
pub mod error;
pub mod event;
pub mod ports;
pub mod update;

pub use container::{Container, Inject, Injectable, Overrides, Resolver, ServiceArc};
pub use error::{
    ApiError, ApiResult, ResolveError, ResolveResult, StorageError, StorageResult,
};
pub use event::{Command, Event, EventKind};
pub use ports::{MemoryStorage, MessagingApi, Storage};
pub use update::{
    Audio, CallbackQuery, Chat, ChatMember, ChatMemberUpdated, ChosenInlineResult, Document,
    InlineQuery, Location, Message, PhotoSize, Poll, PollAnswer, Sticker, Update, User, Video,
    Voice,
};
