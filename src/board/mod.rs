//! Board core: per-user Kanban boards, columns, tasks and subtasks.
//!
//! ## Overview
//!
//! A signed-in user owns boards. Each board holds ordered columns, columns
//! hold ordered tasks, tasks hold ordered subtasks. All four collections are
//! loaded once per session into an in-memory [`store::EntityStore`] and every
//! mutation is applied there first, then mirrored to a remote record store.
//! Remote failures never block the user: the write is parked in an outbox
//! and can be replayed later.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐  HTTP  ┌─────────────────────────────────────────────────┐
//! │  Client  │ ─────> │  server.rs  (axum Router, ServerConfig)         │
//! │          │ <───── │    └─ api.rs  (route handlers, AppState)        │
//! └──────────┘        │         │                                       │
//!                     │         v                                       │
//!                     │  service.rs  (KanbanService, session lifecycle) │
//!                     │    │        │                                   │
//!                     │    v        v                                   │
//!                     │  store.rs  sync.rs  (RemoteMirror + outbox)     │
//!                     │                │                                │
//!                     │                v                                │
//!                     │  remote.rs (RecordStore) ── db.rs / http.rs     │
//!                     └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `models`   | Entities, creation inputs, tri-state patches, views     |
//! | `identity` | `IdentityProvider` trait and auth state                 |
//! | `activity` | Change classification, messages, day grouping           |
//! | `filter`   | Search, priority, status, due-date and column filters   |
//! | `stats`    | Board statistics, analytics, dashboard summary          |
//! | `drag`     | Resolving a drop target to a column move                |
//! | `seed`     | Default columns and the demo data set                   |
//! | `notify`   | Success/error notices for the user                      |
//! | `clock`    | Injectable "now"                                        |

pub mod activity;
pub mod api;
pub mod clock;
pub mod db;
pub mod drag;
pub mod filter;
pub mod http;
pub mod identity;
pub mod models;
pub mod notify;
pub mod remote;
pub mod seed;
pub mod server;
pub mod service;
pub mod stats;
pub mod store;
pub mod sync;
