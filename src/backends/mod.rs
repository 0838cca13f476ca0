// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! The backend layer abstracts the platform media APIs, so the session logic
//! in [`crate::session`] only sees traits:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Session Layer                 │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │ Permissions │    │     Devices      │   │
//! │  └─────────────┘    └──────────────────┘   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │   Session   │    │  Photo / Movie   │   │
//! │  └─────────────┘    └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend traits, shared types and the virtual backend

pub mod camera;
