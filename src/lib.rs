//! Isomorphic components without a VDOM differ.
//!
//! Components [`render`](Component::render) an [`Element`] tree that is either serialized to HTML (server paint) or
//! materialized into [`DomElement`]s (browser mount, or hydration of server-painted markup). Binding captures named
//! element references and instantiates child components, guarded by a monotonic [`RenderId`] so that superseded
//! renders can't write to the DOM.
//!
//! [`data`] holds the REST-backed [`Model`](data::Model)/[`Collection`](data::Collection) stores that components
//! observe through their events.

#![doc(html_root_url = "https://docs.rs/composer/0.0.3")]
#![warn(clippy::pedantic)]

pub mod component;
pub mod config;
pub mod data;
pub mod dom;
pub mod emitter;
mod error;
pub mod html;
pub mod http;
mod localization;
mod props;
pub mod tree;

pub use component::{Base, Component, ComponentHandle, WeakComponent};
pub use dom::DomElement;
pub use error::{Error, Result};
pub use localization::Localization;
pub use props::{Props, Text};
pub use tree::{Element, RenderId};
