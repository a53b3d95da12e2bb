// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod config;
pub mod exception;
pub mod guard;
pub mod handler;
pub mod param;
pub mod payload;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod store;
pub mod util;
pub mod validator;
pub mod view;

pub use config::Config;
pub use exception::Exception;
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use server::AppState;
pub use store::{DirStore, FileStore, MemoryStore};
pub use view::HtmlBuilder;
